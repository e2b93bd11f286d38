//! Voice response (TwiML) document sent with each outbound call

use std::fmt::{self, Write};

/// A spoken message followed by an audio cue
#[derive(Debug, Clone)]
pub struct VoiceResponse<'a> {
    pub message: &'a str,
    pub voice: &'a str,
    pub language: &'a str,
    pub audio_cue_url: &'a str,
}

impl VoiceResponse<'_> {
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.message.len());
        // Writing into a String never fails
        let _ = self.write_xml(&mut xml);
        xml
    }

    fn write_xml(&self, xml: &mut String) -> fmt::Result {
        write!(xml, r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#)?;
        write!(
            xml,
            r#"<Say voice="{}" language="{}">{}</Say>"#,
            xml_escape(self.voice),
            xml_escape(self.language),
            xml_escape(self.message)
        )?;
        if !self.audio_cue_url.is_empty() {
            write!(xml, "<Play>{}</Play>", xml_escape(self.audio_cue_url))?;
        }
        write!(xml, "</Response>")
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
