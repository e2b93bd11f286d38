//! Provider status callback payload
//!
//! The provider posts form-encoded `CallSid`, `CallStatus` and `CallDuration`
//! (plus many fields the dialer ignores). JSON clients may use `externalId`,
//! `status` and `durationSeconds` instead.

use dialer_core::models::StatusEvent;
use dialer_core::{AppError, FieldError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusCallbackPayload {
    #[serde(alias = "CallSid", alias = "externalId")]
    pub external_id: Option<String>,

    #[serde(alias = "CallStatus")]
    pub status: Option<String>,

    #[serde(alias = "CallDuration", alias = "durationSeconds")]
    pub duration_seconds: Option<RawDuration>,
}

/// Column widths of `call_records.external_id` and `call_records.status`
pub const MAX_EXTERNAL_ID_LEN: usize = 64;
pub const MAX_STATUS_LEN: usize = 20;

fn required_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
    errors: &mut Vec<FieldError>,
) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) if v.chars().count() > max_len => {
            errors.push(FieldError::new(
                field,
                "length",
                format!("{} must be at most {} characters", field, max_len),
            ));
            String::new()
        }
        Some(v) => v.to_string(),
        None => {
            errors.push(FieldError::required(field));
            String::new()
        }
    }
}

impl StatusCallbackPayload {
    /// Check the payload and turn it into a status event
    ///
    /// Every problem is reported, not only the first. An empty duration is
    /// treated as absent.
    pub fn into_event(self) -> Result<StatusEvent, AppError> {
        let mut errors = Vec::new();

        let external_id = required_text(
            self.external_id.as_deref(),
            "external_id",
            MAX_EXTERNAL_ID_LEN,
            &mut errors,
        );
        let status = required_text(self.status.as_deref(), "status", MAX_STATUS_LEN, &mut errors);

        let duration = match self.duration_seconds {
            None => None,
            Some(RawDuration::Number(n)) => Some(n),
            Some(RawDuration::Text(text)) if text.trim().is_empty() => None,
            Some(RawDuration::Text(text)) => match text.trim().parse::<i64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    errors.push(FieldError::new(
                        "duration_seconds",
                        "invalid",
                        "duration_seconds must be a whole number of seconds",
                    ));
                    None
                }
            },
        };

        let duration_secs = match duration {
            Some(n) => match i32::try_from(n) {
                Ok(n) if n >= 0 => Some(n),
                _ => {
                    errors.push(FieldError::new(
                        "duration_seconds",
                        "out_of_range",
                        "duration_seconds must be a non-negative number of seconds",
                    ));
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(AppError::InvalidFields(errors));
        }

        Ok(StatusEvent {
            external_id,
            status,
            duration_secs,
        })
    }
}
