//! Telephony provider integration for the autodialer
//!
//! [`TwilioClient`] implements [`dialer_core::traits::TelephonyGateway`]
//! against the provider's REST API. Each call carries an inline voice
//! response: the personalized message spoken in the configured voice,
//! followed by an audio cue.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use dialer_core::config::TelephonyConfig;
//! use dialer_core::traits::TelephonyGateway;
//! use dialer_telephony::TwilioClient;
//!
//! let client = TwilioClient::new(&TelephonyConfig {
//!     account_sid: "AC...".into(),
//!     auth_token: "...".into(),
//!     origin_number: Some("+15550000000".into()),
//!     ..Default::default()
//! })?;
//! let outcome = client.place_call("+15551234567", "Hello Ada").await?;
//! println!("provider call id: {}", outcome.external_id);
//! ```

pub mod client;
pub mod types;
pub mod voice_response;

pub use client::TwilioClient;
pub use voice_response::VoiceResponse;
