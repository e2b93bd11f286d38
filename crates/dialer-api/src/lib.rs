//! API layer for the autodialer
//!
//! HTTP handlers for authentication, contacts, contact lists, dial jobs,
//! call records and the telephony provider's status callback. All routes
//! are registered by [`configure`], normally under `/api/v1`.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;
pub mod state;

pub use dto::{ApiResponse, PaginationParams};
pub use handlers::configure;
pub use state::AppState;

use actix_web::web;
use dialer_core::AppError;

/// JSON body extractor config reporting malformed bodies as validation errors
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

/// Query string extractor config reporting bad parameters as validation errors
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}
