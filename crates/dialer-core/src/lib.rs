//! AutoDialer Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the autodialer. It includes:
//!
//! - Domain models (Contact, ContactList, CallRecord, dial jobs)
//! - Repository, gateway and job queue traits
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::{AppError, FieldError, GatewayError};

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
