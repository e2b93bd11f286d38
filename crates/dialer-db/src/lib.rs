//! AutoDialer Database Layer
//!
//! This crate provides PostgreSQL database access and repository implementations
//! for the autodialer. It includes:
//!
//! - Connection pool management and embedded migrations
//! - Repository implementations for users, contacts, lists and call records
//! - Idempotent bulk insertion of call records keyed by provider call id
//! - An in-memory store (feature `memory`) for tests

#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod pool;
pub mod repositories;

#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use dialer_core::{AppError, AppResult};
pub use sqlx::PgPool;
