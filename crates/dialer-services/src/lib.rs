//! Business logic services for the autodialer
//!
//! # Services
//!
//! - [`personalize`] - Fills `{first_name}`-style placeholders from a contact
//! - [`DialOrchestrator`] - Expands a contact list into calls and commits the
//!   resulting call records in one idempotent bulk insert
//! - [`DialJobQueue`] - Runs dial jobs on a bounded pool of background workers
//!   and records their status for polling
//! - [`WebhookReconciler`] - Applies provider status callbacks to call records
//!
//! Services hold their collaborators as `Arc<dyn Trait>`, so the same code
//! runs against PostgreSQL/Redis in production and in-memory stores in tests.

pub mod jobs;
pub mod orchestrator;
pub mod reconciler;
pub mod templater;

pub use jobs::{DialJobQueue, MemoryJobStatusStore};
pub use orchestrator::DialOrchestrator;
pub use reconciler::WebhookReconciler;
pub use templater::personalize;
