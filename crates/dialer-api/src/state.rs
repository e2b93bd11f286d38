//! Shared application state handed to every handler

use dialer_core::traits::{
    CallRecordRepository, ContactListRepository, ContactRepository, JobQueue, UserRepository,
};
use dialer_services::WebhookReconciler;
use std::sync::Arc;

/// Repositories and services behind the HTTP API
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub lists: Arc<dyn ContactListRepository>,
    pub call_records: Arc<dyn CallRecordRepository>,
    pub jobs: Arc<dyn JobQueue>,
    pub reconciler: Arc<WebhookReconciler>,

    /// Default size of the recent dial jobs listing
    pub recent_jobs_limit: usize,
}
