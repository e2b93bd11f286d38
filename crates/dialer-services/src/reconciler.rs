//! Webhook reconciler
//!
//! Applies provider status callbacks to call records by external id. Events
//! may arrive more than once or out of order; the last one applied wins.
//! Records are never created here, only updated.

use dialer_core::{
    models::{CallRecord, StatusEvent},
    traits::CallRecordRepository,
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct WebhookReconciler {
    records: Arc<dyn CallRecordRepository>,
}

impl WebhookReconciler {
    pub fn new(records: Arc<dyn CallRecordRepository>) -> Self {
        Self { records }
    }

    /// Apply one status event
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` when no call record has the event's external id
    /// - `AppError::Validation` for a negative duration
    #[instrument(skip(self), fields(external_id = %event.external_id))]
    pub async fn on_status_event(&self, event: &StatusEvent) -> AppResult<CallRecord> {
        if matches!(event.duration_secs, Some(d) if d < 0) {
            return Err(AppError::Validation(
                "duration must not be negative".to_string(),
            ));
        }

        let record = self
            .records
            .update_status(&event.external_id, &event.status, event.duration_secs)
            .await
            .map_err(|e| {
                if matches!(e, AppError::NotFound(_)) {
                    warn!("Status event for unknown call {}", event.external_id);
                }
                e
            })?;

        if record.is_terminal() {
            info!(
                "Call {} finished as {} after {}s",
                record.external_id, record.status, record.duration
            );
        } else {
            debug!("Call {} is now {}", record.external_id, record.status);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialer_core::models::NewCallRecord;
    use dialer_db::MemoryStore;
    use rust_decimal_macros::dec;

    async fn store_with_call() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .bulk_insert(&[NewCallRecord {
                external_id: "CA1".to_string(),
                user_id: 1,
                contact_id: None,
                phone_number: "+1111".to_string(),
                duration: 0,
                cost: dec!(0.0075),
                status: "queued".to_string(),
            }])
            .await
            .unwrap();
        store
    }

    fn event(status: &str, duration: Option<i32>) -> StatusEvent {
        StatusEvent {
            external_id: "CA1".to_string(),
            status: status.to_string(),
            duration_secs: duration,
        }
    }

    #[tokio::test]
    async fn test_status_without_duration_keeps_duration() {
        let store = store_with_call().await;
        let reconciler = WebhookReconciler::new(store.clone());

        reconciler
            .on_status_event(&event("completed", Some(42)))
            .await
            .unwrap();
        let record = reconciler
            .on_status_event(&event("completed", None))
            .await
            .unwrap();

        assert_eq!(record.duration, 42);
        assert_eq!(record.cost, dec!(0.0075));
    }

    #[tokio::test]
    async fn test_out_of_order_events_last_write_wins() {
        let store = store_with_call().await;
        let reconciler = WebhookReconciler::new(store.clone());

        reconciler
            .on_status_event(&event("completed", Some(42)))
            .await
            .unwrap();
        reconciler
            .on_status_event(&event("ringing", Some(0)))
            .await
            .unwrap();

        let record = store.find_by_external_id("CA1").await.unwrap().unwrap();
        assert_eq!(record.status, "ringing");
        assert_eq!(record.duration, 0);
    }

    #[tokio::test]
    async fn test_negative_duration_is_rejected_without_update() {
        let store = store_with_call().await;
        let reconciler = WebhookReconciler::new(store.clone());

        let err = reconciler
            .on_status_event(&event("completed", Some(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let record = store.find_by_external_id("CA1").await.unwrap().unwrap();
        assert_eq!(record.status, "queued");
    }
}
