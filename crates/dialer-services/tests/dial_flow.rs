//! End-to-end dial flow: job submission, orchestration against a simulated
//! provider, and webhook reconciliation over the in-memory store.

use dialer_core::models::{
    CallOutcome, ContactDraft, DialJob, JobId, JobRecord, JobState, StatusEvent,
};
use dialer_core::traits::{
    CallRecordRepository, ContactListRepository, ContactRepository, JobQueue,
    MockTelephonyGateway,
};
use dialer_core::{AppError, GatewayError};
use dialer_db::MemoryStore;
use dialer_services::{DialJobQueue, DialOrchestrator, MemoryJobStatusStore, WebhookReconciler};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

const OWNER: i64 = 1;

struct Harness {
    store: Arc<MemoryStore>,
    queue: DialJobQueue,
    reconciler: WebhookReconciler,
}

/// Provider accepts +1111 as CA1 and rejects every other number
fn sales_gateway() -> MockTelephonyGateway {
    let mut gateway = MockTelephonyGateway::new();
    gateway
        .expect_place_call()
        .returning(|destination, _| match destination {
            "+1111" => Ok(CallOutcome {
                external_id: "CA1".to_string(),
                status: "queued".to_string(),
                duration_secs: None,
                cost: None,
            }),
            _ => Err(GatewayError::Provider {
                code: Some(21211),
                message: "The 'To' number is not valid.".to_string(),
            }),
        });
    gateway
}

fn harness(gateway: MockTelephonyGateway) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let orchestrator = DialOrchestrator::new(store.clone(), store.clone(), Arc::new(gateway));
    let queue = DialJobQueue::start(
        Arc::new(orchestrator),
        Arc::new(MemoryJobStatusStore::new()),
        2,
        16,
    );
    Harness {
        reconciler: WebhookReconciler::new(store.clone()),
        store,
        queue,
    }
}

async fn create_list(store: &MemoryStore, name: &str, phones: &[&str]) -> i64 {
    let list = ContactListRepository::create(store, OWNER, name).await.unwrap();
    for (n, phone) in phones.iter().enumerate() {
        let draft = ContactDraft {
            first_name: format!("Contact{}", n),
            last_name: "Doe".to_string(),
            city: "Quito".to_string(),
            phone_number: phone.to_string(),
        };
        let contact = ContactRepository::create(store, OWNER, &draft).await.unwrap();
        store.add_contact(list.id, contact.id).await.unwrap();
    }
    list.id
}

async fn submit(queue: &DialJobQueue, list_id: i64) -> JobId {
    queue
        .submit(DialJob {
            contact_list_id: list_id,
            message: "Hello {first_name} from {city}".to_string(),
            requested_by: OWNER,
        })
        .await
        .unwrap()
}

async fn wait_finished(queue: &DialJobQueue, id: &JobId) -> JobRecord {
    for _ in 0..300 {
        let record = queue.status(id).await.unwrap().unwrap();
        if record.state.is_finished() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", id);
}

#[tokio::test]
async fn test_sales_list_records_only_successful_calls() {
    let h = harness(sales_gateway());
    let list_id = create_list(&h.store, "Sales", &["+1111", "+2222"]).await;

    let id = submit(&h.queue, list_id).await;
    let record = wait_finished(&h.queue, &id).await;

    match record.state {
        JobState::Succeeded { result } => {
            assert_eq!(result.attempted, 2);
            assert_eq!(result.placed, 1);
            assert_eq!(result.failed, 1);
            assert_eq!(result.inserted, 1);
        }
        other => panic!("unexpected state {:?}", other),
    }

    assert_eq!(h.store.call_record_count(), 1);
    let call = h.store.find_by_external_id("CA1").await.unwrap().unwrap();
    assert_eq!(call.status, "queued");
    assert_eq!(call.duration, 0);
    assert_eq!(call.cost, Decimal::ZERO);
    assert_eq!(call.phone_number, "+1111");
    assert_eq!(call.user_id, OWNER);
}

#[tokio::test]
async fn test_webhook_updates_dialed_call() {
    let h = harness(sales_gateway());
    let list_id = create_list(&h.store, "Sales", &["+1111", "+2222"]).await;
    let id = submit(&h.queue, list_id).await;
    wait_finished(&h.queue, &id).await;

    h.reconciler
        .on_status_event(&StatusEvent {
            external_id: "CA1".to_string(),
            status: "completed".to_string(),
            duration_secs: Some(42),
        })
        .await
        .unwrap();

    let call = h.store.find_by_external_id("CA1").await.unwrap().unwrap();
    assert_eq!(call.status, "completed");
    assert_eq!(call.duration, 42);
}

#[tokio::test]
async fn test_webhook_for_unknown_call_creates_nothing() {
    let h = harness(sales_gateway());

    let err = h
        .reconciler
        .on_status_event(&StatusEvent {
            external_id: "CA999".to_string(),
            status: "completed".to_string(),
            duration_secs: Some(10),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(h.store.call_record_count(), 0);
    assert!(h.store.find_by_external_id("CA999").await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_list_succeeds_without_records() {
    let mut gateway = MockTelephonyGateway::new();
    gateway.expect_place_call().never();
    let h = harness(gateway);
    let list_id = create_list(&h.store, "Empty", &[]).await;

    let id = submit(&h.queue, list_id).await;
    let record = wait_finished(&h.queue, &id).await;

    assert_eq!(record.state.label(), "succeeded");
    assert_eq!(h.store.call_record_count(), 0);
}

#[tokio::test]
async fn test_missing_list_fails_job() {
    let h = harness(sales_gateway());

    let id = submit(&h.queue, 12345).await;
    match wait_finished(&h.queue, &id).await.state {
        JobState::Failed { error } => assert!(error.contains("Not found")),
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
async fn test_store_outage_fails_job() {
    let h = harness(sales_gateway());
    let list_id = create_list(&h.store, "Sales", &["+1111"]).await;

    h.store.set_available(false);
    let id = submit(&h.queue, list_id).await;

    assert_eq!(wait_finished(&h.queue, &id).await.state.label(), "failed");
    h.store.set_available(true);
    assert_eq!(h.store.call_record_count(), 0);
}

#[tokio::test]
async fn test_redelivered_job_is_idempotent() {
    let h = harness(sales_gateway());
    let list_id = create_list(&h.store, "Sales", &["+1111", "+2222"]).await;

    let first = submit(&h.queue, list_id).await;
    wait_finished(&h.queue, &first).await;
    let second = submit(&h.queue, list_id).await;

    match wait_finished(&h.queue, &second).await.state {
        JobState::Succeeded { result } => assert_eq!(result.inserted, 0),
        other => panic!("unexpected state {:?}", other),
    }
    assert_eq!(h.store.call_record_count(), 1);
}
