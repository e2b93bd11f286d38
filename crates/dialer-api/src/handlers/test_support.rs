//! Shared fixtures for handler tests: in-memory repositories, a simulated
//! provider and a dial worker pool, wired the same way the server wires them.

use crate::state::AppState;
use dialer_auth::{JwtService, PasswordService};
use dialer_core::models::{CallOutcome, Contact, ContactDraft, JobId, JobRecord, NewUser};
use dialer_core::traits::{
    ContactListRepository, ContactRepository, JobQueue, MockTelephonyGateway, UserRepository,
};
use dialer_db::MemoryStore;
use dialer_services::{DialJobQueue, DialOrchestrator, MemoryJobStatusStore, WebhookReconciler};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const PASSWORD: &str = "password123";

pub(crate) struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub jwt: Arc<JwtService>,
    pub passwords: Arc<PasswordService>,
}

/// Provider that accepts every number, using `CA<number>` as the call id
fn accepting_gateway() -> MockTelephonyGateway {
    let mut gateway = MockTelephonyGateway::new();
    gateway.expect_place_call().returning(|destination, _| {
        Ok(CallOutcome {
            external_id: format!("CA{}", destination.trim_start_matches('+')),
            status: "queued".to_string(),
            duration_secs: None,
            cost: None,
        })
    });
    gateway
}

impl TestContext {
    /// Must be created inside a runtime; dial workers are spawned here
    pub fn new() -> Self {
        Self::with_gateway(accepting_gateway())
    }

    pub fn with_gateway(gateway: MockTelephonyGateway) -> Self {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = DialOrchestrator::new(store.clone(), store.clone(), Arc::new(gateway));
        let jobs = DialJobQueue::start(
            Arc::new(orchestrator),
            Arc::new(MemoryJobStatusStore::new()),
            1,
            8,
        );

        let state = AppState {
            users: store.clone(),
            contacts: store.clone(),
            lists: store.clone(),
            call_records: store.clone(),
            jobs: Arc::new(jobs),
            reconciler: Arc::new(WebhookReconciler::new(store.clone())),
            recent_jobs_limit: 5,
        };

        Self {
            store,
            state,
            jwt: Arc::new(JwtService::new("test-secret-key-12345", 3600)),
            passwords: Arc::new(PasswordService::new()),
        }
    }

    /// Register a user with [`PASSWORD`] and return its id and a bearer header
    pub async fn user(&self, username: &str) -> (i64, (&'static str, String)) {
        let user = UserRepository::create(
            self.store.as_ref(),
            &NewUser {
                username: username.to_string(),
                email: None,
                password_hash: self.passwords.hash_password(PASSWORD).unwrap(),
            },
        )
        .await
        .unwrap();

        let token = self.jwt.create_token_for_user(user.id, &user.username).unwrap();
        (user.id, ("Authorization", format!("Bearer {}", token)))
    }

    pub async fn contact(&self, owner: i64, first_name: &str, phone: &str) -> Contact {
        ContactRepository::create(
            self.store.as_ref(),
            owner,
            &ContactDraft {
                first_name: first_name.to_string(),
                last_name: "Doe".to_string(),
                city: "Lima".to_string(),
                phone_number: phone.to_string(),
            },
        )
        .await
        .unwrap()
    }

    pub async fn list(&self, owner: i64, name: &str, members: &[&Contact]) -> i64 {
        let list = ContactListRepository::create(self.store.as_ref(), owner, name)
            .await
            .unwrap();
        for contact in members {
            self.store.add_contact(list.id, contact.id).await.unwrap();
        }
        list.id
    }

    pub async fn wait_for_job(&self, id: &str) -> JobRecord {
        let id = JobId::from(id);
        for _ in 0..300 {
            let record = self.state.jobs.status(&id).await.unwrap().unwrap();
            if record.state.is_finished() {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", id);
    }
}

/// Build the API service around a [`TestContext`]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.state.clone()))
                .app_data(actix_web::web::Data::new($ctx.jwt.clone()))
                .app_data(actix_web::web::Data::new($ctx.passwords.clone()))
                .app_data($crate::json_config())
                .app_data($crate::query_config())
                .service(actix_web::web::scope("/api/v1").configure($crate::configure)),
        )
        .await
    };
}

pub(crate) use test_app;
