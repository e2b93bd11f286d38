//! Dial orchestrator
//!
//! Runs one dial job end to end:
//! - Load the contact list with its members
//! - Personalize the message and ask the provider to call each member
//! - Collect a call record candidate for every accepted call
//! - Commit all candidates with a single bulk insert deduplicated on the
//!   provider's call id
//!
//! A provider failure for one contact is logged and skipped. A missing list,
//! a provider configuration error, or a failed commit fails the whole run.

use crate::templater::personalize;
use async_trait::async_trait;
use dialer_core::{
    models::{ContactListWithContacts, DialJob, DialSummary, NewCallRecord},
    traits::{CallRecordRepository, ContactListRepository, DialRunner, TelephonyGateway},
    AppError, AppResult,
};
use futures::stream::{self, StreamExt};
use std::pin::pin;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct DialOrchestrator {
    lists: Arc<dyn ContactListRepository>,
    records: Arc<dyn CallRecordRepository>,
    gateway: Arc<dyn TelephonyGateway>,
    max_concurrent_calls: usize,
}

impl DialOrchestrator {
    /// Create an orchestrator that dials one contact at a time
    pub fn new(
        lists: Arc<dyn ContactListRepository>,
        records: Arc<dyn CallRecordRepository>,
        gateway: Arc<dyn TelephonyGateway>,
    ) -> Self {
        Self {
            lists,
            records,
            gateway,
            max_concurrent_calls: 1,
        }
    }

    /// Allow up to `limit` provider requests in flight per run
    ///
    /// Results are still consumed in list order.
    pub fn with_max_concurrent_calls(mut self, limit: usize) -> Self {
        self.max_concurrent_calls = limit.max(1);
        self
    }

    /// Dial every member of `contact_list_id` with `template`
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if the list does not exist
    /// - `AppError::Config` if the provider is not configured to place calls
    /// - the store's error if the final bulk insert fails
    #[instrument(skip(self, template))]
    pub async fn dial(&self, contact_list_id: i64, template: &str) -> AppResult<DialSummary> {
        let ContactListWithContacts { list, contacts } = self
            .lists
            .find_with_contacts(contact_list_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contact list {}", contact_list_id)))?;

        info!(
            "Dialing {} contacts of list {} ({})",
            contacts.len(),
            list.id,
            list.name
        );

        let mut summary = DialSummary {
            contact_list_id: list.id,
            attempted: contacts.len(),
            ..Default::default()
        };

        let gateway = &self.gateway;
        let calls: Vec<_> = contacts
            .iter()
            .map(|contact| async move {
                let message = personalize(template, contact);
                let result = gateway.place_call(&contact.phone_number, &message).await;
                (contact, result)
            })
            .collect();
        let mut attempts = pin!(stream::iter(calls).buffered(self.max_concurrent_calls));

        let mut candidates = Vec::with_capacity(contacts.len());
        while let Some((contact, result)) = attempts.next().await {
            match result {
                Ok(outcome) => {
                    debug!(
                        "Call {} placed to contact {} ({})",
                        outcome.external_id, contact.id, contact.phone_number
                    );
                    candidates.push(NewCallRecord::from_outcome(list.user_id, contact, &outcome));
                }
                Err(e) if e.is_configuration() => {
                    error!("Aborting dial of list {}: {}", list.id, e);
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(
                        "Call to contact {} ({}) failed: {}",
                        contact.id, contact.phone_number, e
                    );
                    summary.failed += 1;
                }
            }
        }

        summary.placed = candidates.len();

        if !candidates.is_empty() {
            summary.inserted = self.records.bulk_insert(&candidates).await.map_err(|e| {
                error!(
                    "Failed to commit {} call records for list {}: {}",
                    candidates.len(),
                    list.id,
                    e
                );
                e
            })?;
        }

        info!(
            "Dial of list {} finished: attempted={} placed={} failed={} inserted={}",
            list.id, summary.attempted, summary.placed, summary.failed, summary.inserted
        );

        Ok(summary)
    }
}

#[async_trait]
impl DialRunner for DialOrchestrator {
    async fn run(&self, job: &DialJob) -> AppResult<DialSummary> {
        self.dial(job.contact_list_id, &job.message).await
    }
}
