//! Call record model
//!
//! One row per outbound call attempt the provider accepted. The provider's
//! call identifier (`external_id`) is the correlation key between the dial
//! orchestrator, which inserts rows, and the webhook reconciler, which updates
//! them.

use super::contact::Contact;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Persisted call attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Surrogate key
    pub id: i64,

    /// Provider-assigned call identifier (unique, immutable)
    pub external_id: String,

    /// Owning user; survives deletion of the contact
    pub user_id: i64,

    /// Originating contact, nulled when the contact is deleted
    pub contact_id: Option<i64>,

    /// Destination number as dialed (denormalized)
    pub phone_number: String,

    /// Call duration in whole seconds
    pub duration: i32,

    /// Provider cost, always non-negative
    pub cost: Decimal,

    /// Provider status token ("queued", "in-progress", "completed", ...)
    pub status: String,

    /// Insertion timestamp
    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    /// Check whether the provider reports the call as finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.as_str(),
            "completed" | "failed" | "busy" | "no-answer" | "canceled"
        )
    }
}

impl Default for CallRecord {
    fn default() -> Self {
        Self {
            id: 0,
            external_id: String::new(),
            user_id: 0,
            contact_id: None,
            phone_number: String::new(),
            duration: 0,
            cost: Decimal::ZERO,
            status: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Call record together with its (possibly deleted) contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecordDetail {
    pub record: CallRecord,
    pub contact: Option<Contact>,
}

/// Result of asking the provider to place one call
///
/// Duration and cost are best-effort: the provider usually reports neither
/// until the call ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub external_id: String,
    pub status: String,
    pub duration_secs: Option<i32>,
    pub cost: Option<Decimal>,
}

/// Call record candidate built by the orchestrator, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCallRecord {
    pub external_id: String,
    pub user_id: i64,
    pub contact_id: Option<i64>,
    pub phone_number: String,
    pub duration: i32,
    pub cost: Decimal,
    pub status: String,
}

impl NewCallRecord {
    /// Build a candidate for `contact` from a successful provider outcome
    ///
    /// Provider prices are reported as negative amounts (a debit); the stored
    /// cost is always the absolute value. Missing duration or cost become zero.
    pub fn from_outcome(user_id: i64, contact: &Contact, outcome: &CallOutcome) -> Self {
        Self {
            external_id: outcome.external_id.clone(),
            user_id,
            contact_id: Some(contact.id),
            phone_number: contact.phone_number.clone(),
            duration: outcome.duration_secs.unwrap_or(0).max(0),
            cost: normalize_cost(outcome.cost),
            status: outcome.status.clone(),
        }
    }
}

/// Absolute value of a provider cost, zero when unknown
pub fn normalize_cost(cost: Option<Decimal>) -> Decimal {
    cost.map(|c| c.abs()).unwrap_or(Decimal::ZERO)
}

/// Asynchronous status update reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub external_id: String,
    pub status: String,
    pub duration_secs: Option<i32>,
}
