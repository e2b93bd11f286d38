//! Dial job model
//!
//! A dial job is one orchestration unit: expand a contact list, place a call
//! per member and commit the resulting call records. Jobs are submitted to a
//! background executor and polled by identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque job identifier handed back to the submitter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Fresh time-ordered identifier
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit of work submitted to the job queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialJob {
    pub contact_list_id: i64,

    /// Message template with `{first_name}`-style placeholders
    pub message: String,

    /// User who requested the dial; owns the produced call records' visibility
    pub requested_by: i64,
}

/// Outcome of a successful orchestration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialSummary {
    pub contact_list_id: i64,

    /// Members of the list at run time
    pub attempted: usize,

    /// Calls the provider accepted
    pub placed: usize,

    /// Per-contact gateway failures (logged, not fatal)
    pub failed: usize,

    /// New rows written, after external-id dedupe
    pub inserted: u64,
}

/// Public job state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobState {
    /// Queued or running
    Pending,
    Succeeded { result: DialSummary },
    Failed { error: String },
}

impl JobState {
    pub fn label(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Succeeded { .. } => "succeeded",
            JobState::Failed { .. } => "failed",
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, JobState::Pending)
    }
}

/// Stored job status entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub job: DialJob,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Freshly submitted job
    pub fn submitted(id: JobId, job: DialJob) -> Self {
        Self {
            id,
            job,
            state: JobState::Pending,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
    }

    pub fn finish(&mut self, state: JobState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
    }

    pub fn owned_by(&self, user_id: i64) -> bool {
        self.job.requested_by == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> DialJob {
        DialJob {
            contact_list_id: 1,
            message: "Hi {first_name}".to_string(),
            requested_by: 9,
        }
    }

    #[test]
    fn test_job_ids_are_unique() {
        assert_ne!(JobId::generate(), JobId::generate());
    }

    #[test]
    fn test_job_lifecycle() {
        let mut record = JobRecord::submitted(JobId::from("job-1"), job());
        assert_eq!(record.state.label(), "pending");
        assert!(record.started_at.is_none());

        record.mark_started();
        assert!(record.started_at.is_some());
        assert!(!record.state.is_finished());

        record.finish(JobState::Failed {
            error: "store unavailable".to_string(),
        });
        assert_eq!(record.state.label(), "failed");
        assert!(record.finished_at.is_some());
    }

    #[test]
    fn test_job_record_survives_json() {
        let mut record = JobRecord::submitted(JobId::from("job-2"), job());
        record.finish(JobState::Succeeded {
            result: DialSummary {
                contact_list_id: 1,
                attempted: 2,
                placed: 1,
                failed: 1,
                inserted: 1,
            },
        });

        let json = serde_json::to_string(&record).unwrap();
        let back: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert!(back.owned_by(9));
        assert!(!back.owned_by(10));
    }
}
