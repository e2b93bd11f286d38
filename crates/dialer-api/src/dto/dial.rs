//! Dial trigger and job status DTOs

use chrono::{DateTime, Utc};
use dialer_core::models::{DialSummary, JobRecord, JobState};
use dialer_core::{AppError, FieldError};
use serde::{Deserialize, Serialize};

/// Body of `POST /contact-lists/{id}/dial`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DialRequest {
    /// Message template with `{first_name}`-style placeholders
    #[serde(default)]
    pub message: Option<String>,
}

impl DialRequest {
    /// The message template; missing or blank is a field error
    pub fn template(&self) -> Result<&str, AppError> {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AppError::InvalidFields(vec![FieldError::required("message")]))
    }
}

/// Accepted dial job
#[derive(Debug, Clone, Serialize)]
pub struct DialResponse {
    pub message: String,
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatusResponse {
    pub task_id: String,
    pub contact_list_id: i64,

    /// `pending`, `succeeded` or `failed`
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DialSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        let status = record.state.label();
        let (result, error) = match record.state {
            JobState::Pending => (None, None),
            JobState::Succeeded { result } => (Some(result), None),
            JobState::Failed { error } => (None, Some(error)),
        };

        Self {
            task_id: record.id.to_string(),
            contact_list_id: record.job.contact_list_id,
            status,
            result,
            error,
            submitted_at: record.submitted_at,
            started_at: record.started_at,
            finished_at: record.finished_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentJobsQuery {
    pub limit: Option<usize>,
}

/// Latest job ids, newest first
#[derive(Debug, Clone, Serialize)]
pub struct RecentJobsResponse {
    pub task_ids: Vec<String>,
}
