//! Cache key constants and builders
//!
//! # Key Patterns
//!
//! - `dial_job:{job_id}` - Serialized dial job status entry
//! - `dial_jobs:user:{user_id}` - List of a user's job ids, newest first
//!
//! # Example
//!
//! ```
//! use dialer_cache::keys;
//!
//! assert_eq!(keys::dial_job_key("0191"), "dial_job:0191");
//! assert_eq!(keys::user_jobs_key(7), "dial_jobs:user:7");
//! ```

/// Prefix for dial job status entries
///
/// Format: `dial_job:{job_id}`
pub const DIAL_JOB_PREFIX: &str = "dial_job";

/// Prefix for per-user recent job lists
///
/// Format: `dial_jobs:user:{user_id}`
pub const USER_JOBS_PREFIX: &str = "dial_jobs:user";

/// Job ids retained per user
pub const USER_JOBS_MAX_LEN: usize = 100;

/// Build the key holding one job's status entry
pub fn dial_job_key(job_id: &str) -> String {
    format!("{}:{}", DIAL_JOB_PREFIX, job_id)
}

/// Build the key of a user's recent job list
pub fn user_jobs_key(user_id: i64) -> String {
    format!("{}:{}", USER_JOBS_PREFIX, user_id)
}
