//! Common traits for repositories and services
//!
//! Services depend on these abstractions as `Arc<dyn Trait>` so the
//! PostgreSQL, Redis and provider-backed implementations can be swapped for
//! in-memory or mocked ones.

use crate::error::{AppError, GatewayError};
use crate::models::{
    CallOutcome, CallRecord, CallRecordDetail, Contact, ContactDraft, ContactList,
    ContactListWithContacts, DialJob, DialSummary, JobId, JobRecord, NewCallRecord, NewUser, User,
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Contact repository, scoped by owning user
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Find a contact owned by `owner`
    async fn find_by_id(&self, owner: i64, id: i64) -> Result<Option<Contact>, AppError>;

    /// List the owner's contacts, oldest first
    async fn list(&self, owner: i64, limit: i64, offset: i64)
        -> Result<(Vec<Contact>, i64), AppError>;

    /// Create a contact; a duplicate (owner, phone number) is `AlreadyExists`
    async fn create(&self, owner: i64, draft: &ContactDraft) -> Result<Contact, AppError>;

    /// Replace a contact's fields; `None` when not owned
    async fn update(
        &self,
        owner: i64,
        id: i64,
        draft: &ContactDraft,
    ) -> Result<Option<Contact>, AppError>;

    /// Delete a contact; its call records survive with a null contact
    async fn delete(&self, owner: i64, id: i64) -> Result<bool, AppError>;
}

/// Contact list repository
#[async_trait]
pub trait ContactListRepository: Send + Sync {
    /// Find a list owned by `owner`
    async fn find_by_id(&self, owner: i64, id: i64) -> Result<Option<ContactList>, AppError>;

    /// Load a list with its members in enumeration order, regardless of owner
    async fn find_with_contacts(&self, id: i64)
        -> Result<Option<ContactListWithContacts>, AppError>;

    async fn list(&self, owner: i64, limit: i64, offset: i64)
        -> Result<(Vec<ContactList>, i64), AppError>;

    async fn create(&self, owner: i64, name: &str) -> Result<ContactList, AppError>;

    async fn rename(&self, owner: i64, id: i64, name: &str)
        -> Result<Option<ContactList>, AppError>;

    /// Delete a list; member contacts are untouched
    async fn delete(&self, owner: i64, id: i64) -> Result<bool, AppError>;

    /// Add a member; adding an existing member is a no-op
    async fn add_contact(&self, list_id: i64, contact_id: i64) -> Result<(), AppError>;

    async fn remove_contact(&self, list_id: i64, contact_id: i64) -> Result<bool, AppError>;
}

/// Call record store
#[async_trait]
pub trait CallRecordRepository: Send + Sync {
    /// Insert all records, skipping any whose external id already exists.
    /// Returns the number of rows actually written.
    async fn bulk_insert(&self, records: &[NewCallRecord]) -> Result<u64, AppError>;

    async fn find_by_external_id(&self, external_id: &str)
        -> Result<Option<CallRecord>, AppError>;

    /// Set status (and duration when given) on an existing record.
    /// Fails with `NotFound` when no record has that external id.
    async fn update_status(
        &self,
        external_id: &str,
        status: &str,
        duration: Option<i32>,
    ) -> Result<CallRecord, AppError>;

    /// Owner's records, newest first, with optional case-insensitive filters
    /// on the contact's first name and the dialed number
    async fn list_filtered(
        &self,
        owner: i64,
        contact_name: Option<&str>,
        phone_number: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CallRecordDetail>, i64), AppError>;

    async fn find_by_id(&self, owner: i64, id: i64) -> Result<Option<CallRecordDetail>, AppError>;

    async fn delete(&self, owner: i64, id: i64) -> Result<bool, AppError>;
}

/// User repository trait with specialized methods
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Register a user; a taken username is `AlreadyExists`
    async fn create(&self, user: &NewUser) -> Result<User, AppError>;

    /// Update last login timestamp
    async fn update_last_login(&self, id: i64) -> Result<(), AppError>;
}

/// Outbound call provider
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait TelephonyGateway: Send + Sync {
    /// Ask the provider to call `destination` and speak `message`.
    ///
    /// Fails with `GatewayError::Configuration` when no caller id is
    /// configured; every other error concerns this one destination only.
    async fn place_call(&self, destination: &str, message: &str)
        -> Result<CallOutcome, GatewayError>;
}

/// Executes one dial job; implemented by the orchestrator
#[async_trait]
pub trait DialRunner: Send + Sync {
    async fn run(&self, job: &DialJob) -> Result<DialSummary, AppError>;
}

/// Background submission of dial jobs
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job and return its identifier without waiting for it
    async fn submit(&self, job: DialJob) -> Result<JobId, AppError>;

    async fn status(&self, id: &JobId) -> Result<Option<JobRecord>, AppError>;

    /// Most recent job ids submitted by `user_id`, newest first
    async fn recent(&self, user_id: i64, limit: usize) -> Result<Vec<JobId>, AppError>;
}

/// Persistence of job status entries
#[async_trait]
pub trait JobStatusStore: Send + Sync {
    /// Store a newly submitted job and index it under its requester
    async fn insert(&self, record: &JobRecord) -> Result<(), AppError>;

    /// Overwrite an existing job's entry
    async fn update(&self, record: &JobRecord) -> Result<(), AppError>;

    async fn get(&self, id: &JobId) -> Result<Option<JobRecord>, AppError>;

    async fn recent(&self, user_id: i64, limit: usize) -> Result<Vec<JobId>, AppError>;
}

/// Cache service trait
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Get value from cache
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError>;

    /// Set value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), AppError>;

    /// Push to the head of a list
    async fn lpush(&self, key: &str, value: &str) -> Result<i64, AppError>;

    /// Keep only the first `len` elements of a list
    async fn ltrim(&self, key: &str, len: usize) -> Result<(), AppError>;

    /// Read the first `len` elements of a list
    async fn lrange(&self, key: &str, len: usize) -> Result<Vec<String>, AppError>;

    /// Set expiration
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, AppError>;
}

/// Pagination parameters
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub const DEFAULT_PER_PAGE: i64 = 20;
    pub const MAX_PER_PAGE: i64 = 100;

    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(total, pagination.page, pagination.per_page),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}
