//! Redis-backed dial job status store
//!
//! Each job is one JSON value under `dial_job:{id}` with a TTL; a capped
//! `dial_jobs:user:{id}` list indexes job ids per requester, newest first.

use crate::keys;
use async_trait::async_trait;
use dialer_core::{
    models::{JobId, JobRecord},
    traits::{CacheService, JobStatusStore},
    AppResult,
};
use tracing::instrument;

/// Job status store over any [`CacheService`]
pub struct RedisJobStatusStore<C> {
    cache: C,
    ttl_secs: u64,
}

impl<C: CacheService> RedisJobStatusStore<C> {
    pub fn new(cache: C, ttl_secs: u64) -> Self {
        Self { cache, ttl_secs }
    }
}

#[async_trait]
impl<C: CacheService> JobStatusStore for RedisJobStatusStore<C> {
    #[instrument(skip(self, record), fields(job_id = %record.id))]
    async fn insert(&self, record: &JobRecord) -> AppResult<()> {
        self.cache
            .set(&keys::dial_job_key(record.id.as_str()), record, self.ttl_secs)
            .await?;

        let index = keys::user_jobs_key(record.job.requested_by);
        self.cache.lpush(&index, record.id.as_str()).await?;
        self.cache.ltrim(&index, keys::USER_JOBS_MAX_LEN).await?;
        self.cache.expire(&index, self.ttl_secs).await?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(job_id = %record.id))]
    async fn update(&self, record: &JobRecord) -> AppResult<()> {
        self.cache
            .set(&keys::dial_job_key(record.id.as_str()), record, self.ttl_secs)
            .await
    }

    async fn get(&self, id: &JobId) -> AppResult<Option<JobRecord>> {
        self.cache.get(&keys::dial_job_key(id.as_str())).await
    }

    async fn recent(&self, user_id: i64, limit: usize) -> AppResult<Vec<JobId>> {
        let ids = self
            .cache
            .lrange(&keys::user_jobs_key(user_id), limit)
            .await?;
        Ok(ids.into_iter().map(JobId::from).collect())
    }
}
