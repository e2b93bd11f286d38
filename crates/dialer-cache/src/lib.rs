//! Redis caching layer for the autodialer
//!
//! Provides the Redis-backed `CacheService` and a dial job status store built
//! on top of it, so that job status survives process restarts and is shared
//! between API instances.
//!
//! # Features
//!
//! - Connection pooling via Redis ConnectionManager
//! - Automatic serialization/deserialization using serde_json
//! - TTL support for cache entries
//! - Capped per-user lists of recent job ids
//!
//! # Example
//!
//! ```no_run
//! use dialer_cache::RedisCache;
//! use dialer_core::traits::CacheService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = RedisCache::new("redis://127.0.0.1:6379").await?;
//!
//!     cache.set("my_key", &"my_value", 60).await?;
//!
//!     let value: Option<String> = cache.get("my_key").await?;
//!     assert_eq!(value, Some("my_value".to_string()));
//!
//!     Ok(())
//! }
//! ```

pub mod job_store;
pub mod keys;

pub use job_store::RedisJobStatusStore;

use async_trait::async_trait;
use dialer_core::error::AppError;
use dialer_core::traits::CacheService;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, warn};

/// Redis cache implementation with connection pooling
///
/// Wraps a Redis ConnectionManager to provide efficient, multiplexed access
/// to Redis. All operations are async and return Results with AppError.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Create a new Redis cache instance
    ///
    /// # Errors
    ///
    /// Returns `AppError::CacheConnection` if the connection fails
    pub async fn new(url: &str) -> Result<Self, AppError> {
        debug!("Connecting to Redis at {}", url);

        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            AppError::CacheConnection(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to establish Redis connection: {}", e);
            AppError::CacheConnection(format!("Connection failed: {}", e))
        })?;

        debug!("Redis connection established successfully");
        Ok(Self { manager })
    }

    /// Ping the Redis server to check connectivity
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis ping failed: {}", e);
                AppError::Cache(format!("Ping failed: {}", e))
            })?;
        Ok(())
    }

    /// Flush all keys from the current database
    #[cfg(test)]
    pub async fn flush_db(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Cache(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    /// Convert RedisError to AppError
    fn map_redis_error(err: RedisError) -> AppError {
        match err.kind() {
            redis::ErrorKind::IoError => {
                error!("Redis I/O error: {}", err);
                AppError::CacheConnection(format!("I/O error: {}", err))
            }
            redis::ErrorKind::TypeError => {
                warn!("Redis type error: {}", err);
                AppError::Cache(format!("Type mismatch: {}", err))
            }
            _ => {
                error!("Redis error: {}", err);
                AppError::Cache(err.to_string())
            }
        }
    }
}

/// Inclusive stop index for the first `len` list elements
fn list_stop(len: usize) -> isize {
    len.saturating_sub(1).min(isize::MAX as usize) as isize
}

#[async_trait]
impl CacheService for RedisCache {
    /// Get a value from cache and deserialize it
    ///
    /// Returns `Ok(None)` when the key doesn't exist.
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        debug!("GET {}", key);
        let mut conn = self.manager.clone();

        let result: Option<String> = conn.get(key).await.map_err(Self::map_redis_error)?;

        match result {
            Some(json) => {
                let value = serde_json::from_str::<T>(&json).map_err(|e| {
                    error!("Failed to deserialize value for key {}: {}", key, e);
                    AppError::Serialization(format!("Deserialization failed: {}", e))
                })?;
                debug!("Cache HIT: {}", key);
                Ok(Some(value))
            }
            None => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), AppError> {
        debug!("SET {} (TTL: {}s)", key, ttl_secs);
        let mut conn = self.manager.clone();

        let json = serde_json::to_string(value).map_err(|e| {
            error!("Failed to serialize value for key {}: {}", key, e);
            AppError::Serialization(format!("Serialization failed: {}", e))
        })?;

        let _: () = conn
            .set_ex(key, json, ttl_secs)
            .await
            .map_err(Self::map_redis_error)?;

        Ok(())
    }

    /// Push a value to the head of a list, returning the new length
    async fn lpush(&self, key: &str, value: &str) -> Result<i64, AppError> {
        debug!("LPUSH {} {}", key, value);
        let mut conn = self.manager.clone();

        let len: i64 = conn
            .lpush(key, value)
            .await
            .map_err(Self::map_redis_error)?;

        Ok(len)
    }

    async fn ltrim(&self, key: &str, len: usize) -> Result<(), AppError> {
        debug!("LTRIM {} 0 {}", key, list_stop(len));
        let mut conn = self.manager.clone();

        let _: () = conn
            .ltrim(key, 0, list_stop(len))
            .await
            .map_err(Self::map_redis_error)?;

        Ok(())
    }

    async fn lrange(&self, key: &str, len: usize) -> Result<Vec<String>, AppError> {
        if len == 0 {
            return Ok(Vec::new());
        }

        debug!("LRANGE {} 0 {}", key, list_stop(len));
        let mut conn = self.manager.clone();

        let values: Vec<String> = conn
            .lrange(key, 0, list_stop(len))
            .await
            .map_err(Self::map_redis_error)?;

        Ok(values)
    }

    /// `Ok(false)` if the key doesn't exist
    async fn expire(&self, key: &str, ttl_secs: u64) -> Result<bool, AppError> {
        debug!("EXPIRE {} {}", key, ttl_secs);
        let mut conn = self.manager.clone();

        let result: bool = conn
            .expire(key, ttl_secs as i64)
            .await
            .map_err(Self::map_redis_error)?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        id: i32,
        name: String,
    }

    async fn setup_cache() -> RedisCache {
        let cache = RedisCache::new("redis://127.0.0.1:6379")
            .await
            .expect("Failed to connect to Redis");
        cache.flush_db().await.expect("Failed to flush DB");
        cache
    }

    #[test]
    fn test_list_stop() {
        assert_eq!(list_stop(5), 4);
        assert_eq!(list_stop(1), 0);
        assert_eq!(list_stop(0), 0);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_set_and_get() {
        let cache = setup_cache().await;

        let data = TestData {
            id: 1,
            name: "Test".to_string(),
        };

        cache.set("test_key", &data, 60).await.unwrap();

        let result: Option<TestData> = cache.get("test_key").await.unwrap();
        assert_eq!(result, Some(data));

        let missing: Option<TestData> = cache.get("missing_key").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_list_operations() {
        let cache = setup_cache().await;

        for id in ["a", "b", "c"] {
            cache.lpush("test_list", id).await.unwrap();
        }
        cache.ltrim("test_list", 2).await.unwrap();

        let values = cache.lrange("test_list", 10).await.unwrap();
        assert_eq!(values, vec!["c".to_string(), "b".to_string()]);
    }
}
