//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

const ENV_PREFIX: &str = "AUTODIALER";

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,

    /// Job status lives in process memory when Redis is not configured
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    pub auth: AuthConfig,

    #[serde(default)]
    pub telephony: TelephonyConfig,

    #[serde(default)]
    pub dialer: DialerConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    30
}

/// Redis configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// How long finished job entries are kept, in seconds
    #[serde(default = "default_job_ttl")]
    pub job_ttl_secs: u64,
}

fn default_job_ttl() -> u64 {
    86_400
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,

    /// JWT token lifetime in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: i64,
}

fn default_jwt_expiration() -> i64 {
    86_400
}

/// Telephony provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelephonyConfig {
    #[serde(default)]
    pub account_sid: String,

    #[serde(default)]
    pub auth_token: String,

    /// Caller id for outbound calls. Dialing fails without it.
    #[serde(default)]
    pub origin_number: Option<String>,

    /// Public URL the provider posts status changes to
    #[serde(default)]
    pub status_callback_url: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Audio played after the spoken message
    #[serde(default = "default_audio_cue_url")]
    pub audio_cue_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_api_base_url() -> String {
    "https://api.twilio.com/2010-04-01".to_string()
}

fn default_voice() -> String {
    "woman".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_audio_cue_url() -> String {
    "https://api.twilio.com/cowbell.mp3".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            origin_number: None,
            status_callback_url: String::new(),
            api_base_url: default_api_base_url(),
            voice: default_voice(),
            language: default_language(),
            audio_cue_url: default_audio_cue_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl TelephonyConfig {
    /// Configured origin number, treating an empty string as absent
    pub fn origin(&self) -> Option<&str> {
        self.origin_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Dial job execution settings
#[derive(Debug, Deserialize, Clone)]
pub struct DialerConfig {
    /// Dial jobs run concurrently
    #[serde(default = "default_dialer_workers")]
    pub workers: usize,

    /// Jobs waiting for a worker before submission is refused
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Provider requests in flight per job; 1 dials sequentially
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    /// Rows per INSERT statement during the bulk commit
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,

    /// Job ids returned by the recent jobs listing by default
    #[serde(default = "default_recent_jobs_limit")]
    pub recent_jobs_limit: usize,

    /// Seconds to let queued and running jobs finish on shutdown
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_dialer_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_max_concurrent_calls() -> usize {
    1
}

fn default_insert_batch_size() -> usize {
    5000
}

fn default_recent_jobs_limit() -> usize {
    5
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            workers: default_dialer_workers(),
            queue_capacity: default_queue_capacity(),
            max_concurrent_calls: default_max_concurrent_calls(),
            insert_batch_size: default_insert_batch_size(),
            recent_jobs_limit: default_recent_jobs_limit(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("auth.jwt_expiration_secs", 86_400)?
            .set_default("dialer.workers", 4)?
            .set_default("dialer.queue_capacity", 1000)?
            .set_default("dialer.max_concurrent_calls", 1)?
            .set_default("dialer.insert_batch_size", 5000)?
            .set_default("dialer.recent_jobs_limit", 5)?
            .set_default("dialer.shutdown_grace_secs", 30)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // e.g. AUTODIALER__TELEPHONY__ORIGIN_NUMBER
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
