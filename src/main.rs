//! AutoDialer Backend Server
//!
//! Contacts, contact lists and bulk outbound voice calls. Dial jobs run on an
//! in-process worker pool; the telephony provider reports call progress back
//! through the status webhook.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use dialer_api::AppState;
use dialer_auth::{JwtService, PasswordService};
use dialer_cache::{RedisCache, RedisJobStatusStore};
use dialer_core::traits::JobStatusStore;
use dialer_core::AppConfig;
use dialer_db::{
    create_pool, run_migrations, PgCallRecordRepository, PgContactListRepository,
    PgContactRepository, PgUserRepository,
};
use dialer_services::{DialJobQueue, DialOrchestrator, MemoryJobStatusStore, WebhookReconciler};
use dialer_telephony::TwilioClient;
use std::env;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "autodialer={level},dialer_api={level},dialer_services={level},\
             dialer_telephony={level},dialer_db={level},dialer_cache={level},\
             actix_web=info,sqlx=warn",
            level = log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

fn startup_error(what: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", what, err))
}

/// Job status lives in Redis when configured so it survives restarts
async fn job_status_store(config: &AppConfig) -> Arc<dyn JobStatusStore> {
    let Some(redis) = &config.redis else {
        info!("Redis not configured, keeping dial job status in memory");
        return Arc::new(MemoryJobStatusStore::new());
    };

    match RedisCache::new(&redis.url).await {
        Ok(cache) => {
            info!("Dial job status stored in Redis (ttl {}s)", redis.job_ttl_secs);
            Arc::new(RedisJobStatusStore::new(cache, redis.job_ttl_secs))
        }
        Err(e) => {
            warn!("Redis unavailable ({}), keeping dial job status in memory", e);
            Arc::new(MemoryJobStatusStore::new())
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting AutoDialer v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().map_err(|e| startup_error("Invalid configuration", e))?;

    if config.telephony.origin().is_none() {
        warn!("No origin number configured; dial jobs will fail until one is set");
    }

    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .map_err(|e| startup_error("Failed to create database pool", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;

    info!(
        "Database connection established with {} max connections",
        config.database.max_connections
    );

    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let contacts = Arc::new(PgContactRepository::new(pool.clone()));
    let lists = Arc::new(PgContactListRepository::new(pool.clone()));
    let call_records = Arc::new(PgCallRecordRepository::with_batch_size(
        pool.clone(),
        config.dialer.insert_batch_size,
    ));

    let gateway = TwilioClient::new(&config.telephony)
        .map_err(|e| startup_error("Failed to build telephony client", e))?;

    let orchestrator = DialOrchestrator::new(lists.clone(), call_records.clone(), Arc::new(gateway))
        .with_max_concurrent_calls(config.dialer.max_concurrent_calls);

    let jobs = Arc::new(DialJobQueue::start(
        Arc::new(orchestrator),
        job_status_store(&config).await,
        config.dialer.workers,
        config.dialer.queue_capacity,
    ));

    info!(
        "Dial worker pool started with {} workers (queue capacity {})",
        config.dialer.workers, config.dialer.queue_capacity
    );

    let state = AppState {
        users,
        contacts,
        lists,
        call_records: call_records.clone(),
        jobs: jobs.clone(),
        reconciler: Arc::new(WebhookReconciler::new(call_records)),
        recent_jobs_limit: config.dialer.recent_jobs_limit,
    };

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));
    let password_service = Arc::new(PasswordService::new());

    info!(
        "JWT service configured with {} second token expiration",
        config.auth.jwt_expiration_secs
    );

    let cors_origins = env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    info!("Starting HTTP server on {} with {} workers", bind_addr, workers);

    let server = HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origins: Vec<&str> = cors_origins_inner.split(',').collect();
                if let Ok(origin_str) = origin.to_str() {
                    origins.iter().any(|o| o.trim() == origin_str)
                } else {
                    false
                }
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::COOKIE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .app_data(dialer_api::json_config())
            .app_data(dialer_api::query_config())
            .wrap(cors)
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .service(web::scope("/api/v1").configure(dialer_api::configure))
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await;

    // Calls already placed by a running job are only recorded when it finishes
    info!("HTTP server stopped, draining dial jobs");
    let grace = Duration::from_secs(config.dialer.shutdown_grace_secs);
    if !jobs.shutdown(grace).await {
        warn!("Shutdown grace period elapsed with dial jobs still running");
    }

    server
}
