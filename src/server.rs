//! HTTP server initialization and runtime setup.
//!
//! Handles store selection, cache setup, worker spawning, and Axum server lifecycle.

use crate::application::services::{ClickMode, CodePolicy};
use crate::config::{ClickRecording, Config, StorageBackend};
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::UrlRepository;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{MemoryUrlRepository, PgUrlRepository};
use crate::routes::app_router;
use crate::state::AppState;
use crate::utils::code_generator::RandomCodeGenerator;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long shutdown waits for queued clicks to be written.
const CLICK_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - URL store (PostgreSQL pool plus migrations, or in-memory)
/// - Redis cache (or NullCache fallback)
/// - Background click worker (deferred click mode)
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repository = connect_repository(&config).await?;
    let cache = connect_cache(&config).await;

    let (clicks, worker) = match config.click_mode {
        ClickRecording::Deferred => {
            let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
            let worker = tokio::spawn(run_click_worker(
                click_rx,
                repository.clone(),
                config.click_worker_concurrency,
            ));
            tracing::info!(
                concurrency = config.click_worker_concurrency,
                "Click worker started"
            );
            (ClickMode::Deferred(click_tx), Some(worker))
        }
        ClickRecording::Immediate => {
            tracing::info!("Clicks recorded inline");
            (ClickMode::Immediate, None)
        }
    };

    let state = AppState::new(
        repository,
        cache,
        Arc::new(RandomCodeGenerator::new(config.code_length)),
        CodePolicy {
            max_attempts: config.code_max_attempts,
            retry_jitter_ms: config.code_retry_jitter_ms,
        },
        clicks,
        config.base_url.clone(),
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last click sender; the worker now drains and exits.
    if let Some(worker) = worker {
        if tokio::time::timeout(CLICK_DRAIN_TIMEOUT, worker).await.is_err() {
            tracing::warn!("Click worker did not drain in time, pending clicks lost");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Builds the configured store. PostgreSQL gets a tuned pool and migrations.
pub async fn connect_repository(config: &Config) -> Result<Arc<dyn UrlRepository>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryUrlRepository::new()))
        }
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;

            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
                .idle_timeout(Duration::from_secs(config.db_idle_timeout))
                .max_lifetime(Duration::from_secs(config.db_max_lifetime))
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            Ok(Arc::new(PgUrlRepository::new(Arc::new(pool))))
        }
    }
}

/// Connects Redis if configured. Any failure degrades to [`NullCache`].
pub async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
