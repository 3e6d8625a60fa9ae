pub mod handlers;
pub mod rest;
pub mod state;
pub mod tracing_init;
pub mod validation;

pub use rest::build_router;
pub use state::AppState;

use noteshare_core::{Config, CoreError, CoreResult, RateLimitPolicy, RateLimiter};
use noteshare_store::{AuditLog, ExpirySweeper, MemoryAuditSink, MemoryNoteBackend, NoteStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// Boots the note API stack: store, audit writer, rate limiter, sweeper,
/// and the HTTP server, then tears them down in order on shutdown.
pub async fn run_server(config: Config) -> CoreResult<()> {
    let config = Arc::new(config);

    let backend = Arc::new(MemoryNoteBackend::new());
    let store = Arc::new(NoteStore::new(backend, config.retention.note_ttl_days));

    let sink = Arc::new(MemoryAuditSink::new());
    let (audit, audit_writer) = AuditLog::spawn(sink);

    let limiter = Arc::new(RateLimiter::new(RateLimitPolicy {
        read_budget: config.rate_limit.read_budget,
        write_budget: config.rate_limit.write_budget,
        window: Duration::from_secs(config.rate_limit.window_seconds),
    }));

    let mut sweeper = ExpirySweeper::new(
        Arc::clone(&store),
        audit.clone(),
        Duration::from_secs(config.sweep.interval_seconds),
        config.retention.tombstone_ttl_days,
    );
    sweeper.start_worker();

    // Limiter window GC rides the sweep cadence; nothing here is latency
    // sensitive.
    let limiter_gc = {
        let limiter = Arc::clone(&limiter);
        let period = Duration::from_secs(config.sweep.interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.purge_stale();
            }
        })
    };

    let state = AppState::new(store, audit.clone(), limiter, Arc::clone(&config));
    let app = rest::build_router(state);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        CoreError::Validation(format!("Invalid bind address '{bind_address}': {e}"))
    })?;

    info!(
        %addr,
        note_ttl_days = config.retention.note_ttl_days,
        tombstone_ttl_days = config.retention.tombstone_ttl_days,
        max_payload_bytes = config.limits.max_payload_bytes,
        sweep_interval_seconds = config.sweep.interval_seconds,
        "Starting noteshare API server"
    );

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| CoreError::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::Internal(format!("Server error: {e}")))?;

    // Orderly teardown: stop the background tasks, then drop every audit
    // handle so the writer drains its buffer and exits.
    sweeper.shutdown().await;
    limiter_gc.abort();
    drop(sweeper);
    drop(audit);
    if audit_writer.await.is_err() {
        tracing::warn!("audit writer did not exit cleanly");
    }

    info!("noteshare API server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM signal, initiating graceful shutdown");
        }
    }
}
