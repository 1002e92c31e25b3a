//! Todo audit server - main entry point

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use todo_audit_common::logging::{init_logging, LogConfig};
use tokio::signal;
use tracing::{info, warn};

use todo_audit_server::{
    app::{build_router, AppState},
    audit::{
        AuditQueryService, AuditRecorder, AuditStore, AuditSubscriber, MemoryAuditStore,
        PgAuditStore,
    },
    config::{AuditBackend, Config},
    db,
    features::todos::{PgTodoRepository, TodoService},
    hooks::MutationHooks,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_config = LogConfig::builder()
        .log_file_prefix("todo-audit-server")
        .filter_directives("todo_audit_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting todo audit server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        audit_store = ?config.audit.backend,
        "Configuration loaded"
    );

    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to the primary database")?;

    let audit_store: Arc<dyn AuditStore> = match config.audit.backend {
        AuditBackend::Postgres => {
            let pool = db::create_audit_pool(&config.audit)
                .await
                .context("Failed to connect to the audit database")?;
            let store = PgAuditStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        },
        AuditBackend::Memory => {
            warn!("Audit entries are kept in memory and lost on restart");
            Arc::new(MemoryAuditStore::new())
        },
    };

    // Every committed Todo mutation is forwarded to the audit trail.
    let hooks = MutationHooks::new().with_subscriber(Arc::new(AuditSubscriber::new(
        AuditRecorder::new(Arc::clone(&audit_store)),
    )));

    let repository = PgTodoRepository::new(db_pool.clone(), hooks);
    repository.ensure_schema().await?;

    let state = AppState::new(
        TodoService::new(Arc::new(repository)),
        AuditQueryService::new(audit_store),
    )
    .with_db(db_pool);

    let app = build_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!(timeout_secs, "Waiting for in-flight requests to finish");
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
