use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use projectree_api::config::ServerConfig;
use projectree_api::engine::positions::{PgPositionStore, PositionBatchUpdater};
use projectree_api::router::build_app_router;
use projectree_api::state::AppState;
use projectree_events::{CollabDelivery, NodeNotifier, NoopNotifier};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projectree_api=debug,projectree_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = projectree_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    projectree_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    projectree_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaboration notifier ---
    let notifier = build_notifier(&config);

    // --- Position batches ---
    let positions = PositionBatchUpdater::new(
        Arc::new(PgPositionStore::new(pool.clone())),
        config.positions,
    );
    tracing::info!(
        max_concurrency = config.positions.max_concurrency,
        max_batch_size = config.positions.max_batch_size,
        "Position updater started"
    );

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        notifier,
        positions: positions.clone(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!(
        in_flight = positions.in_flight(),
        "Server stopped accepting connections, draining position batches"
    );
    if positions
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await
    {
        tracing::info!("Position batches drained");
    }

    tracing::info!("Graceful shutdown complete");
}

/// HTTP delivery when a collaboration server is configured, otherwise a no-op.
fn build_notifier(config: &ServerConfig) -> Arc<dyn NodeNotifier> {
    let Some(collab) = config.collab.clone() else {
        tracing::info!("COLLAB_SERVER_URL not set, node notifications disabled");
        return Arc::new(NoopNotifier);
    };

    match CollabDelivery::new(collab) {
        Ok(delivery) => {
            tracing::info!(base_url = %delivery.config().base_url, "Node notifications enabled");
            Arc::new(delivery)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build collaboration client, notifications disabled");
            Arc::new(NoopNotifier)
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
