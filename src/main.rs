use anyhow::Context;
use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use payment_emulator::app::config::{Config, StoreBackend};
use payment_emulator::handlers::payments;
use payment_emulator::services::PaymentService;
use payment_emulator::store::{InMemoryPaymentStore, PaymentStore, PgPaymentStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!("starting payment emulator on port {}", config.server_port);

    let store: Arc<dyn PaymentStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = connect_postgres(&config).await?;
            sqlx::migrate!()
                .run(&pool)
                .await
                .context("database migration failed")?;
            Arc::new(PgPaymentStore::new(pool))
        }
        StoreBackend::Memory => {
            info!("using in-memory payment store");
            Arc::new(InMemoryPaymentStore::new())
        }
    };

    let service = Arc::new(PaymentService::new(store));

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/payment", post(payments::create_payment))
        .route(
            "/payments/:id/status",
            put(payments::update_status).get(payments::get_status),
        )
        .route("/payments/user", get(payments::get_payments_by_email))
        .route("/payments/user/:id", get(payments::get_payments_by_user))
        .route("/payments/:id", put(payments::cancel_payment))
        .with_state(service);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// Connects to Postgres with a bounded number of retries, so the emulator
/// survives the database coming up slightly later in compose setups.
async fn connect_postgres(config: &Config) -> anyhow::Result<PgPool> {
    let mut attempts = config.db_connect_attempts;

    loop {
        match PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url())
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(err) if attempts > 0 => {
                warn!(error = %err, "postgres not ready, attempts left: {attempts}");
                tokio::time::sleep(Duration::from_secs(config.db_connect_timeout_secs)).await;
                attempts -= 1;
            }
            Err(err) => return Err(err).context("postgres connection failed"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received interrupt, shutting down"),
        _ = terminate => info!("received terminate, shutting down"),
    }
}
