// Framework bootstrap for the quiz coordinator runtime.

use crate::domain::Identity;
use crate::frameworks::config::{self, ServerConfig};
use crate::frameworks::db;
use crate::interface_adapters::routes;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Gateway, SessionRegistry};

use std::io::{Error, Result};
use std::sync::Arc;

fn init_runtime() {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, config: ServerConfig) -> Result<()> {
    let address = listener.local_addr()?;
    // Build shared state (pool, registry, gateway) before accepting connections.
    let state = build_state(&config).await?;
    let app = routes::app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    // Read the bind address and service settings from the environment.
    let address = config::http_addr();
    let config = ServerConfig::from_env();

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, config).await
}

async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let db = db::init_pool(&config.database_url, config.database_max_connections)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "database initialization failed"))
        .map_err(Error::other)?;

    // A blank admin identity would make start_quiz unreachable.
    let admin_identity = Identity::parse(&config.admin_identity)
        .map_err(|e| Error::other(format!("invalid admin identity: {e:?}")))?;

    // The quiz starts closed; only the admin toggle opens it.
    let registry = Arc::new(SessionRegistry::new(admin_identity));
    let gateway = Arc::new(Gateway::new(
        registry.clone(),
        config.room_broadcast_capacity,
    ));
    tracing::debug!(
        admin_identity = %registry.admin_identity(),
        enforce_active = config.enforce_active,
        room_broadcast_capacity = config.room_broadcast_capacity,
        "session coordinator configured"
    );

    Ok(AppState {
        db,
        registry,
        gateway,
        enforce_active: config.enforce_active,
    })
}
