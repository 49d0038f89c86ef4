use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use clinica_core::config::{database_config_from_env_values, store_backend_from_env_value};
use clinica_core::constants::DEFAULT_REST_ADDR;
use clinica_core::store::open_store;
use clinica_core::CoreConfig;

/// Main entry point for the Clinica application
///
/// Starts the REST server with OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `CLINICA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINICA_STORE`: `memory` or `postgres` (default: "memory")
/// - `DATABASE_URL`: PostgreSQL URL, required when `CLINICA_STORE=postgres`
/// - `CLINICA_DB_MAX_CONNECTIONS`: pool size (default: 5)
/// - `CLINICA_DB_ACQUIRE_TIMEOUT_SECS`: pool acquire timeout (default: 5)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, store startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinica=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINICA_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let cfg = resolve_config(|name| std::env::var(name).ok())?;

    tracing::info!("++ Starting Clinica REST on {} ({} store)", rest_addr, cfg.store_backend());

    let store = open_store(&cfg).await?;
    let app = api_rest::router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Clinica REST stopped");
    Ok(())
}

/// Builds the core configuration from environment values supplied by `var`.
fn resolve_config(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<CoreConfig> {
    let store_backend = store_backend_from_env_value(var("CLINICA_STORE"))?;
    let database = database_config_from_env_values(
        var("DATABASE_URL"),
        var("CLINICA_DB_MAX_CONNECTIONS"),
        var("CLINICA_DB_ACQUIRE_TIMEOUT_SECS"),
    )?;
    Ok(CoreConfig::new(store_backend, database)?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
}
