use anyhow::Context;
use tracing_subscriber::EnvFilter;

use personal_scheduler::{app, config::Config, state::AppState, store::JsonStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "personal_scheduler=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let store = JsonStore::open(&config.db_path)
        .with_context(|| format!("failed to open database {}", config.db_path.display()))?;

    let addr = config.addr();
    let static_dir = config.static_dir.clone();
    let timezone = config.timezone;
    let app = app(AppState::new(store, config));

    // Print the link to the server
    tracing::info!("Server running at http://{addr}");
    tracing::info!("Static files: {} at http://{addr}/", static_dir.display());
    tracing::info!("API base:     http://{addr}/api (default timezone {timezone})");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr} failed"))?;

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
