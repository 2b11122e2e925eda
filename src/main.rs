use anyhow::Context;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use deskserver::core::config::AppConfig;
use deskserver::core::shared::state::AppState;
use deskserver::core::shared::utils::{create_conn, run_migrations};
use deskserver::llm::HttpReasoningBackend;
use deskserver::main_module::run_axum_server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!(
        "Starting deskserver {} (backend {}, pool size {})",
        env!("CARGO_PKG_VERSION"),
        config.backend_url,
        config.pool_size
    );

    let pool = create_conn(&config.database_url, config.pool_size)
        .context("Failed to create database pool")?;

    if config.run_migrations {
        if let Err(e) = run_migrations(&pool) {
            error!("Failed to run migrations: {e:#}");
            return Err(e);
        }
    }

    let backend = HttpReasoningBackend::new(
        config.backend_url.clone(),
        config.user_message_timeout,
        config.manager_prompt_timeout,
    );

    let app_state = Arc::new(AppState {
        conn: pool,
        config,
        backend: Arc::new(backend),
    });

    run_axum_server(app_state)
        .await
        .context("HTTP server failed")?;
    Ok(())
}
