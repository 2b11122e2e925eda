//! HTTP server initialization and routing

use axum::{
    extract::{Request, State},
    handler::Handler,
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::kb::handle_manager_prompt;
use crate::security::{create_cors_layer, CorsConfig};
use crate::tickets::handle_message;

use super::{health_check, shutdown_signal};

/// `OPTIONS` on a function route answers `ok` with the CORS policy headers.
pub async fn preflight(State(state): State<Arc<AppState>>) -> (HeaderMap, &'static str) {
    let headers = CorsConfig::edge_functions(&state.config.frontend_url).preflight_headers();
    (headers, "ok")
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    info!(
        "{method} {path} -> {} in {}ms",
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = create_cors_layer(&app_state.config.frontend_url);

    Router::new()
        .route(
            ApiUrls::HANDLE_MESSAGE,
            post(handle_message.layer(cors.clone())).options(preflight),
        )
        .route(
            ApiUrls::HANDLE_MANAGER_PROMPT,
            post(handle_manager_prompt.layer(cors)).options(preflight),
        )
        .route(ApiUrls::HEALTH, get(health_check))
        .layer(middleware::from_fn(log_requests))
        .with_state(app_state)
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let host = app_state.config.server.host.clone();
    let port = app_state.config.server.port;
    let app = build_router(app_state);

    let listener = match tokio::net::TcpListener::bind((host.as_str(), port)).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}:{}: {} - is another instance running?",
                host, port, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}:{}", host, port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}
