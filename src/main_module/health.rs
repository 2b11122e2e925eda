//! Readiness of the desk service. The functions need the ticket and article
//! tables, so the service only reports healthy when a pooled connection can
//! be checked out and answer a query within a short deadline.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::RunQueryDsl;
use log::{error, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::core::shared::state::AppState;
use crate::core::shared::DbPool;

pub const READINESS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub connections: u32,
    pub idle: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub pool: PoolStatus,
}

fn database_ready(pool: &DbPool, timeout: Duration) -> bool {
    let mut conn = match pool.get_timeout(timeout) {
        Ok(conn) => conn,
        Err(e) => {
            warn!("Database not ready: {e}");
            return false;
        }
    };
    match diesel::sql_query("SELECT 1").execute(&mut *conn) {
        Ok(_) => true,
        Err(e) => {
            warn!("Database readiness query failed: {e}");
            false
        }
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Readiness>) {
    let pool = state.conn.clone();
    // r2d2 checkouts block, so they stay off the async workers.
    let ready = tokio::task::spawn_blocking(move || database_ready(&pool, READINESS_TIMEOUT))
        .await
        .unwrap_or_else(|e| {
            error!("Readiness check did not complete: {e}");
            false
        });

    let pool_state = state.conn.state();
    let (code, status, database) = if ready {
        (StatusCode::OK, "healthy", "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };

    (
        code,
        Json(Readiness {
            status,
            service: "deskserver",
            version: env!("CARGO_PKG_VERSION"),
            database,
            pool: PoolStatus {
                connections: pool_state.connections,
                idle: pool_state.idle_connections,
            },
        }),
    )
}
