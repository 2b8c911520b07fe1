//! Liveness endpoint.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use tracing::info;

#[derive(Clone)]
pub struct HealthState {
    pub developer_name: String,
    pub developer_handle: String,
    pub started_at: DateTime<Utc>,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/", get(liveness)).with_state(state)
}

async fn liveness(State(state): State<HealthState>) -> String {
    format!(
        "bot is up since {} - developer: {} ({})",
        state.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        state.developer_name,
        state.developer_handle,
    )
}

pub async fn serve(state: HealthState, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Health endpoint listening on port {port}");
    axum::serve(listener, router(state)).await
}
