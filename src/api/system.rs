use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthStatus>, ApiError> {
    state.cache().ping().await?;

    Ok(Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.start_time.elapsed().as_secs(),
    }))
}
