//! Health check HTTP handler.

use std::sync::OnceLock;
use std::time::Instant;

use axum::{extract::State, response::Json};
use serde::Serialize;

use super::types::{ApiResponse, AppState};

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Initialize server start time (call once at startup).
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_ms: u64,
    pub queues: usize,
}

/// Liveness probe. Always 200 while the server is running.
pub async fn health_check(State(qm): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let uptime = START_TIME
        .get()
        .map(|t| t.elapsed().as_millis() as u64)
        .unwrap_or(0);

    let health = HealthResponse {
        status: if qm.is_shutdown() { "shutting_down" } else { "healthy" },
        uptime_ms: uptime,
        queues: qm.queue_count(),
    };
    ApiResponse::success(health)
}
