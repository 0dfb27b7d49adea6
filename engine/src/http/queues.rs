//! Queue directory HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::protocol::{QueueInfo, QueueType};

use super::types::{
    ApiResponse, ApiResult, AppState, CreateQueueQuery, ListQueuesQuery, QueueUrlResponse,
};

/// List queue names, optionally filtered by prefix.
pub async fn list_queues(
    State(qm): State<AppState>,
    Query(params): Query<ListQueuesQuery>,
) -> Json<ApiResponse<Vec<String>>> {
    ApiResponse::success(qm.list_queues(params.prefix.as_deref()))
}

/// Resolve a queue name to its URL.
pub async fn get_queue_url(
    State(qm): State<AppState>,
    Path(queue): Path<String>,
) -> ApiResult<QueueUrlResponse> {
    match qm.queue_url(&queue) {
        Ok(queue_url) => ApiResponse::ok(QueueUrlResponse { queue_url }),
        Err(e) => ApiResponse::from_error(&e),
    }
}

/// Create a queue. Returns the descriptor including the security code.
pub async fn create_queue(
    State(qm): State<AppState>,
    Path(queue): Path<String>,
    Query(params): Query<CreateQueueQuery>,
) -> ApiResult<QueueInfo> {
    let queue_type = match QueueType::from_selector(params.queue_type.as_deref()) {
        Ok(queue_type) => queue_type,
        Err(e) => return ApiResponse::from_error(&e),
    };

    let options = qm.options_for(queue_type);
    match qm.create_queue(&queue, params.security_code.as_deref(), options) {
        Ok(named) => (StatusCode::CREATED, ApiResponse::success(named.info())),
        Err(e) => ApiResponse::from_error(&e),
    }
}

/// Delete a queue, waking any blocked getters.
pub async fn delete_queue(State(qm): State<AppState>, Path(queue): Path<String>) -> ApiResult<()> {
    if qm.delete_queue(&queue) {
        ApiResponse::ok(())
    } else {
        ApiResponse::failure(StatusCode::NOT_FOUND, format!("queue not found: {}", queue))
    }
}
