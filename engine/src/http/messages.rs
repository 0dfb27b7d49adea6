//! Message HTTP handlers. Every route is scoped by security code and queue.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::error;

use crate::protocol::{MessageView, DEFAULT_PRIORITY};

use super::types::{
    AddMessageRequest, ApiResponse, ApiResult, AppState, GetMessagesQuery, MessagesResponse,
    QueueStatsResponse, MAX_MESSAGES_PER_GET, MAX_POLL_SECONDS,
};

/// Add a message. `data` is `null` when the queue absorbed it as a duplicate.
pub async fn add_message(
    State(qm): State<AppState>,
    Path((code, queue)): Path<(String, String)>,
    Json(req): Json<AddMessageRequest>,
) -> ApiResult<Option<MessageView>> {
    let named = match qm.get_queue(&queue, &code) {
        Ok(named) => named,
        Err(e) => return ApiResponse::from_error(&e),
    };

    let delay_seconds = req.delay_seconds.unwrap_or(named.options().delay_seconds);
    let priority = req.priority.unwrap_or(DEFAULT_PRIORITY);
    match named.add_message(&req.body, delay_seconds, priority) {
        Ok(message) => ApiResponse::ok(message.map(|m| m.view())),
        Err(e) => ApiResponse::from_error(&e),
    }
}

/// Get up to `numMessages`, long-polling up to `pollTime` seconds for the
/// first one.
pub async fn get_messages(
    State(qm): State<AppState>,
    Path((code, queue)): Path<(String, String)>,
    Query(params): Query<GetMessagesQuery>,
) -> ApiResult<MessagesResponse> {
    let named = match qm.get_queue(&queue, &code) {
        Ok(named) => named,
        Err(e) => return ApiResponse::from_error(&e),
    };

    let wanted = params.num_messages.clamp(1, MAX_MESSAGES_PER_GET);
    let poll_time = Duration::from_secs(params.poll_time.min(MAX_POLL_SECONDS));

    let first = if poll_time.is_zero() {
        named.get_message(Duration::ZERO)
    } else {
        let waiting = named.clone();
        match tokio::task::spawn_blocking(move || waiting.get_message(poll_time)).await {
            Ok(message) => message,
            Err(e) => {
                error!(queue = %queue, error = %e, "Blocking get failed");
                return ApiResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, "get failed");
            }
        }
    };

    let Some(first) = first else {
        return ApiResponse::failure(StatusCode::NOT_FOUND, "no messages available");
    };

    if wanted == 1 {
        return ApiResponse::ok(MessagesResponse::One(first.view()));
    }

    let mut messages = vec![first.view()];
    messages.extend(named.get_messages(wanted - 1).iter().map(|m| m.view()));
    ApiResponse::ok(MessagesResponse::Many(messages))
}

/// Delete a queued message by id.
pub async fn delete_message(
    State(qm): State<AppState>,
    Path((code, queue, id)): Path<(String, String, u64)>,
) -> ApiResult<()> {
    let named = match qm.get_queue(&queue, &code) {
        Ok(named) => named,
        Err(e) => return ApiResponse::from_error(&e),
    };

    if named.delete_message(id) {
        ApiResponse::ok(())
    } else {
        ApiResponse::failure(StatusCode::NOT_FOUND, format!("message not found: {}", id))
    }
}

/// Queue counters.
pub async fn queue_stats(
    State(qm): State<AppState>,
    Path((code, queue)): Path<(String, String)>,
) -> ApiResult<QueueStatsResponse> {
    match qm.get_queue(&queue, &code) {
        Ok(named) => ApiResponse::ok(QueueStatsResponse {
            queue: named.name().to_string(),
            queue_type: named.queue_type(),
            created_at: named.created_at(),
            stats: named.stats(),
        }),
        Err(e) => ApiResponse::from_error(&e),
    }
}

/// Drop every queued message.
pub async fn clear_queue(
    State(qm): State<AppState>,
    Path((code, queue)): Path<(String, String)>,
) -> ApiResult<()> {
    match qm.get_queue(&queue, &code) {
        Ok(named) => {
            named.clear();
            ApiResponse::ok(())
        }
        Err(e) => ApiResponse::from_error(&e),
    }
}
