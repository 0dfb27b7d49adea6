//! HTTP API request and response types.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::LineUpError;
use crate::protocol::{MessageView, QueueStats, QueueType};
use crate::queue::QueueManager;

/// Shared application state.
pub type AppState = Arc<QueueManager>;

/// Longest long-poll a client may request, in seconds.
pub const MAX_POLL_SECONDS: u64 = 20;

/// Most messages returned by a single get.
pub const MAX_MESSAGES_PER_GET: usize = 100;

/// Add message request.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMessageRequest {
    pub body: String,
    /// Falls back to the queue's default delay.
    #[serde(default)]
    pub delay_seconds: Option<u32>,
    #[serde(default)]
    pub priority: Option<i32>,
}

/// Create queue query parameters.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQueueQuery {
    #[serde(default)]
    pub queue_type: Option<String>,
    #[serde(default)]
    pub security_code: Option<String>,
}

/// List queues query parameters.
#[derive(Deserialize)]
pub struct ListQueuesQuery {
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Get messages query parameters.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMessagesQuery {
    #[serde(default = "default_num_messages")]
    pub num_messages: usize,
    /// Long-poll duration in seconds; 0 returns immediately.
    #[serde(default)]
    pub poll_time: u64,
}

fn default_num_messages() -> usize {
    1
}

/// Generic API response wrapper.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response with an explicit status code.
pub type ApiResult<T> = (StatusCode, Json<ApiResponse<T>>);

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            ok: true,
            data: Some(data),
            error: None,
        })
    }

    pub fn error(msg: impl Into<String>) -> Json<Self> {
        Json(Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        })
    }

    #[inline]
    pub fn ok(data: T) -> ApiResult<T> {
        (StatusCode::OK, Self::success(data))
    }

    #[inline]
    pub fn failure(status: StatusCode, msg: impl Into<String>) -> ApiResult<T> {
        (status, Self::error(msg))
    }

    pub fn from_error(err: &LineUpError) -> ApiResult<T> {
        Self::failure(status_for(err), err.to_string())
    }
}

/// Status code for a directory or validation error.
pub fn status_for(err: &LineUpError) -> StatusCode {
    match err {
        LineUpError::QueueNotFound(_) => StatusCode::NOT_FOUND,
        LineUpError::Unauthorized(_) => StatusCode::FORBIDDEN,
        LineUpError::QueueAlreadyExists(_) => StatusCode::CONFLICT,
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// One message for `numMessages=1`, a list otherwise.
#[derive(Serialize)]
#[serde(untagged)]
pub enum MessagesResponse {
    One(MessageView),
    Many(Vec<MessageView>),
}

/// Queue URL response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueUrlResponse {
    pub queue_url: String,
}

/// Queue stats response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatsResponse {
    pub queue: String,
    pub queue_type: QueueType,
    pub created_at: u64,
    #[serde(flatten)]
    pub stats: QueueStats,
}
