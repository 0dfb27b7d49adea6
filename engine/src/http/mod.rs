//! HTTP API module.
//!
//! REST endpoints for the queue directory and message operations. Message
//! routes carry the queue's security code as the first path segment.

mod health;
mod messages;
mod queues;
mod types;

use axum::{
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use types::{status_for, ApiResponse, AppState};

/// Create CORS layer based on environment configuration.
/// Set CORS_ALLOW_ORIGIN env var for production (comma-separated list of origins).
/// If not set, allows all origins (development mode).
fn create_cors_layer() -> CorsLayer {
    let allowed_origins = std::env::var("CORS_ALLOW_ORIGIN").ok();

    match allowed_origins {
        Some(origins) if !origins.is_empty() && origins != "*" => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        }
        _ => CorsLayer::permissive(),
    }
}

/// Create the HTTP router with all API routes.
pub fn create_router(state: AppState) -> Router {
    let cors = create_cors_layer();
    health::init_start_time();

    Router::new()
        // Directory
        .route("/queues", get(queues::list_queues))
        .route(
            "/queue/{queue}",
            get(queues::get_queue_url)
                .post(queues::create_queue)
                .put(queues::create_queue)
                .delete(queues::delete_queue),
        )
        // Messages
        .route(
            "/messages/{code}/{queue}",
            post(messages::add_message).get(messages::get_messages),
        )
        .route("/messages/{code}/{queue}/stats", get(messages::queue_stats))
        .route("/messages/{code}/{queue}/clear", post(messages::clear_queue))
        .route("/messages/{code}/{queue}/{id}", delete(messages::delete_message))
        // Health
        .route("/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
