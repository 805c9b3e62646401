//! HTTP API Layer
//!
//! REST surface over the posting engine. Every document state transition
//! gets a dedicated endpoint; payloads accept camelCase and snake_case keys
//! and are normalized at this boundary so the engine only ever sees its
//! canonical request shapes.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{documents, health, payments};
use crate::middleware::{context_middleware, request_log_middleware};
pub use crate::state::{AppState, MasterData};

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health::health_check));

    let document_routes = Router::new()
        .route("/", post(documents::create_document))
        .route("/:id", get(documents::get_document))
        .route("/:id/send", post(documents::send_document))
        .route("/:id/approve", post(documents::approve_document))
        .route("/:id/reject", post(documents::reject_document))
        .route("/:id/cancel", post(documents::cancel_document))
        .route("/:id/payments", post(payments::record_payment));

    let api_routes = Router::new()
        .nest("/documents", document_routes)
        .layer(axum_middleware::from_fn(request_log_middleware))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            context_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
