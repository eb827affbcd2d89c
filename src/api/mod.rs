//! HTTP API module
//!
//! This module contains all HTTP and WebSocket endpoint handlers and the
//! request/response structures.

pub mod handlers;
pub mod responses;
pub mod sockets;


use std::sync::Arc;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;
use sockets::{subscribe_handler, time_sync_handler};

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/page/new", post(new_page_handler))
        .route("/page/:link", get(get_page_handler))
        .route("/page/:link/timers", post(create_timer_handler))
        .route("/page/:link/settings", put(page_settings_handler))
        // Timers
        .route("/timer/:edit_link/:number", delete(delete_timer_handler))
        .route("/timer/:edit_link/:number/start", post(start_timer_handler))
        .route("/timer/:edit_link/:number/pause", post(pause_timer_handler))
        .route("/timer/:edit_link/:number/reset", post(reset_timer_handler))
        .route("/timer/:edit_link/:number/rename", post(rename_timer_handler))
        .route("/timer/:edit_link/:number/add_time/:seconds", post(add_time_handler))
        // Push channels
        .route("/subscribe/:link", get(subscribe_handler))
        .route("/time_sync", get(time_sync_handler))
        // Probes
        .route("/ready", get(ready_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
