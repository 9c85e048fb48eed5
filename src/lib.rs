//! Dorado Calendar: a recurring-event engine plus the small JSON backend that
//! stores dated calendar entries and serves the browser UI.

pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

use axum::{
    Router,
    routing::{get, put},
};
use state::AppState;
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub fn app(app_state: AppState, public_dir: &Path) -> Router {
    Router::new()
        .route(
            "/events",
            get(handlers::get_entries).post(handlers::create_entry_handler),
        )
        .route(
            "/events/{id}",
            put(handlers::update_entry_handler).delete(handlers::delete_entry_handler),
        )
        .fallback_service(ServeDir::new(public_dir))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}
