//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `POST /api/jobs` - upload a video and start a split job
//! - `GET /api/jobs/{id}` - poll job status
//! - `GET /api/jobs/{id}/download` - fetch the finished archive
//! - `GET /api/health` - health check
//! - `/` - landing page describing the API

pub mod health;
pub mod index;
pub mod jobs;

use crate::models::AppState;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let api_router = Router::new()
        .merge(jobs::router(state))
        .merge(health::router());

    Router::new()
        .merge(api_router)
        .merge(index::router())
        .layer(TraceLayer::new_for_http())
}
