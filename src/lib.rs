// Vidsplit - split uploaded videos into parts with FFmpeg, serve them back as a zip

pub mod archiver;
pub mod cleanup;
pub mod config;
pub mod executor;
pub mod middleware;
pub mod models;
pub mod planner;
pub mod probe;
pub mod queue;
pub mod registry;
pub mod routes;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
