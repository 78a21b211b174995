use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidsplit::registry::JobRegistry;
use vidsplit::{cleanup, config::Config, middleware, routes::create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidsplit=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    // Temp storage root must exist before the first upload
    tokio::fs::create_dir_all(&config.storage.upload_root).await?;
    info!(
        upload_root = %config.storage.upload_root.display(),
        "Upload root ready"
    );

    // Create shared state
    let state = AppState {
        registry: JobRegistry::new(),
        config: config.clone(),
    };

    // Reap abandoned jobs in the background
    cleanup::spawn_retention_sweep(
        state.registry.clone(),
        config.storage.upload_root.clone(),
        config.storage.retention_secs,
    );

    // Create router
    let app = middleware::cors::apply_cors(
        create_router(state),
        &config.server.cors_allowed_origins,
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
