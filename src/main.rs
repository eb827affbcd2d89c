//! Shared Timers - A live-synchronized shared timer page server
//! 
//! This is the main entry point for the shared-timers application.

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use shared_timers::{
    api::create_router,
    config::Config,
    services::{FileStore, LocaleCatalog, MemoryStore, PageStore, RequestLimits},
    state::AppState,
    tasks::ExpirySweeper,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("shared_timers={},tower_http=info", config.log_level()))
        .init();

    info!("Starting shared-timers server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, retention={}d, heartbeat={}s",
          config.host, config.port, config.retention_days, config.heartbeat_secs);

    let store: Arc<dyn PageStore> = match &config.data_dir {
        Some(dir) => Arc::new(FileStore::open(dir).await?),
        None => {
            info!("No data directory configured, pages are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let locales = match &config.locales_dir {
        Some(dir) => LocaleCatalog::load(dir)?,
        None => LocaleCatalog::builtin(),
    };

    // Create application state
    let state = Arc::new(AppState::new(
        config.settings(),
        store,
        locales,
        RequestLimits::new(config.create_per_minute, config.fetch_per_minute),
    ));

    // Reload pages from storage; /ready reports 503 until this completes
    let startup_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = startup_state.initialize().await {
            error!("Failed to load pages from storage: {}", e);
        }
    });

    let sweeper = ExpirySweeper::spawn(Arc::clone(&state));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /page/new                                - Create a page");
    info!("  GET    /page/:link                              - Fetch a page");
    info!("  POST   /page/:edit_link/timers                  - Add a timer");
    info!("  PUT    /page/:edit_link/settings                - Change name and color");
    info!("  POST   /timer/:edit_link/:n/(start|pause|reset) - Control a timer");
    info!("  POST   /timer/:edit_link/:n/add_time/:seconds   - Add time to a timer");
    info!("  POST   /timer/:edit_link/:n/rename?name=        - Rename a timer");
    info!("  DELETE /timer/:edit_link/:n                     - Delete a timer");
    info!("  WS     /subscribe/:link                         - Live page updates");
    info!("  WS     /time_sync                               - Clock synchronization");
    info!("  GET    /ready, /health                          - Probes");

    // Setup graceful shutdown
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        error!("Server error: {}", e);
    }

    sweeper.stop().await;
    info!("Server shutdown complete");
    Ok(())
}
