//! HTTP surface.
//!
//! ```text
//! POST /api/images/upload               multipart field `image`
//! GET  /api/images/download/{filename}  attachment, deleted after transfer
//! POST /api/images/resize               { filename, width, height }
//! POST /api/images/compress             { filename, targetSizeKB } | { filename, quality }
//! POST /api/images/rotate               { filename, angle }
//! POST /api/images/crop                 { filename, width, height, left, top }
//! GET  /uploads/{filename}              static files from the upload dir
//! ```

pub mod error;
pub mod handlers;

use crate::compress::CompressionSettings;
use crate::config::ServiceConfig;
use crate::store::ImageStore;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use error::ServeError;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: ImageStore,
    pub compression: CompressionSettings,
    /// Upper bound on resize output, in pixels.
    pub max_output_pixels: u64,
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let static_files = ServeDir::new(state.store.root());

    let api = Router::new()
        .route("/upload", post(handlers::upload_image))
        .route("/download/{filename}", get(handlers::download_image))
        .route("/resize", post(handlers::resize_image))
        .route("/compress", post(handlers::compress_image))
        .route("/rotate", post(handlers::rotate_image))
        .route("/crop", post(handlers::crop_image));

    Router::new()
        .nest("/api/images", api)
        .nest_service("/uploads", static_files)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the store and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &ServiceConfig) -> Result<(), ServeError> {
    let store = ImageStore::open(&config.storage.upload_dir)?;
    info!(upload_dir = %store.root().display(), "image store ready");

    let state = AppState {
        store,
        compression: config.compression,
        max_output_pixels: config.server.max_output_pixels,
    };
    let app = router(state, config.server.max_upload_bytes);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "imgpress listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
