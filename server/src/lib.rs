//! Web front end for email triage.
//!
//! `GET /` shows the upload form, `POST /` classifies an uploaded email
//! and `POST /enviar` pretends to send the edited reply.

pub mod error;
pub mod handlers;
pub mod page;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use triage_core::MessageProcessor;
use triage_core::TriageConfig;

pub use error::Result;
pub use error::ServerError;

/// Shared state accessible by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<MessageProcessor>,
    pub upload_dir: PathBuf,
    pub show_debug: bool,
}

impl AppState {
    pub fn from_config(config: &TriageConfig) -> Self {
        Self {
            processor: Arc::new(MessageProcessor::new(config.model.clone())),
            upload_dir: config.server.upload_dir.clone(),
            show_debug: config.server.show_debug,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::upload))
        .route("/enviar", post(handlers::send_reply))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl+C.
pub async fn serve(config: &TriageConfig) -> Result<()> {
    let addr = config.server.bind_addr()?;
    let state = AppState::from_config(config);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        model_enabled = state.processor.model_enabled(),
        upload_dir = %state.upload_dir.display(),
        "triage server listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("triage server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
