//! HTTP transport: upload PDFs, download Word documents.
//!
//! Routes:
//! - `GET /`             : upload page driving the JSON API
//! - `GET /health`       : liveness, returns `ok`
//! - `POST /convert`     : one PDF (`pdfFile`, optional `start_page` /
//!   `end_page`) → `.docx` attachment
//! - `POST /convert/batch`: several PDFs (`pdfFiles`) → `converted_files.zip`
//! - `POST /api/convert` : either shape → JSON report with base64 payloads
//!
//! Each request gets its own temporary workspace, released once the
//! response body has been built.

mod error;
mod handlers;
mod page;
mod routes;
mod upload;

pub use error::ApiError;
pub use handlers::{ApiArchive, ApiDocument, ApiReport};
pub use routes::create_router;

use crate::config::ServerConfig;
use crate::convert::Converter;
use std::sync::Arc;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
}

impl AppState {
    pub fn new(converter: Arc<Converter>) -> Self {
        Self { converter }
    }
}

/// Bind `config.host:config.port` and serve until the process is stopped.
pub async fn serve(converter: Arc<Converter>, config: &ServerConfig) -> std::io::Result<()> {
    let app = create_router(AppState::new(converter), config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
