//! Main Gateway implementation
//!
//! Serves the document over `/backend`, the editor, and a static directory,
//! and runs the persistence loop next to the HTTP server.

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use specpad_core::{Document, Persister, SyncStatus};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{EditorSource, GatewayConfig};
use crate::{assets, browser, cors};
use crate::{GatewayError, Result};

/// Gateway state shared across handlers
pub struct GatewayState {
    pub config: GatewayConfig,
    pub document: Arc<Document>,
    pub sync_status: Arc<SyncStatus>,
    pub shutdown: CancellationToken,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            document: Arc::new(Document::new(config.document_path.clone())),
            sync_status: Arc::new(SyncStatus::new()),
            shutdown: CancellationToken::new(),
            config,
        }
    }
}

/// Main Gateway
pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    /// Create a new gateway with configuration
    pub fn new(config: GatewayConfig) -> Self {
        let state = Arc::new(GatewayState::new(config));
        Self { state }
    }

    /// Get gateway state
    pub fn state(&self) -> Arc<GatewayState> {
        self.state.clone()
    }

    /// Token that stops the server and the persistence loop when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Persister bound to this gateway's document and status
    pub fn persister(&self) -> Persister {
        Persister::new(self.state.document.clone())
            .with_interval(self.state.config.flush_interval())
            .with_status(self.state.sync_status.clone())
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        let static_files = Router::new()
            .nest_service("/static", ServeDir::new(self.state.config.resolved_static_path()))
            .layer(cors::static_cors());

        let router = Router::new()
            .route("/backend", get(Self::handle_fetch).put(Self::handle_replace))
            .route("/health", get(Self::handle_health))
            .route("/status", get(Self::handle_status))
            .merge(static_files);

        let router = match &self.state.config.editor {
            EditorSource::Builtin => router.fallback(Self::handle_bundled),
            EditorSource::Directory(dir) => router.fallback_service(ServeDir::new(dir)),
        };

        router
            .layer(DefaultBodyLimit::disable())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until shutdown
    pub async fn start(&self) -> Result<()> {
        self.state.config.validate()?;
        let addr = self.state.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown
    ///
    /// The document is loaded before the first request is accepted. If the
    /// load fails the server still runs, but nothing is written back to disk.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let persister = self.persister();
        let shutdown = self.state.shutdown.clone();
        // stopped only once the server has drained in-flight requests
        let sync_stop = CancellationToken::new();

        let loaded = persister.open().await;
        let sync = match loaded {
            Ok(_) => Some(tokio::spawn(persister.flush_loop(sync_stop.clone()))),
            Err(e) => {
                tracing::error!("{}; edits will not be saved", e);
                None
            }
        };

        tracing::info!(
            "specpad serving {} on {}",
            self.state.document.path().display(),
            local_addr
        );

        if self.state.config.open_browser {
            tokio::spawn(browser::open(browser::editor_url(local_addr.port())));
        }

        let router = self.build_router();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(GatewayError::Io);

        sync_stop.cancel();
        if let Some(sync) = sync {
            sync.await
                .map_err(|e| GatewayError::Internal(e.to_string()))??;
        }

        served
    }

    /// Shutdown the gateway
    pub fn shutdown(&self) {
        self.state.shutdown.cancel();
        tracing::info!("Gateway shutdown initiated");
    }

    // HTTP handlers

    async fn handle_fetch(State(state): State<Arc<GatewayState>>) -> Bytes {
        state.document.read()
    }

    async fn handle_replace(
        State(state): State<Arc<GatewayState>>,
        body: Body,
    ) -> Result<StatusCode> {
        let contents = axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
            let err = GatewayError::BodyRead(e.to_string());
            tracing::error!("{}", err);
            err
        })?;

        tracing::debug!("Document replaced ({} bytes)", contents.len());
        state.document.replace(contents);

        Ok(StatusCode::OK)
    }

    async fn handle_health() -> impl IntoResponse {
        axum::Json(serde_json::json!({
            "status": "healthy",
            "version": crate::VERSION
        }))
    }

    async fn handle_status(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
        let document = &state.document;

        axum::Json(serde_json::json!({
            "version": crate::VERSION,
            "document": {
                "path": document.path().display().to_string(),
                "bytes": document.len(),
                "dirty": document.is_dirty(),
                "revision": document.revision(),
            },
            "sync": state.sync_status.report(),
        }))
    }

    async fn handle_bundled(uri: Uri) -> Result<Response> {
        let asset = assets::bundled(uri.path()).map_err(|e| {
            tracing::debug!("{}", e);
            e
        })?;

        Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response())
    }
}
