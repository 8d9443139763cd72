//! HTTP surface built on axum.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | overview page |
//! | `GET /experiment/{id}` | detail page |
//! | `GET /experiments/{id}/{file}` | artifact bytes |
//! | `POST /bookmark` | toggle bookmark, body `{id}` |
//! | `POST /delete_experiment` | delete, body `{id}` |
//! | `GET /clear_all_empty` | bulk delete empty experiments |
//! | `GET /clear_all_short` | bulk delete short experiments |
//! | `POST /evaluate` | request an evaluation, body `{id}` |
//! | `GET /api/experiments[/{id}]` | overview / detail as JSON |
//! | `GET /health` | liveness |
//!
//! Failed requests answer with `{"kind": ..., "message": ...}`.

mod pages;
mod routes;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::experiment::ExperimentStore;
use crate::monitor::Monitor;
use crate::{Error, Result};

pub use pages::Pages;
pub use routes::{content_type_for, IdRequest};

/// State shared by every handler.
pub struct WebState<S> {
    monitor: Monitor<S>,
    pages: Pages,
}

impl<S: ExperimentStore> WebState<S> {
    /// Wrap a monitor, registering the page templates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if a template does not parse.
    pub fn new(monitor: Monitor<S>) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            monitor,
            pages: Pages::new()?,
        }))
    }

    /// The wrapped monitor.
    pub const fn monitor(&self) -> &Monitor<S> {
        &self.monitor
    }
}

/// Build the router for the monitor's pages and JSON API.
pub fn router<S: ExperimentStore + 'static>(state: Arc<WebState<S>>) -> Router {
    Router::new()
        .route("/", get(routes::overview_page::<S>))
        .route("/experiment/{id}", get(routes::experiment_page::<S>))
        .route("/experiments/{id}/{file}", get(routes::artifact::<S>))
        .route("/bookmark", post(routes::bookmark::<S>))
        .route("/delete_experiment", post(routes::delete_experiment::<S>))
        .route("/clear_all_empty", get(routes::clear_all_empty::<S>))
        .route("/clear_all_short", get(routes::clear_all_short::<S>))
        .route("/evaluate", post(routes::evaluate::<S>))
        .route("/api/experiments", get(routes::list_json::<S>))
        .route("/api/experiments/{id}", get(routes::detail_json::<S>))
        .route("/health", get(routes::health::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C, then let in-flight requests finish.
///
/// # Errors
///
/// Returns [`Error::Io`] if the address cannot be bound.
pub async fn serve<S: ExperimentStore + 'static>(state: Arc<WebState<S>>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "experiment monitor listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::ArtifactNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::EvaluationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::StorageError(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Template(_)
            | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "request failed");
        }
        let body = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
