//! HTTP handlers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::WebState;
use crate::experiment::{ExperimentId, ExperimentStore};
use crate::monitor::{ClearOutcome, EvaluationTicket, ExperimentView, Overview};
use crate::{Error, Result};

type Shared<S> = State<Arc<WebState<S>>>;

/// Body of every single-experiment mutation.
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    /// Target experiment.
    pub id: ExperimentId,
}

fn id_from_body(payload: std::result::Result<Json<IdRequest>, JsonRejection>) -> Result<ExperimentId> {
    payload
        .map(|Json(request)| request.id)
        .map_err(|rejection| Error::Validation(rejection.body_text()))
}

/// Content type for an artifact, by file extension.
#[must_use]
pub fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "json" => "application/json",
        "txt" | "log" | "csv" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

pub(super) async fn overview_page<S: ExperimentStore>(State(state): Shared<S>) -> Result<Html<String>> {
    let overview = state.monitor.list_experiments().await?;
    Ok(Html(state.pages.overview(&overview)?))
}

pub(super) async fn experiment_page<S: ExperimentStore>(
    State(state): Shared<S>,
    Path(id): Path<String>,
) -> Result<Html<String>> {
    let view = state.monitor.experiment_detail(id.parse()?).await?;
    Ok(Html(state.pages.experiment(&view)?))
}

pub(super) async fn artifact<S: ExperimentStore>(
    State(state): Shared<S>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response> {
    let bytes = state.monitor.store().read_artifact(id.parse()?, &name).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&name))], bytes).into_response())
}

pub(super) async fn list_json<S: ExperimentStore>(State(state): Shared<S>) -> Result<Json<Overview>> {
    Ok(Json(state.monitor.list_experiments().await?))
}

pub(super) async fn detail_json<S: ExperimentStore>(
    State(state): Shared<S>,
    Path(id): Path<String>,
) -> Result<Json<ExperimentView>> {
    Ok(Json(state.monitor.experiment_detail(id.parse()?).await?))
}

pub(super) async fn bookmark<S: ExperimentStore>(
    State(state): Shared<S>,
    payload: std::result::Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let bookmark = state.monitor.bookmark(id_from_body(payload)?).await?;
    Ok(Json(json!({ "bookmark": bookmark })))
}

pub(super) async fn delete_experiment<S: ExperimentStore>(
    State(state): Shared<S>,
    payload: std::result::Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    state.monitor.delete(id_from_body(payload)?).await?;
    Ok(Json(json!({})))
}

pub(super) async fn clear_all_empty<S: ExperimentStore>(
    State(state): Shared<S>,
) -> Result<Json<ClearOutcome>> {
    Ok(Json(state.monitor.clear_all_empty().await?))
}

pub(super) async fn clear_all_short<S: ExperimentStore>(
    State(state): Shared<S>,
) -> Result<Json<ClearOutcome>> {
    Ok(Json(state.monitor.clear_all_short().await?))
}

pub(super) async fn evaluate<S: ExperimentStore>(
    State(state): Shared<S>,
    payload: std::result::Result<Json<IdRequest>, JsonRejection>,
) -> Result<Json<EvaluationTicket>> {
    Ok(Json(state.monitor.evaluate(id_from_body(payload)?).await?))
}

pub(super) async fn health<S: ExperimentStore>(State(state): Shared<S>) -> Result<Json<Value>> {
    let experiments = state.monitor.store().list().await?.len();
    Ok(Json(json!({
        "status": "ok",
        "experiments": experiments,
    })))
}
