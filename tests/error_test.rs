//! Tests for error types

use axum::http::StatusCode;
use experiment_monitor::experiment::ExperimentId;
use experiment_monitor::Error;

#[test]
fn test_not_found_error() {
    let error = Error::NotFound(ExperimentId::new(1_588_341_681));
    let error_str = format!("{error}");
    assert!(error_str.contains("not found"));
    assert!(error_str.contains("1588341681"));
    assert_eq!(error.kind(), "not_found");
    assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn test_artifact_not_found_error() {
    let error = Error::ArtifactNotFound {
        id: ExperimentId::new(5),
        name: "loss_plot.png".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("loss_plot.png"));
    assert_eq!(error.kind(), "not_found");
    assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn test_validation_error() {
    let error = Error::Validation("missing field `id`".to_string());
    assert!(format!("{error}").contains("Invalid request"));
    assert_eq!(error.kind(), "validation");
    assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_evaluation_unavailable_error() {
    let error = Error::EvaluationUnavailable("no evaluation command configured".to_string());
    assert!(format!("{error}").contains("Evaluation unavailable"));
    assert_eq!(error.kind(), "evaluation_unavailable");
    assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("permission denied".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Storage error"));
    assert!(error_str.contains("permission denied"));
    assert_eq!(error.kind(), "storage");
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let error: Error = io_error.into();
    assert!(format!("{error}").contains("IO error"));
    assert_eq!(error.kind(), "storage");
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{ broken").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
    assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_template_and_config_errors() {
    let template = Error::Template("unclosed block".to_string());
    assert_eq!(template.kind(), "template");

    let config = Error::Config("invalid port".to_string());
    assert!(format!("{config}").contains("Configuration error"));
    assert_eq!(config.kind(), "config");
    assert_eq!(config.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_error_debug() {
    let error = Error::NotFound(ExperimentId::new(7));
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("NotFound"));
}
