//! Upstream success classification

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tri-state outcome of a training run, as judged by the training pipeline.
///
/// The monitor never derives this itself; it only reads what the pipeline
/// wrote and uses it to highlight rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessClass {
    /// The run reached its goal.
    Success,
    /// The run looks promising but did not clearly reach its goal.
    Maybe,
    /// No classification available.
    #[default]
    Unknown,
}

impl SuccessClass {
    /// Interpret the `success` field of an experiment's metadata.
    ///
    /// Accepts `"success"`, `"maybe"` (case-insensitive) or a boolean, where
    /// `true` means success. Everything else, including a missing field or
    /// `false`, is unknown.
    #[must_use]
    pub fn from_metadata(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if s.eq_ignore_ascii_case("success") => Self::Success,
            Some(Value::String(s)) if s.eq_ignore_ascii_case("maybe") => Self::Maybe,
            Some(Value::Bool(true)) => Self::Success,
            _ => Self::Unknown,
        }
    }

    /// CSS class used to highlight the experiment's row on the overview page.
    #[must_use]
    pub const fn row_class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Maybe => "maybe",
            Self::Unknown => "",
        }
    }
}
