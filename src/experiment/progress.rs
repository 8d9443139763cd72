//! Training progress written by the pipeline next to each experiment

use serde::{Deserialize, Deserializer, Serialize};

use crate::Result;

/// Non-finite literals the pipeline's JSON writer emits for diverged rewards.
const NON_FINITE: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// Per-iteration training statistics (`progress.json`).
///
/// Only the reward history matters to the monitor: one entry per completed
/// iteration. Episode lengths and entropies in the same file are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgress {
    #[serde(default, deserialize_with = "deserialize_rewards")]
    rewards: Vec<f64>,
}

impl TrainingProgress {
    /// Progress with the given per-iteration mean rewards.
    #[must_use]
    pub const fn new(rewards: Vec<f64>) -> Self {
        Self { rewards }
    }

    /// Parse a `progress.json` file.
    ///
    /// Accepts the bare `NaN`, `Infinity` and `-Infinity` tokens that are
    /// not valid JSON but appear whenever a reward diverged.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the content is not a progress object,
    /// e.g. because the file is only partially written.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(&quote_non_finite(bytes))?)
    }

    /// Per-iteration mean rewards, oldest first.
    #[must_use]
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Number of completed iterations.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.rewards.len() as u64
    }

    /// Best reward seen so far, ignoring NaN entries.
    #[must_use]
    pub fn max_reward(&self) -> Option<f64> {
        self.rewards
            .iter()
            .copied()
            .filter(|r| !r.is_nan())
            .reduce(f64::max)
    }
}

/// Turn bare non-finite tokens outside string literals into quoted strings.
fn quote_non_finite(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = input;

    while let Some((&byte, tail)) = rest.split_first() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
        } else if byte == b'"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE.iter().find(|t| rest.starts_with(t.as_bytes())) {
            out.push(b'"');
            out.extend_from_slice(token.as_bytes());
            out.push(b'"');
            rest = &rest[token.len()..];
            continue;
        }
        out.push(byte);
        rest = tail;
    }
    out
}

fn deserialize_rewards<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reward {
        Number(f64),
        Literal(String),
        // serde_json writes NaN as null
        Null(()),
    }

    Vec::<Reward>::deserialize(deserializer)?
        .into_iter()
        .map(|reward| match reward {
            Reward::Number(value) => Ok(value),
            Reward::Null(()) => Ok(f64::NAN),
            Reward::Literal(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(serde::de::Error::custom(format!("invalid reward {other:?}"))),
            },
        })
        .collect()
}
