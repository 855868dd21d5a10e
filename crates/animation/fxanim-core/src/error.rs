//! Error types for the animation core.
//!
//! Effect configuration is ingested tolerantly and never fails; these errors
//! cover malformed JSON envelopes and registry misuse only.

use crate::ids::AnimatorId;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum AnimeError {
    /// The input was not valid JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A JSON value of the wrong kind was supplied where an object is required.
    #[error("Expected a JSON object for {what}, got {found}")]
    NotAnObject {
        what: &'static str,
        found: &'static str,
    },

    /// No animator with this id is registered.
    #[error("Animator not registered: {id}")]
    UnknownAnimator { id: AnimatorId },

    /// The animator is registered but the host has dropped its puppet.
    #[error("Puppet of animator {id} was dropped")]
    PuppetDropped { id: AnimatorId },
}

impl AnimeError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse(_) | Self::NotAnObject { .. } => "ingestion",
            Self::UnknownAnimator { .. } | Self::PuppetDropped { .. } => "registry",
        }
    }
}

pub type Result<T> = core::result::Result<T, AnimeError>;

/// Name of a JSON value's kind, for error messages.
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
