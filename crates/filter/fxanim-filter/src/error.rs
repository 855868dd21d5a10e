//! Error types for filter parameter ingestion.

use fxanim_core::AnimeError;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum FilterError {
    /// Failure inside the animation core (JSON parse, malformed `animated` table).
    #[error(transparent)]
    Anime(#[from] AnimeError),

    /// Filter parameters must be a JSON object.
    #[error("Expected a JSON object for filter parameters, got {found}")]
    NotAnObject { found: &'static str },
}

impl FilterError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Anime(inner) => inner.category(),
            Self::NotAnObject { .. } => "ingestion",
        }
    }
}

pub type Result<T> = core::result::Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_pass_through() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FilterError = AnimeError::from(json_err).into();
        assert_eq!(err.category(), "ingestion");
        assert!(err.to_string().starts_with("Parse error"));
    }
}
