//! Engine errors
//!
//! Only failures that abort a whole unit surface here. Everything scoped to
//! one tag is folded into that tag's status instead.

use rotorguard_core::DetectionError;
use rotorguard_schemas::SchemaError;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage failed for this unit; no report is produced for it
    #[error("Upstream data error for unit {unit}: {reason}")]
    Upstream { unit: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// The scan was cancelled before this unit started
    #[error("Scan cancelled before unit {unit} started")]
    Cancelled { unit: String },
}

impl EngineError {
    pub fn upstream(unit: &str, reason: impl Into<String>) -> Self {
        Self::Upstream {
            unit: unit.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure came from the storage collaborator
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

impl From<DetectionError> for EngineError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::UpstreamData { unit, reason } => Self::upstream(&unit, reason),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<SchemaError> for EngineError {
    fn from(err: SchemaError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_detection_error_keeps_unit() {
        let err: EngineError = DetectionError::UpstreamData {
            unit: "K-7".into(),
            reason: "historian timeout".into(),
        }
        .into();
        assert!(err.is_upstream());
        assert_eq!(err.to_string(), "Upstream data error for unit K-7: historian timeout");
    }

    #[test]
    fn other_errors_are_configuration() {
        let err: EngineError = DetectionError::config("max_workers must be nonzero").into();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
