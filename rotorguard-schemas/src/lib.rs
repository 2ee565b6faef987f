//! Plant and Unit Profiles
//!
//! ## Overview
//!
//! The detection engine never guesses what a tag measures. Which tags carry
//! shaft speed, what the nominal speed is, which tags form the reconstruction
//! feature vector and what hard limits apply are all declared in a profile,
//! validated once when it is loaded, and resolved into
//! [`UnitRoles`](rotorguard_core::UnitRoles) for the engine.
//!
//! ## Profile Format
//!
//! One JSON document per plant:
//!
//! ```json
//! {
//!   "plant": "north",
//!   "detection": { "candidate": { "min_consecutive_run": 4 } },
//!   "units": [
//!     {
//!       "unit": "K-101",
//!       "nominal_speed": 3600.0,
//!       "tags": [
//!         { "tag": "SI-101", "role": "speed" },
//!         { "tag": "TI-101", "reconstruction": true, "upper_limit": 120.0 },
//!         { "tag": "VI-101", "reconstruction": true, "sigma_override": 3.0 }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `detection` is optional and takes the same shape as
//! [`DetectionConfig`](rotorguard_core::DetectionConfig); missing fields keep
//! their defaults.
//!
//! ## Usage Example
//!
//! ```rust
//! use rotorguard_schemas::{PlantProfile, ProfileRegistry};
//!
//! let json = r#"{
//!     "plant": "north",
//!     "units": [{ "unit": "K-101", "tags": [{ "tag": "SI-101", "role": "speed" }] }]
//! }"#;
//!
//! let registry = ProfileRegistry::new();
//! registry.register_plant(PlantProfile::from_json(json)?)?;
//!
//! let roles = registry.roles("K-101")?;
//! assert!(roles.is_speed_tag("SI-101"));
//! # Ok::<(), rotorguard_schemas::SchemaError>(())
//! ```

#![deny(unsafe_code)]

pub mod profile;
pub mod registry;
pub mod validation;

pub use profile::{PlantProfile, TagProfile, TagRole, UnitProfile};
pub use registry::ProfileRegistry;
pub use validation::{IssueType, ProfileValidator, Severity, ValidationIssue, ValidationReport};

/// Profile-related errors
#[derive(Debug, thiserror_no_std::Error)]
pub enum SchemaError {
    #[error("Failed to parse profile: {0}")]
    ParseError(String),

    #[error("Failed to read profile: {0}")]
    IoError(String),

    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for SchemaError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_parse_errors() {
        let err: SchemaError = serde_json::from_str::<PlantProfile>("{ not json").unwrap_err().into();
        assert!(matches!(err, SchemaError::ParseError(_)));
        assert!(err.to_string().starts_with("Failed to parse profile"));
    }
}
