//! Profile Validation
//!
//! Checks a plant profile before any of it reaches the engine. Problems that
//! would make a unit unanalysable are errors; problems that only weaken the
//! analysis (no speed tag, a reconstruction vector too small to fit) are
//! warnings.

use std::collections::HashSet;

use rotorguard_core::config::SecondarySettings;

use crate::profile::{PlantProfile, TagRole, UnitProfile};

/// Validates plant profiles
#[derive(Debug, Clone, Default)]
pub struct ProfileValidator;

impl ProfileValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate every unit of the plant and its detection settings
    pub fn validate(&self, profile: &PlantProfile) -> ValidationReport {
        let mut report = ValidationReport::new();

        if profile.plant.trim().is_empty() {
            report.add_error(ValidationIssue::error(
                IssueType::MissingField,
                Some("plant"),
                "Plant name is empty",
            ));
        }

        if let Err(err) = profile.detection.validate() {
            report.add_error(ValidationIssue::error(
                IssueType::InvalidConfig,
                Some("detection"),
                err.to_string(),
            ));
        }

        if profile.units.is_empty() {
            report.add_warning(ValidationIssue::warning(
                IssueType::MissingField,
                Some("units"),
                format!("Plant '{}' declares no units", profile.plant),
            ));
        }

        let mut seen_units = HashSet::new();
        for unit in &profile.units {
            if !seen_units.insert(unit.unit.as_str()) {
                report.add_error(ValidationIssue::error(
                    IssueType::DuplicateEntry,
                    Some("unit"),
                    format!("Unit '{}' is declared more than once", unit.unit),
                ));
            }
            self.validate_unit(unit, &profile.detection.secondary, &mut report);
        }

        report
    }

    fn validate_unit(&self, unit: &UnitProfile, secondary: &SecondarySettings, report: &mut ValidationReport) {
        if unit.unit.trim().is_empty() {
            report.add_error(ValidationIssue::error(
                IssueType::MissingField,
                Some("unit"),
                "Unit name is empty",
            ));
        }
        if unit.tags.is_empty() {
            report.add_error(ValidationIssue::error(
                IssueType::MissingField,
                Some("tags"),
                format!("Unit '{}' has no tags", unit.unit),
            ));
        }

        if let Some(speed) = unit.nominal_speed {
            if !(speed.is_finite() && speed > 0.0) {
                report.add_error(ValidationIssue::error(
                    IssueType::InvalidValue,
                    Some("nominal_speed"),
                    format!("Unit '{}' nominal speed {} must be positive", unit.unit, speed),
                ));
            }
        }

        let mut seen_tags = HashSet::new();
        for tag in &unit.tags {
            if tag.tag.trim().is_empty() {
                report.add_error(ValidationIssue::error(
                    IssueType::MissingField,
                    Some("tag"),
                    format!("Unit '{}' has a tag without a name", unit.unit),
                ));
                continue;
            }
            if !seen_tags.insert(tag.tag.as_str()) {
                report.add_error(ValidationIssue::error(
                    IssueType::DuplicateEntry,
                    Some("tag"),
                    format!("Tag '{}' appears twice in unit '{}'", tag.tag, unit.unit),
                ));
            }
            if let Err(err) = tag.limits().validate(&tag.tag) {
                report.add_error(ValidationIssue::error(
                    IssueType::InvalidLimits,
                    Some(tag.tag.as_str()),
                    err.to_string(),
                ));
            }
        }

        let speed_tags = unit.tags.iter().filter(|t| t.role == TagRole::Speed).count();
        if speed_tags == 0 {
            report.add_warning(ValidationIssue::warning(
                IssueType::MissingRole,
                Some("role"),
                format!(
                    "Unit '{}' has no speed tag; operating state will be UNKNOWN and analysis always runs",
                    unit.unit
                ),
            ));
        } else if unit.nominal_speed.is_none() {
            report.add_info(ValidationIssue::info(
                IssueType::MissingRole,
                Some("nominal_speed"),
                format!("Unit '{}' has no nominal speed; the absolute low-speed floor applies", unit.unit),
            ));
        }

        let reconstruction = unit.tags.iter().filter(|t| t.reconstruction).count();
        if reconstruction > 0 && reconstruction <= secondary.components.max(1) {
            report.add_warning(ValidationIssue::warning(
                IssueType::ReconstructionCoverage,
                Some("reconstruction"),
                format!(
                    "Unit '{}' has {} reconstruction tags, more than {} are needed; the detector will stay unavailable",
                    unit.unit, reconstruction, secondary.components
                ),
            ));
        }
    }
}

/// Validation report containing all issues found
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Validation errors (must be fixed)
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (should be reviewed)
    pub warnings: Vec<ValidationIssue>,

    /// Informational messages
    pub info: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    pub fn add_info(&mut self, issue: ValidationIssue) {
        self.info.push(issue);
    }

    pub fn total_issues(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.info.len()
    }

    /// Error messages joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Individual validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub issue_type: IssueType,

    /// Field that caused the issue (if applicable)
    pub field: Option<String>,

    /// Human-readable message
    pub message: String,

    pub severity: Severity,
}

impl ValidationIssue {
    fn new(issue_type: IssueType, field: Option<&str>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            issue_type,
            field: field.map(str::to_string),
            message: message.into(),
            severity,
        }
    }

    pub fn error(issue_type: IssueType, field: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(issue_type, field, message, Severity::Error)
    }

    pub fn warning(issue_type: IssueType, field: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(issue_type, field, message, Severity::Warning)
    }

    pub fn info(issue_type: IssueType, field: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(issue_type, field, message, Severity::Info)
    }
}

/// Types of validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    /// Required field is missing or empty
    MissingField,

    /// Unit or tag declared twice
    DuplicateEntry,

    /// Numeric field out of range
    InvalidValue,

    /// Hard limits or sigma override unusable
    InvalidLimits,

    /// Detection settings rejected
    InvalidConfig,

    /// An optional role is not declared
    MissingRole,

    /// Reconstruction vector cannot support the model
    ReconstructionCoverage,
}

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::TagProfile;

    fn unit(name: &str, tags: Vec<TagProfile>) -> UnitProfile {
        UnitProfile {
            unit: name.to_string(),
            description: None,
            nominal_speed: Some(3000.0),
            tags,
        }
    }

    fn plant(units: Vec<UnitProfile>) -> PlantProfile {
        PlantProfile {
            plant: "north".to_string(),
            detection: Default::default(),
            units,
        }
    }

    #[test]
    fn clean_profile_passes() {
        let profile = plant(vec![unit("K-1", vec![TagProfile::speed("SI-1"), TagProfile::new("TI-1")])]);
        let report = ProfileValidator::new().validate(&profile);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn duplicate_tags_and_units_are_errors() {
        let profile = plant(vec![
            unit("K-1", vec![TagProfile::new("TI-1"), TagProfile::new("TI-1")]),
            unit("K-1", vec![TagProfile::new("TI-2")]),
        ]);
        let report = ProfileValidator::new().validate(&profile);
        let duplicates = report
            .errors
            .iter()
            .filter(|i| i.issue_type == IssueType::DuplicateEntry)
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn inverted_limits_are_errors() {
        let mut tag = TagProfile::new("TI-1");
        tag.lower_limit = Some(100.0);
        tag.upper_limit = Some(50.0);
        let report = ProfileValidator::new().validate(&plant(vec![unit("K-1", vec![tag])]));
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].issue_type, IssueType::InvalidLimits);
        assert_eq!(report.errors[0].field.as_deref(), Some("TI-1"));
    }

    #[test]
    fn missing_speed_tag_is_only_a_warning() {
        let report = ProfileValidator::new().validate(&plant(vec![unit("K-1", vec![TagProfile::new("TI-1")])]));
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].issue_type, IssueType::MissingRole);
        assert_eq!(report.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn thin_reconstruction_vector_warns() {
        let mut a = TagProfile::new("TI-1");
        a.reconstruction = true;
        let mut b = TagProfile::new("TI-2");
        b.reconstruction = true;
        let profile = plant(vec![unit("K-1", vec![TagProfile::speed("SI-1"), a, b])]);
        let report = ProfileValidator::new().validate(&profile);
        assert!(report.is_valid());
        assert!(report
            .warnings
            .iter()
            .any(|i| i.issue_type == IssueType::ReconstructionCoverage));
    }

    #[test]
    fn bad_detection_settings_are_errors() {
        let mut profile = plant(vec![unit("K-1", vec![TagProfile::speed("SI-1")])]);
        profile.detection.max_workers = 0;
        let report = ProfileValidator::new().validate(&profile);
        assert_eq!(report.errors[0].issue_type, IssueType::InvalidConfig);
        assert!(!report.error_summary().is_empty());
    }
}
