//! Profile documents and their resolution into unit roles

use std::path::Path;

use rotorguard_core::{DetectionConfig, TagLimits, UnitRoles};
use serde::{Deserialize, Serialize};

use crate::SchemaError;

/// What a tag measures, as far as the engine cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagRole {
    /// Ordinary process measurement
    #[default]
    Process,
    /// Shaft speed, drives operating-state classification
    Speed,
}

/// One tag of a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagProfile {
    pub tag: String,
    #[serde(default)]
    pub role: TagRole,
    /// Engineering unit, informational
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engineering_unit: Option<String>,
    /// Member of the unit's reconstruction feature vector
    #[serde(default)]
    pub reconstruction: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma_override: Option<f64>,
}

impl TagProfile {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            role: TagRole::Process,
            engineering_unit: None,
            reconstruction: false,
            lower_limit: None,
            upper_limit: None,
            sigma_override: None,
        }
    }

    pub fn speed(tag: impl Into<String>) -> Self {
        Self {
            role: TagRole::Speed,
            ..Self::new(tag)
        }
    }

    pub fn limits(&self) -> TagLimits {
        TagLimits {
            lower_limit: self.lower_limit,
            upper_limit: self.upper_limit,
            sigma_override: self.sigma_override,
        }
    }

    fn has_limits(&self) -> bool {
        self.lower_limit.is_some() || self.upper_limit.is_some() || self.sigma_override.is_some()
    }
}

/// One piece of rotating equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitProfile {
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_speed: Option<f64>,
    #[serde(default)]
    pub tags: Vec<TagProfile>,
}

impl UnitProfile {
    /// Resolve the declared roles for the engine
    pub fn resolve(&self, plant: &str) -> UnitRoles {
        let mut roles = UnitRoles::new(&self.unit);
        roles.plant = plant.to_string();
        roles.nominal_speed = self.nominal_speed;

        for tag in &self.tags {
            if tag.role == TagRole::Speed {
                roles.speed_tags.push(tag.tag.clone());
            }
            if tag.reconstruction {
                roles.reconstruction_tags.push(tag.tag.clone());
            }
            if tag.has_limits() {
                roles.limits.insert(tag.tag.clone(), tag.limits());
            }
        }
        roles
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.tag.as_str())
    }
}

/// A plant profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantProfile {
    pub plant: String,
    /// Detection settings for every unit of the plant
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub units: Vec<UnitProfile>,
}

impl PlantProfile {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Roles of every unit, in document order
    pub fn resolve(&self) -> Vec<UnitRoles> {
        self.units.iter().map(|u| u.resolve(&self.plant)).collect()
    }

    pub fn unit(&self, name: &str) -> Option<&UnitProfile> {
        self.units.iter().find(|u| u.unit == name)
    }
}
