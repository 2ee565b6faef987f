//! Profile Registry
//!
//! Thread-safe store of resolved unit roles. Profiles are validated when
//! registered; after that, lookups only clone already resolved values.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use rotorguard_core::{DetectionConfig, UnitRoles};

use crate::profile::PlantProfile;
use crate::validation::{ProfileValidator, ValidationReport};
use crate::SchemaError;

/// A registered plant
#[derive(Debug, Clone)]
struct PlantEntry {
    detection: DetectionConfig,
    units: Vec<String>,
}

/// Thread-safe registry of plants and their units
pub struct ProfileRegistry {
    /// Resolved roles indexed by unit name
    units: RwLock<HashMap<String, UnitRoles>>,

    /// Plant settings and unit membership
    plants: RwLock<HashMap<String, PlantEntry>>,
}

fn poisoned<T>(_: T) -> SchemaError {
    SchemaError::ParseError("Lock poisoned".to_string())
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self {
            units: RwLock::new(HashMap::new()),
            plants: RwLock::new(HashMap::new()),
        }
    }

    /// Validate and register a plant.
    ///
    /// Fails when the profile has errors, when the plant is already
    /// registered, or when one of its units belongs to another plant.
    /// Returns the validation report so warnings can be surfaced.
    pub fn register_plant(&self, profile: PlantProfile) -> Result<ValidationReport, SchemaError> {
        let report = ProfileValidator::new().validate(&profile);
        if !report.is_valid() {
            return Err(SchemaError::ValidationError(format!(
                "plant '{}': {}",
                profile.plant,
                report.error_summary()
            )));
        }
        for issue in &report.warnings {
            log::warn!("plant {}: {}", profile.plant, issue.message);
        }

        let mut plants = self.plants.write().map_err(poisoned)?;
        let mut units = self.units.write().map_err(poisoned)?;

        if plants.contains_key(&profile.plant) {
            return Err(SchemaError::ValidationError(format!(
                "Plant {} already registered",
                profile.plant
            )));
        }
        if let Some(taken) = profile.units.iter().find(|u| units.contains_key(&u.unit)) {
            return Err(SchemaError::ValidationError(format!(
                "Unit {} already registered",
                taken.unit
            )));
        }

        let roles = profile.resolve();
        let names = roles.iter().map(|r| r.unit.clone()).collect();
        for r in roles {
            units.insert(r.unit.clone(), r);
        }
        plants.insert(
            profile.plant.clone(),
            PlantEntry {
                detection: profile.detection,
                units: names,
            },
        );

        log::info!("registered plant {} ({} units)", profile.plant, profile.units.len());
        Ok(report)
    }

    /// Load and register one profile file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ValidationReport, SchemaError> {
        self.register_plant(PlantProfile::from_path(path)?)
    }

    /// Load every `*.json` profile in a directory, in file-name order
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<usize, SchemaError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        Ok(paths.len())
    }

    /// Resolved roles of a unit
    pub fn roles(&self, unit: &str) -> Result<UnitRoles, SchemaError> {
        let units = self.units.read().map_err(poisoned)?;
        units
            .get(unit)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(unit.to_string()))
    }

    /// Roles of every unit of a plant, in profile order
    pub fn plant_units(&self, plant: &str) -> Result<Vec<UnitRoles>, SchemaError> {
        let plants = self.plants.read().map_err(poisoned)?;
        let entry = plants
            .get(plant)
            .ok_or_else(|| SchemaError::NotFound(plant.to_string()))?;
        let units = self.units.read().map_err(poisoned)?;
        Ok(entry
            .units
            .iter()
            .filter_map(|name| units.get(name).cloned())
            .collect())
    }

    /// Detection settings of a plant
    pub fn detection_config(&self, plant: &str) -> Result<DetectionConfig, SchemaError> {
        let plants = self.plants.read().map_err(poisoned)?;
        plants
            .get(plant)
            .map(|entry| entry.detection.clone())
            .ok_or_else(|| SchemaError::NotFound(plant.to_string()))
    }

    /// Registered plant names, sorted
    pub fn plants(&self) -> Result<Vec<String>, SchemaError> {
        let plants = self.plants.read().map_err(poisoned)?;
        let mut names: Vec<String> = plants.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Remove a plant and its units
    pub fn remove_plant(&self, plant: &str) -> Result<(), SchemaError> {
        let mut plants = self.plants.write().map_err(poisoned)?;
        let entry = plants
            .remove(plant)
            .ok_or_else(|| SchemaError::NotFound(plant.to_string()))?;
        let mut units = self.units.write().map_err(poisoned)?;
        for name in &entry.units {
            units.remove(name);
        }
        Ok(())
    }

    pub fn unit_count(&self) -> usize {
        self.units.read().map(|u| u.len()).unwrap_or(0)
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
