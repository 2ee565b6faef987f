//! Operating state classification
//!
//! A unit's regime is read from the speed tags named in its [`UnitRoles`].
//! Tag names are never searched for "speed"-like substrings; a unit without
//! configured speed tags is `Unknown`, which monitors as if running.

use serde::{Deserialize, Serialize};

use crate::config::{StateSettings, UnitRoles};
use crate::constants::state::SHUTDOWN_TAIL_READINGS;
use crate::sample::{mean, SensorSeries};
use crate::time::Timestamp;

/// Equipment regime over the trailing state window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingState {
    Running,
    Shutdown,
    LowSpeed,
    Unknown,
}

impl OperatingState {
    /// State used for scoring decisions; `Unknown` monitors as `Running`
    pub fn effective(self) -> Self {
        match self {
            Self::Unknown => Self::Running,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Shutdown => "SHUTDOWN",
            Self::LowSpeed => "LOW_SPEED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl core::fmt::Display for OperatingState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one speed tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedAssessment {
    pub tag: String,
    pub state: OperatingState,
    /// Readings inside the state window
    pub samples: usize,
    pub mean_speed: Option<f64>,
    pub near_zero_fraction: f64,
}

/// Classification of a whole unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateAssessment {
    pub state: OperatingState,
    pub speed_tags: Vec<SpeedAssessment>,
}

impl StateAssessment {
    pub fn unknown() -> Self {
        Self {
            state: OperatingState::Unknown,
            speed_tags: Vec::new(),
        }
    }
}

/// Speed-based regime classifier
#[derive(Debug, Clone)]
pub struct StateClassifier<'a> {
    settings: &'a StateSettings,
}

impl<'a> StateClassifier<'a> {
    pub fn new(settings: &'a StateSettings) -> Self {
        Self { settings }
    }

    /// Classify one speed tag over `[now - window, now]`
    pub fn classify_tag(
        &self,
        series: &SensorSeries,
        nominal_speed: Option<f64>,
        now: Timestamp,
    ) -> SpeedAssessment {
        let start = now.saturating_sub(self.settings.window_ms());
        let readings = series.window_values(start, now);

        let Some(mean_speed) = mean(readings) else {
            return SpeedAssessment {
                tag: series.tag().to_string(),
                state: OperatingState::Unknown,
                samples: 0,
                mean_speed: None,
                near_zero_fraction: 0.0,
            };
        };

        let near_zero = self.settings.near_zero_speed;
        let stopped = readings.iter().filter(|&&v| v <= near_zero).count();
        let near_zero_fraction = stopped as f64 / readings.len() as f64;

        let tail = &readings[readings.len().saturating_sub(SHUTDOWN_TAIL_READINGS)..];
        let tail_mean = mean(tail).unwrap_or(mean_speed);

        let floor = nominal_speed
            .map(|nominal| nominal * self.settings.low_speed_fraction)
            .unwrap_or(self.settings.absolute_low_speed);

        let state = if near_zero_fraction > self.settings.shutdown_fraction || tail_mean <= near_zero {
            OperatingState::Shutdown
        } else if mean_speed < floor {
            OperatingState::LowSpeed
        } else {
            OperatingState::Running
        };

        SpeedAssessment {
            tag: series.tag().to_string(),
            state,
            samples: readings.len(),
            mean_speed: Some(mean_speed),
            near_zero_fraction,
        }
    }

    /// Classify a unit from its configured speed tags.
    ///
    /// Any shut-down tag shuts the unit down; otherwise any low-speed tag
    /// makes it low speed. Tags without recent readings do not vote.
    pub fn classify_unit(
        &self,
        roles: &UnitRoles,
        speed_series: &[SensorSeries],
        now: Timestamp,
    ) -> StateAssessment {
        if roles.speed_tags.is_empty() {
            return StateAssessment::unknown();
        }

        let assessments: Vec<SpeedAssessment> = speed_series
            .iter()
            .filter(|s| roles.is_speed_tag(s.tag()))
            .map(|s| self.classify_tag(s, roles.nominal_speed, now))
            .collect();

        let voting = || assessments.iter().filter(|a| a.state != OperatingState::Unknown);
        let state = if voting().any(|a| a.state == OperatingState::Shutdown) {
            OperatingState::Shutdown
        } else if voting().any(|a| a.state == OperatingState::LowSpeed) {
            OperatingState::LowSpeed
        } else if voting().next().is_some() {
            OperatingState::Running
        } else {
            OperatingState::Unknown
        };

        log::debug!("unit {} classified {}", roles.unit, state);

        StateAssessment {
            state,
            speed_tags: assessments,
        }
    }
}
