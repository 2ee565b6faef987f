//! Unit analysis
//!
//! One call analyses one unit end to end:
//!
//! 1. fetch every series the unit needs from the [`SeriesSource`]
//! 2. classify the operating state from the configured speed tags
//! 3. run the reconstruction detector once over the unit's feature vector
//! 4. analyse tags on the bounded worker pool, checking cancellation
//!    between tags
//! 5. join on all tags and aggregate the report
//!
//! Storage failure aborts the unit. Everything else is recorded on the
//! affected tag and the report is still produced.

use std::collections::{BTreeMap, BTreeSet};

use rotorguard_core::{
    DetectionConfig, DetectionError, DetectorKind, DetectorNote, OperatingState, ReportingTrigger, SensorSeries,
    ShutdownPolicy, StateClassifier, TagAnomalySummary, TagStatus, Timestamp, UnitAggregator, UnitAnomalyReport,
    UnitRoles, UnitRun,
};
use rotorguard_ml::{ReconstructionDetector, ReconstructionResult, VerificationLayer};
use rotorguard_schemas::ProfileRegistry;

use crate::cancel::CancellationToken;
use crate::errors::{EngineError, EngineResult};
use crate::pool::run_bounded;
use crate::source::SeriesSource;
use crate::tag::{skip_status, TagAnalyzer, TagInput};

/// What storage returned for one tag
enum Fetched {
    Series(SensorSeries),
    Failed(TagStatus),
}

/// Detection engine bound to one immutable configuration
pub struct DetectionEngine {
    config: DetectionConfig,
    layer: VerificationLayer,
}

impl DetectionEngine {
    /// Validate `config` and build the default verification layer
    pub fn new(config: DetectionConfig) -> EngineResult<Self> {
        let layer = VerificationLayer::new(&config.verification);
        Self::with_layer(config, layer)
    }

    /// Use a custom verification layer
    pub fn with_layer(config: DetectionConfig, layer: VerificationLayer) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config, layer })
    }

    /// Engine configured with a registered plant's detection settings
    pub fn for_plant(registry: &ProfileRegistry, plant: &str) -> EngineResult<Self> {
        Self::new(registry.detection_config(plant)?)
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Analyse one unit at `now`
    pub fn analyze_unit(
        &self,
        roles: &UnitRoles,
        source: &dyn SeriesSource,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> EngineResult<UnitAnomalyReport> {
        let unit = roles.unit.as_str();
        log::info!("unit {}: analysis started", unit);

        let tags = source.all_tags(unit)?;
        let mut fetched = self.fetch(roles, &tags, source, now)?;

        let speed: Vec<SensorSeries> = roles
            .speed_tags
            .iter()
            .filter_map(|tag| match fetched.get(tag) {
                Some(Fetched::Series(series)) => Some(series.clone()),
                _ => None,
            })
            .collect();
        let state = StateClassifier::new(&self.config.state).classify_unit(roles, &speed, now);
        let suppressed =
            state.state == OperatingState::Shutdown && self.config.state.shutdown_policy == ShutdownPolicy::Suppress;
        if suppressed {
            log::info!("unit {}: shut down, candidate generation suppressed", unit);
        }

        let mut notes = Vec::new();
        let secondary = if suppressed {
            None
        } else {
            self.reconstruct(roles, &fetched, &mut notes)
        };
        let secondary_note = notes.first().cloned();

        let analyzer = TagAnalyzer::new(&self.config, &self.layer);
        let unit_state = state.state;
        let jobs: Vec<(String, Fetched)> = tags
            .iter()
            .map(|tag| {
                let entry = fetched
                    .remove(tag)
                    .unwrap_or(Fetched::Failed(TagStatus::InsufficientData {
                        required: 1,
                        available: 0,
                    }));
                (tag.clone(), entry)
            })
            .collect();

        let summaries = run_bounded(&jobs, self.config.max_workers, |(tag, entry)| {
            if cancel.is_cancelled() {
                return TagAnomalySummary::skipped(tag.as_str(), unit, TagStatus::Cancelled);
            }
            let series = match entry {
                Fetched::Series(series) => series,
                Fetched::Failed(status) => {
                    let mut summary = TagAnomalySummary::skipped(tag.as_str(), unit, status.clone());
                    summary.operating_state = unit_state;
                    return summary;
                }
            };
            let limits = roles.limits_for(tag);
            let covered = roles.reconstruction_tags.iter().any(|t| t == tag);
            analyzer.analyze(&TagInput {
                unit,
                series,
                limits: &limits,
                state: unit_state,
                suppressed,
                secondary: secondary.as_ref().map(|r| r.timestamps_for(tag)),
                secondary_note: secondary_note.as_ref().filter(|_| covered),
                now,
            })
        });

        if cancel.is_cancelled() {
            log::warn!("unit {}: cancelled, report is partial", unit);
        }

        Ok(UnitAggregator::new().aggregate(UnitRun {
            unit: unit.to_string(),
            state,
            analysis_suppressed: suppressed,
            summaries,
            notes,
            generated_at: now,
        }))
    }

    /// Analyse several units independently.
    ///
    /// Each unit gets its own result; a failing unit never affects the
    /// others. Units not yet started when `cancel` fires are reported as
    /// cancelled.
    pub fn scan_units(
        &self,
        units: &[UnitRoles],
        source: &dyn SeriesSource,
        now: Timestamp,
        cancel: &CancellationToken,
    ) -> Vec<(String, EngineResult<UnitAnomalyReport>)> {
        units
            .iter()
            .map(|roles| {
                let result = if cancel.is_cancelled() {
                    Err(EngineError::Cancelled {
                        unit: roles.unit.clone(),
                    })
                } else {
                    self.analyze_unit(roles, source, now, cancel)
                };
                if let Err(err) = &result {
                    log::error!("unit {}: {}", roles.unit, err);
                }
                (roles.unit.clone(), result)
            })
            .collect()
    }

    /// Tags of `report` that pass the actionability gate, most severe first
    pub fn actionable<'r>(&self, report: &'r UnitAnomalyReport) -> Vec<&'r TagAnomalySummary> {
        ReportingTrigger::new(&self.config).actionable_anomalies(report)
    }

    /// Fetch the analysed tags plus any speed or reconstruction tags the
    /// unit lists separately
    fn fetch(
        &self,
        roles: &UnitRoles,
        tags: &[String],
        source: &dyn SeriesSource,
        now: Timestamp,
    ) -> EngineResult<BTreeMap<String, Fetched>> {
        let start = now.saturating_sub(self.config.baseline.window_ms());
        let wanted: BTreeSet<&String> = tags
            .iter()
            .chain(&roles.speed_tags)
            .chain(&roles.reconstruction_tags)
            .collect();

        let mut fetched = BTreeMap::new();
        for tag in wanted {
            let entry = match source.get_series(tag, &roles.unit, start, now) {
                Ok(series) => Fetched::Series(series),
                Err(err @ DetectionError::UpstreamData { .. }) => return Err(err.into()),
                Err(err) => {
                    log::warn!("unit {}: {} unusable, {}", roles.unit, tag, err);
                    Fetched::Failed(skip_status(err))
                }
            };
            fetched.insert(tag.clone(), entry);
        }
        Ok(fetched)
    }

    /// Run the reconstruction detector once for the unit
    fn reconstruct(
        &self,
        roles: &UnitRoles,
        fetched: &BTreeMap<String, Fetched>,
        notes: &mut Vec<DetectorNote>,
    ) -> Option<ReconstructionResult> {
        if !self.config.secondary.enabled || roles.reconstruction_tags.is_empty() {
            return None;
        }

        let columns: Vec<&SensorSeries> = roles
            .reconstruction_tags
            .iter()
            .filter_map(|tag| match fetched.get(tag) {
                Some(Fetched::Series(series)) => Some(series),
                _ => None,
            })
            .collect();

        match ReconstructionDetector::new(&self.config.secondary).detect(&roles.reconstruction_tags, &columns) {
            Ok(result) => {
                log::debug!(
                    "unit {}: reconstruction flagged {} of {} rows",
                    roles.unit,
                    result.flagged_rows,
                    result.rows
                );
                Some(result)
            }
            Err(err) => {
                log::warn!("unit {}: reconstruction detector unavailable, {}", roles.unit, err);
                notes.push(DetectorNote {
                    detector: DetectorKind::Reconstruction,
                    reason: err.to_string(),
                });
                None
            }
        }
    }
}
