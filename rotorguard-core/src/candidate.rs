//! Candidate generation
//!
//! ## Primary detectors
//!
//! The statistical detector flags every sample whose z-score against the
//! rolling baseline reaches the sigma threshold, plus any sample outside the
//! tag's hard limits. The reconstruction detector, when available, adds its
//! own timestamps through [`CandidateSet::merge_secondary`]. Candidates are
//! unique per timestamp; a sample flagged by both carries both flags.
//!
//! ## Persistence
//!
//! Isolated spikes are common and rarely matter. A tag only becomes an
//! actionable candidate when a run of consecutive flagged samples of at least
//! `min_consecutive_run` lies inside the trailing recency window. The full
//! candidate set is kept either way for contextual scoring.

use serde::{Deserialize, Serialize};

use crate::baseline::Baseline;
use crate::config::{CandidateSettings, TagLimits};
use crate::sample::SensorSeries;
use crate::time::Timestamp;

/// Detectors that can flag or confirm a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Rolling z-score and hard limits
    Statistical,
    /// Multi-tag reconstruction error
    Reconstruction,
    /// Local tau test
    TauTest,
    /// Isolation forest over per-sample features
    OutlierForest,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 4] = [
        DetectorKind::Statistical,
        DetectorKind::Reconstruction,
        DetectorKind::TauTest,
        DetectorKind::OutlierForest,
    ];

    pub const fn is_primary(self) -> bool {
        matches!(self, Self::Statistical | Self::Reconstruction)
    }

    pub const fn is_verifier(self) -> bool {
        !self.is_primary()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Statistical => "statistical",
            Self::Reconstruction => "reconstruction",
            Self::TauTest => "tau_test",
            Self::OutlierForest => "outlier_forest",
        }
    }

    pub const fn flag(self) -> DetectorFlags {
        match self {
            Self::Statistical => DetectorFlags::STATISTICAL,
            Self::Reconstruction => DetectorFlags::RECONSTRUCTION,
            Self::TauTest => DetectorFlags::TAU_TEST,
            Self::OutlierForest => DetectorFlags::OUTLIER_FOREST,
        }
    }
}

/// Set of detectors, one bit each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectorFlags(u8);

impl DetectorFlags {
    pub const STATISTICAL: Self = Self(1 << 0);
    pub const RECONSTRUCTION: Self = Self(1 << 1);
    pub const TAU_TEST: Self = Self(1 << 2);
    pub const OUTLIER_FOREST: Self = Self(1 << 3);

    pub const PRIMARY: Self = Self(0b0011);
    pub const VERIFIERS: Self = Self(0b1100);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    pub fn set(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub const fn intersects(&self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Detectors in this set, in declaration order
    pub fn kinds(self) -> impl Iterator<Item = DetectorKind> {
        DetectorKind::ALL.into_iter().filter(move |k| self.contains(k.flag()))
    }
}

impl From<DetectorKind> for DetectorFlags {
    fn from(kind: DetectorKind) -> Self {
        kind.flag()
    }
}

/// A sample flagged by a primary detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    pub tag: String,
    pub timestamp: Timestamp,
    pub value: f64,
    pub z_score: f64,
    /// Primary detectors that flagged the sample
    pub sources: DetectorFlags,
    /// Position in the source series
    pub index: usize,
}

/// All candidates of one tag for one run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CandidateSet {
    pub tag: String,
    /// Sorted by timestamp, one entry per timestamp
    pub candidates: Vec<DetectionCandidate>,
    pub series_len: usize,
    /// Longest run of consecutive statistical flags anywhere in the series
    pub longest_run: usize,
    /// Longest run inside the trailing recency window
    pub recent_longest_run: usize,
    /// Whether the persistence gate fired
    pub persistence_triggered: bool,
}

impl CandidateSet {
    pub fn empty(tag: impl Into<String>, series_len: usize) -> Self {
        Self {
            tag: tag.into(),
            series_len,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates flagged by `kind`
    pub fn count_by(&self, kind: DetectorKind) -> usize {
        self.candidates
            .iter()
            .filter(|c| c.sources.contains(kind.flag()))
            .count()
    }

    /// Share of samples that are candidates
    pub fn candidate_rate(&self) -> f64 {
        if self.series_len == 0 {
            0.0
        } else {
            self.candidates.len() as f64 / self.series_len as f64
        }
    }

    /// Primary detectors that produced at least one candidate
    pub fn primary_flags(&self) -> DetectorFlags {
        self.candidates
            .iter()
            .fold(DetectorFlags::empty(), |acc, c| acc.union(c.sources))
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.candidates.iter().map(|c| c.timestamp).collect()
    }

    /// Merge reconstruction-detector timestamps into the set.
    ///
    /// Timestamps without a matching sample in `series` are ignored.
    pub fn merge_secondary(&mut self, series: &SensorSeries, baseline: &Baseline, timestamps: &[Timestamp]) {
        for &ts in timestamps {
            let Some(index) = series.index_of(ts) else {
                continue;
            };
            match self.candidates.binary_search_by_key(&ts, |c| c.timestamp) {
                Ok(pos) => self.candidates[pos].sources.set(DetectorFlags::RECONSTRUCTION),
                Err(pos) => {
                    let value = series.values()[index];
                    self.candidates.insert(
                        pos,
                        DetectionCandidate {
                            tag: self.tag.clone(),
                            timestamp: ts,
                            value,
                            z_score: baseline.z_score(index, value),
                            sources: DetectorFlags::RECONSTRUCTION,
                            index,
                        },
                    );
                }
            }
        }
    }
}

/// Statistical primary detector with persistence gating
#[derive(Debug, Clone)]
pub struct CandidateDetector<'a> {
    settings: &'a CandidateSettings,
}

impl<'a> CandidateDetector<'a> {
    pub fn new(settings: &'a CandidateSettings) -> Self {
        Self { settings }
    }

    /// Flag samples of `series` against `baseline`
    pub fn detect(
        &self,
        series: &SensorSeries,
        baseline: &Baseline,
        limits: &TagLimits,
        now: Timestamp,
    ) -> CandidateSet {
        let threshold = limits
            .sigma_override
            .unwrap_or(self.settings.primary_sigma_threshold);
        let recent_start = now.saturating_sub(self.settings.recency_window_ms());

        let mut set = CandidateSet::empty(series.tag(), series.len());
        let mut run = 0;
        let mut recent_run = 0;

        for (index, (&timestamp, &value)) in series
            .timestamps()
            .iter()
            .zip(series.values())
            .enumerate()
        {
            let z_score = baseline.z_score(index, value);
            let flagged = z_score.abs() >= threshold || limits.breaches(value);

            if !flagged {
                run = 0;
                recent_run = 0;
                continue;
            }

            run += 1;
            set.longest_run = set.longest_run.max(run);
            if timestamp >= recent_start {
                recent_run += 1;
                set.recent_longest_run = set.recent_longest_run.max(recent_run);
            }

            set.candidates.push(DetectionCandidate {
                tag: series.tag().to_string(),
                timestamp,
                value,
                z_score,
                sources: DetectorFlags::STATISTICAL,
                index,
            });
        }

        set.persistence_triggered = set.recent_longest_run >= self.settings.min_consecutive_run;
        if set.persistence_triggered {
            log::debug!(
                "{}: persistence run of {} in recency window",
                series.tag(),
                set.recent_longest_run
            );
        }
        set
    }
}
