//! Outlier-forest verifier
//!
//! Fits an isolation forest on the tag's own feature rows and confirms a
//! candidate when its row scores above the contamination threshold. The
//! contamination is the candidate share of the series, capped.

use std::time::Instant;

use rotorguard_core::config::ForestSettings;
use rotorguard_core::constants::detection::FOREST_MIN_SAMPLES;
use rotorguard_core::{DetectionError, DetectionResult, DetectorKind};

use super::{Check, Verifier, VerifyContext};
use crate::{FeatureExtractor, ForestConfig, IsolationForest};

#[derive(Debug, Clone)]
pub struct ForestVerifier {
    settings: ForestSettings,
}

impl ForestVerifier {
    pub fn new(settings: &ForestSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    fn config(&self) -> ForestConfig {
        ForestConfig {
            num_trees: self.settings.trees,
            sample_size: self.settings.sample_size,
            max_depth: None,
            seed: self.settings.seed,
        }
    }
}

impl Verifier for ForestVerifier {
    fn kind(&self) -> DetectorKind {
        DetectorKind::OutlierForest
    }

    fn verify(&self, ctx: &VerifyContext<'_>, deadline: Instant) -> DetectionResult<Vec<Check>> {
        let name = self.kind().name();
        let series = ctx.series;
        if series.len() < FOREST_MIN_SAMPLES {
            return Err(DetectionError::DetectorUnavailable {
                detector: name,
                reason: format!("need {} samples, have {}", FOREST_MIN_SAMPLES, series.len()),
            });
        }

        let contamination =
            (ctx.candidates.len() as f64 / series.len() as f64).min(self.settings.contamination_cap);
        if contamination <= 0.0 {
            return Ok(vec![Check::default(); ctx.candidates.len()]);
        }

        let samples = FeatureExtractor::default()
            .samples(series.values())
            .map_err(|e| e.into_unavailable(name))?;

        let mut forest = IsolationForest::new(self.config());
        forest
            .fit_until(&samples, Some(deadline))
            .map_err(|e| e.into_unavailable(name))?;
        let scores = forest
            .predict_until(&samples, Some(deadline))
            .map_err(|e| e.into_unavailable(name))?;

        let threshold = IsolationForest::contamination_threshold(&scores, contamination).ok_or(
            DetectionError::DetectorUnavailable {
                detector: name,
                reason: "no scores to threshold".to_string(),
            },
        )?;

        Ok(ctx
            .candidates
            .candidates
            .iter()
            .map(|c| match series.nearest_index(c.timestamp).and_then(|i| scores.get(i)) {
                Some(score) => Check {
                    confirmed: score.is_anomaly(threshold),
                    score: Some(score.score),
                },
                None => Check::default(),
            })
            .collect())
    }
}
