//! Tau verifier
//!
//! Compares each candidate with its neighbourhood. The reference population
//! is the non-candidate readings within `±tau_window` of the candidate, or
//! all non-candidate readings when the neighbourhood is thinner than ten.
//! Keeping other candidates out of the reference stops a sustained
//! excursion from hiding itself by inflating the local spread.
//!
//! The critical value is tiered by reference size: lenient for thin
//! references, stricter as they grow. A breach of configured hard limits
//! confirms regardless.

use std::time::Instant;

use rotorguard_core::config::{TauTiers, VerificationSettings};
use rotorguard_core::constants::detection::{TAU_MIN_SAMPLES, TAU_MIN_WINDOW_SAMPLES};
use rotorguard_core::sample::{mean, sample_std};
use rotorguard_core::{DetectionResult, DetectorKind};

use super::{budget_exceeded, Check, Verifier, VerifyContext};

/// Local deviation test around each candidate
#[derive(Debug, Clone)]
pub struct TauVerifier {
    window_ms: u64,
    tiers: TauTiers,
}

impl TauVerifier {
    pub fn new(settings: &VerificationSettings) -> Self {
        Self {
            window_ms: settings.tau_window_ms(),
            tiers: settings.tau_tiers.clone(),
        }
    }
}

impl Verifier for TauVerifier {
    fn kind(&self) -> DetectorKind {
        DetectorKind::TauTest
    }

    fn verify(&self, ctx: &VerifyContext<'_>, deadline: Instant) -> DetectionResult<Vec<Check>> {
        let series = ctx.series;
        let values = series.values();

        let mut is_candidate = vec![false; series.len()];
        for c in &ctx.candidates.candidates {
            if let Some(flag) = is_candidate.get_mut(c.index) {
                *flag = true;
            }
        }

        let everywhere: Vec<f64> = values
            .iter()
            .zip(&is_candidate)
            .filter(|(_, &cand)| !cand)
            .map(|(&v, _)| v)
            .collect();

        let mut checks = Vec::with_capacity(ctx.candidates.len());
        for candidate in &ctx.candidates.candidates {
            if Instant::now() >= deadline {
                return Err(budget_exceeded(self.kind()));
            }

            let range = series.window(
                candidate.timestamp.saturating_sub(self.window_ms),
                candidate.timestamp.saturating_add(self.window_ms),
            );
            let local: Vec<f64> = range
                .filter(|&i| !is_candidate[i])
                .map(|i| values[i])
                .collect();
            let reference = if local.len() < TAU_MIN_WINDOW_SAMPLES {
                &everywhere
            } else {
                &local
            };

            let breach = ctx.limits.breaches(candidate.value);
            let score = local_deviation(reference, candidate.value);
            let statistical = score.is_some_and(|dev| dev > self.tiers.critical_value(reference.len()));

            checks.push(Check {
                confirmed: breach || statistical,
                score,
            });
        }

        Ok(checks)
    }
}

/// |value - mean| / std of the reference; `None` when it cannot be computed
fn local_deviation(reference: &[f64], value: f64) -> Option<f64> {
    if reference.len() < TAU_MIN_SAMPLES {
        return None;
    }
    let m = mean(reference)?;
    let s = sample_std(reference)?;
    if !(s > 0.0 && s.is_finite()) {
        return None;
    }
    Some((value - m).abs() / s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotorguard_core::{CandidateSet, DetectionCandidate, DetectorFlags, SensorSeries, TagLimits};

    fn candidate(series: &SensorSeries, index: usize) -> DetectionCandidate {
        let (timestamp, value) = series.get(index).unwrap();
        DetectionCandidate {
            tag: series.tag().to_string(),
            timestamp,
            value,
            z_score: 3.0,
            sources: DetectorFlags::STATISTICAL,
            index,
        }
    }

    fn run(series: &SensorSeries, indices: &[usize], limits: &TagLimits) -> Vec<Check> {
        let mut set = CandidateSet::empty(series.tag(), series.len());
        set.candidates = indices.iter().map(|&i| candidate(series, i)).collect();
        let ctx = VerifyContext {
            series,
            candidates: &set,
            limits,
        };
        let far = Instant::now() + std::time::Duration::from_secs(60);
        TauVerifier::new(&VerificationSettings::default())
            .verify(&ctx, far)
            .unwrap()
    }

    /// One sample per minute alternating 9/11, so local std is about 1
    fn minutely(overrides: &[(usize, f64)]) -> SensorSeries {
        let points = (0..240)
            .map(|i| {
                let v = overrides
                    .iter()
                    .find(|(at, _)| *at == i)
                    .map(|(_, v)| *v)
                    .unwrap_or(if i % 2 == 0 { 9.0 } else { 11.0 });
                (i as u64 * 60_000, v)
            })
            .collect();
        SensorSeries::new("TI-5", points).unwrap()
    }

    #[test]
    fn confirms_large_local_deviation() {
        let series = minutely(&[(120, 16.0)]);
        let checks = run(&series, &[120], &TagLimits::default());
        assert!(checks[0].confirmed);
        assert!(checks[0].score.unwrap() > 5.0);
    }

    #[test]
    fn leaves_mild_deviation_unconfirmed() {
        // 11.5 is about half a std from the local mean
        let series = minutely(&[(120, 11.5)]);
        let checks = run(&series, &[120], &TagLimits::default());
        assert!(!checks[0].confirmed);
    }

    #[test]
    fn hard_limit_breach_confirms() {
        let series = minutely(&[(120, 11.5)]);
        let limits = TagLimits {
            upper_limit: Some(11.2),
            ..TagLimits::default()
        };
        let checks = run(&series, &[120], &limits);
        assert!(checks[0].confirmed);
    }

    #[test]
    fn flat_reference_is_not_confirmed() {
        let points = (0..40).map(|i| (i as u64 * 60_000, if i == 20 { 50.0 } else { 5.0 })).collect();
        let series = SensorSeries::new("TI-5", points).unwrap();
        let checks = run(&series, &[20], &TagLimits::default());
        assert!(!checks[0].confirmed);
        assert_eq!(checks[0].score, None);
    }

    #[test]
    fn tiny_series_is_not_confirmed() {
        let series = SensorSeries::new("TI-5", vec![(0, 1.0), (60_000, 9.0), (120_000, 1.5)]).unwrap();
        let checks = run(&series, &[1], &TagLimits::default());
        assert!(!checks[0].confirmed);
    }

    #[test]
    fn expired_deadline_is_unavailable() {
        let series = minutely(&[(120, 16.0)]);
        let mut set = CandidateSet::empty(series.tag(), series.len());
        set.candidates = vec![candidate(&series, 120)];
        let limits = TagLimits::default();
        let ctx = VerifyContext {
            series: &series,
            candidates: &set,
            limits: &limits,
        };
        let err = TauVerifier::new(&VerificationSettings::default())
            .verify(&ctx, Instant::now())
            .unwrap_err();
        assert!(err.is_degradation());
    }
}
