//! Verification layer
//!
//! Independent detectors re-examine each candidate of a tag. A candidate is
//! verified when any verifier confirms it. A verifier that cannot run, or
//! runs past its time budget, is skipped and recorded as unavailable; its
//! silence is never read as a rejection.

use std::time::{Duration, Instant};

use rotorguard_core::config::VerificationSettings;
use rotorguard_core::{
    CandidateSet, DetectionError, DetectionResult, DetectorFlags, DetectorKind, DetectorNote, SensorSeries,
    TagLimits, VerificationOutcome, VerificationVerdict,
};

mod forest;
mod tau;

pub use forest::ForestVerifier;
pub use tau::TauVerifier;

/// Everything a verifier may look at for one tag
#[derive(Debug, Clone, Copy)]
pub struct VerifyContext<'a> {
    pub series: &'a SensorSeries,
    pub candidates: &'a CandidateSet,
    pub limits: &'a TagLimits,
}

/// Verdict of one verifier on one candidate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Check {
    pub confirmed: bool,
    pub score: Option<f64>,
}

/// Secondary detector that confirms or leaves candidates unconfirmed
pub trait Verifier: Send + Sync {
    /// Which detector this is
    fn kind(&self) -> DetectorKind;

    /// One check per candidate, in candidate order.
    ///
    /// Implementations poll `deadline` and return
    /// [`DetectionError::DetectorUnavailable`] once it has passed.
    fn verify(&self, ctx: &VerifyContext<'_>, deadline: Instant) -> DetectionResult<Vec<Check>>;
}

/// Runs every verifier under its budget and ORs their confirmations
pub struct VerificationLayer {
    verifiers: Vec<Box<dyn Verifier>>,
    budget: Duration,
}

impl VerificationLayer {
    /// Tau verifier and outlier-forest verifier
    pub fn new(settings: &VerificationSettings) -> Self {
        Self::with_verifiers(
            vec![
                Box::new(TauVerifier::new(settings)),
                Box::new(ForestVerifier::new(&settings.forest)),
            ],
            settings.verifier_budget(),
        )
    }

    pub fn with_verifiers(verifiers: Vec<Box<dyn Verifier>>, budget: Duration) -> Self {
        Self { verifiers, budget }
    }

    pub fn verify(&self, series: &SensorSeries, candidates: &CandidateSet, limits: &TagLimits) -> VerificationOutcome {
        let mut outcome = VerificationOutcome {
            verdicts: candidates
                .candidates
                .iter()
                .cloned()
                .map(VerificationVerdict::unconfirmed)
                .collect(),
            ran: DetectorFlags::empty(),
            unavailable: Vec::new(),
        };
        if candidates.is_empty() {
            return outcome;
        }

        let ctx = VerifyContext {
            series,
            candidates,
            limits,
        };

        for verifier in &self.verifiers {
            let kind = verifier.kind();
            let started = Instant::now();
            let deadline = started + self.budget;

            let result = verifier.verify(&ctx, deadline).and_then(|checks| {
                if started.elapsed() > self.budget {
                    Err(DetectionError::DetectorUnavailable {
                        detector: kind.name(),
                        reason: format!("exceeded budget of {} ms", self.budget.as_millis()),
                    })
                } else {
                    Ok(checks)
                }
            });

            match result {
                Ok(checks) => {
                    outcome.ran.set(kind.flag());
                    for (verdict, check) in outcome.verdicts.iter_mut().zip(checks) {
                        if check.confirmed {
                            verdict.confirmed_by.set(kind.flag());
                        }
                        match kind {
                            DetectorKind::TauTest => verdict.tau_score = check.score,
                            DetectorKind::OutlierForest => verdict.forest_score = check.score,
                            _ => {}
                        }
                    }
                }
                Err(err) => {
                    log::warn!("{}: {} skipped: {}", series.tag(), kind.name(), err);
                    outcome.unavailable.push(DetectorNote {
                        detector: kind,
                        reason: err.to_string(),
                    });
                }
            }
        }

        outcome
    }
}

/// Error for a verifier that ran out of time
pub(crate) fn budget_exceeded(kind: DetectorKind) -> DetectionError {
    DetectionError::DetectorUnavailable {
        detector: kind.name(),
        reason: "exceeded execution budget".to_string(),
    }
}
