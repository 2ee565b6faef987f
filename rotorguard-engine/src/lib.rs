//! RotorGuard Engine
//!
//! ## Overview
//!
//! Ties the detection stages together for whole units of rotating equipment.
//! Series come in through the [`SeriesSource`] seam and a ranked
//! [`UnitAnomalyReport`](rotorguard_core::UnitAnomalyReport) goes out. The
//! engine renders nothing and notifies no one; callers pass the report to
//! [`DetectionEngine::actionable`] and decide what to do with the result.
//!
//! ## Concurrency
//!
//! Tags within a unit are independent, so they are spread over a bounded
//! pool of scoped threads (`max_workers`). The report is built only after
//! every tag has finished. Units share nothing and are analysed one after
//! another by [`DetectionEngine::scan_units`], each with its own result.
//!
//! Cancellation is cooperative: a [`CancellationToken`] is checked before
//! each tag starts, never inside one. Tags not reached are reported as
//! `Cancelled` and the partial report is still returned.
//!
//! ## Usage Example
//!
//! ```rust
//! use rotorguard_core::{DetectionConfig, UnitRoles};
//! use rotorguard_engine::{CancellationToken, DetectionEngine, InMemorySource};
//!
//! let now = 30 * 24 * 3_600_000;
//! let points: Vec<(u64, f64)> = (0..200u64)
//!     .map(|i| (now - (199 - i) * 600_000, 80.0 + (i % 5) as f64 * 0.2))
//!     .collect();
//! let source = InMemorySource::new().with_series("K-101", "TI-101", points);
//!
//! let engine = DetectionEngine::new(DetectionConfig::default())?;
//! let report = engine.analyze_unit(&UnitRoles::new("K-101"), &source, now, &CancellationToken::new())?;
//!
//! assert_eq!(report.tag_summaries.len(), 1);
//! assert!(engine.actionable(&report).is_empty());
//! # Ok::<(), rotorguard_engine::EngineError>(())
//! ```

#![deny(unsafe_code)]

pub mod cancel;
pub mod engine;
pub mod errors;
pub mod pool;
pub mod source;
pub mod tag;

pub use cancel::CancellationToken;
pub use engine::DetectionEngine;
pub use errors::{EngineError, EngineResult};
pub use source::{InMemorySource, SeriesSource};
pub use tag::{TagAnalyzer, TagInput};
