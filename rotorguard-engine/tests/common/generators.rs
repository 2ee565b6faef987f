//! Deterministic series generators
//!
//! Every generator is seeded so a failing scenario replays exactly.

use rotorguard_core::time::{hours, minutes};
use rotorguard_core::Timestamp;

/// Raw readings as stored by a historian
pub type Points = Vec<(Timestamp, f64)>;

/// Linear congruential noise source
pub struct Noise {
    seed: u32,
}

impl Noise {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Uniform on [0, 1)
    pub fn unit(&mut self) -> f64 {
        self.seed = self.seed.wrapping_mul(1664525).wrapping_add(1013904223);
        self.seed as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniform noise with standard deviation `sigma`
    pub fn uniform(&mut self, sigma: f64) -> f64 {
        (self.unit() * 2.0 - 1.0) * 3f64.sqrt() * sigma
    }
}

/// Shapes series ending at a fixed evaluation time
pub struct SeriesGenerator {
    now: Timestamp,
    step: u64,
    noise: Noise,
}

impl SeriesGenerator {
    /// Samples every `step_minutes`, the last one exactly at `now`
    pub fn new(now: Timestamp, step_minutes: u64, seed: u32) -> Self {
        Self {
            now,
            step: minutes(step_minutes),
            noise: Noise::new(seed),
        }
    }

    fn at(&self, n: usize, i: usize) -> Timestamp {
        self.now - (n - 1 - i) as u64 * self.step
    }

    /// Level plus uniform noise
    pub fn steady(&mut self, n: usize, level: f64, sigma: f64) -> Points {
        (0..n).map(|i| (self.at(n, i), level + self.noise.uniform(sigma))).collect()
    }

    /// Steady series whose last `count` samples sit at `level + jump`
    pub fn recent_spikes(&mut self, n: usize, level: f64, sigma: f64, count: usize, jump: f64) -> Points {
        let mut points = self.steady(n, level, sigma);
        for point in points.iter_mut().skip(n - count) {
            point.1 = level + jump;
        }
        points
    }

    /// Steady series with `count` consecutive samples at `level + jump`,
    /// starting `age` before `now`
    pub fn old_cluster(&mut self, n: usize, level: f64, sigma: f64, count: usize, jump: f64, age: u64) -> Points {
        let mut points = self.steady(n, level, sigma);
        let start = self.now.saturating_sub(age);
        let first = points.iter().position(|(ts, _)| *ts >= start).unwrap_or(n);
        for point in points.iter_mut().skip(first).take(count) {
            point.1 = level + jump;
        }
        points
    }

    /// Constant readings
    pub fn flat(&self, n: usize, value: f64) -> Points {
        (0..n).map(|i| (self.at(n, i), value)).collect()
    }
}

/// Speed readings over the last two hours, every five minutes.
///
/// `stopped` is the share of readings at standstill, all at the end.
pub fn speed_profile(now: Timestamp, running_rpm: f64, stopped: f64) -> Points {
    let n = 24;
    let stopped_from = n - (n as f64 * stopped).round() as usize;
    (0..n)
        .map(|i| {
            let ts = now - hours(2) + minutes(5 * i as u64 + 5);
            let v = if i >= stopped_from { 2.0 } else { running_rpm };
            (ts, v)
        })
        .collect()
}
