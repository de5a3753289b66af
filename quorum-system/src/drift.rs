//! Metric drift models for reported system snapshots.
//!
//! Operators polling `system_state` expect consecutive snapshots of a live
//! fleet to wiggle the way real telemetry does. A `MetricDrift`
//! implementation colors the reported copy of the assembled metrics; health
//! is always scored before drift is applied, so the jitter never moves the
//! health label.

use quorum_core::SystemMetrics;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Post-assembly adjustment applied to the reported metrics copy.
pub trait MetricDrift: Send + Sync {
    /// Adjust the metrics in place.
    fn drift(&self, metrics: &mut SystemMetrics);
}

/// Identity drift: report the assembled metrics untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDrift;

impl MetricDrift for NoDrift {
    fn drift(&self, _metrics: &mut SystemMetrics) {}
}

/// Uniform jitter on the learning metrics.
///
/// Learning velocity shifts by up to half a point in either direction,
/// floored at zero, and the knowledge sharing rate gains up to two points
/// per snapshot.
#[derive(Debug)]
pub struct UniformDrift {
    rng: Mutex<StdRng>,
}

impl UniformDrift {
    /// Create a drift source seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Create a drift source from an explicit seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for UniformDrift {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricDrift for UniformDrift {
    fn drift(&self, metrics: &mut SystemMetrics) {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        metrics.learning_velocity =
            (metrics.learning_velocity + rng.random_range(-0.5..0.5)).max(0.0);
        metrics.knowledge_sharing_rate += rng.random_range(0.0..2.0);
    }
}
