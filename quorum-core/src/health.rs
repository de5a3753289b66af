//! System health scoring.
//!
//! The health score is a weighted combination of success rate, communication
//! efficiency, learning velocity, and cost efficiency, normalized to [0, ~1]
//! and classified into a discrete label. Label thresholds are exclusive
//! lower bounds: a score of exactly 0.90 is Good, not Excellent.

use crate::metrics::SystemMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Weight of the overall success rate in the health score.
const SUCCESS_WEIGHT: f64 = 0.30;
/// Weight of communication efficiency in the health score.
const COMMUNICATION_WEIGHT: f64 = 0.25;
/// Weight of (rescaled) learning velocity in the health score.
const LEARNING_WEIGHT: f64 = 0.25;
/// Weight of cost efficiency in the health score.
const COST_WEIGHT: f64 = 0.20;

// ============================================================================
// HEALTH LABEL
// ============================================================================

/// Discrete classification of a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum HealthLabel {
    /// Score above 0.90
    Excellent,
    /// Score above 0.80
    Good,
    /// Score above 0.70
    Fair,
    /// Score at or below 0.70
    NeedsAttention,
}

impl HealthLabel {
    /// Classify a score. Bounds are exclusive: 0.90 is Good, 0.80 is Fair,
    /// 0.70 is NeedsAttention.
    pub fn from_score(score: f64) -> Self {
        if score > 0.90 {
            HealthLabel::Excellent
        } else if score > 0.80 {
            HealthLabel::Good
        } else if score > 0.70 {
            HealthLabel::Fair
        } else {
            HealthLabel::NeedsAttention
        }
    }

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            HealthLabel::Excellent => "excellent",
            HealthLabel::Good => "good",
            HealthLabel::Fair => "fair",
            HealthLabel::NeedsAttention => "needs_attention",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, HealthLabelParseError> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "excellent" => Ok(HealthLabel::Excellent),
            "good" => Ok(HealthLabel::Good),
            "fair" => Ok(HealthLabel::Fair),
            "needs_attention" => Ok(HealthLabel::NeedsAttention),
            _ => Err(HealthLabelParseError(s.to_string())),
        }
    }
}

impl fmt::Display for HealthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for HealthLabel {
    type Err = HealthLabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid health label string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthLabelParseError(pub String);

impl fmt::Display for HealthLabelParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid health label: {}", self.0)
    }
}

impl std::error::Error for HealthLabelParseError {}

// ============================================================================
// HEALTH REPORT
// ============================================================================

/// Weighted health score plus its classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthReport {
    /// Weighted score, nominally in [0.0, 1.0]
    pub score: f64,
    /// Discrete classification of the score
    pub label: HealthLabel,
}

/// Weighted health score for a set of metrics.
///
/// Communication efficiency, rescaled learning velocity (x10), and cost
/// efficiency are clamped to [0, 100] before weighting; the success rate is
/// taken as reported.
pub fn health_score(metrics: &SystemMetrics) -> f64 {
    let success = metrics.overall_success_rate * SUCCESS_WEIGHT;
    let communication = metrics.communication_efficiency.clamp(0.0, 100.0) * COMMUNICATION_WEIGHT;
    let learning = (metrics.learning_velocity * 10.0).clamp(0.0, 100.0) * LEARNING_WEIGHT;
    let cost = metrics.cost_efficiency.clamp(0.0, 100.0) * COST_WEIGHT;
    (success + communication + learning + cost) / 100.0
}

/// Score the metrics and classify the result.
pub fn health_report(metrics: &SystemMetrics) -> HealthReport {
    let score = health_score(metrics);
    HealthReport {
        score,
        label: HealthLabel::from_score(score),
    }
}
