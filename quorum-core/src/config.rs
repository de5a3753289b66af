//! Runtime tuning knobs for the coordination core.
//!
//! Every knob ships with a working default so `CoreConfig::default()` is a
//! valid configuration. Callers that override values should call `validate()`
//! before wiring the config into the registry or system facade.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, QuorumError, QuorumResult};

/// Tunable parameters shared across the coordination core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Multiplier over a plan's estimate that arms the fallback alternative.
    /// 1.5 means the alternative triggers at 150% of the estimated duration.
    pub overrun_factor: f64,
    /// Minimum token-overlap score for two memory traces to share a cluster.
    pub similarity_threshold: f64,
    /// Traces below this importance are dropped during consolidation
    /// instead of being promoted.
    pub importance_cutoff: f64,
    /// How many times a participant grouping must recur before it is
    /// reported as an emergent behavior.
    pub emergent_frequency_threshold: u32,
    /// Mean outcome score at or above which an emergent behavior counts
    /// as positive.
    pub positive_outcome_threshold: f64,
    /// Mean outcome score at or below which an emergent behavior counts
    /// as negative.
    pub negative_outcome_threshold: f64,
    /// Sampling temperature handed to completion providers when the caller
    /// does not specify one.
    pub default_temperature: f64,
    /// Token ceiling handed to completion providers when the caller does
    /// not specify one.
    pub default_max_tokens: u32,
    /// Cost efficiency assumed for a fresh system before any drift or
    /// observation adjusts it, on a 0-100 scale.
    pub cost_efficiency_baseline: f64,
    /// Increment applied to a tool's effectiveness each time it is used.
    pub tool_effectiveness_nudge: f64,
    /// Confidence assigned to each causal level, outermost (immediate
    /// trigger) first. Must be non-increasing.
    pub causal_confidences: Vec<f64>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            overrun_factor: 1.5,
            similarity_threshold: 0.55,
            importance_cutoff: 0.35,
            emergent_frequency_threshold: 3,
            positive_outcome_threshold: 0.65,
            negative_outcome_threshold: 0.35,
            default_temperature: 0.7,
            default_max_tokens: 1000,
            cost_efficiency_baseline: 87.3,
            tool_effectiveness_nudge: 0.01,
            causal_confidences: vec![0.95, 0.82, 0.78],
        }
    }
}

impl CoreConfig {
    /// Validate the configuration.
    /// Returns Ok(()) if valid, Err(QuorumError::Config) if invalid.
    ///
    /// Validates:
    /// - overrun_factor > 1.0
    /// - all ratio fields in [0.0, 1.0]
    /// - negative_outcome_threshold <= positive_outcome_threshold
    /// - default_temperature in [0.0, 2.0]
    /// - default_max_tokens > 0
    /// - cost_efficiency_baseline in [0.0, 100.0]
    /// - causal_confidences non-empty, each in [0.0, 1.0], non-increasing
    pub fn validate(&self) -> QuorumResult<()> {
        // Validate overrun_factor
        if self.overrun_factor <= 1.0 {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "overrun_factor".to_string(),
                value: self.overrun_factor.to_string(),
                reason: "overrun_factor must be greater than 1.0".to_string(),
            }));
        }

        // Validate similarity_threshold
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "similarity_threshold".to_string(),
                value: self.similarity_threshold.to_string(),
                reason: "similarity_threshold must be between 0.0 and 1.0".to_string(),
            }));
        }

        // Validate importance_cutoff
        if !(0.0..=1.0).contains(&self.importance_cutoff) {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "importance_cutoff".to_string(),
                value: self.importance_cutoff.to_string(),
                reason: "importance_cutoff must be between 0.0 and 1.0".to_string(),
            }));
        }

        // Validate emergent_frequency_threshold
        if self.emergent_frequency_threshold < 2 {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "emergent_frequency_threshold".to_string(),
                value: self.emergent_frequency_threshold.to_string(),
                reason: "emergent_frequency_threshold must be at least 2".to_string(),
            }));
        }

        // Validate positive_outcome_threshold
        if !(0.0..=1.0).contains(&self.positive_outcome_threshold) {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "positive_outcome_threshold".to_string(),
                value: self.positive_outcome_threshold.to_string(),
                reason: "positive_outcome_threshold must be between 0.0 and 1.0".to_string(),
            }));
        }

        // Validate negative_outcome_threshold
        if !(0.0..=1.0).contains(&self.negative_outcome_threshold) {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "negative_outcome_threshold".to_string(),
                value: self.negative_outcome_threshold.to_string(),
                reason: "negative_outcome_threshold must be between 0.0 and 1.0".to_string(),
            }));
        }

        // The two classification thresholds must not cross
        if self.negative_outcome_threshold > self.positive_outcome_threshold {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "negative_outcome_threshold".to_string(),
                value: self.negative_outcome_threshold.to_string(),
                reason: "negative_outcome_threshold must not exceed positive_outcome_threshold"
                    .to_string(),
            }));
        }

        // Validate default_temperature
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "default_temperature".to_string(),
                value: self.default_temperature.to_string(),
                reason: "default_temperature must be between 0.0 and 2.0".to_string(),
            }));
        }

        // Validate default_max_tokens
        if self.default_max_tokens == 0 {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "default_max_tokens".to_string(),
                value: self.default_max_tokens.to_string(),
                reason: "default_max_tokens must be greater than 0".to_string(),
            }));
        }

        // Validate cost_efficiency_baseline
        if !(0.0..=100.0).contains(&self.cost_efficiency_baseline) {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "cost_efficiency_baseline".to_string(),
                value: self.cost_efficiency_baseline.to_string(),
                reason: "cost_efficiency_baseline must be between 0.0 and 100.0".to_string(),
            }));
        }

        // Validate tool_effectiveness_nudge
        if !(0.0..=1.0).contains(&self.tool_effectiveness_nudge) {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "tool_effectiveness_nudge".to_string(),
                value: self.tool_effectiveness_nudge.to_string(),
                reason: "tool_effectiveness_nudge must be between 0.0 and 1.0".to_string(),
            }));
        }

        // Validate causal_confidences
        if self.causal_confidences.is_empty() {
            return Err(QuorumError::Config(ConfigError::InvalidValue {
                field: "causal_confidences".to_string(),
                value: "[]".to_string(),
                reason: "causal_confidences must contain at least one level".to_string(),
            }));
        }
        for (i, &confidence) in self.causal_confidences.iter().enumerate() {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(QuorumError::Config(ConfigError::InvalidValue {
                    field: "causal_confidences".to_string(),
                    value: confidence.to_string(),
                    reason: format!("confidence at level {i} must be between 0.0 and 1.0"),
                }));
            }
        }
        for pair in self.causal_confidences.windows(2) {
            if pair[1] > pair[0] {
                return Err(QuorumError::Config(ConfigError::InvalidValue {
                    field: "causal_confidences".to_string(),
                    value: format!("{:?}", self.causal_confidences),
                    reason: "causal_confidences must be non-increasing".to_string(),
                }));
            }
        }

        Ok(())
    }

    /// Human-readable trigger condition for the overrun fallback,
    /// e.g. "execution time exceeds 150% of estimate" at the default factor.
    pub fn overrun_trigger_text(&self) -> String {
        format!(
            "execution time exceeds {}% of estimate",
            (self.overrun_factor * 100.0).round() as i64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_overrun_trigger_text() {
        let config = CoreConfig::default();
        assert_eq!(
            config.overrun_trigger_text(),
            "execution time exceeds 150% of estimate"
        );
    }

    #[test]
    fn overrun_trigger_text_tracks_factor() {
        let config = CoreConfig {
            overrun_factor: 2.0,
            ..CoreConfig::default()
        };
        assert_eq!(
            config.overrun_trigger_text(),
            "execution time exceeds 200% of estimate"
        );
    }

    #[test]
    fn rejects_overrun_factor_at_or_below_one() {
        let config = CoreConfig {
            overrun_factor: 1.0,
            ..CoreConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("overrun_factor"));
    }

    #[test]
    fn rejects_out_of_range_similarity_threshold() {
        let config = CoreConfig {
            similarity_threshold: 1.2,
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_frequency_threshold_below_two() {
        let config = CoreConfig {
            emergent_frequency_threshold: 1,
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_crossed_outcome_thresholds() {
        let config = CoreConfig {
            positive_outcome_threshold: 0.3,
            negative_outcome_threshold: 0.6,
            ..CoreConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("negative_outcome_threshold"));
    }

    #[test]
    fn rejects_zero_max_tokens() {
        let config = CoreConfig {
            default_max_tokens: 0,
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_causal_confidences() {
        let config = CoreConfig {
            causal_confidences: vec![],
            ..CoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_increasing_causal_confidences() {
        let config = CoreConfig {
            causal_confidences: vec![0.8, 0.9],
            ..CoreConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("non-increasing"));
    }

    #[test]
    fn equal_causal_confidences_are_allowed() {
        let config = CoreConfig {
            causal_confidences: vec![0.8, 0.8, 0.8],
            ..CoreConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
