//! Causal analysis engine.
//!
//! Derives a [`CausalReport`] for an observed event: an ordered chain from
//! the immediate trigger down to the root cause, one recommendation per
//! level, and preventive measures aimed at the root. Chain depth and level
//! confidences come from `CoreConfig::causal_confidences`; callers may extend
//! the chain with their own hypotheses, which are floored so the chain stays
//! non-increasing.

use quorum_core::{
    CausalChain, CausalLevel, CausalReport, CoreConfig, QuorumResult, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Evidence attached to the immediate trigger when the caller supplies none.
const DEFAULT_OBSERVATION: &str = "Reported by runtime monitoring";

/// Recommendation addressing the immediate trigger.
const IMMEDIATE_RECOMMENDATION: &str = "Implement dynamic resource monitoring with auto-scaling";

/// Contributing-factor narratives, cycled for chains deeper than three
/// levels. Each entry is (cause, evidence, recommendation).
const CONTRIBUTING_FACTORS: &[(&str, &str, &str)] = &[
    (
        "Contributing factor: Inefficient memory consolidation",
        "Memory cleanup frequency too low",
        "Optimize memory consolidation frequency based on usage patterns",
    ),
    (
        "Contributing factor: Overloaded coordination channels",
        "Coordination events queued during load spikes",
        "Stagger collaborative sessions to off-peak windows",
    ),
    (
        "Contributing factor: Stale capability routing",
        "Recent knowledge transfers not reflected in task assignment",
        "Refresh routing weights after each knowledge transfer",
    ),
];

/// Root-cause narrative: (cause, evidence, recommendation).
const ROOT_CAUSE: (&str, &str, &str) = (
    "Root cause: Suboptimal task scheduling algorithm",
    "Task distribution analysis shows clustering patterns",
    "Enhance task scheduling with load balancing algorithms",
);

/// Preventive measures derived from the scheduling root cause.
const PREVENTIVE_MEASURES: &[&str] = &[
    "Establish proactive resource monitoring alerts",
    "Implement predictive scaling based on historical patterns",
    "Create automated load balancing triggers",
];

/// A caller-supplied candidate cause with its supporting evidence.
///
/// Hypotheses slot into the chain between the template's contributing
/// factors and the root cause; their confidence is floored by the level
/// above them so the chain ordering holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// The suspected cause
    pub cause: String,
    /// Evidence supporting it; must be non-empty
    pub evidence: String,
    /// Caller's raw confidence, clamped to [0.0, 1.0]
    pub confidence: f64,
}

impl Hypothesis {
    /// Create a hypothesis with confidence clamped to [0.0, 1.0].
    pub fn new(cause: impl Into<String>, evidence: impl Into<String>, confidence: f64) -> Self {
        Self {
            cause: cause.into(),
            evidence: evidence.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Caller observations that extend an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    /// Evidence for the immediate trigger, if the caller observed it directly
    pub observation: Option<String>,
    /// Candidate deeper causes to weave into the chain
    pub hypotheses: Vec<Hypothesis>,
}

impl AnalysisContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direct observation used as trigger evidence.
    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = Some(observation.into());
        self
    }

    /// Add a hypothesis.
    pub fn with_hypothesis(mut self, hypothesis: Hypothesis) -> Self {
        self.hypotheses.push(hypothesis);
        self
    }
}

/// Derives causal chains for observed events.
///
/// The chain skeleton is deterministic: level 0 names the event as the
/// immediate trigger, intermediate levels walk the contributing-factor
/// narratives, and the deepest template level is the root cause. Context
/// hypotheses are inserted above the root. Confidences come from the
/// configuration and are validated non-increasing there.
#[derive(Debug, Clone)]
pub struct CausalAnalyzer {
    config: CoreConfig,
}

impl CausalAnalyzer {
    /// Create an analyzer. Fails if the configuration is invalid.
    pub fn new(config: CoreConfig) -> QuorumResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Analyze an event and produce a chain with recommendations and
    /// preventive measures.
    ///
    /// # Arguments
    /// * `event` - The observed event; must be non-empty
    /// * `context` - Observations and hypotheses contributed by the caller
    ///
    /// # Returns
    /// A report whose chain confidence is non-increasing with depth, with
    /// exactly one recommendation per level and at least one preventive
    /// measure, or `ValidationError` for an empty event or a hypothesis with
    /// empty evidence.
    pub fn analyze(&self, event: &str, context: &AnalysisContext) -> QuorumResult<CausalReport> {
        if event.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "event".to_string(),
            }
            .into());
        }

        let confidences = &self.config.causal_confidences;
        let mut chain = CausalChain::new(event);
        let mut recommendations = Vec::new();

        let observation = context
            .observation
            .clone()
            .unwrap_or_else(|| DEFAULT_OBSERVATION.to_string());
        chain.push_level(CausalLevel::new(
            format!("Immediate trigger: {event}"),
            observation,
            confidences[0],
        ))?;
        recommendations.push(IMMEDIATE_RECOMMENDATION.to_string());

        if confidences.len() > 2 {
            for (offset, confidence) in confidences[1..confidences.len() - 1].iter().enumerate() {
                let (cause, evidence, recommendation) =
                    CONTRIBUTING_FACTORS[offset % CONTRIBUTING_FACTORS.len()];
                chain.push_level(CausalLevel::new(cause, evidence, *confidence))?;
                recommendations.push(recommendation.to_string());
            }
        }

        let mut floor = chain
            .root_cause()
            .map(|level| level.confidence)
            .unwrap_or(1.0);
        for hypothesis in &context.hypotheses {
            let confidence = hypothesis.confidence.clamp(0.0, 1.0).min(floor);
            chain.push_level(CausalLevel::new(
                hypothesis.cause.clone(),
                hypothesis.evidence.clone(),
                confidence,
            ))?;
            recommendations.push(format!("Validate hypothesis: {}", hypothesis.cause));
            floor = confidence;
        }

        if confidences.len() >= 2 {
            let confidence = confidences[confidences.len() - 1].min(floor);
            chain.push_level(CausalLevel::new(ROOT_CAUSE.0, ROOT_CAUSE.1, confidence))?;
            recommendations.push(ROOT_CAUSE.2.to_string());
        }

        chain.validate()?;

        let preventive_measures: Vec<String> = match chain.root_cause() {
            Some(root) if root.cause == ROOT_CAUSE.0 => PREVENTIVE_MEASURES
                .iter()
                .map(|measure| measure.to_string())
                .collect(),
            Some(root) => vec![format!("Add early detection for {}", root.cause)],
            None => Vec::new(),
        };

        Ok(CausalReport {
            chain,
            recommendations,
            preventive_measures,
        })
    }

    /// The configuration this analyzer was built with.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::ErrorKind;

    fn analyzer() -> CausalAnalyzer {
        CausalAnalyzer::new(CoreConfig::default()).unwrap()
    }

    #[test]
    fn test_default_chain_has_three_levels() {
        let report = analyzer()
            .analyze("resource constraint exceeded", &AnalysisContext::new())
            .unwrap();

        let confidences: Vec<f64> = report
            .chain
            .levels
            .iter()
            .map(|level| level.confidence)
            .collect();
        assert_eq!(confidences, vec![0.95, 0.82, 0.78]);
        assert_eq!(report.chain.depth(), 3);
        assert_eq!(
            report.chain.immediate_trigger().unwrap().cause,
            "Immediate trigger: resource constraint exceeded"
        );
        assert_eq!(
            report.chain.root_cause().unwrap().cause,
            "Root cause: Suboptimal task scheduling algorithm"
        );
        assert!(report
            .chain
            .levels
            .iter()
            .all(|level| !level.evidence.trim().is_empty()));
        assert!(report.chain.validate().is_ok());
    }

    #[test]
    fn test_one_recommendation_per_level() {
        let report = analyzer()
            .analyze("resource constraint exceeded", &AnalysisContext::new())
            .unwrap();
        assert_eq!(report.recommendations.len(), report.chain.depth());
        assert_eq!(
            report.recommendations[0],
            "Implement dynamic resource monitoring with auto-scaling"
        );
        assert_eq!(
            report.recommendations[2],
            "Enhance task scheduling with load balancing algorithms"
        );
    }

    #[test]
    fn test_preventive_measures_derived_from_root() {
        let report = analyzer()
            .analyze("resource constraint exceeded", &AnalysisContext::new())
            .unwrap();
        assert_eq!(report.preventive_measures.len(), 3);
        assert_eq!(
            report.preventive_measures[0],
            "Establish proactive resource monitoring alerts"
        );
    }

    #[test]
    fn test_empty_event_rejected() {
        let err = analyzer().analyze("", &AnalysisContext::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(analyzer().analyze("   ", &AnalysisContext::new()).is_err());
    }

    #[test]
    fn test_observation_becomes_trigger_evidence() {
        let context = AnalysisContext::new().with_observation("CPU utilization > 85% threshold");
        let report = analyzer()
            .analyze("resource constraint exceeded", &context)
            .unwrap();
        assert_eq!(
            report.chain.immediate_trigger().unwrap().evidence,
            "CPU utilization > 85% threshold"
        );
    }

    #[test]
    fn test_hypotheses_slot_above_root() {
        let context = AnalysisContext::new().with_hypothesis(Hypothesis::new(
            "Thermal throttling on executor nodes",
            "Clock frequency dips align with failures",
            0.99,
        ));
        let report = analyzer()
            .analyze("resource constraint exceeded", &context)
            .unwrap();

        assert_eq!(report.chain.depth(), 4);
        let hypothesis_level = &report.chain.levels[2];
        assert_eq!(hypothesis_level.cause, "Thermal throttling on executor nodes");
        // floored by the contributing level above it
        assert_eq!(hypothesis_level.confidence, 0.82);
        assert_eq!(
            report.chain.root_cause().unwrap().cause,
            "Root cause: Suboptimal task scheduling algorithm"
        );
        assert_eq!(report.recommendations.len(), 4);
        assert!(report.recommendations[2].contains("Thermal throttling"));
        assert!(report.chain.validate().is_ok());
    }

    #[test]
    fn test_hypothesis_with_empty_evidence_rejected() {
        let context =
            AnalysisContext::new().with_hypothesis(Hypothesis::new("ghost cause", "  ", 0.5));
        assert!(analyzer()
            .analyze("resource constraint exceeded", &context)
            .is_err());
    }

    #[test]
    fn test_two_level_config_skips_contributing_factors() {
        let config = CoreConfig {
            causal_confidences: vec![0.9, 0.8],
            ..CoreConfig::default()
        };
        let report = CausalAnalyzer::new(config)
            .unwrap()
            .analyze("queue backlog", &AnalysisContext::new())
            .unwrap();

        assert_eq!(report.chain.depth(), 2);
        assert!(report.chain.levels[0].cause.starts_with("Immediate trigger:"));
        assert!(report.chain.levels[1].cause.starts_with("Root cause:"));
    }

    #[test]
    fn test_deep_config_cycles_contributing_factors() {
        let config = CoreConfig {
            causal_confidences: vec![0.95, 0.9, 0.85, 0.8, 0.75, 0.7],
            ..CoreConfig::default()
        };
        let report = CausalAnalyzer::new(config)
            .unwrap()
            .analyze("queue backlog", &AnalysisContext::new())
            .unwrap();

        assert_eq!(report.chain.depth(), 6);
        assert_eq!(
            report.chain.levels[1].cause,
            "Contributing factor: Inefficient memory consolidation"
        );
        assert_eq!(
            report.chain.levels[2].cause,
            "Contributing factor: Overloaded coordination channels"
        );
        assert_eq!(report.recommendations.len(), 6);
    }

    #[test]
    fn test_single_level_config_derives_measures_from_trigger() {
        let config = CoreConfig {
            causal_confidences: vec![0.9],
            ..CoreConfig::default()
        };
        let report = CausalAnalyzer::new(config)
            .unwrap()
            .analyze("queue backlog", &AnalysisContext::new())
            .unwrap();

        assert_eq!(report.chain.depth(), 1);
        assert_eq!(report.preventive_measures.len(), 1);
        assert!(report.preventive_measures[0].contains("queue backlog"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CoreConfig {
            causal_confidences: vec![0.5, 0.9],
            ..CoreConfig::default()
        };
        assert!(CausalAnalyzer::new(config).is_err());
    }
}
