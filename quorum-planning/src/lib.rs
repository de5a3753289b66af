//! QUORUM Planning - Adaptive Plan Construction
//!
//! Builds goal-directed plans with a fixed three-phase skeleton: decompose
//! the goal, select tools and approach, execute adaptively. Each step's
//! confidence is estimated independently by a pluggable [`ConfidenceModel`];
//! the plan carries one fallback alternative whose trigger text is rendered
//! from the configured overrun factor, and a default risk entry. The planner
//! never evaluates the overrun deadline itself; that is the caller's job
//! while driving execution.

use quorum_core::{
    CoreConfig, DurationMs, Plan, PlanAlternative, PlanStep, QuorumResult, RiskFactor,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default duration estimate for a freshly built plan (30 minutes).
pub const DEFAULT_PLAN_DURATION_MS: DurationMs = 1_800_000;

// ============================================================================
// PLAN PHASES AND CONFIDENCE MODEL
// ============================================================================

/// The three phases of the plan skeleton, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanPhase {
    /// Break the goal into sub-goals.
    Decomposition,
    /// Pick tools and an approach for the sub-goals.
    ToolSelection,
    /// Carry out the work with monitoring and adaptation.
    AdaptiveExecution,
}

/// Trait for per-step confidence estimation.
/// Implementations must be thread-safe (Send + Sync).
///
/// Estimates are clamped to [0.0, 1.0] by the planner before they reach the
/// plan, so implementations may return raw scores.
pub trait ConfidenceModel: Send + Sync {
    /// Estimate the confidence that a phase will succeed for this goal.
    ///
    /// # Arguments
    /// * `phase` - The skeleton phase being estimated
    /// * `goal` - The goal text the plan pursues
    /// * `context` - Caller-supplied context, possibly empty
    ///
    /// # Returns
    /// A confidence estimate, nominally in [0.0, 1.0].
    fn confidence(&self, phase: PlanPhase, goal: &str, context: &str) -> f64;
}

/// Default confidence heuristic: a base estimate per phase, nudged by how
/// much signal the caller supplied. Non-empty context raises the estimate
/// slightly; a one-word goal lowers it.
///
/// Deterministic, so plans built from the same inputs always score the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineConfidence;

impl BaselineConfidence {
    const CONTEXT_BOOST: f64 = 0.02;
    const SPARSE_GOAL_PENALTY: f64 = 0.05;

    fn phase_base(phase: PlanPhase) -> f64 {
        match phase {
            PlanPhase::Decomposition => 0.90,
            PlanPhase::ToolSelection => 0.85,
            PlanPhase::AdaptiveExecution => 0.88,
        }
    }
}

impl ConfidenceModel for BaselineConfidence {
    fn confidence(&self, phase: PlanPhase, goal: &str, context: &str) -> f64 {
        let mut estimate = Self::phase_base(phase);
        if !context.trim().is_empty() {
            estimate += Self::CONTEXT_BOOST;
        }
        if goal.split_whitespace().count() < 2 {
            estimate -= Self::SPARSE_GOAL_PENALTY;
        }
        estimate.clamp(0.0, 1.0)
    }
}

// ============================================================================
// PLANNER
// ============================================================================

/// Builds plans from goals using the three-phase skeleton.
///
/// Generic over the confidence model so tests can inject a fixed one and
/// production callers can swap in a learned estimator later.
pub struct Planner<C: ConfidenceModel> {
    config: CoreConfig,
    confidence: C,
}

impl Planner<BaselineConfidence> {
    /// Create a planner with the default confidence heuristic.
    pub fn with_default_model(config: CoreConfig) -> QuorumResult<Self> {
        Self::new(config, BaselineConfidence)
    }
}

impl<C: ConfidenceModel> Planner<C> {
    /// Create a planner. Fails if the configuration is invalid.
    pub fn new(config: CoreConfig, confidence: C) -> QuorumResult<Self> {
        config.validate()?;
        Ok(Self { config, confidence })
    }

    /// Build a Draft plan for a goal.
    ///
    /// The skeleton is always three steps chained by sequential dependencies:
    /// decomposition, tool/approach selection, adaptive execution. Caller
    /// constraints become preconditions on the decomposition step, since they
    /// bound how the goal may be broken down. Exactly one alternative is
    /// attached, triggered by the configured execution-time overrun, plus a
    /// default capacity risk.
    ///
    /// # Arguments
    /// * `goal` - What the plan pursues; must be non-empty
    /// * `context` - Free-text context fed to the confidence model
    /// * `constraints` - Caller constraints on the decomposition
    ///
    /// # Returns
    /// A validated plan in Draft status, or `ValidationError` for an empty
    /// goal.
    pub fn create_plan(
        &self,
        goal: &str,
        context: &str,
        constraints: &[String],
    ) -> QuorumResult<Plan> {
        if goal.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "goal".to_string(),
            }
            .into());
        }

        let mut plan = Plan::new(goal);

        let mut decompose = PlanStep::new(0, "Analyze requirements and decompose into sub-goals")
            .with_precondition("Clear goal definition")
            .with_expected_outcome("Detailed task breakdown")
            .with_confidence(
                self.confidence
                    .confidence(PlanPhase::Decomposition, goal, context),
            );
        for constraint in constraints {
            decompose = decompose.with_precondition(constraint.clone());
        }

        let select = PlanStep::new(1, "Identify optimal tools and approaches")
            .with_dependency(decompose.step_id)
            .with_precondition("Task breakdown completed")
            .with_expected_outcome("Tool and approach selection")
            .with_confidence(
                self.confidence
                    .confidence(PlanPhase::ToolSelection, goal, context),
            );

        let execute = PlanStep::new(2, "Execute with real-time monitoring and adaptation")
            .with_dependency(select.step_id)
            .with_precondition("Tools selected and configured")
            .with_expected_outcome("Successful task completion")
            .with_confidence(
                self.confidence
                    .confidence(PlanPhase::AdaptiveExecution, goal, context),
            );

        plan.add_step(decompose);
        plan.add_step(select);
        plan.add_step(execute);

        plan.add_alternative(PlanAlternative::new(
            self.config.overrun_trigger_text(),
            "Parallel execution approach if sequential fails",
        ));

        plan.add_risk(RiskFactor::new(
            "Task complexity may exceed single agent capacity",
            0.3,
            0.7,
            "Engage additional agents for collaborative execution",
        ));

        let plan = plan.with_estimated_duration(DEFAULT_PLAN_DURATION_MS);
        plan.validate()?;
        Ok(plan)
    }

    /// Clamped confidence estimate for one phase, exactly as it would land
    /// on a plan step built from the same goal and context.
    pub fn confidence_for(&self, phase: PlanPhase, goal: &str, context: &str) -> f64 {
        self.confidence
            .confidence(phase, goal, context)
            .clamp(0.0, 1.0)
    }

    /// The configuration this planner was built with.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}

impl<C: ConfidenceModel> fmt::Debug for Planner<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Planner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_core::{PlanStatus, StepStatus};

    struct FixedConfidence(f64);

    impl ConfidenceModel for FixedConfidence {
        fn confidence(&self, _phase: PlanPhase, _goal: &str, _context: &str) -> f64 {
            self.0
        }
    }

    fn default_planner() -> Planner<BaselineConfidence> {
        Planner::with_default_model(CoreConfig::default()).unwrap()
    }

    #[test]
    fn test_create_plan_builds_three_phase_skeleton() {
        let plan = default_planner()
            .create_plan("Optimize data layer", "", &[])
            .unwrap();

        assert_eq!(plan.status, PlanStatus::Draft);
        assert_eq!(plan.completed_steps, 0);
        assert_eq!(plan.estimated_duration_ms, 1_800_000);
        assert_eq!(plan.steps.len(), 3);

        let descriptions: Vec<&str> = plan.steps.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec![
                "Analyze requirements and decompose into sub-goals",
                "Identify optimal tools and approaches",
                "Execute with real-time monitoring and adaptation",
            ]
        );
        assert!(plan.steps.iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(plan.steps[0].expected_outcome, "Detailed task breakdown");
        assert_eq!(plan.steps[1].expected_outcome, "Tool and approach selection");
        assert_eq!(plan.steps[2].expected_outcome, "Successful task completion");
    }

    #[test]
    fn test_steps_chain_sequential_dependencies() {
        let plan = default_planner()
            .create_plan("Optimize data layer", "", &[])
            .unwrap();

        assert!(plan.steps[0].depends_on.is_empty());
        assert_eq!(plan.steps[1].depends_on, vec![plan.steps[0].step_id]);
        assert_eq!(plan.steps[2].depends_on, vec![plan.steps[1].step_id]);
        assert_eq!(plan.steps[0].index, 0);
        assert_eq!(plan.steps[1].index, 1);
        assert_eq!(plan.steps[2].index, 2);
    }

    #[test]
    fn test_default_alternative_trigger_text() {
        let plan = default_planner()
            .create_plan("Optimize data layer", "", &[])
            .unwrap();

        assert_eq!(plan.alternatives.len(), 1);
        let alternative = &plan.alternatives[0];
        assert_eq!(
            alternative.trigger,
            "execution time exceeds 150% of estimate"
        );
        assert_eq!(
            alternative.approach,
            "Parallel execution approach if sequential fails"
        );
        assert_eq!(alternative.priority, 1);
    }

    #[test]
    fn test_overrun_factor_changes_trigger_text() {
        let config = CoreConfig {
            overrun_factor: 2.0,
            ..CoreConfig::default()
        };
        let plan = Planner::with_default_model(config)
            .unwrap()
            .create_plan("Optimize data layer", "", &[])
            .unwrap();

        assert_eq!(
            plan.alternatives[0].trigger,
            "execution time exceeds 200% of estimate"
        );
    }

    #[test]
    fn test_plan_carries_default_risk() {
        let plan = default_planner()
            .create_plan("Optimize data layer", "", &[])
            .unwrap();

        assert_eq!(plan.risks.len(), 1);
        let risk = &plan.risks[0];
        assert_eq!(risk.risk, "Task complexity may exceed single agent capacity");
        assert_eq!(risk.probability, 0.3);
        assert_eq!(risk.impact, 0.7);
        assert_eq!(
            risk.mitigation,
            "Engage additional agents for collaborative execution"
        );
        assert!((risk.exposure() - 0.21).abs() < 1e-9);
    }

    #[test]
    fn test_empty_goal_rejected() {
        let planner = default_planner();
        assert!(planner.create_plan("", "", &[]).is_err());
        assert!(planner.create_plan("   ", "", &[]).is_err());

        let err = planner.create_plan("", "", &[]).unwrap_err();
        assert_eq!(err.kind(), quorum_core::ErrorKind::ValidationError);
    }

    #[test]
    fn test_constraints_become_decomposition_preconditions() {
        let constraints = vec![
            "Read-only access to production".to_string(),
            "Finish within one sprint".to_string(),
        ];
        let plan = default_planner()
            .create_plan("Optimize data layer", "", &constraints)
            .unwrap();

        let preconditions = &plan.steps[0].preconditions;
        assert_eq!(preconditions[0], "Clear goal definition");
        assert!(preconditions.contains(&"Read-only access to production".to_string()));
        assert!(preconditions.contains(&"Finish within one sprint".to_string()));
        assert_eq!(plan.steps[1].preconditions, vec!["Task breakdown completed"]);
        assert_eq!(
            plan.steps[2].preconditions,
            vec!["Tools selected and configured"]
        );
    }

    #[test]
    fn test_confidence_for_matches_plan_step_confidences() {
        let planner = default_planner();
        let goal = "Optimize data layer";
        let context = "prior rollout hit lock contention";
        let plan = planner.create_plan(goal, context, &[]).unwrap();

        assert_eq!(
            plan.steps[0].confidence,
            planner.confidence_for(PlanPhase::Decomposition, goal, context)
        );
        assert_eq!(
            plan.steps[1].confidence,
            planner.confidence_for(PlanPhase::ToolSelection, goal, context)
        );
        assert_eq!(
            plan.steps[2].confidence,
            planner.confidence_for(PlanPhase::AdaptiveExecution, goal, context)
        );
    }

    #[test]
    fn test_confidence_for_clamps_raw_estimates() {
        let planner = Planner::new(CoreConfig::default(), FixedConfidence(1.8)).unwrap();
        assert_eq!(
            planner.confidence_for(PlanPhase::Decomposition, "Ship it", ""),
            1.0
        );

        let planner = Planner::new(CoreConfig::default(), FixedConfidence(-0.3)).unwrap();
        assert_eq!(
            planner.confidence_for(PlanPhase::ToolSelection, "Ship it", ""),
            0.0
        );
    }

    #[test]
    fn test_baseline_confidence_phase_bases() {
        let model = BaselineConfidence;
        let goal = "Optimize data layer";
        assert_eq!(model.confidence(PlanPhase::Decomposition, goal, ""), 0.90);
        assert_eq!(model.confidence(PlanPhase::ToolSelection, goal, ""), 0.85);
        assert_eq!(
            model.confidence(PlanPhase::AdaptiveExecution, goal, ""),
            0.88
        );
    }

    #[test]
    fn test_context_raises_baseline_confidence() {
        let model = BaselineConfidence;
        let goal = "Optimize data layer";
        let bare = model.confidence(PlanPhase::Decomposition, goal, "");
        let informed = model.confidence(
            PlanPhase::Decomposition,
            goal,
            "previous attempt stalled on index rebuilds",
        );
        assert!(informed > bare);
    }

    #[test]
    fn test_sparse_goal_lowers_baseline_confidence() {
        let model = BaselineConfidence;
        let full = model.confidence(PlanPhase::ToolSelection, "Optimize data layer", "");
        let sparse = model.confidence(PlanPhase::ToolSelection, "optimize", "");
        assert!(sparse < full);
    }

    #[test]
    fn test_step_confidence_clamped() {
        let config = CoreConfig::default();

        let high = Planner::new(config.clone(), FixedConfidence(7.3))
            .unwrap()
            .create_plan("Optimize data layer", "", &[])
            .unwrap();
        assert!(high.steps.iter().all(|s| s.confidence == 1.0));

        let low = Planner::new(config, FixedConfidence(-3.0))
            .unwrap()
            .create_plan("Optimize data layer", "", &[])
            .unwrap();
        assert!(low.steps.iter().all(|s| s.confidence == 0.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CoreConfig {
            overrun_factor: 0.5,
            ..CoreConfig::default()
        };
        assert!(Planner::with_default_model(config).is_err());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use quorum_core::PlanStatus;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_any_nonempty_goal_yields_draft_skeleton(
            goal in "[a-zA-Z][a-zA-Z0-9 ]{0,60}",
        ) {
            prop_assume!(!goal.trim().is_empty());
            let planner = Planner::with_default_model(CoreConfig::default()).unwrap();
            let plan = planner.create_plan(&goal, "", &[]).unwrap();

            prop_assert_eq!(plan.steps.len(), 3);
            prop_assert_eq!(plan.status, PlanStatus::Draft);
            prop_assert_eq!(plan.alternatives.len(), 1);
            prop_assert!(!plan.risks.is_empty());
            prop_assert!(plan.validate().is_ok());
        }

        #[test]
        fn prop_baseline_confidence_stays_in_unit_range(
            goal in ".{0,80}",
            context in ".{0,80}",
        ) {
            let model = BaselineConfidence;
            for phase in [
                PlanPhase::Decomposition,
                PlanPhase::ToolSelection,
                PlanPhase::AdaptiveExecution,
            ] {
                let estimate = model.confidence(phase, &goal, &context);
                prop_assert!((0.0..=1.0).contains(&estimate));
            }
        }

        #[test]
        fn prop_trigger_text_matches_configured_factor(
            factor in 1.01f64..10.0,
        ) {
            let config = CoreConfig {
                overrun_factor: factor,
                ..CoreConfig::default()
            };
            let expected = config.overrun_trigger_text();
            let plan = Planner::with_default_model(config)
                .unwrap()
                .create_plan("Optimize data layer", "", &[])
                .unwrap();
            prop_assert_eq!(&plan.alternatives[0].trigger, &expected);
        }

        #[test]
        fn prop_step_confidences_always_clamped(
            raw in -10.0f64..10.0,
        ) {
            struct Fixed(f64);
            impl ConfidenceModel for Fixed {
                fn confidence(&self, _phase: PlanPhase, _goal: &str, _context: &str) -> f64 {
                    self.0
                }
            }

            let plan = Planner::new(CoreConfig::default(), Fixed(raw))
                .unwrap()
                .create_plan("Optimize data layer", "", &[])
                .unwrap();
            for step in &plan.steps {
                prop_assert!((0.0..=1.0).contains(&step.confidence));
            }
        }
    }
}
