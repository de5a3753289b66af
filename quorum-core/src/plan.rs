//! Adaptive plan types: ordered steps, conditional alternatives, and risk
//! assessment.
//!
//! A plan is created Draft by the planning engine, adopted by exactly one
//! agent (Active), moved to Executing by the `plan-ready` action, and settled
//! Completed or Failed by the caller driving execution.

use crate::error::{InvariantError, QuorumResult, ValidationError};
use crate::identity::{AgentId, DurationMs, PlanId, StepId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PLAN STATUS
// ============================================================================

/// Lifecycle status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum PlanStatus {
    /// Built but not yet owned by an agent
    #[default]
    Draft,
    /// Adopted by an agent, waiting to start
    Active,
    /// Work in progress
    Executing,
    /// All work finished successfully
    Completed,
    /// Terminally failed
    Failed,
}

impl PlanStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PlanStatus::Draft => "Draft",
            PlanStatus::Active => "Active",
            PlanStatus::Executing => "Executing",
            PlanStatus::Completed => "Completed",
            PlanStatus::Failed => "Failed",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, PlanStatusParseError> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PlanStatus::Draft),
            "active" => Ok(PlanStatus::Active),
            "executing" => Ok(PlanStatus::Executing),
            "completed" => Ok(PlanStatus::Completed),
            "failed" => Ok(PlanStatus::Failed),
            _ => Err(PlanStatusParseError(s.to_string())),
        }
    }

    /// Whether the plan can still change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Completed | PlanStatus::Failed)
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for PlanStatus {
    type Err = PlanStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid plan status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStatusParseError(pub String);

impl fmt::Display for PlanStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid plan status: {}", self.0)
    }
}

impl std::error::Error for PlanStatusParseError {}

// ============================================================================
// STEP STATUS
// ============================================================================

/// Lifecycle status of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum StepStatus {
    /// Not started
    #[default]
    Pending,
    /// Currently being worked
    InProgress,
    /// Finished successfully
    Completed,
    /// Finished in failure
    Failed,
    /// Intentionally not executed
    Skipped,
}

impl StepStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "Pending",
            StepStatus::InProgress => "InProgress",
            StepStatus::Completed => "Completed",
            StepStatus::Failed => "Failed",
            StepStatus::Skipped => "Skipped",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, StepStatusParseError> {
        match s.to_lowercase().replace('_', "").as_str() {
            "pending" => Ok(StepStatus::Pending),
            "inprogress" => Ok(StepStatus::InProgress),
            "completed" => Ok(StepStatus::Completed),
            "failed" => Ok(StepStatus::Failed),
            "skipped" => Ok(StepStatus::Skipped),
            _ => Err(StepStatusParseError(s.to_string())),
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for StepStatus {
    type Err = StepStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid step status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatusParseError(pub String);

impl fmt::Display for StepStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid step status: {}", self.0)
    }
}

impl std::error::Error for StepStatusParseError {}

// ============================================================================
// PLAN STEP
// ============================================================================

/// One ordered step of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlanStep {
    /// Unique step identifier
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub step_id: StepId,
    /// Position in the plan, starting at 0
    pub index: u32,
    /// What this step does
    pub description: String,
    /// Ids of earlier steps this one depends on
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub depends_on: Vec<StepId>,
    /// Conditions that must hold before the step starts
    pub preconditions: Vec<String>,
    /// What the step is expected to produce
    pub expected_outcome: String,
    /// Current status
    pub status: StepStatus,
    /// Estimated confidence the step succeeds, clamped to [0.0, 1.0]
    pub confidence: f64,
}

impl PlanStep {
    /// Create a pending step with a fresh id.
    pub fn new(index: u32, description: impl Into<String>) -> Self {
        Self {
            step_id: StepId::now_v7(),
            index,
            description: description.into(),
            depends_on: Vec::new(),
            preconditions: Vec::new(),
            expected_outcome: String::new(),
            status: StepStatus::Pending,
            confidence: 0.5,
        }
    }

    /// Add a dependency on an earlier step.
    pub fn with_dependency(mut self, step_id: StepId) -> Self {
        self.depends_on.push(step_id);
        self
    }

    /// Add a precondition.
    pub fn with_precondition(mut self, precondition: impl Into<String>) -> Self {
        self.preconditions.push(precondition.into());
        self
    }

    /// Set the expected outcome.
    pub fn with_expected_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.expected_outcome = outcome.into();
        self
    }

    /// Set confidence, clamped to [0.0, 1.0].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

// ============================================================================
// ALTERNATIVES AND RISK
// ============================================================================

/// A fallback approach attached to a plan, fired when its trigger condition
/// is observed by the caller driving execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlanAlternative {
    /// Condition under which this alternative applies
    pub trigger: String,
    /// What to do instead
    pub approach: String,
    /// Selection priority among alternatives (1 = first choice)
    pub priority: u32,
}

impl PlanAlternative {
    /// Create an alternative with priority 1.
    pub fn new(trigger: impl Into<String>, approach: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            approach: approach.into(),
            priority: 1,
        }
    }

    /// Set the selection priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

/// A risk identified for a plan, with probability and impact in [0.0, 1.0].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RiskFactor {
    /// Short description of the risk
    pub risk: String,
    /// Likelihood of the risk occurring, clamped to [0.0, 1.0]
    pub probability: f64,
    /// Severity if it occurs, clamped to [0.0, 1.0]
    pub impact: f64,
    /// How the risk will be handled
    pub mitigation: String,
}

impl RiskFactor {
    /// Create a risk with probability and impact clamped to [0.0, 1.0].
    pub fn new(
        risk: impl Into<String>,
        probability: f64,
        impact: f64,
        mitigation: impl Into<String>,
    ) -> Self {
        Self {
            risk: risk.into(),
            probability: probability.clamp(0.0, 1.0),
            impact: impact.clamp(0.0, 1.0),
            mitigation: mitigation.into(),
        }
    }

    /// Probability-weighted severity.
    pub fn exposure(&self) -> f64 {
        self.probability * self.impact
    }
}

// ============================================================================
// PLAN
// ============================================================================

/// A goal-directed plan owned by at most one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Plan {
    /// Unique plan identifier
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub plan_id: PlanId,
    /// Goal the plan pursues
    pub goal: String,
    /// Ordered steps
    pub steps: Vec<PlanStep>,
    /// Fallback approaches with trigger conditions
    pub alternatives: Vec<PlanAlternative>,
    /// Identified risks
    pub risks: Vec<RiskFactor>,
    /// Lifecycle status
    pub status: PlanStatus,
    /// Steps completed so far; never exceeds `steps.len()`
    pub completed_steps: u32,
    /// Estimated total duration in milliseconds
    pub estimated_duration_ms: DurationMs,
    /// Agent that adopted the plan, once Active
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub adopted_by: Option<AgentId>,
    /// Creation timestamp
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Plan {
    /// Create an empty Draft plan for a goal.
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            plan_id: PlanId::now_v7(),
            goal: goal.into(),
            steps: Vec::new(),
            alternatives: Vec::new(),
            risks: Vec::new(),
            status: PlanStatus::Draft,
            completed_steps: 0,
            estimated_duration_ms: 0,
            adopted_by: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// Append a step.
    pub fn add_step(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    /// Append an alternative.
    pub fn add_alternative(&mut self, alternative: PlanAlternative) {
        self.alternatives.push(alternative);
    }

    /// Append a risk.
    pub fn add_risk(&mut self, risk: RiskFactor) {
        self.risks.push(risk);
    }

    /// Set the duration estimate.
    pub fn with_estimated_duration(mut self, duration_ms: DurationMs) -> Self {
        self.estimated_duration_ms = duration_ms;
        self
    }

    /// An agent takes ownership: Draft -> Active.
    pub fn adopt(&mut self, agent_id: AgentId) -> QuorumResult<()> {
        if self.status != PlanStatus::Draft {
            return Err(ValidationError::ConstraintViolation {
                constraint: "plan adoption".to_string(),
                reason: format!("plan is {}, expected Draft", self.status),
            }
            .into());
        }
        self.status = PlanStatus::Active;
        self.adopted_by = Some(agent_id);
        Ok(())
    }

    /// Work begins: Active -> Executing.
    pub fn begin(&mut self) -> QuorumResult<()> {
        if self.status != PlanStatus::Active {
            return Err(ValidationError::ConstraintViolation {
                constraint: "plan start".to_string(),
                reason: format!("plan is {}, expected Active", self.status),
            }
            .into());
        }
        self.status = PlanStatus::Executing;
        Ok(())
    }

    /// Terminal success: Executing -> Completed.
    pub fn complete(&mut self) -> QuorumResult<()> {
        if self.status != PlanStatus::Executing {
            return Err(ValidationError::ConstraintViolation {
                constraint: "plan completion".to_string(),
                reason: format!("plan is {}, expected Executing", self.status),
            }
            .into());
        }
        self.status = PlanStatus::Completed;
        Ok(())
    }

    /// Terminal failure: Executing -> Failed.
    pub fn fail(&mut self) -> QuorumResult<()> {
        if self.status != PlanStatus::Executing {
            return Err(ValidationError::ConstraintViolation {
                constraint: "plan failure".to_string(),
                reason: format!("plan is {}, expected Executing", self.status),
            }
            .into());
        }
        self.status = PlanStatus::Failed;
        Ok(())
    }

    /// Mark one step completed and advance the progress counter.
    pub fn mark_step_complete(&mut self, step_id: StepId) -> QuorumResult<()> {
        let total = self.steps.len();
        let step = self
            .steps
            .iter_mut()
            .find(|s| s.step_id == step_id)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "step_id".to_string(),
                reason: format!("no step {} in plan", step_id),
            })?;

        if step.status == StepStatus::Completed {
            return Ok(());
        }
        step.status = StepStatus::Completed;
        self.completed_steps += 1;

        if self.completed_steps as usize > total {
            return Err(InvariantError::StepAccounting {
                completed: self.completed_steps as usize,
                total,
            }
            .into());
        }
        Ok(())
    }

    /// First pending step whose dependencies have all completed.
    pub fn next_pending_step(&self) -> Option<&PlanStep> {
        self.steps.iter().find(|step| {
            step.status == StepStatus::Pending
                && step.depends_on.iter().all(|dep| {
                    self.steps
                        .iter()
                        .any(|s| s.step_id == *dep && s.status == StepStatus::Completed)
                })
        })
    }

    /// Fraction of steps completed, in [0.0, 1.0].
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.completed_steps as f64 / self.steps.len() as f64
    }

    /// Structural checks: step accounting and dependency ordering.
    pub fn validate(&self) -> QuorumResult<()> {
        if self.completed_steps as usize > self.steps.len() {
            return Err(InvariantError::StepAccounting {
                completed: self.completed_steps as usize,
                total: self.steps.len(),
            }
            .into());
        }
        for (position, step) in self.steps.iter().enumerate() {
            for dep in &step.depends_on {
                let depends_on_prior = self.steps[..position].iter().any(|s| s.step_id == *dep);
                if !depends_on_prior {
                    return Err(ValidationError::ConstraintViolation {
                        constraint: "step dependencies".to_string(),
                        reason: format!(
                            "step {} depends on {} which is not an earlier step",
                            step.index, dep
                        ),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_step_plan() -> Plan {
        let mut plan = Plan::new("Optimize data layer");
        let first = PlanStep::new(0, "Decompose goal into subtasks").with_confidence(0.9);
        let second = PlanStep::new(1, "Select tools and approach")
            .with_dependency(first.step_id)
            .with_confidence(0.85);
        let third = PlanStep::new(2, "Execute adaptively")
            .with_dependency(second.step_id)
            .with_confidence(0.88);
        plan.add_step(first);
        plan.add_step(second);
        plan.add_step(third);
        plan
    }

    #[test]
    fn test_new_plan_is_draft() {
        let plan = Plan::new("Optimize data layer");
        assert_eq!(plan.status, PlanStatus::Draft);
        assert_eq!(plan.completed_steps, 0);
        assert!(plan.adopted_by.is_none());
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut plan = three_step_plan();
        let agent = AgentId::now_v7();

        plan.adopt(agent).unwrap();
        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.adopted_by, Some(agent));

        plan.begin().unwrap();
        assert_eq!(plan.status, PlanStatus::Executing);

        plan.complete().unwrap();
        assert_eq!(plan.status, PlanStatus::Completed);
        assert!(plan.status.is_terminal());
    }

    #[test]
    fn test_adopt_rejects_non_draft() {
        let mut plan = three_step_plan();
        plan.adopt(AgentId::now_v7()).unwrap();
        assert!(plan.adopt(AgentId::now_v7()).is_err());
    }

    #[test]
    fn test_begin_requires_active() {
        let mut plan = three_step_plan();
        assert!(plan.begin().is_err());
    }

    #[test]
    fn test_complete_requires_executing() {
        let mut plan = three_step_plan();
        plan.adopt(AgentId::now_v7()).unwrap();
        assert!(plan.complete().is_err());
        plan.begin().unwrap();
        plan.fail().unwrap();
        assert_eq!(plan.status, PlanStatus::Failed);
    }

    #[test]
    fn test_mark_step_complete_is_idempotent() {
        let mut plan = three_step_plan();
        let first = plan.steps[0].step_id;
        plan.mark_step_complete(first).unwrap();
        plan.mark_step_complete(first).unwrap();
        assert_eq!(plan.completed_steps, 1);
    }

    #[test]
    fn test_mark_step_complete_unknown_step() {
        let mut plan = three_step_plan();
        assert!(plan.mark_step_complete(StepId::now_v7()).is_err());
    }

    #[test]
    fn test_next_pending_step_respects_dependencies() {
        let mut plan = three_step_plan();
        assert_eq!(plan.next_pending_step().unwrap().index, 0);

        let first = plan.steps[0].step_id;
        plan.mark_step_complete(first).unwrap();
        assert_eq!(plan.next_pending_step().unwrap().index, 1);
    }

    #[test]
    fn test_validate_rejects_forward_dependency() {
        let mut plan = Plan::new("goal");
        let later = PlanStep::new(1, "later");
        let earlier = PlanStep::new(0, "earlier").with_dependency(later.step_id);
        plan.add_step(earlier);
        plan.add_step(later);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_risk_clamping_and_exposure() {
        let risk = RiskFactor::new("Data migration complexity", 1.5, -0.2, "Staged rollout");
        assert_eq!(risk.probability, 1.0);
        assert_eq!(risk.impact, 0.0);
        assert_eq!(risk.exposure(), 0.0);
    }

    #[test]
    fn test_plan_status_roundtrip() {
        for status in [
            PlanStatus::Draft,
            PlanStatus::Active,
            PlanStatus::Executing,
            PlanStatus::Completed,
            PlanStatus::Failed,
        ] {
            assert_eq!(PlanStatus::from_db_str(status.as_db_str()).unwrap(), status);
        }
        assert!(PlanStatus::from_db_str("paused").is_err());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_step_confidence_clamped(confidence in -2.0f64..3.0) {
            let step = PlanStep::new(0, "step").with_confidence(confidence);
            prop_assert!((0.0..=1.0).contains(&step.confidence));
        }

        #[test]
        fn prop_risk_fields_clamped(probability in -2.0f64..3.0, impact in -2.0f64..3.0) {
            let risk = RiskFactor::new("risk", probability, impact, "mitigation");
            prop_assert!((0.0..=1.0).contains(&risk.probability));
            prop_assert!((0.0..=1.0).contains(&risk.impact));
            prop_assert!((0.0..=1.0).contains(&risk.exposure()));
        }

        #[test]
        fn prop_completed_steps_never_exceed_total(step_count in 1usize..8, completions in proptest::collection::vec(0usize..8, 0..20)) {
            let mut plan = Plan::new("goal");
            for i in 0..step_count {
                plan.add_step(PlanStep::new(i as u32, format!("step {i}")));
            }
            let ids: Vec<StepId> = plan.steps.iter().map(|s| s.step_id).collect();
            for pick in completions {
                if let Some(id) = ids.get(pick) {
                    plan.mark_step_complete(*id).unwrap();
                }
            }
            prop_assert!(plan.completed_steps as usize <= plan.steps.len());
            prop_assert!((0.0..=1.0).contains(&plan.progress()));
        }
    }
}
