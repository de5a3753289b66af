//! Agent profile and state-machine types.
//!
//! An agent is an autonomous worker with a role, a coordination state, four
//! memory layers, performance counters, and an optional owned plan. Profiles
//! are plain data; the registry crate owns all mutation discipline.

use crate::identity::{AgentId, Timestamp};
use crate::memory::MemoryStats;
use crate::plan::Plan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// AGENT STATE
// ============================================================================

/// Coordination state of an agent. `Offline` is the resting state; there is
/// no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AgentState {
    /// Active and waiting for work
    Idle,
    /// Working out what an assigned task requires
    Reasoning,
    /// Building or adopting a plan
    Planning,
    /// Executing the current plan
    Executing,
    /// Reviewing recent work (transient, restored to the prior state)
    Reflecting,
    /// Coordinating with another agent (transient, restored to the prior state)
    Collaborating,
    /// Deactivated; only `start` leaves this state
    #[default]
    Offline,
}

impl AgentState {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AgentState::Idle => "Idle",
            AgentState::Reasoning => "Reasoning",
            AgentState::Planning => "Planning",
            AgentState::Executing => "Executing",
            AgentState::Reflecting => "Reflecting",
            AgentState::Collaborating => "Collaborating",
            AgentState::Offline => "Offline",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, AgentStateParseError> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(AgentState::Idle),
            "reasoning" => Ok(AgentState::Reasoning),
            "planning" => Ok(AgentState::Planning),
            "executing" => Ok(AgentState::Executing),
            "reflecting" => Ok(AgentState::Reflecting),
            "collaborating" => Ok(AgentState::Collaborating),
            "offline" => Ok(AgentState::Offline),
            _ => Err(AgentStateParseError(s.to_string())),
        }
    }

    /// Whether this state accepts reflection and collaboration pass-throughs.
    pub fn is_active(&self) -> bool {
        !matches!(self, AgentState::Offline)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AgentState {
    type Err = AgentStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid agent state string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStateParseError(pub String);

impl fmt::Display for AgentStateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent state: {}", self.0)
    }
}

impl std::error::Error for AgentStateParseError {}

// ============================================================================
// AGENT KIND
// ============================================================================

/// Role an agent plays in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AgentKind {
    /// Orchestrates task distribution across the fleet
    Coordinator,
    /// Generates and refactors code
    CodeGen,
    /// Reviews work produced by other agents
    Reviewer,
    /// Designs and runs test suites
    Tester,
    /// Writes and maintains documentation
    DocWriter,
    /// Handles rollout and release work
    Deployer,
    /// Tunes models and curates training signals
    Learner,
}

impl AgentKind {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AgentKind::Coordinator => "Coordinator",
            AgentKind::CodeGen => "CodeGen",
            AgentKind::Reviewer => "Reviewer",
            AgentKind::Tester => "Tester",
            AgentKind::DocWriter => "DocWriter",
            AgentKind::Deployer => "Deployer",
            AgentKind::Learner => "Learner",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, AgentKindParseError> {
        match s.to_lowercase().replace(['_', '-'], "").as_str() {
            "coordinator" => Ok(AgentKind::Coordinator),
            "codegen" => Ok(AgentKind::CodeGen),
            "reviewer" => Ok(AgentKind::Reviewer),
            "tester" => Ok(AgentKind::Tester),
            "docwriter" | "docs" => Ok(AgentKind::DocWriter),
            "deployer" | "deploy" => Ok(AgentKind::Deployer),
            "learner" | "learning" => Ok(AgentKind::Learner),
            _ => Err(AgentKindParseError(s.to_string())),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AgentKind {
    type Err = AgentKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid agent kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentKindParseError(pub String);

impl fmt::Display for AgentKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent kind: {}", self.0)
    }
}

impl std::error::Error for AgentKindParseError {}

// ============================================================================
// AGENT PRIORITY
// ============================================================================

/// Scheduling priority of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AgentPriority {
    /// Low priority - can be delayed
    Low,
    /// Normal priority
    #[default]
    Normal,
    /// High priority - should be scheduled soon
    High,
    /// Critical - must be scheduled immediately
    Critical,
}

impl AgentPriority {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AgentPriority::Low => "Low",
            AgentPriority::Normal => "Normal",
            AgentPriority::High => "High",
            AgentPriority::Critical => "Critical",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, AgentPriorityParseError> {
        match s.to_lowercase().as_str() {
            "low" => Ok(AgentPriority::Low),
            "normal" | "medium" => Ok(AgentPriority::Normal),
            "high" => Ok(AgentPriority::High),
            "critical" => Ok(AgentPriority::Critical),
            _ => Err(AgentPriorityParseError(s.to_string())),
        }
    }
}

impl fmt::Display for AgentPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AgentPriority {
    type Err = AgentPriorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid agent priority string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPriorityParseError(pub String);

impl fmt::Display for AgentPriorityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent priority: {}", self.0)
    }
}

impl std::error::Error for AgentPriorityParseError {}

// ============================================================================
// PERFORMANCE AND TOOL STATS
// ============================================================================

/// Task throughput counters for one agent.
///
/// Invariant: `completed_tasks + failed_tasks <= total_tasks`. Tasks are
/// counted into `total_tasks` at assignment and settle into one of the
/// outcome counters when execution finishes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PerformanceStats {
    /// Tasks ever assigned to this agent
    pub total_tasks: u64,
    /// Tasks that finished successfully
    pub completed_tasks: u64,
    /// Tasks that finished in failure
    pub failed_tasks: u64,
    /// Running mean of task duration in milliseconds
    pub avg_response_time_ms: f64,
}

impl PerformanceStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Success rate as a percentage of settled tasks (0.0 when none settled).
    pub fn success_rate(&self) -> f64 {
        let settled = self.completed_tasks + self.failed_tasks;
        if settled == 0 {
            return 0.0;
        }
        (self.completed_tasks as f64 / settled as f64) * 100.0
    }

    /// Record a settled task, folding its duration into the running mean.
    pub fn record_outcome(&mut self, success: bool, duration_ms: f64) {
        if success {
            self.completed_tasks += 1;
        } else {
            self.failed_tasks += 1;
        }
        let settled = (self.completed_tasks + self.failed_tasks) as f64;
        self.avg_response_time_ms += (duration_ms - self.avg_response_time_ms) / settled;
    }

    /// Whether the counter invariant holds.
    pub fn is_balanced(&self) -> bool {
        self.completed_tasks + self.failed_tasks <= self.total_tasks
    }
}

/// Usage and effectiveness of one tool available to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ToolStats {
    /// Tool name (e.g. "ast-parser")
    pub name: String,
    /// Tool category (e.g. "analysis", "generation")
    pub category: String,
    /// Times the tool has been invoked
    pub usage_count: u64,
    /// Observed effectiveness, clamped to [0.0, 1.0]
    pub effectiveness: f64,
}

impl ToolStats {
    /// Create a tool entry with effectiveness clamped to [0.0, 1.0].
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        effectiveness: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            usage_count: 0,
            effectiveness: effectiveness.clamp(0.0, 1.0),
        }
    }

    /// Count one invocation.
    pub fn record_use(&mut self) {
        self.usage_count += 1;
    }

    /// Shift effectiveness by `delta`, staying inside [0.0, 1.0].
    pub fn nudge_effectiveness(&mut self, delta: f64) {
        self.effectiveness = (self.effectiveness + delta).clamp(0.0, 1.0);
    }
}

// ============================================================================
// AGENT PROFILE
// ============================================================================

/// A registered agent: identity, role, coordination state, memory layers,
/// counters, and the optionally owned current plan.
///
/// Collaborators are stored as id back-references and resolved through the
/// registry at read time; profiles never own other profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentProfile {
    /// Unique agent identifier
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    /// Human-readable name (e.g. "QD Coordinator Prime")
    pub name: String,
    /// Role in the fleet
    pub kind: AgentKind,
    /// Current coordination state
    pub status: AgentState,
    /// Scheduling priority
    pub priority: AgentPriority,
    /// Whether the agent participates in coordination
    pub is_active: bool,
    /// Declared capabilities (free-form labels)
    pub capabilities: Vec<String>,
    /// Model ids this agent prefers for reasoning calls
    pub preferred_models: Vec<String>,
    /// Tools available to the agent with usage stats
    pub tools: Vec<ToolStats>,
    /// Task throughput counters
    pub performance: PerformanceStats,
    /// Four-layer memory counters
    pub memory: MemoryStats,
    /// Tasks queued but not yet settled
    pub queue_length: u32,
    /// Plan currently owned by this agent, if any
    pub current_plan: Option<Plan>,
    /// Learning velocity, non-negative
    pub learning_velocity: f64,
    /// Knowledge transfers initiated by this agent
    pub knowledge_transfers: u64,
    /// Reflections performed recently
    pub recent_reflections: u64,
    /// Ids of agents this one has collaborated with
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub collaborators: Vec<AgentId>,
    /// Creation timestamp
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    /// Last state change or heartbeat
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub last_active: Timestamp,
}

impl AgentProfile {
    /// Create a new offline agent with empty counters.
    pub fn new(name: impl Into<String>, kind: AgentKind) -> Self {
        let now = chrono::Utc::now();
        Self {
            agent_id: AgentId::now_v7(),
            name: name.into(),
            kind,
            status: AgentState::Offline,
            priority: AgentPriority::Normal,
            is_active: false,
            capabilities: Vec::new(),
            preferred_models: Vec::new(),
            tools: Vec::new(),
            performance: PerformanceStats::new(),
            memory: MemoryStats::default(),
            queue_length: 0,
            current_plan: None,
            learning_velocity: 0.0,
            knowledge_transfers: 0,
            recent_reflections: 0,
            collaborators: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// Set the scheduling priority.
    pub fn with_priority(mut self, priority: AgentPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Add one capability label.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Replace the capability set.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Add a preferred model id.
    pub fn with_preferred_model(mut self, model_id: impl Into<String>) -> Self {
        self.preferred_models.push(model_id.into());
        self
    }

    /// Add a tool entry.
    pub fn with_tool(mut self, tool: ToolStats) -> Self {
        self.tools.push(tool);
        self
    }

    /// Seed the memory counters.
    pub fn with_memory(mut self, memory: MemoryStats) -> Self {
        self.memory = memory;
        self
    }

    /// Set learning velocity (negative values are floored to zero).
    pub fn with_learning_velocity(mut self, velocity: f64) -> Self {
        self.learning_velocity = velocity.max(0.0);
        self
    }

    /// Whether the agent declares the given capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Whether the agent can accept reflection/collaboration right now.
    pub fn is_operational(&self) -> bool {
        self.is_active && self.status.is_active()
    }

    /// Record activity at the current instant.
    pub fn touch(&mut self) {
        self.last_active = chrono::Utc::now();
    }

    /// Success rate as a percentage of settled tasks.
    pub fn success_rate(&self) -> f64 {
        self.performance.success_rate()
    }

    /// Register a collaborator id, keeping the list free of duplicates and
    /// self-references.
    pub fn add_collaborator(&mut self, partner: AgentId) {
        if partner != self.agent_id && !self.collaborators.contains(&partner) {
            self.collaborators.push(partner);
        }
    }
}

// ============================================================================
// DISPATCH SIDE ARTIFACTS
// ============================================================================

/// Result of a reflection pass-through: what the agent noticed, what it will
/// change, and what it learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReflectionOutcome {
    /// Agent that reflected
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    /// Optional focus supplied by the caller
    pub focus: Option<String>,
    /// Observations about recent work
    pub insights: Vec<String>,
    /// Behavioural adjustments the agent will make
    pub improvements: Vec<String>,
    /// Knowledge worth keeping
    pub new_knowledge: Vec<String>,
    /// When the reflection ran
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

/// Result of a collaboration pass-through between two agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CollaborationOutcome {
    /// Agent that initiated the collaboration
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub initiator: AgentId,
    /// Agent that joined
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub partner: AgentId,
    /// Shared objective text
    pub objective: String,
    /// What the pair expects to get out of the collaboration
    pub expected_outcomes: Vec<String>,
    /// When the collaboration was initiated
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

// ============================================================================
// REASONING CHAIN
// ============================================================================

/// One step of a reasoning chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReasoningStep {
    /// Short label ("Analyze request")
    pub label: String,
    /// What the agent concluded at this step
    pub observation: String,
    /// Confidence in the conclusion, clamped to [0.0, 1.0]
    pub confidence: f64,
}

impl ReasoningStep {
    /// Create a step with confidence clamped to [0.0, 1.0].
    pub fn new(
        label: impl Into<String>,
        observation: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            label: label.into(),
            observation: observation.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Ordered reasoning steps produced for one task, usually by driving the
/// completion provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReasoningChain {
    /// Agent the chain was produced for
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    /// Task the chain addresses
    pub task: String,
    /// Ordered steps
    pub steps: Vec<ReasoningStep>,
    /// Model that produced the observations, when one was used
    pub model_id: Option<String>,
    /// When the chain was produced
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl ReasoningChain {
    /// Create an empty chain for a task.
    pub fn new(agent_id: AgentId, task: impl Into<String>) -> Self {
        Self {
            agent_id,
            task: task.into(),
            steps: Vec::new(),
            model_id: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// Record the model that produced the observations.
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Append a step.
    pub fn push_step(&mut self, step: ReasoningStep) {
        self.steps.push(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_is_offline() {
        let agent = AgentProfile::new("QD Coordinator Prime", AgentKind::Coordinator);
        assert_eq!(agent.status, AgentState::Offline);
        assert!(!agent.is_active);
        assert!(!agent.is_operational());
        assert_eq!(agent.queue_length, 0);
        assert!(agent.current_plan.is_none());
    }

    #[test]
    fn test_agent_state_roundtrip() {
        for state in [
            AgentState::Idle,
            AgentState::Reasoning,
            AgentState::Planning,
            AgentState::Executing,
            AgentState::Reflecting,
            AgentState::Collaborating,
            AgentState::Offline,
        ] {
            let parsed = AgentState::from_db_str(state.as_db_str()).unwrap();
            assert_eq!(parsed, state);
        }
    }

    #[test]
    fn test_agent_state_parse_rejects_unknown() {
        assert!(AgentState::from_db_str("hibernating").is_err());
    }

    #[test]
    fn test_agent_kind_accepts_legacy_names() {
        assert_eq!(AgentKind::from_db_str("docs").unwrap(), AgentKind::DocWriter);
        assert_eq!(AgentKind::from_db_str("deploy").unwrap(), AgentKind::Deployer);
        assert_eq!(AgentKind::from_db_str("learning").unwrap(), AgentKind::Learner);
    }

    #[test]
    fn test_priority_accepts_medium_alias() {
        assert_eq!(
            AgentPriority::from_db_str("medium").unwrap(),
            AgentPriority::Normal
        );
    }

    #[test]
    fn test_success_rate_with_no_settled_tasks() {
        let stats = PerformanceStats::new();
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_record_outcome_updates_counters_and_mean() {
        let mut stats = PerformanceStats {
            total_tasks: 2,
            ..Default::default()
        };
        stats.record_outcome(true, 1000.0);
        stats.record_outcome(false, 3000.0);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.failed_tasks, 1);
        assert!((stats.avg_response_time_ms - 2000.0).abs() < f64::EPSILON);
        assert!(stats.is_balanced());
        assert!((stats.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_counter_invariant_example() {
        let stats = PerformanceStats {
            total_tasks: 923,
            completed_tasks: 894,
            failed_tasks: 29,
            avg_response_time_ms: 2340.0,
        };
        assert!(stats.is_balanced());
    }

    #[test]
    fn test_tool_effectiveness_clamped() {
        let tool = ToolStats::new("ast-parser", "analysis", 1.7);
        assert_eq!(tool.effectiveness, 1.0);

        let mut tool = ToolStats::new("linter", "analysis", 0.95);
        tool.nudge_effectiveness(0.2);
        assert_eq!(tool.effectiveness, 1.0);
        tool.nudge_effectiveness(-2.0);
        assert_eq!(tool.effectiveness, 0.0);
    }

    #[test]
    fn test_add_collaborator_dedupes_and_rejects_self() {
        let mut agent = AgentProfile::new("QD Reviewer", AgentKind::Reviewer);
        let partner = AgentId::now_v7();
        let own_id = agent.agent_id;

        agent.add_collaborator(partner);
        agent.add_collaborator(partner);
        agent.add_collaborator(own_id);

        assert_eq!(agent.collaborators, vec![partner]);
    }

    #[test]
    fn test_reasoning_step_confidence_clamped() {
        let step = ReasoningStep::new("Analyze request", "task decomposed", 1.4);
        assert_eq!(step.confidence, 1.0);
    }

    #[test]
    fn test_learning_velocity_floored_at_zero() {
        let agent =
            AgentProfile::new("QD Learner", AgentKind::Learner).with_learning_velocity(-3.0);
        assert_eq!(agent.learning_velocity, 0.0);
    }
}
