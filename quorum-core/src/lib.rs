//! QUORUM Core - Entity Types and Invariants
//!
//! Pure data structures for the multi-agent coordination core. All other
//! crates depend on this. Business logic lives upstream in `quorum-agents`,
//! `quorum-memory`, `quorum-planning`, `quorum-insight`, and `quorum-system`;
//! this crate owns the types they exchange and the invariants those types
//! enforce on construction.
//!
//! # Key Types
//!
//! - `AgentProfile`: a registered agent with state, stats, and memory counters
//! - `AgentState`: seven-state lifecycle (Idle through Offline)
//! - `Plan` / `PlanStep` / `PlanAlternative` / `RiskFactor`: structured plans
//! - `MemoryStats` / `ConsolidationReport`: memory accounting
//! - `KnowledgeTransferRecord`: immutable transfer evidence
//! - `CausalChain` / `CausalReport`: root-cause analysis results
//! - `CoordinationEvent` / `EmergentBehavior`: coordination history
//! - `SystemMetrics` / `HealthReport`: system-level health scoring
//! - `QuorumError` / `ErrorKind`: the error taxonomy shared by every crate
//!
//! # Invariants
//!
//! Types here reject invalid states at construction or mutation time:
//! confidences and probabilities are clamped to [0.0, 1.0], causal
//! confidences may never increase with depth, consolidation may never
//! grow the total memory count, and coordination events require at
//! least two distinct participants.

mod agent;
mod causal;
mod config;
mod coordination;
mod error;
mod health;
mod identity;
mod memory;
mod metrics;
mod plan;
mod transfer;

pub use agent::{
    AgentKind, AgentKindParseError, AgentPriority, AgentPriorityParseError, AgentProfile,
    AgentState, AgentStateParseError, CollaborationOutcome, PerformanceStats, ReasoningChain,
    ReasoningStep, ReflectionOutcome, ToolStats,
};
pub use causal::{CausalChain, CausalLevel, CausalReport};
pub use config::CoreConfig;
pub use coordination::{
    BehaviorImpact, CoordinationEvent, CoordinationKind, CoordinationKindParseError,
    EmergentBehavior, OutcomeKind, OutcomeKindParseError,
};
pub use error::{
    ConfigError, ErrorKind, InvariantError, QuorumError, QuorumResult, RegistryError,
    UpstreamError, ValidationError,
};
pub use health::{health_report, health_score, HealthLabel, HealthLabelParseError, HealthReport};
pub use identity::{
    compute_content_hash, AgentId, ContentHash, DurationMs, EntityIdType, EventId, PlanId,
    StepId, Timestamp, TraceId, TransferId,
};
pub use memory::{ConsolidationReport, MemoryStats, MemoryTrace};
pub use metrics::{SystemMetrics, SystemState, SystemSummary};
pub use plan::{
    Plan, PlanAlternative, PlanStatus, PlanStatusParseError, PlanStep, RiskFactor, StepStatus,
    StepStatusParseError,
};
pub use transfer::KnowledgeTransferRecord;
