//! Coordination events and emergent-behavior types.

use crate::error::{QuorumResult, ValidationError};
use crate::identity::{AgentId, DurationMs, EventId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// COORDINATION KIND
// ============================================================================

/// What kind of multi-agent interaction an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CoordinationKind {
    /// One agent handed a task to another
    TaskHandoff,
    /// Agents planned a goal together
    JointPlanning,
    /// Knowledge moved between agents
    KnowledgeExchange,
    /// A disagreement was resolved
    ConflictResolution,
    /// General collaboration session
    Collaboration,
}

impl CoordinationKind {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            CoordinationKind::TaskHandoff => "TaskHandoff",
            CoordinationKind::JointPlanning => "JointPlanning",
            CoordinationKind::KnowledgeExchange => "KnowledgeExchange",
            CoordinationKind::ConflictResolution => "ConflictResolution",
            CoordinationKind::Collaboration => "Collaboration",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, CoordinationKindParseError> {
        match s.to_lowercase().replace(['_', '-'], "").as_str() {
            "taskhandoff" => Ok(CoordinationKind::TaskHandoff),
            "jointplanning" => Ok(CoordinationKind::JointPlanning),
            "knowledgeexchange" | "knowledgetransfer" => Ok(CoordinationKind::KnowledgeExchange),
            "conflictresolution" => Ok(CoordinationKind::ConflictResolution),
            "collaboration" => Ok(CoordinationKind::Collaboration),
            _ => Err(CoordinationKindParseError(s.to_string())),
        }
    }
}

impl fmt::Display for CoordinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for CoordinationKind {
    type Err = CoordinationKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid coordination kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationKindParseError(pub String);

impl fmt::Display for CoordinationKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid coordination kind: {}", self.0)
    }
}

impl std::error::Error for CoordinationKindParseError {}

// ============================================================================
// OUTCOME KIND
// ============================================================================

/// How a coordination event turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// The interaction achieved its objective
    Success,
    /// The interaction failed outright
    Failure,
    /// Mixed result
    Partial,
}

impl OutcomeKind {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Failure => "failure",
            OutcomeKind::Partial => "partial",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, OutcomeKindParseError> {
        match s.to_lowercase().as_str() {
            "success" => Ok(OutcomeKind::Success),
            "failure" => Ok(OutcomeKind::Failure),
            "partial" => Ok(OutcomeKind::Partial),
            _ => Err(OutcomeKindParseError(s.to_string())),
        }
    }

    /// Numeric score used when aggregating outcomes.
    pub fn score(&self) -> f64 {
        match self {
            OutcomeKind::Success => 1.0,
            OutcomeKind::Partial => 0.5,
            OutcomeKind::Failure => 0.0,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for OutcomeKind {
    type Err = OutcomeKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid outcome kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeKindParseError(pub String);

impl fmt::Display for OutcomeKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid outcome kind: {}", self.0)
    }
}

impl std::error::Error for OutcomeKindParseError {}

// ============================================================================
// COORDINATION EVENT
// ============================================================================

/// One logged multi-agent interaction. Events are append-only; they are
/// created, logged, and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CoordinationEvent {
    /// Unique event identifier
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub event_id: EventId,
    /// Kind of interaction
    pub kind: CoordinationKind,
    /// Agents involved; at least two, all distinct
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub participants: Vec<AgentId>,
    /// What happened
    pub description: String,
    /// How it turned out
    pub outcome: OutcomeKind,
    /// How long the interaction took
    pub duration_ms: DurationMs,
    /// Lessons recorded by the participants
    pub lessons: Vec<String>,
    /// When the interaction happened
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

impl CoordinationEvent {
    /// Create an event, validating that at least two distinct participants
    /// are involved.
    pub fn new(
        kind: CoordinationKind,
        participants: Vec<AgentId>,
        description: impl Into<String>,
        outcome: OutcomeKind,
        duration_ms: DurationMs,
    ) -> QuorumResult<Self> {
        let distinct: HashSet<AgentId> = participants.iter().copied().collect();
        if distinct.len() < 2 {
            return Err(ValidationError::ConstraintViolation {
                constraint: "participants".to_string(),
                reason: format!(
                    "coordination requires at least 2 distinct agents, got {}",
                    distinct.len()
                ),
            }
            .into());
        }
        Ok(Self {
            event_id: EventId::now_v7(),
            kind,
            participants,
            description: description.into(),
            outcome,
            duration_ms,
            lessons: Vec::new(),
            timestamp: chrono::Utc::now(),
        })
    }

    /// Attach a lesson.
    pub fn with_lesson(mut self, lesson: impl Into<String>) -> Self {
        self.lessons.push(lesson.into());
        self
    }
}

// ============================================================================
// EMERGENT BEHAVIOR
// ============================================================================

/// Classification of a recurring participant pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum BehaviorImpact {
    /// The pattern helps the fleet
    Positive,
    /// No clear effect either way
    Neutral,
    /// The pattern hurts the fleet
    Negative,
}

impl BehaviorImpact {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            BehaviorImpact::Positive => "positive",
            BehaviorImpact::Neutral => "neutral",
            BehaviorImpact::Negative => "negative",
        }
    }
}

impl fmt::Display for BehaviorImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// A recurring multi-agent pattern detected in the coordination log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EmergentBehavior {
    /// The recurring participant group, sorted by id
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub pattern: Vec<AgentId>,
    /// Human-readable description of the pattern
    pub description: String,
    /// How many logged events matched the pattern
    pub frequency: u64,
    /// Mean outcome score of the matching events, in [0.0, 1.0]
    pub effectiveness: f64,
    /// Net effect on the fleet
    pub impact: BehaviorImpact,
    /// What to do about the pattern
    pub recommendation: String,
}
