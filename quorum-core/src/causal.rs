//! Causal-chain types.
//!
//! A chain explains an observed event as an ordered list of levels, from the
//! immediate trigger (level 0, highest confidence) down to the root cause.
//! Confidence is non-increasing with depth; that ordering is a hard invariant
//! enforced at construction, not a heuristic artifact.

use crate::error::{InvariantError, QuorumResult, ValidationError};
use crate::identity::Timestamp;
use serde::{Deserialize, Serialize};

/// One level of a causal chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CausalLevel {
    /// The cause at this depth
    pub cause: String,
    /// Evidence supporting the cause; never empty
    pub evidence: String,
    /// Confidence in this cause, clamped to [0.0, 1.0]
    pub confidence: f64,
}

impl CausalLevel {
    /// Create a level with confidence clamped to [0.0, 1.0].
    pub fn new(cause: impl Into<String>, evidence: impl Into<String>, confidence: f64) -> Self {
        Self {
            cause: cause.into(),
            evidence: evidence.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Ordered cause-to-root-cause explanation of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CausalChain {
    /// The event being explained
    pub event: String,
    /// Levels from immediate trigger to root cause
    pub levels: Vec<CausalLevel>,
    /// When the chain was derived
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl CausalChain {
    /// Create an empty chain for an event.
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            levels: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Append a level, rejecting empty evidence and any confidence increase
    /// over the previous level.
    pub fn push_level(&mut self, level: CausalLevel) -> QuorumResult<()> {
        if level.evidence.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "evidence".to_string(),
            }
            .into());
        }
        if let Some(previous) = self.levels.last() {
            if level.confidence > previous.confidence {
                return Err(InvariantError::ConfidenceOrder {
                    index: self.levels.len(),
                    previous: previous.confidence,
                    current: level.confidence,
                }
                .into());
            }
        }
        self.levels.push(level);
        Ok(())
    }

    /// The immediate trigger, if the chain has any levels.
    pub fn immediate_trigger(&self) -> Option<&CausalLevel> {
        self.levels.first()
    }

    /// The deepest (root) cause, if the chain has any levels.
    pub fn root_cause(&self) -> Option<&CausalLevel> {
        self.levels.last()
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Defensive re-check of the confidence ordering.
    pub fn validate(&self) -> QuorumResult<()> {
        for (index, window) in self.levels.windows(2).enumerate() {
            if window[1].confidence > window[0].confidence {
                return Err(InvariantError::ConfidenceOrder {
                    index: index + 1,
                    previous: window[0].confidence,
                    current: window[1].confidence,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// A causal chain plus what to do about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CausalReport {
    /// The derived chain
    pub chain: CausalChain,
    /// One recommendation per level, addressing that level's cause
    pub recommendations: Vec<String>,
    /// Forward-looking measures derived from the root cause
    pub preventive_measures: Vec<String>,
}
