//! Error types for the QUORUM coordination core.
//!
//! Domain errors are grouped into small enums and rolled into the master
//! [`QuorumError`]. Every failure maps onto one of five coarse kinds via
//! [`QuorumError::kind`] so callers can branch without matching the full
//! variant tree.

use crate::agent::AgentState;
use crate::identity::AgentId;
use thiserror::Error;

/// Registry and state-machine errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("Agent not found: {id}")]
    AgentNotFound { id: AgentId },

    #[error("Agent {agent_id} has no current plan")]
    PlanNotFound { agent_id: AgentId },

    #[error("Action {action} is not valid in state {state}")]
    InvalidAction { action: String, state: AgentState },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },
}

/// Failures of external collaborators (completion service, secret store).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("No {provider} provider configured")]
    ProviderNotConfigured { provider: String },

    #[error("Completion request for model {model} failed: {reason}")]
    CompletionFailed { model: String, reason: String },

    #[error("Secret store {operation} failed for {provider}: {reason}")]
    SecretStoreFailed {
        operation: String,
        provider: String,
        reason: String,
    },
}

/// Defensive internal checks. Reaching a caller signals a bug.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvariantError {
    #[error("Consolidation grew memory: {before_total} entries before, {after_total} after")]
    MemoryExpansion { before_total: u64, after_total: u64 },

    #[error("Causal confidence increased at level {index}: {previous} -> {current}")]
    ConfidenceOrder {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("Task counters out of balance: {completed} completed + {failed} failed > {total} total")]
    TaskCounters {
        completed: u64,
        failed: u64,
        total: u64,
    },

    #[error("Step accounting out of balance: {completed} completed of {total} steps")]
    StepAccounting { completed: usize, total: usize },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all QUORUM errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuorumError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ErrorKind {
    /// Unknown agent, plan, or provider id.
    NotFound,
    /// Action unrecognized or not legal in the current state.
    InvalidAction,
    /// Missing or malformed required field.
    ValidationError,
    /// Completion service or secret store call failed.
    UpstreamFailure,
    /// Defensive internal check failed.
    InvariantViolation,
}

impl QuorumError {
    /// Map any error onto its coarse kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuorumError::Registry(RegistryError::AgentNotFound { .. }) => ErrorKind::NotFound,
            QuorumError::Registry(RegistryError::PlanNotFound { .. }) => ErrorKind::NotFound,
            QuorumError::Registry(RegistryError::InvalidAction { .. }) => ErrorKind::InvalidAction,
            QuorumError::Validation(_) => ErrorKind::ValidationError,
            QuorumError::Upstream(_) => ErrorKind::UpstreamFailure,
            QuorumError::Invariant(_) => ErrorKind::InvariantViolation,
            QuorumError::Config(_) => ErrorKind::ValidationError,
        }
    }
}

/// Result type alias for QUORUM operations.
pub type QuorumResult<T> = Result<T, QuorumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kind() {
        let err: QuorumError = RegistryError::AgentNotFound {
            id: AgentId::now_v7(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_action_kind_and_message() {
        let err: QuorumError = RegistryError::InvalidAction {
            action: "assign-task".to_string(),
            state: AgentState::Executing,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidAction);
        assert!(err.to_string().contains("assign-task"));
        assert!(err.to_string().contains("Executing"));
    }

    #[test]
    fn test_validation_kind() {
        let err: QuorumError = ValidationError::RequiredFieldMissing {
            field: "goal".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_upstream_kind() {
        let err: QuorumError = UpstreamError::CompletionFailed {
            model: "gpt-4".to_string(),
            reason: "status 503".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    }

    #[test]
    fn test_invariant_kind() {
        let err: QuorumError = InvariantError::MemoryExpansion {
            before_total: 10,
            after_total: 12,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[test]
    fn test_config_maps_to_validation() {
        let err: QuorumError = ConfigError::InvalidValue {
            field: "overrun_factor".to_string(),
            value: "0.5".to_string(),
            reason: "must be greater than 1.0".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }
}
