//! Completion provider implementations
//!
//! This module contains concrete implementations of the CompletionProvider
//! trait for HTTP chat-completion services.

pub mod http;

pub use http::HttpCompletionProvider;

use quorum_core::{QuorumError, UpstreamError};

pub(crate) fn completion_failed(model: &str, reason: impl Into<String>) -> QuorumError {
    QuorumError::Upstream(UpstreamError::CompletionFailed {
        model: model.to_string(),
        reason: reason.into(),
    })
}

pub(crate) fn invalid_response(model: &str, reason: impl Into<String>) -> QuorumError {
    QuorumError::Upstream(UpstreamError::CompletionFailed {
        model: model.to_string(),
        reason: format!("invalid response: {}", reason.into()),
    })
}
