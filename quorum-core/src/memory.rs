//! Layered memory counters, working-set traces, and consolidation reports.

use crate::error::{InvariantError, QuorumResult};
use crate::identity::{compute_content_hash, AgentId, ContentHash, Timestamp, TraceId};
use serde::{Deserialize, Serialize};

// ============================================================================
// MEMORY LAYERS
// ============================================================================

/// Per-agent counters for the four memory layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MemoryStats {
    /// Entries held for the current task window
    pub short_term: u64,
    /// Durable entries and semantic links
    pub long_term: u64,
    /// Episode records of past task runs
    pub episodic: u64,
    /// Abstracted concepts and patterns
    pub semantic: u64,
}

impl MemoryStats {
    /// Create counters with explicit per-layer values.
    pub fn new(short_term: u64, long_term: u64, episodic: u64, semantic: u64) -> Self {
        Self {
            short_term,
            long_term,
            episodic,
            semantic,
        }
    }

    /// Total entries across all layers.
    pub fn total(&self) -> u64 {
        self.short_term + self.long_term + self.episodic + self.semantic
    }

    /// Whether all layers are empty.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// ============================================================================
// WORKING-SET TRACES
// ============================================================================

/// A short-term memory trace: one unit of recent observation carried in the
/// working set until consolidation absorbs or discards it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MemoryTrace {
    /// Unique trace identifier
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub trace_id: TraceId,
    /// Agent the trace belongs to
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    /// Observed content
    pub content: String,
    /// Importance weight, clamped to [0.0, 1.0]
    pub importance: f64,
    /// SHA-256 of the content, used for deduplication
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "byte"))]
    pub content_hash: ContentHash,
    /// When the trace was recorded
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl MemoryTrace {
    /// Record a trace, clamping importance to [0.0, 1.0].
    pub fn new(agent_id: AgentId, content: impl Into<String>, importance: f64) -> Self {
        let content = content.into();
        let content_hash = compute_content_hash(content.as_bytes());
        Self {
            trace_id: TraceId::now_v7(),
            agent_id,
            content,
            importance: importance.clamp(0.0, 1.0),
            content_hash,
            created_at: chrono::Utc::now(),
        }
    }
}

// ============================================================================
// CONSOLIDATION REPORT
// ============================================================================

/// Outcome of one consolidation pass over an agent's memory.
///
/// Consolidation is lossy compression: the after counters never exceed the
/// before counters in total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConsolidationReport {
    /// Agent whose memory was consolidated
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    /// Layer counters before the pass
    pub before: MemoryStats,
    /// Layer counters after the pass
    pub after: MemoryStats,
    /// Semantic clusters formed from short-term entries
    pub clusters_created: u64,
    /// Long-term links created between clustered entries
    pub semantic_links_created: u64,
    /// Importance-weighted fraction of entries retained, in [0.0, 1.0]
    pub retained_importance: f64,
    /// Human-readable summary of what the pass found
    pub insights: Vec<String>,
    /// When the pass ran
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

impl ConsolidationReport {
    /// Build a report, clamping `retained_importance` to [0.0, 1.0].
    pub fn new(
        agent_id: AgentId,
        before: MemoryStats,
        after: MemoryStats,
        clusters_created: u64,
        semantic_links_created: u64,
        retained_importance: f64,
    ) -> Self {
        Self {
            agent_id,
            before,
            after,
            clusters_created,
            semantic_links_created,
            retained_importance: retained_importance.clamp(0.0, 1.0),
            insights: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Attach an insight line.
    pub fn with_insight(mut self, insight: impl Into<String>) -> Self {
        self.insights.push(insight.into());
        self
    }

    /// Defensive check that consolidation only ever compressed.
    pub fn validate(&self) -> QuorumResult<()> {
        if self.after.total() > self.before.total() {
            return Err(InvariantError::MemoryExpansion {
                before_total: self.before.total(),
                after_total: self.after.total(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stats_total() {
        let stats = MemoryStats::new(156, 89, 45, 67);
        assert_eq!(stats.total(), 357);
        assert!(!stats.is_empty());
        assert!(MemoryStats::default().is_empty());
    }

    #[test]
    fn test_trace_importance_clamped_and_hashed() {
        let agent = AgentId::now_v7();
        let a = MemoryTrace::new(agent, "retry succeeded after backoff", 2.0);
        let b = MemoryTrace::new(agent, "retry succeeded after backoff", 0.4);

        assert_eq!(a.importance, 1.0);
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.trace_id, b.trace_id);
    }

    #[test]
    fn test_report_validate_accepts_compression() {
        let report = ConsolidationReport::new(
            AgentId::now_v7(),
            MemoryStats::new(156, 89, 45, 67),
            MemoryStats::new(89, 134, 38, 89),
            23,
            45,
            0.96,
        );
        assert!(report.validate().is_ok());
    }

    #[test]
    fn test_report_validate_rejects_expansion() {
        let report = ConsolidationReport::new(
            AgentId::now_v7(),
            MemoryStats::new(10, 0, 0, 0),
            MemoryStats::new(10, 5, 0, 0),
            1,
            1,
            0.9,
        );
        assert!(report.validate().is_err());
    }

    #[test]
    fn test_retained_importance_clamped() {
        let report = ConsolidationReport::new(
            AgentId::now_v7(),
            MemoryStats::new(5, 0, 0, 0),
            MemoryStats::new(5, 0, 0, 0),
            0,
            0,
            1.8,
        );
        assert_eq!(report.retained_importance, 1.0);
    }
}
