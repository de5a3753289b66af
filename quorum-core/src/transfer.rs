//! Knowledge-transfer records.
//!
//! A record captures one unit of knowledge moved from a source agent to a
//! target agent. Records are immutable once created: there are no mutating
//! methods, and every transfer call produces a new record (no deduplication).

use crate::identity::{compute_content_hash, AgentId, ContentHash, Timestamp, TransferId};
use serde::{Deserialize, Serialize};

/// One completed knowledge transfer between two agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KnowledgeTransferRecord {
    /// Unique record identifier
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub transfer_id: TransferId,
    /// Agent the knowledge came from
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub source_agent: AgentId,
    /// Agent the knowledge went to
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub target_agent: AgentId,
    /// Domain the knowledge belongs to (e.g. "error-handling-patterns")
    pub domain: String,
    /// The transferred knowledge itself
    pub knowledge: String,
    /// SHA-256 of the knowledge text
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "byte"))]
    pub content_hash: ContentHash,
    /// Estimated effectiveness of the transfer, clamped to [0.0, 1.0]
    pub effectiveness: f64,
    /// When the transfer happened
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

impl KnowledgeTransferRecord {
    /// Create a record, clamping effectiveness to [0.0, 1.0].
    pub fn new(
        source_agent: AgentId,
        target_agent: AgentId,
        domain: impl Into<String>,
        knowledge: impl Into<String>,
        effectiveness: f64,
    ) -> Self {
        let knowledge = knowledge.into();
        let content_hash = compute_content_hash(knowledge.as_bytes());
        Self {
            transfer_id: TransferId::now_v7(),
            source_agent,
            target_agent,
            domain: domain.into(),
            knowledge,
            content_hash,
            effectiveness: effectiveness.clamp(0.0, 1.0),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_carries_endpoints() {
        let source = AgentId::now_v7();
        let target = AgentId::now_v7();
        let record = KnowledgeTransferRecord::new(
            source,
            target,
            "error-handling-patterns",
            "Retry with exponential backoff on 429 responses",
            0.85,
        );
        assert_eq!(record.source_agent, source);
        assert_eq!(record.target_agent, target);
        assert_eq!(record.effectiveness, 0.85);
    }

    #[test]
    fn test_effectiveness_clamped() {
        let record = KnowledgeTransferRecord::new(
            AgentId::now_v7(),
            AgentId::now_v7(),
            "testing",
            "knowledge",
            1.9,
        );
        assert_eq!(record.effectiveness, 1.0);
    }

    #[test]
    fn test_identical_knowledge_hashes_match_while_ids_differ() {
        let source = AgentId::now_v7();
        let target = AgentId::now_v7();
        let a = KnowledgeTransferRecord::new(source, target, "testing", "same text", 0.5);
        let b = KnowledgeTransferRecord::new(source, target, "testing", "same text", 0.5);
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.transfer_id, b.transfer_id);
    }
}

#[cfg(all(test, feature = "openapi"))]
mod schema_tests {
    use super::*;
    use utoipa::PartialSchema;

    #[test]
    fn test_schema_renders_timestamp_as_date_time_string() {
        let schema = serde_json::to_value(KnowledgeTransferRecord::schema()).unwrap();
        let timestamp = &schema["properties"]["timestamp"];
        assert_eq!(timestamp["type"], "string");
        assert_eq!(timestamp["format"], "date-time");
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_effectiveness_always_in_range(effectiveness in -4.0f64..4.0) {
            let record = KnowledgeTransferRecord::new(
                AgentId::now_v7(),
                AgentId::now_v7(),
                "domain",
                "knowledge",
                effectiveness,
            );
            prop_assert!((0.0..=1.0).contains(&record.effectiveness));
        }
    }
}
