//! Identity types for QUORUM entities

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Duration in milliseconds for estimates and measured timings.
pub type DurationMs = i64;

/// SHA-256 content hash for deduplication and integrity verification.
pub type ContentHash = [u8; 32];

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Common surface for strongly-typed entity identifiers.
/// All IDs wrap a UUIDv7 so they sort by creation time.
pub trait EntityIdType: Copy + Eq + Ord + std::hash::Hash + fmt::Display {
    /// Wrap an existing UUID.
    fn new(id: Uuid) -> Self;

    /// Generate a fresh timestamp-sortable ID.
    fn now_v7() -> Self;

    /// Access the underlying UUID.
    fn as_uuid(&self) -> Uuid;
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn new(id: Uuid) -> Self {
                Self(id)
            }

            fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl $name {
            /// Wrap an existing UUID.
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh timestamp-sortable ID.
            pub fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

entity_id!(
    /// Identifier for a registered agent.
    AgentId
);

entity_id!(
    /// Identifier for a plan.
    PlanId
);

entity_id!(
    /// Identifier for a single plan step.
    StepId
);

entity_id!(
    /// Identifier for a knowledge-transfer record.
    TransferId
);

entity_id!(
    /// Identifier for a coordination event.
    EventId
);

entity_id!(
    /// Identifier for a memory trace in the working set.
    TraceId
);
