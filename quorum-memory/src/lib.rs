//! QUORUM Memory - Consolidation Engine
//!
//! Working-set management and memory consolidation for agents. Agents
//! accumulate `MemoryTrace`s while they work; a consolidation pass clusters
//! similar traces into semantic entries, links the absorbed members into
//! long-term memory, and discards low-importance singletons. Consolidation
//! only ever compresses: the after counters never exceed the before counters
//! in total.

use quorum_core::{
    AgentId, ConsolidationReport, CoreConfig, KnowledgeTransferRecord, MemoryStats, MemoryTrace,
    QuorumResult,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::RwLock;

// ============================================================================
// SIMILARITY MODEL
// ============================================================================

/// Trait for content similarity scoring.
/// Implementations must be thread-safe (Send + Sync).
///
/// Scores are in [0.0, 1.0]; the consolidation threshold from `CoreConfig`
/// is compared directly against them.
pub trait SimilarityModel: Send + Sync {
    /// Score the similarity of two pieces of content.
    ///
    /// # Returns
    /// A score in [0.0, 1.0], where 1.0 means identical content.
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Token-overlap (Jaccard) similarity over lowercased whitespace tokens.
///
/// Cheap and deterministic; the default model for consolidation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlapSimilarity;

impl SimilarityModel for TokenOverlapSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let words_a: HashSet<String> = a.split_whitespace().map(|w| w.to_lowercase()).collect();
        let words_b: HashSet<String> = b.split_whitespace().map(|w| w.to_lowercase()).collect();

        let intersection = words_a.intersection(&words_b).count();
        let union = words_a.union(&words_b).count();

        if union > 0 {
            intersection as f64 / union as f64
        } else {
            0.0
        }
    }
}

// ============================================================================
// WORKING SET
// ============================================================================

/// Accumulated traces for a single agent, deduplicated by content hash.
///
/// The working set grows as the agent takes on tasks, reflects, and
/// collaborates; a consolidation pass replaces it with the survivors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingSet {
    traces: Vec<MemoryTrace>,
}

impl WorkingSet {
    /// Create an empty working set.
    pub fn new() -> Self {
        Self { traces: Vec::new() }
    }

    /// Add a trace unless a trace with the same content hash is already held.
    /// Returns true if the trace was added.
    pub fn add(&mut self, trace: MemoryTrace) -> bool {
        let duplicate = self
            .traces
            .iter()
            .any(|held| held.content_hash == trace.content_hash);
        if duplicate {
            return false;
        }
        self.traces.push(trace);
        true
    }

    /// Traces currently held, oldest first.
    pub fn traces(&self) -> &[MemoryTrace] {
        &self.traces
    }

    /// Number of traces held.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Whether the set holds no traces.
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Replace the contents with the survivors of a consolidation pass.
    pub fn replace(&mut self, survivors: Vec<MemoryTrace>) {
        self.traces = survivors;
    }
}

// ============================================================================
// CONSOLIDATION
// ============================================================================

/// Scope of a consolidation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationScope {
    /// Consolidate a single agent's working set
    Agent(AgentId),
    /// Consolidate every registered agent in turn
    Global,
}

/// Result of one consolidation pass: the report plus the traces that
/// survive into the next working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consolidation {
    /// Accounting for the pass
    pub report: ConsolidationReport,
    /// Traces that remain in the working set
    pub survivors: Vec<MemoryTrace>,
}

/// Memory consolidation engine.
///
/// Greedy-clusters the working set by similarity: a cluster of size k
/// absorbs k short-term entries, creates one semantic entry, and links the
/// k-1 absorbed members into long-term memory. Singleton traces below the
/// importance cutoff are discarded. All absorption is capped by the
/// short-term entries the agent actually has.
pub struct Consolidator<S: SimilarityModel> {
    config: CoreConfig,
    similarity: S,
}

impl Consolidator<TokenOverlapSimilarity> {
    /// Consolidator with the default token-overlap similarity model.
    pub fn with_default_model(config: CoreConfig) -> QuorumResult<Self> {
        Self::new(config, TokenOverlapSimilarity)
    }
}

impl<S: SimilarityModel> Consolidator<S> {
    /// Create a consolidator with the given configuration and model.
    pub fn new(config: CoreConfig, similarity: S) -> QuorumResult<Self> {
        config.validate()?;
        Ok(Self { config, similarity })
    }

    /// Run one consolidation pass over an agent's working set.
    ///
    /// # Arguments
    /// * `agent_id` - Agent whose memory is being consolidated
    /// * `before` - The agent's layer counters going in
    /// * `traces` - The agent's current working set
    ///
    /// # Returns
    /// The report and the surviving traces. The report is validated
    /// against the compression invariant before being returned.
    pub fn consolidate(
        &self,
        agent_id: AgentId,
        before: MemoryStats,
        traces: &[MemoryTrace],
    ) -> QuorumResult<Consolidation> {
        let clusters = self.cluster(traces);

        let mut after = before;
        let mut clusters_created = 0u64;
        let mut links_created = 0u64;
        let mut discarded = 0u64;
        let mut discarded_importance = 0.0f64;
        let mut survivors: Vec<MemoryTrace> = Vec::new();

        for cluster in &clusters {
            if cluster.len() >= 2 {
                let k = cluster.len() as u64;
                if after.short_term >= k {
                    after.short_term -= k;
                    after.semantic += 1;
                    after.long_term += k - 1;
                    clusters_created += 1;
                    links_created += k - 1;
                    // The most important member stands in for the cluster
                    if let Some(representative) = cluster
                        .iter()
                        .copied()
                        .max_by(|a, b| a.importance.total_cmp(&b.importance))
                    {
                        survivors.push(representative.clone());
                    }
                } else {
                    // Not enough short-term entries left to absorb this cluster
                    survivors.extend(cluster.iter().map(|t| (*t).clone()));
                }
            } else if let Some(single) = cluster.first() {
                if single.importance < self.config.importance_cutoff && after.short_term > 0 {
                    after.short_term -= 1;
                    discarded += 1;
                    discarded_importance += single.importance;
                } else {
                    survivors.push((*single).clone());
                }
            }
        }

        let total_importance: f64 = traces.iter().map(|t| t.importance).sum();
        let retained_importance = if traces.is_empty() || total_importance <= 0.0 {
            1.0
        } else {
            (total_importance - discarded_importance) / total_importance
        };

        let mut report = ConsolidationReport::new(
            agent_id,
            before,
            after,
            clusters_created,
            links_created,
            retained_importance,
        );
        if clusters_created > 0 {
            report = report.with_insight(format!(
                "Identified {clusters_created} recurring patterns for reuse"
            ));
        }
        if links_created > 0 {
            report = report.with_insight(format!(
                "Created {links_created} new semantic concept relationships"
            ));
        }
        if discarded > 0 {
            report = report.with_insight(format!("Discarded {discarded} low-importance traces"));
        }

        report.validate()?;

        Ok(Consolidation { report, survivors })
    }

    /// Greedy seed-based clustering: each unassigned trace seeds a cluster
    /// and pulls in every later unassigned trace at or above the threshold.
    fn cluster<'a>(&self, traces: &'a [MemoryTrace]) -> Vec<Vec<&'a MemoryTrace>> {
        let mut assigned = vec![false; traces.len()];
        let mut clusters = Vec::new();

        for i in 0..traces.len() {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;
            let mut cluster = vec![&traces[i]];

            for j in (i + 1)..traces.len() {
                if assigned[j] {
                    continue;
                }
                let score = self
                    .similarity
                    .similarity(&traces[i].content, &traces[j].content);
                if score >= self.config.similarity_threshold {
                    assigned[j] = true;
                    cluster.push(&traces[j]);
                }
            }

            clusters.push(cluster);
        }

        clusters
    }
}

impl<S: SimilarityModel> std::fmt::Debug for Consolidator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consolidator")
            .field("similarity_threshold", &self.config.similarity_threshold)
            .field("importance_cutoff", &self.config.importance_cutoff)
            .finish()
    }
}

// ============================================================================
// GLOBAL MEMORY
// ============================================================================

/// System-wide memory shared across agents.
/// Thread-safe via RwLock; views are snapshots, writes are append-only.
pub struct GlobalMemory {
    /// Insights promoted out of per-agent consolidation
    shared_knowledge: RwLock<Vec<String>>,
    /// Knowledge-transfer records between agents
    cross_agent_learnings: RwLock<Vec<KnowledgeTransferRecord>>,
    /// Practices confirmed by repeated success
    best_practices: RwLock<Vec<String>>,
}

impl GlobalMemory {
    /// Create an empty global memory.
    pub fn new() -> Self {
        Self {
            shared_knowledge: RwLock::new(Vec::new()),
            cross_agent_learnings: RwLock::new(Vec::new()),
            best_practices: RwLock::new(Vec::new()),
        }
    }

    /// Append an entry to shared knowledge.
    pub fn add_shared_knowledge(&self, entry: impl Into<String>) {
        if let Ok(mut knowledge) = self.shared_knowledge.write() {
            knowledge.push(entry.into());
        }
    }

    /// Record a cross-agent learning.
    pub fn record_learning(&self, record: KnowledgeTransferRecord) {
        if let Ok(mut learnings) = self.cross_agent_learnings.write() {
            learnings.push(record);
        }
    }

    /// Append a best practice.
    pub fn add_best_practice(&self, entry: impl Into<String>) {
        if let Ok(mut practices) = self.best_practices.write() {
            practices.push(entry.into());
        }
    }

    /// Snapshot of the shared knowledge entries.
    pub fn shared_knowledge(&self) -> Vec<String> {
        self.shared_knowledge
            .read()
            .map(|k| k.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the cross-agent learnings.
    pub fn learnings(&self) -> Vec<KnowledgeTransferRecord> {
        self.cross_agent_learnings
            .read()
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the best practices.
    pub fn best_practices(&self) -> Vec<String> {
        self.best_practices
            .read()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Number of cross-agent learnings recorded.
    pub fn learning_count(&self) -> usize {
        self.cross_agent_learnings
            .read()
            .map(|l| l.len())
            .unwrap_or(0)
    }
}

impl Default for GlobalMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GlobalMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalMemory")
            .field(
                "shared_knowledge",
                &self.shared_knowledge.read().map(|k| k.len()).unwrap_or(0),
            )
            .field("cross_agent_learnings", &self.learning_count())
            .field(
                "best_practices",
                &self.best_practices.read().map(|p| p.len()).unwrap_or(0),
            )
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
