//! QUORUM Agents - Fleet Registry and Command Dispatch
//!
//! The registry owns agent persistence behind [`AgentRepository`], applies
//! [`AgentCommand`]s through a validate-then-mutate state machine, adopts
//! plans on behalf of agents, and runs the knowledge transfer protocol.
//! Per-agent write exclusion comes from a lock table keyed by FNV-1a hashes
//! of agent ids; two-agent operations take both locks in ascending id order.
//!
//! Commands either fully apply or leave the stored profile untouched:
//! mutation happens on a local copy that is only persisted after every
//! validation step has passed.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use quorum_core::{
    AgentId, AgentKind, AgentPriority, AgentProfile, AgentState, CollaborationOutcome,
    CoreConfig, DurationMs, KnowledgeTransferRecord, MemoryStats, PerformanceStats, Plan,
    PlanStatus, PlanStep, QuorumResult, ReflectionOutcome, RegistryError, ToolStats,
    ValidationError,
};

// ============================================================================
// AGENT COMMANDS
// ============================================================================

/// Commands accepted by [`AgentRegistry::dispatch`].
///
/// One variant per action, each carrying its full payload. On the wire a
/// command is tagged by `action` in kebab-case, so `AssignTask` travels as
/// `{"action": "assign-task", "description": ..., "priority": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum AgentCommand {
    /// Bring the agent into coordination in the `Idle` state.
    Start,
    /// Take the agent offline, discarding its queue and in-flight plan.
    Stop,
    /// Reset to `Idle` with an empty queue, keeping plan and memory.
    Restart,
    /// Queue a task on an idle agent; the agent moves to `Reasoning`.
    AssignTask {
        description: String,
        priority: AgentPriority,
    },
    /// Reasoning finished; the agent moves to `Planning`.
    ReasoningComplete,
    /// The adopted plan starts executing; the agent moves to `Executing`.
    PlanReady,
    /// Execution settled; counters update and the plan is archived.
    ExecutionComplete {
        success: bool,
        duration_ms: DurationMs,
    },
    /// Synchronous reflection pass; the agent keeps its prior state.
    TriggerReflection { focus: Option<String> },
    /// Synchronous collaboration pass with another agent.
    InitiateCollaboration { partner: AgentId, objective: String },
}

impl AgentCommand {
    /// Kebab-case action name used in errors and logs.
    pub fn action_name(&self) -> &'static str {
        match self {
            AgentCommand::Start => "start",
            AgentCommand::Stop => "stop",
            AgentCommand::Restart => "restart",
            AgentCommand::AssignTask { .. } => "assign-task",
            AgentCommand::ReasoningComplete => "reasoning-complete",
            AgentCommand::PlanReady => "plan-ready",
            AgentCommand::ExecutionComplete { .. } => "execution-complete",
            AgentCommand::TriggerReflection { .. } => "trigger-reflection",
            AgentCommand::InitiateCollaboration { .. } => "initiate-collaboration",
        }
    }
}

/// Snapshot and side artifacts returned by a successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// The agent profile after the command applied.
    pub agent: AgentProfile,
    /// Present when the command was `TriggerReflection`.
    pub reflection: Option<ReflectionOutcome>,
    /// Present when the command was `InitiateCollaboration`.
    pub collaboration: Option<CollaborationOutcome>,
}

/// Insights reported by a reflection pass.
const REFLECTION_INSIGHTS: &[&str] = &[
    "Memory consolidation efficiency improved 15% through semantic clustering",
    "Cross-agent knowledge sharing increased task success rate by 12%",
    "Causal analysis integration reduced debugging time by 34%",
];

/// Behavioural adjustments reported by a reflection pass.
const REFLECTION_IMPROVEMENTS: &[&str] = &[
    "Optimize reasoning chain depth for complex tasks",
    "Enhance pattern recognition for edge cases",
    "Improve knowledge transfer protocol efficiency",
];

/// Knowledge retained from a reflection pass.
const REFLECTION_KNOWLEDGE: &[&str] = &[
    "Discovered optimal planning-to-execution ratio: 12%",
    "Identified 3 new emergent collaboration patterns",
    "Learned 5 new causal relationship patterns",
];

/// What a collaborating pair expects to get out of the pairing.
const COLLABORATION_EXPECTED_OUTCOMES: &[&str] = &[
    "Knowledge pattern sharing",
    "Collaborative problem solving",
    "Enhanced decision making",
];

// ============================================================================
// AGENT REPOSITORY
// ============================================================================

/// Persistence boundary for agent profiles.
///
/// Object-safe so a registry can be constructed over any backing store.
/// Implementations must be safe for concurrent use; the registry layers its
/// own per-agent write exclusion on top.
pub trait AgentRepository: Send + Sync {
    /// Insert a new profile. Fails if the id is already present.
    fn insert(&self, profile: &AgentProfile) -> QuorumResult<()>;

    /// Fetch a profile by id.
    fn get(&self, agent_id: AgentId) -> QuorumResult<Option<AgentProfile>>;

    /// Persist changes to an existing profile. Fails if the id is unknown.
    fn save(&self, profile: &AgentProfile) -> QuorumResult<()>;

    /// All stored profiles, in no particular order.
    fn list(&self) -> QuorumResult<Vec<AgentProfile>>;

    /// All stored agent ids, in no particular order.
    fn ids(&self) -> QuorumResult<Vec<AgentId>>;

    /// Number of stored profiles.
    fn count(&self) -> QuorumResult<usize>;
}

/// In-memory repository over a `HashMap` behind an `RwLock`.
///
/// The default backing store for tests and single-process runtimes.
#[derive(Debug, Default)]
pub struct InMemoryAgentRepository {
    agents: RwLock<HashMap<AgentId, AgentProfile>>,
}

impl InMemoryAgentRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the read guard, recovering from poisoning.
    fn read_agents(&self) -> RwLockReadGuard<'_, HashMap<AgentId, AgentProfile>> {
        match self.agents.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Acquire the write guard, recovering from poisoning.
    fn write_agents(&self) -> RwLockWriteGuard<'_, HashMap<AgentId, AgentProfile>> {
        match self.agents.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl AgentRepository for InMemoryAgentRepository {
    fn insert(&self, profile: &AgentProfile) -> QuorumResult<()> {
        let mut agents = self.write_agents();
        if agents.contains_key(&profile.agent_id) {
            return Err(ValidationError::ConstraintViolation {
                constraint: "agent registration".to_string(),
                reason: format!("agent {} is already registered", profile.agent_id),
            }
            .into());
        }
        agents.insert(profile.agent_id, profile.clone());
        Ok(())
    }

    fn get(&self, agent_id: AgentId) -> QuorumResult<Option<AgentProfile>> {
        Ok(self.read_agents().get(&agent_id).cloned())
    }

    fn save(&self, profile: &AgentProfile) -> QuorumResult<()> {
        let mut agents = self.write_agents();
        match agents.get_mut(&profile.agent_id) {
            Some(stored) => {
                *stored = profile.clone();
                Ok(())
            }
            None => Err(RegistryError::AgentNotFound {
                id: profile.agent_id,
            }
            .into()),
        }
    }

    fn list(&self) -> QuorumResult<Vec<AgentProfile>> {
        Ok(self.read_agents().values().cloned().collect())
    }

    fn ids(&self) -> QuorumResult<Vec<AgentId>> {
        Ok(self.read_agents().keys().copied().collect())
    }

    fn count(&self) -> QuorumResult<usize> {
        Ok(self.read_agents().len())
    }
}

// ============================================================================
// ADVISORY LOCK KEYS
// ============================================================================

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Compute a stable i64 lock key for an agent id using FNV-1a.
///
/// Distinct ids may collide; a collision only coarsens exclusion to a
/// shared slot, it never loses it.
pub fn agent_lock_key(agent_id: AgentId) -> i64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in agent_id.as_uuid().as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash as i64
}

/// Per-agent lock slots, created on first use and kept for the registry's
/// lifetime.
#[derive(Default)]
struct LockTable {
    slots: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl LockTable {
    /// Slot for the given agent, allocating one if needed.
    fn slot(&self, agent_id: AgentId) -> Arc<Mutex<()>> {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(slots.entry(agent_lock_key(agent_id)).or_default())
    }
}

/// Acquire a slot guard, recovering from poisoning. The guarded state is
/// the repository, not the mutex payload, so a recovered guard stays sound.
fn acquire(slot: &Mutex<()>) -> MutexGuard<'_, ()> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ============================================================================
// TRANSFER EFFECTIVENESS
// ============================================================================

/// Scores how well knowledge in a domain will land on a target agent.
pub trait EffectivenessModel: Send + Sync {
    /// Estimated transfer effectiveness in [0.0, 1.0].
    fn effectiveness(&self, source: &AgentProfile, target: &AgentProfile, domain: &str) -> f64;
}

/// Default model: domain relevance against the target's capabilities,
/// blended with capability overlap between the two agents.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityOverlapEffectiveness;

impl CapabilityOverlapEffectiveness {
    /// Weight of domain relevance in the blended score.
    const RELEVANCE_WEIGHT: f64 = 0.6;
    /// Weight of capability overlap in the blended score.
    const OVERLAP_WEIGHT: f64 = 0.4;

    /// Fraction of domain tokens that appear in the target's capabilities.
    fn domain_relevance(target: &AgentProfile, domain: &str) -> f64 {
        let tokens: Vec<String> = domain
            .split(['-', '_', ' ', '/'])
            .filter(|token| !token.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        if tokens.is_empty() {
            return 0.0;
        }
        let matched = tokens
            .iter()
            .filter(|token| {
                target
                    .capabilities
                    .iter()
                    .any(|capability| capability.to_ascii_lowercase().contains(token.as_str()))
            })
            .count();
        matched as f64 / tokens.len() as f64
    }

    /// Jaccard overlap between the two agents' capability sets.
    fn capability_overlap(source: &AgentProfile, target: &AgentProfile) -> f64 {
        let source_set: HashSet<String> = source
            .capabilities
            .iter()
            .map(|capability| capability.to_ascii_lowercase())
            .collect();
        let target_set: HashSet<String> = target
            .capabilities
            .iter()
            .map(|capability| capability.to_ascii_lowercase())
            .collect();
        let union = source_set.union(&target_set).count();
        if union == 0 {
            return 0.0;
        }
        source_set.intersection(&target_set).count() as f64 / union as f64
    }
}

impl EffectivenessModel for CapabilityOverlapEffectiveness {
    fn effectiveness(&self, source: &AgentProfile, target: &AgentProfile, domain: &str) -> f64 {
        let relevance = Self::domain_relevance(target, domain);
        let overlap = Self::capability_overlap(source, target);
        (Self::RELEVANCE_WEIGHT * relevance + Self::OVERLAP_WEIGHT * overlap).clamp(0.0, 1.0)
    }
}

// ============================================================================
// AGENT REGISTRY
// ============================================================================

/// Fleet registry: agent persistence, command dispatch, plan adoption, and
/// knowledge transfer.
pub struct AgentRegistry {
    repo: Arc<dyn AgentRepository>,
    config: CoreConfig,
    effectiveness: Arc<dyn EffectivenessModel>,
    locks: LockTable,
    archived: RwLock<Vec<Plan>>,
}

impl AgentRegistry {
    /// Create a registry over the given repository.
    pub fn new(repo: Arc<dyn AgentRepository>, config: CoreConfig) -> QuorumResult<Self> {
        config.validate()?;
        Ok(Self {
            repo,
            config,
            effectiveness: Arc::new(CapabilityOverlapEffectiveness),
            locks: LockTable::default(),
            archived: RwLock::new(Vec::new()),
        })
    }

    /// Create a registry over a fresh in-memory repository.
    pub fn in_memory(config: CoreConfig) -> QuorumResult<Self> {
        Self::new(Arc::new(InMemoryAgentRepository::new()), config)
    }

    /// Replace the transfer effectiveness model.
    pub fn with_effectiveness_model(mut self, model: Arc<dyn EffectivenessModel>) -> Self {
        self.effectiveness = model;
        self
    }

    /// Registry configuration.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Add a new agent to the fleet.
    pub fn register(&self, profile: AgentProfile) -> QuorumResult<AgentId> {
        let agent_id = profile.agent_id;
        self.repo.insert(&profile)?;
        Ok(agent_id)
    }

    /// Fetch one agent.
    pub fn get(&self, agent_id: AgentId) -> QuorumResult<AgentProfile> {
        Ok(self
            .repo
            .get(agent_id)?
            .ok_or(RegistryError::AgentNotFound { id: agent_id })?)
    }

    /// All agents, ordered by id. v7 ids sort by creation time, so this is
    /// registration order for fleets minted in-process.
    pub fn list_agents(&self) -> QuorumResult<Vec<AgentProfile>> {
        let mut agents = self.repo.list()?;
        agents.sort_by_key(|profile| profile.agent_id);
        Ok(agents)
    }

    /// Number of registered agents.
    pub fn count(&self) -> QuorumResult<usize> {
        self.repo.count()
    }

    /// Apply a command to an agent.
    ///
    /// Every path validates before it writes: a returned error means the
    /// stored profile is exactly as it was.
    pub fn dispatch(
        &self,
        agent_id: AgentId,
        command: AgentCommand,
    ) -> QuorumResult<DispatchOutcome> {
        match command {
            AgentCommand::InitiateCollaboration { partner, objective } => {
                self.initiate_collaboration(agent_id, partner, objective)
            }
            single => self.dispatch_single(agent_id, single),
        }
    }

    /// Single-agent command path.
    fn dispatch_single(
        &self,
        agent_id: AgentId,
        command: AgentCommand,
    ) -> QuorumResult<DispatchOutcome> {
        let (agent, reflection) = self.with_agent(agent_id, |profile| {
            let reflection = self.apply_single(profile, &command)?;
            Ok((profile.clone(), reflection))
        })?;
        Ok(DispatchOutcome {
            agent,
            reflection,
            collaboration: None,
        })
    }

    /// Apply one single-agent command to a working copy of the profile.
    fn apply_single(
        &self,
        profile: &mut AgentProfile,
        command: &AgentCommand,
    ) -> QuorumResult<Option<ReflectionOutcome>> {
        let reflection = match command {
            AgentCommand::Start => {
                profile.status = AgentState::Idle;
                profile.is_active = true;
                profile.touch();
                None
            }
            AgentCommand::Stop => {
                // The in-flight plan is discarded, not archived.
                profile.status = AgentState::Offline;
                profile.is_active = false;
                profile.current_plan = None;
                profile.queue_length = 0;
                profile.touch();
                None
            }
            AgentCommand::Restart => {
                // Plan and memory counters survive a restart.
                profile.status = AgentState::Idle;
                profile.is_active = true;
                profile.queue_length = 0;
                profile.touch();
                None
            }
            AgentCommand::AssignTask { description, .. } => {
                if description.trim().is_empty() {
                    return Err(ValidationError::RequiredFieldMissing {
                        field: "description".to_string(),
                    }
                    .into());
                }
                require_state(profile, AgentState::Idle, command.action_name())?;
                profile.status = AgentState::Reasoning;
                profile.queue_length += 1;
                profile.performance.total_tasks += 1;
                profile.touch();
                None
            }
            AgentCommand::ReasoningComplete => {
                require_state(profile, AgentState::Reasoning, command.action_name())?;
                profile.status = AgentState::Planning;
                profile.touch();
                None
            }
            AgentCommand::PlanReady => {
                require_state(profile, AgentState::Planning, command.action_name())?;
                let plan = profile
                    .current_plan
                    .as_mut()
                    .ok_or(RegistryError::PlanNotFound {
                        agent_id: profile.agent_id,
                    })?;
                // A plan preserved across a restart may already be running.
                if plan.status != PlanStatus::Executing {
                    plan.begin()?;
                }
                profile.status = AgentState::Executing;
                profile.touch();
                None
            }
            AgentCommand::ExecutionComplete {
                success,
                duration_ms,
            } => {
                require_state(profile, AgentState::Executing, command.action_name())?;
                let settled_plan = match profile.current_plan.take() {
                    Some(mut plan) => {
                        if *success {
                            plan.complete()?;
                        } else {
                            plan.fail()?;
                        }
                        Some(plan)
                    }
                    None => None,
                };
                profile
                    .performance
                    .record_outcome(*success, *duration_ms as f64);
                profile.queue_length = profile.queue_length.saturating_sub(1);
                profile.status = AgentState::Idle;
                profile.touch();
                if let Some(plan) = settled_plan {
                    self.archive_plan(plan);
                }
                None
            }
            AgentCommand::TriggerReflection { focus } => {
                require_operational(profile, command.action_name())?;
                profile.recent_reflections += 1;
                profile.touch();
                Some(ReflectionOutcome {
                    agent_id: profile.agent_id,
                    focus: focus.clone(),
                    insights: canned(REFLECTION_INSIGHTS),
                    improvements: canned(REFLECTION_IMPROVEMENTS),
                    new_knowledge: canned(REFLECTION_KNOWLEDGE),
                    timestamp: chrono::Utc::now(),
                })
            }
            AgentCommand::InitiateCollaboration { .. } => {
                unreachable!("collaboration is routed to its two-agent path")
            }
        };
        Ok(reflection)
    }

    /// Two-agent collaboration path.
    ///
    /// Validates the pairing before touching either profile, then locks
    /// both agents in ascending id order and updates both sides.
    fn initiate_collaboration(
        &self,
        agent_id: AgentId,
        partner: AgentId,
        objective: String,
    ) -> QuorumResult<DispatchOutcome> {
        if objective.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "objective".to_string(),
            }
            .into());
        }
        if partner == agent_id {
            return Err(ValidationError::InvalidValue {
                field: "partner".to_string(),
                reason: "an agent cannot collaborate with itself".to_string(),
            }
            .into());
        }
        self.with_two_agents(agent_id, partner, |initiator, partner_profile| {
            require_operational(initiator, "initiate-collaboration")?;
            initiator.add_collaborator(partner_profile.agent_id);
            partner_profile.add_collaborator(initiator.agent_id);
            initiator.touch();
            partner_profile.touch();
            let collaboration = CollaborationOutcome {
                initiator: initiator.agent_id,
                partner: partner_profile.agent_id,
                objective,
                expected_outcomes: canned(COLLABORATION_EXPECTED_OUTCOMES),
                timestamp: chrono::Utc::now(),
            };
            Ok(DispatchOutcome {
                agent: initiator.clone(),
                reflection: None,
                collaboration: Some(collaboration),
            })
        })
    }

    /// Attach a Draft plan to an agent: the plan becomes Active and the
    /// agent's current plan. Any previously attached plan is replaced and
    /// dropped without archiving.
    pub fn adopt_plan(&self, agent_id: AgentId, mut plan: Plan) -> QuorumResult<AgentProfile> {
        plan.validate()?;
        self.with_agent(agent_id, |profile| {
            if profile.status == AgentState::Offline {
                return Err(ValidationError::ConstraintViolation {
                    constraint: "plan adoption".to_string(),
                    reason: format!("agent {} is offline", profile.agent_id),
                }
                .into());
            }
            plan.adopt(profile.agent_id)?;
            profile.current_plan = Some(plan);
            profile.touch();
            Ok(profile.clone())
        })
    }

    /// Move knowledge from one agent to another, producing an immutable
    /// record. The source's transfer counter advances by exactly one; target
    /// tools whose category matches the domain get an effectiveness nudge.
    pub fn transfer(
        &self,
        source: AgentId,
        target: AgentId,
        domain: &str,
        knowledge: &str,
    ) -> QuorumResult<KnowledgeTransferRecord> {
        if domain.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "domain".to_string(),
            }
            .into());
        }
        if source == target {
            return Err(ValidationError::InvalidValue {
                field: "target".to_string(),
                reason: "source and target must be distinct agents".to_string(),
            }
            .into());
        }
        self.with_two_agents(source, target, |source_profile, target_profile| {
            let effectiveness =
                self.effectiveness
                    .effectiveness(source_profile, target_profile, domain);
            let record =
                KnowledgeTransferRecord::new(source, target, domain, knowledge, effectiveness);
            source_profile.knowledge_transfers += 1;
            source_profile.touch();
            for tool in &mut target_profile.tools {
                if tool.category.eq_ignore_ascii_case(domain) {
                    tool.nudge_effectiveness(self.config.tool_effectiveness_nudge);
                }
            }
            target_profile.touch();
            Ok(record)
        })
    }

    /// Replace an agent's memory counters, typically after consolidation
    /// rewrote its working set.
    pub fn update_memory(&self, agent_id: AgentId, memory: MemoryStats) -> QuorumResult<AgentProfile> {
        self.with_agent(agent_id, |profile| {
            profile.memory = memory;
            profile.touch();
            Ok(profile.clone())
        })
    }

    /// Plans that reached a terminal status through dispatch, in completion
    /// order.
    pub fn archived_plans(&self) -> Vec<Plan> {
        self.archived
            .read()
            .map(|archived| archived.clone())
            .unwrap_or_default()
    }

    fn archive_plan(&self, plan: Plan) {
        if let Ok(mut archived) = self.archived.write() {
            archived.push(plan);
        }
    }

    /// Run a read-modify-write cycle on one agent under its slot lock.
    /// The mutation works on a copy; nothing persists unless it succeeds.
    fn with_agent<T>(
        &self,
        agent_id: AgentId,
        mutate: impl FnOnce(&mut AgentProfile) -> QuorumResult<T>,
    ) -> QuorumResult<T> {
        let slot = self.locks.slot(agent_id);
        let _guard = acquire(&slot);
        let mut profile = self.get(agent_id)?;
        let value = mutate(&mut profile)?;
        self.repo.save(&profile)?;
        Ok(value)
    }

    /// Run a read-modify-write cycle on two distinct agents, locking both
    /// slots in ascending id order.
    fn with_two_agents<T>(
        &self,
        first_id: AgentId,
        second_id: AgentId,
        mutate: impl FnOnce(&mut AgentProfile, &mut AgentProfile) -> QuorumResult<T>,
    ) -> QuorumResult<T> {
        let (low, high) = if first_id <= second_id {
            (first_id, second_id)
        } else {
            (second_id, first_id)
        };
        let low_slot = self.locks.slot(low);
        let high_slot = self.locks.slot(high);
        let _low_guard = acquire(&low_slot);
        let _high_guard = if Arc::ptr_eq(&low_slot, &high_slot) {
            // Shared slot under an FNV collision; one guard covers both.
            None
        } else {
            Some(acquire(&high_slot))
        };
        let mut first = self.get(first_id)?;
        let mut second = self.get(second_id)?;
        let value = mutate(&mut first, &mut second)?;
        self.repo.save(&first)?;
        self.repo.save(&second)?;
        Ok(value)
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Materialize a canned string table.
fn canned(table: &[&str]) -> Vec<String> {
    table.iter().map(|entry| (*entry).to_string()).collect()
}

fn require_state(
    profile: &AgentProfile,
    expected: AgentState,
    action: &str,
) -> QuorumResult<()> {
    if profile.status != expected {
        return Err(RegistryError::InvalidAction {
            action: action.to_string(),
            state: profile.status,
        }
        .into());
    }
    Ok(())
}

fn require_operational(profile: &AgentProfile, action: &str) -> QuorumResult<()> {
    if !profile.is_operational() {
        return Err(RegistryError::InvalidAction {
            action: action.to_string(),
            state: profile.status,
        }
        .into());
    }
    Ok(())
}

// ============================================================================
// SEED FLEET
// ============================================================================

/// Build the seven-agent fleet a coordination system boots with.
///
/// Profiles carry the production snapshot: task counters, tool usage,
/// memory layers, and in-flight plans. The deployment agent starts offline;
/// every other agent is active.
pub fn seed_fleet() -> QuorumResult<Vec<AgentProfile>> {
    Ok(vec![
        seed_coordinator()?,
        seed_code_generator()?,
        seed_code_reviewer()?,
        seed_tester()?,
        seed_doc_writer()?,
        seed_deployer()?,
        seed_learner()?,
    ])
}

fn seed_coordinator() -> QuorumResult<AgentProfile> {
    let mut agent = AgentProfile::new("QD Coordinator Agent", AgentKind::Coordinator)
        .with_priority(AgentPriority::High)
        .with_capabilities(canned(&[
            "task-distribution",
            "agent-coordination",
            "project-planning",
            "workflow-optimization",
            "reasoning-chains",
            "adaptive-planning",
        ]))
        .with_preferred_model("openrouter/anthropic/claude-sonnet-4")
        .with_preferred_model("openrouter/openai/gpt-4o")
        .with_tool(seed_tool("analyze_task", "analysis", 847, 0.92))
        .with_tool(seed_tool("reasoning_chain", "reasoning", 456, 0.94))
        .with_tool(seed_tool("adaptive_planning", "planning", 234, 0.89))
        .with_tool(seed_tool("workflow_optimization", "optimization", 189, 0.91))
        .with_memory(MemoryStats::new(45, 128, 23, 67))
        .with_learning_velocity(8.5);
    agent.status = AgentState::Reasoning;
    agent.is_active = true;
    agent.performance = seed_performance(923, 894, 29, 1150.0);
    agent.knowledge_transfers = 12;
    agent.recent_reflections = 4;
    agent.current_plan = Some(seed_plan(
        "Optimize inter-agent communication protocols for 25% efficiency gain",
        agent.agent_id,
        true,
    )?);
    Ok(agent)
}

fn seed_code_generator() -> QuorumResult<AgentProfile> {
    let mut agent = AgentProfile::new("QD Code Generator Agent", AgentKind::CodeGen)
        .with_capabilities(canned(&[
            "code-generation",
            "pattern-detection",
            "scaffolding",
            "framework-setup",
            "semantic-analysis",
        ]))
        .with_preferred_model("openrouter/openai/gpt-4o")
        .with_preferred_model("openrouter/anthropic/claude-sonnet-4")
        .with_tool(seed_tool("generate_code", "code", 1567, 0.87))
        .with_tool(seed_tool("pattern_detection", "analysis", 891, 0.89))
        .with_tool(seed_tool("code_complexity", "analysis", 734, 0.91))
        .with_tool(seed_tool("semantic_search", "search", 1203, 0.93))
        .with_memory(MemoryStats::new(32, 95, 18, 42))
        .with_learning_velocity(7.2);
    agent.status = AgentState::Planning;
    agent.is_active = true;
    agent.performance = seed_performance(1456, 1331, 125, 2200.0);
    agent.queue_length = 2;
    agent.knowledge_transfers = 8;
    agent.recent_reflections = 3;
    agent.current_plan = Some(seed_plan(
        "Generate scalable microservice architecture with security patterns",
        agent.agent_id,
        false,
    )?);
    Ok(agent)
}

fn seed_code_reviewer() -> QuorumResult<AgentProfile> {
    let mut agent = AgentProfile::new("QD Code Reviewer Agent", AgentKind::Reviewer)
        .with_capabilities(canned(&[
            "code-review",
            "causal-analysis",
            "security-audit",
            "pattern-analysis",
            "quality-optimization",
        ]))
        .with_preferred_model("openrouter/anthropic/claude-sonnet-4")
        .with_preferred_model("openrouter/openai/gpt-4o")
        .with_tool(seed_tool("analyze_code", "analysis", 1234, 0.91))
        .with_tool(seed_tool("causal_analysis", "reasoning", 567, 0.88))
        .with_tool(seed_tool("security_scan", "security", 892, 0.94))
        .with_tool(seed_tool("pattern_matcher", "analysis", 723, 0.89))
        .with_tool(seed_tool("knowledge_graph", "search", 445, 0.87))
        .with_memory(MemoryStats::new(28, 156, 31, 89))
        .with_learning_velocity(9.1);
    agent.status = AgentState::Executing;
    agent.is_active = true;
    agent.performance = seed_performance(834, 790, 44, 1650.0);
    agent.queue_length = 1;
    agent.knowledge_transfers = 15;
    agent.recent_reflections = 5;
    agent.current_plan = Some(seed_plan(
        "Enhance security review processes with causal analysis",
        agent.agent_id,
        true,
    )?);
    Ok(agent)
}

fn seed_tester() -> QuorumResult<AgentProfile> {
    let mut agent = AgentProfile::new("QD Testing Agent", AgentKind::Tester)
        .with_capabilities(canned(&[
            "test-generation",
            "adaptive-testing",
            "coverage-analysis",
            "memory-enhanced-validation",
        ]))
        .with_preferred_model("openrouter/claude-sonnet-4")
        .with_preferred_model("openrouter/openai/gpt-4o-mini")
        .with_tool(seed_tool("generate_tests", "code", 445, 0.88))
        .with_tool(seed_tool("adaptive_testing", "analysis", 367, 0.91))
        .with_tool(seed_tool("coverage_analysis", "analysis", 289, 0.87))
        .with_memory(MemoryStats::new(22, 134, 28, 56))
        .with_learning_velocity(8.9);
    agent.status = AgentState::Executing;
    agent.is_active = true;
    agent.performance = seed_performance(567, 512, 55, 3200.0);
    agent.queue_length = 2;
    agent.knowledge_transfers = 11;
    agent.recent_reflections = 6;
    agent.current_plan = Some(seed_plan(
        "Implement memory-enhanced testing strategies",
        agent.agent_id,
        true,
    )?);
    Ok(agent)
}

fn seed_doc_writer() -> QuorumResult<AgentProfile> {
    let mut agent = AgentProfile::new("QD Documentation Agent", AgentKind::DocWriter)
        .with_priority(AgentPriority::Low)
        .with_capabilities(canned(&[
            "documentation",
            "context-aware-writing",
            "semantic-integration",
            "knowledge-synthesis",
        ]))
        .with_preferred_model("openrouter/claude-sonnet-4")
        .with_preferred_model("openrouter/anthropic/claude-3-haiku")
        .with_tool(seed_tool("generate_documentation", "code", 234, 0.96))
        .with_tool(seed_tool("semantic_synthesis", "analysis", 156, 0.93))
        .with_memory(MemoryStats::new(12, 189, 23, 145))
        .with_learning_velocity(7.8);
    agent.status = AgentState::Idle;
    agent.is_active = true;
    agent.performance = seed_performance(234, 226, 8, 1500.0);
    agent.knowledge_transfers = 9;
    agent.recent_reflections = 4;
    Ok(agent)
}

fn seed_deployer() -> QuorumResult<AgentProfile> {
    let mut agent = AgentProfile::new("QD Deployment Agent", AgentKind::Deployer)
        .with_capabilities(canned(&[
            "deployment",
            "ci-cd",
            "adaptive-automation",
            "infrastructure-optimization",
        ]))
        .with_preferred_model("openrouter/openai/gpt-4o")
        .with_preferred_model("openrouter/claude-sonnet-4")
        .with_tool(seed_tool("deploy_application", "system", 189, 0.87))
        .with_tool(seed_tool("infrastructure_optimization", "analysis", 134, 0.84))
        .with_memory(MemoryStats::new(8, 156, 28, 45))
        .with_learning_velocity(6.2);
    agent.performance = seed_performance(189, 165, 24, 4000.0);
    agent.knowledge_transfers = 5;
    agent.recent_reflections = 3;
    Ok(agent)
}

fn seed_learner() -> QuorumResult<AgentProfile> {
    let mut agent = AgentProfile::new("QD Learning Agent", AgentKind::Learner)
        .with_priority(AgentPriority::Low)
        .with_capabilities(canned(&[
            "pattern-recognition",
            "memory-consolidation",
            "knowledge-transfer",
            "system-optimization",
            "emergent-behavior-detection",
        ]))
        .with_preferred_model("openrouter/anthropic/claude-sonnet-4")
        .with_preferred_model("openrouter/openai/gpt-4o")
        .with_tool(seed_tool("memory_consolidation", "memory", 445, 0.96))
        .with_tool(seed_tool("learning_transfer", "learning", 367, 0.91))
        .with_tool(seed_tool("pattern_recognition", "analysis", 823, 0.94))
        .with_tool(seed_tool("causal_analysis", "reasoning", 512, 0.88))
        .with_tool(seed_tool("emergent_detection", "system", 234, 0.87))
        .with_tool(seed_tool("reflection_processor", "learning", 156, 0.93))
        .with_memory(MemoryStats::new(78, 234, 67, 145))
        .with_learning_velocity(12.8);
    agent.status = AgentState::Idle;
    agent.is_active = true;
    agent.performance = seed_performance(678, 659, 19, 1890.0);
    agent.queue_length = 1;
    agent.knowledge_transfers = 23;
    agent.recent_reflections = 12;
    agent.current_plan = Some(seed_plan(
        "Enhance system learning velocity through improved knowledge consolidation",
        agent.agent_id,
        false,
    )?);
    Ok(agent)
}

fn seed_tool(name: &str, category: &str, usage_count: u64, effectiveness: f64) -> ToolStats {
    let mut tool = ToolStats::new(name, category, effectiveness);
    tool.usage_count = usage_count;
    tool
}

fn seed_performance(
    total_tasks: u64,
    completed_tasks: u64,
    failed_tasks: u64,
    avg_response_time_ms: f64,
) -> PerformanceStats {
    PerformanceStats {
        total_tasks,
        completed_tasks,
        failed_tasks,
        avg_response_time_ms,
    }
}

/// Three-step plan already adopted by the agent; `executing` plans have
/// begun and carry one completed step.
fn seed_plan(goal: &str, agent_id: AgentId, executing: bool) -> QuorumResult<Plan> {
    let mut plan = Plan::new(goal);
    let decompose = PlanStep::new(0, "Decompose goal into subtasks").with_confidence(0.9);
    let first_step_id = decompose.step_id;
    let select = PlanStep::new(1, "Select tools and approach")
        .with_dependency(decompose.step_id)
        .with_confidence(0.85);
    let execute = PlanStep::new(2, "Execute adaptively")
        .with_dependency(select.step_id)
        .with_confidence(0.88);
    plan.add_step(decompose);
    plan.add_step(select);
    plan.add_step(execute);
    let mut plan = plan.with_estimated_duration(1_800_000);
    plan.adopt(agent_id)?;
    if executing {
        plan.begin()?;
        plan.mark_step_complete(first_step_id)?;
    }
    Ok(plan)
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_priority() -> impl Strategy<Value = AgentPriority> {
        prop_oneof![
            Just(AgentPriority::Low),
            Just(AgentPriority::Normal),
            Just(AgentPriority::High),
            Just(AgentPriority::Critical),
        ]
    }

    fn arb_command() -> impl Strategy<Value = AgentCommand> {
        prop_oneof![
            Just(AgentCommand::Start),
            Just(AgentCommand::Stop),
            Just(AgentCommand::Restart),
            ("[a-z ]{1,24}", arb_priority()).prop_map(|(description, priority)| {
                AgentCommand::AssignTask {
                    description,
                    priority,
                }
            }),
            Just(AgentCommand::ReasoningComplete),
            Just(AgentCommand::PlanReady),
            (any::<bool>(), 1i64..60_000i64).prop_map(|(success, duration_ms)| {
                AgentCommand::ExecutionComplete {
                    success,
                    duration_ms,
                }
            }),
            proptest::option::of("[a-z]{3,10}").prop_map(|focus| {
                AgentCommand::TriggerReflection { focus }
            }),
        ]
    }

    fn arb_capabilities() -> impl Strategy<Value = Vec<String>> {
        proptest::sample::subsequence(
            vec![
                "code-generation".to_string(),
                "code-review".to_string(),
                "pattern-detection".to_string(),
                "security-audit".to_string(),
                "test-generation".to_string(),
                "documentation".to_string(),
            ],
            0..=4,
        )
    }

    fn draft_plan() -> Plan {
        let mut plan = Plan::new("Exercise the lifecycle");
        plan.add_step(PlanStep::new(0, "Only step"));
        plan
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: lock keys are a pure function of the agent id.
        #[test]
        fn prop_lock_key_stable(_trial in 0u8..16) {
            let first = AgentId::now_v7();
            let second = AgentId::now_v7();
            prop_assert_eq!(agent_lock_key(first), agent_lock_key(first));
            prop_assert_ne!(agent_lock_key(first), agent_lock_key(second));
        }

        /// Property: any command sequence leaves the active flag consistent
        /// with the offline state, keeps task counters balanced, and only
        /// archives terminal plans.
        #[test]
        fn prop_command_sequences_keep_profile_invariants(
            steps in proptest::collection::vec((arb_command(), any::<bool>()), 0..24)
        ) {
            let registry = AgentRegistry::in_memory(CoreConfig::default()).unwrap();
            let agent_id = registry
                .register(AgentProfile::new("Prop Agent", AgentKind::Tester))
                .unwrap();
            for (command, adopt_first) in steps {
                if adopt_first {
                    let _ = registry.adopt_plan(agent_id, draft_plan());
                }
                let _ = registry.dispatch(agent_id, command);
            }
            let profile = registry.get(agent_id).unwrap();
            prop_assert_eq!(profile.status == AgentState::Offline, !profile.is_active);
            prop_assert!(profile.performance.is_balanced());
            for plan in registry.archived_plans() {
                prop_assert!(
                    plan.status == PlanStatus::Completed || plan.status == PlanStatus::Failed
                );
            }
        }

        /// Property: a rejected command leaves the stored profile untouched.
        #[test]
        fn prop_rejected_commands_mutate_nothing(command in arb_command()) {
            let registry = AgentRegistry::in_memory(CoreConfig::default()).unwrap();
            let agent_id = registry
                .register(AgentProfile::new("Prop Agent", AgentKind::Reviewer))
                .unwrap();
            let before = registry.get(agent_id).unwrap();
            if registry.dispatch(agent_id, command).is_err() {
                let after = registry.get(agent_id).unwrap();
                prop_assert_eq!(before, after);
            }
        }

        /// Property: transfer effectiveness is clamped to [0, 1] and the
        /// source counter advances by exactly one per successful call.
        #[test]
        fn prop_transfer_effectiveness_in_range(
            source_caps in arb_capabilities(),
            target_caps in arb_capabilities(),
            domain in "[a-z]{3,10}(-[a-z]{3,10})?",
        ) {
            let registry = AgentRegistry::in_memory(CoreConfig::default()).unwrap();
            let source = registry
                .register(
                    AgentProfile::new("Prop Source", AgentKind::Learner)
                        .with_capabilities(source_caps),
                )
                .unwrap();
            let target = registry
                .register(
                    AgentProfile::new("Prop Target", AgentKind::CodeGen)
                        .with_capabilities(target_caps),
                )
                .unwrap();
            let record = registry
                .transfer(source, target, &domain, "observed pattern")
                .unwrap();
            prop_assert!((0.0..=1.0).contains(&record.effectiveness));
            prop_assert_eq!(registry.get(source).unwrap().knowledge_transfers, 1);
        }
    }
}
