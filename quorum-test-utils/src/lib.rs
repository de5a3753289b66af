//! QUORUM Test Utilities
//!
//! Centralized test infrastructure for the QUORUM workspace:
//! - Proptest generators for entity types
//! - Mock providers with failure injection
//! - Test fixtures for common scenarios
//! - Custom assertions for QUORUM-specific validation

// Re-export the in-memory repository and seed fleet from their source crate
pub use quorum_agents::{seed_fleet, AgentRegistry, InMemoryAgentRepository};

// Re-export core types for convenience
pub use quorum_core::{
    compute_content_hash, AgentId, AgentKind, AgentPriority, AgentProfile, AgentState,
    CausalChain, CausalLevel, CausalReport, ContentHash, CoordinationEvent, CoordinationKind,
    CoreConfig, DurationMs, EntityIdType, ErrorKind, EventId, KnowledgeTransferRecord,
    MemoryStats, MemoryTrace, OutcomeKind, PerformanceStats, Plan, PlanId, PlanStatus, PlanStep,
    QuorumError, QuorumResult, StepId, SystemMetrics, Timestamp, ToolStats, TraceId, TransferId,
};

// Re-export provider traits so tests can register mocks without an extra import
pub use quorum_providers::{
    CompletionProvider, CompletionRequest, CompletionResponse, Credential, InMemorySecretStore,
    MessageRole, SecretStore,
};

use async_trait::async_trait;
use chrono::Utc;
use quorum_core::UpstreamError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ============================================================================
// MOCK PROVIDERS
// ============================================================================

/// Mock completion provider for testing (async).
///
/// Responses are served from a script queue, falling back to a deterministic
/// echo of the last user message once the script runs dry. Every request is
/// recorded for later inspection, and `fail_next` arms a one-shot failure.
///
/// Clones share the script, the failure switch, and the request log, so a
/// test can keep one clone as an observer while handing the other to the
/// system under test.
#[derive(Debug, Clone)]
pub struct MockCompletionProvider {
    model_id: String,
    scripted: Arc<Mutex<VecDeque<String>>>,
    fail_next: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionProvider {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            fail_next: Arc::new(AtomicBool::new(false)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a scripted response (builder form).
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push_response(content);
        self
    }

    /// Queue a scripted response.
    pub fn push_response(&self, content: impl Into<String>) {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.push_back(content.into());
        }
    }

    /// Make the next `complete` call fail with `CompletionFailed`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|requests| requests.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> QuorumResult<CompletionResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let model_id = if request.model_id.is_empty() {
            self.model_id.clone()
        } else {
            request.model_id.clone()
        };

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(UpstreamError::CompletionFailed {
                model: model_id,
                reason: "injected failure".to_string(),
            }
            .into());
        }

        let content = self
            .scripted
            .lock()
            .ok()
            .and_then(|mut scripted| scripted.pop_front())
            .unwrap_or_else(|| {
                let prompt = request
                    .messages
                    .iter()
                    .rev()
                    .find(|message| message.role == MessageRole::User)
                    .map(|message| message.content.as_str())
                    .unwrap_or("");
                format!("Completion: {}", prompt)
            });

        let input_chars: usize = request
            .messages
            .iter()
            .map(|message| message.content.len())
            .sum();
        let output_tokens = (content.len() / 4) as i64;

        Ok(CompletionResponse {
            content,
            model_id,
            input_tokens: (input_chars / 4) as i64,
            output_tokens,
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Mock secret store for testing (async).
///
/// Delegates to an `InMemorySecretStore`, with a one-shot failure switch
/// for exercising `SecretStoreFailed` paths.
#[derive(Debug)]
pub struct MockSecretStore {
    inner: InMemorySecretStore,
    fail_next: AtomicBool,
}

impl MockSecretStore {
    pub fn new() -> Self {
        Self {
            inner: InMemorySecretStore::new(),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Make the next store call fail with `SecretStoreFailed`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn take_failure(&self, operation: &str, provider: &str) -> QuorumResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(UpstreamError::SecretStoreFailed {
                operation: operation.to_string(),
                provider: provider.to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for MockSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for MockSecretStore {
    async fn get(&self, provider: &str) -> QuorumResult<Credential> {
        self.take_failure("get", provider)?;
        self.inner.get(provider).await
    }

    async fn put(&self, provider: &str, secret: &str) -> QuorumResult<Credential> {
        self.take_failure("put", provider)?;
        self.inner.put(provider, secret).await
    }

    async fn rotate(&self, provider: &str, new_secret: &str) -> QuorumResult<Credential> {
        self.take_failure("rotate", provider)?;
        self.inner.rotate(provider, new_secret).await
    }

    async fn delete(&self, provider: &str) -> QuorumResult<()> {
        self.take_failure("delete", provider)?;
        self.inner.delete(provider).await
    }

    async fn list(&self) -> QuorumResult<Vec<String>> {
        self.take_failure("list", "*")?;
        self.inner.list().await
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating QUORUM entity types.

    use super::*;
    use proptest::prelude::*;

    // === Identity Type Generators ===

    /// Generate a random UUID (for generic ID generation).
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a valid UUIDv7 (timestamp-sortable).
    pub fn arb_uuid_v7() -> impl Strategy<Value = Uuid> {
        Just(()).prop_map(|_| Uuid::now_v7())
    }

    /// Generate a random AgentId.
    pub fn arb_agent_id() -> impl Strategy<Value = AgentId> {
        arb_uuid().prop_map(AgentId::new)
    }

    /// Generate a random PlanId.
    pub fn arb_plan_id() -> impl Strategy<Value = PlanId> {
        arb_uuid().prop_map(PlanId::new)
    }

    /// Generate a random StepId.
    pub fn arb_step_id() -> impl Strategy<Value = StepId> {
        arb_uuid().prop_map(StepId::new)
    }

    /// Generate a random TransferId.
    pub fn arb_transfer_id() -> impl Strategy<Value = TransferId> {
        arb_uuid().prop_map(TransferId::new)
    }

    /// Generate a random EventId.
    pub fn arb_event_id() -> impl Strategy<Value = EventId> {
        arb_uuid().prop_map(EventId::new)
    }

    /// Generate a random TraceId.
    pub fn arb_trace_id() -> impl Strategy<Value = TraceId> {
        arb_uuid().prop_map(TraceId::new)
    }

    /// Generate a Timestamp (DateTime<Utc>).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        // Generate timestamps within a reasonable range (2020-2030)
        (1577836800i64..1893456000i64)
            .prop_map(|secs| chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now))
    }

    // === Enum Generators ===

    /// Generate an AgentKind variant.
    pub fn arb_agent_kind() -> impl Strategy<Value = AgentKind> {
        prop_oneof![
            Just(AgentKind::Coordinator),
            Just(AgentKind::CodeGen),
            Just(AgentKind::Reviewer),
            Just(AgentKind::Tester),
            Just(AgentKind::DocWriter),
            Just(AgentKind::Deployer),
            Just(AgentKind::Learner),
        ]
    }

    /// Generate an AgentState variant.
    pub fn arb_agent_state() -> impl Strategy<Value = AgentState> {
        prop_oneof![
            Just(AgentState::Idle),
            Just(AgentState::Reasoning),
            Just(AgentState::Planning),
            Just(AgentState::Executing),
            Just(AgentState::Reflecting),
            Just(AgentState::Collaborating),
            Just(AgentState::Offline),
        ]
    }

    /// Generate an AgentPriority variant.
    pub fn arb_agent_priority() -> impl Strategy<Value = AgentPriority> {
        prop_oneof![
            Just(AgentPriority::Low),
            Just(AgentPriority::Normal),
            Just(AgentPriority::High),
            Just(AgentPriority::Critical),
        ]
    }

    /// Generate a PlanStatus variant.
    pub fn arb_plan_status() -> impl Strategy<Value = PlanStatus> {
        prop_oneof![
            Just(PlanStatus::Draft),
            Just(PlanStatus::Active),
            Just(PlanStatus::Executing),
            Just(PlanStatus::Completed),
            Just(PlanStatus::Failed),
        ]
    }

    /// Generate a CoordinationKind variant.
    pub fn arb_coordination_kind() -> impl Strategy<Value = CoordinationKind> {
        prop_oneof![
            Just(CoordinationKind::TaskHandoff),
            Just(CoordinationKind::JointPlanning),
            Just(CoordinationKind::KnowledgeExchange),
            Just(CoordinationKind::ConflictResolution),
            Just(CoordinationKind::Collaboration),
        ]
    }

    /// Generate an OutcomeKind variant.
    pub fn arb_outcome_kind() -> impl Strategy<Value = OutcomeKind> {
        prop_oneof![
            Just(OutcomeKind::Success),
            Just(OutcomeKind::Failure),
            Just(OutcomeKind::Partial),
        ]
    }

    // === Struct Generators ===

    /// Generate a MemoryStats struct.
    pub fn arb_memory_stats() -> impl Strategy<Value = MemoryStats> {
        (0u64..512, 0u64..512, 0u64..512, 0u64..512).prop_map(
            |(short_term, long_term, episodic, semantic)| {
                MemoryStats::new(short_term, long_term, episodic, semantic)
            },
        )
    }

    /// Generate a PerformanceStats struct whose counters always balance.
    pub fn arb_performance_stats() -> impl Strategy<Value = PerformanceStats> {
        (0u64..2_000, 0u64..500, 0u64..200, 50.0f64..5_000.0).prop_map(
            |(completed, failed, in_flight, avg_response_time_ms)| PerformanceStats {
                total_tasks: completed + failed + in_flight,
                completed_tasks: completed,
                failed_tasks: failed,
                avg_response_time_ms,
            },
        )
    }

    /// Generate a ToolStats struct.
    pub fn arb_tool_stats() -> impl Strategy<Value = ToolStats> {
        ("[a-z_]{3,20}", "[a-z]{3,12}", 0u64..10_000, 0.0f64..=1.0).prop_map(
            |(name, category, usage_count, effectiveness)| {
                let mut tool = ToolStats::new(name, category, effectiveness);
                tool.usage_count = usage_count;
                tool
            },
        )
    }

    /// Generate a MemoryTrace owned by the given agent.
    pub fn arb_memory_trace(agent_id: AgentId) -> impl Strategy<Value = MemoryTrace> {
        ("[a-z ]{1,60}", 0.0f64..=1.0)
            .prop_map(move |(content, importance)| MemoryTrace::new(agent_id, content, importance))
    }

    /// Generate an AgentProfile with coherent status and activity flags.
    pub fn arb_profile() -> impl Strategy<Value = AgentProfile> {
        (
            (
                "[A-Za-z][A-Za-z0-9 ]{2,30}",
                arb_agent_kind(),
                arb_agent_state(),
                arb_agent_priority(),
            ),
            (
                prop::collection::vec("[a-z-]{3,18}", 0..5),
                arb_memory_stats(),
                arb_performance_stats(),
            ),
            (0u32..10, 0.0f64..15.0, 0u64..50, 0u64..20),
        )
            .prop_map(
                |(
                    (name, kind, status, priority),
                    (capabilities, memory, performance),
                    (queue_length, learning_velocity, knowledge_transfers, recent_reflections),
                )| {
                    let mut profile = AgentProfile::new(name, kind)
                        .with_priority(priority)
                        .with_capabilities(capabilities)
                        .with_memory(memory)
                        .with_learning_velocity(learning_velocity);
                    profile.status = status;
                    profile.is_active = status != AgentState::Offline;
                    profile.performance = performance;
                    profile.queue_length = queue_length;
                    profile.knowledge_transfers = knowledge_transfers;
                    profile.recent_reflections = recent_reflections;
                    profile
                },
            )
    }

    /// Generate a CoordinationEvent with at least two distinct participants.
    pub fn arb_coordination_event() -> impl Strategy<Value = CoordinationEvent> {
        (
            arb_coordination_kind(),
            prop::collection::hash_set(arb_agent_id(), 2..5),
            "[a-z ]{1,40}",
            arb_outcome_kind(),
            0i64..120_000,
        )
            .prop_map(|(kind, participants, description, outcome, duration_ms)| {
                CoordinationEvent::new(
                    kind,
                    participants.into_iter().collect(),
                    description,
                    outcome,
                    duration_ms,
                )
                .expect("hash set yields at least two distinct participants")
            })
    }

    /// Generate a KnowledgeTransferRecord.
    pub fn arb_transfer_record() -> impl Strategy<Value = KnowledgeTransferRecord> {
        (
            arb_agent_id(),
            arb_agent_id(),
            "[a-z-]{3,15}",
            "[a-z ]{1,80}",
            0.0f64..=1.0,
        )
            .prop_map(|(source, target, domain, knowledge, effectiveness)| {
                KnowledgeTransferRecord::new(source, target, domain, knowledge, effectiveness)
            })
    }

    /// Generate a SystemMetrics struct within observable ranges.
    pub fn arb_system_metrics() -> impl Strategy<Value = SystemMetrics> {
        (
            0.0f64..=100.0,
            100.0f64..10_000.0,
            0.0f64..=100.0,
            0.0f64..50.0,
            0.0f64..15.0,
            0.0f64..=100.0,
            0u64..20,
            0u64..200,
        )
            .prop_map(
                |(
                    overall_success_rate,
                    avg_completion_time_ms,
                    communication_efficiency,
                    knowledge_sharing_rate,
                    learning_velocity,
                    cost_efficiency,
                    emergent_behaviors_detected,
                    adaptation_count,
                )| SystemMetrics {
                    overall_success_rate,
                    avg_completion_time_ms,
                    communication_efficiency,
                    knowledge_sharing_rate,
                    learning_velocity,
                    cost_efficiency,
                    emergent_behaviors_detected,
                    adaptation_count,
                },
            )
    }

    /// Generate a Draft plan with a short goal.
    pub fn arb_draft_plan() -> impl Strategy<Value = Plan> {
        "[A-Za-z][a-z ]{2,40}".prop_map(|goal| super::fixtures::draft_plan(&goal))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// The default configuration, which every engine accepts.
    pub fn default_config() -> CoreConfig {
        CoreConfig::default()
    }

    /// Create an agent that is active and Idle, ready for dispatch.
    pub fn operational_agent(name: impl Into<String>, kind: AgentKind) -> AgentProfile {
        let mut profile = AgentProfile::new(name, kind);
        profile.status = AgentState::Idle;
        profile.is_active = true;
        profile
    }

    /// Create an agent in the freshly-provisioned Offline state.
    pub fn offline_agent(name: impl Into<String>, kind: AgentKind) -> AgentProfile {
        AgentProfile::new(name, kind)
    }

    /// Create a three-step Draft plan with sequential dependencies.
    pub fn draft_plan(goal: &str) -> Plan {
        let mut plan = Plan::new(goal);
        let outline = PlanStep::new(0, "Outline the work").with_confidence(0.9);
        let tooling = PlanStep::new(1, "Choose tooling")
            .with_dependency(outline.step_id)
            .with_confidence(0.85);
        let execute = PlanStep::new(2, "Carry out the plan")
            .with_dependency(tooling.step_id)
            .with_confidence(0.88);
        plan.add_step(outline);
        plan.add_step(tooling);
        plan.add_step(execute);
        plan.with_estimated_duration(1_800_000)
    }

    /// Create a plan already adopted by the agent and begun.
    pub fn executing_plan(goal: &str, agent_id: AgentId) -> Plan {
        let mut plan = draft_plan(goal);
        plan.adopt(agent_id).expect("fresh draft plan adopts cleanly");
        plan.begin().expect("adopted plan begins cleanly");
        plan
    }

    /// Create a successful two-agent collaboration event.
    pub fn collaboration_event(initiator: AgentId, partner: AgentId) -> CoordinationEvent {
        CoordinationEvent::new(
            CoordinationKind::Collaboration,
            vec![initiator, partner],
            "Joint problem solving session",
            OutcomeKind::Success,
            1_500,
        )
        .expect("two distinct participants")
        .with_lesson("Share intermediate findings early")
    }

    /// Create a knowledge-transfer record between two agents.
    pub fn transfer_record(source: AgentId, target: AgentId) -> KnowledgeTransferRecord {
        KnowledgeTransferRecord::new(
            source,
            target,
            "analysis",
            "Cache invalidation patterns recur across review findings",
            0.8,
        )
    }

    /// Create an in-memory registry pre-loaded with the seed fleet.
    pub fn seeded_registry() -> AgentRegistry {
        let registry =
            AgentRegistry::in_memory(CoreConfig::default()).expect("default config is valid");
        for agent in seed_fleet().expect("seed fleet builds") {
            registry.register(agent).expect("seed ids are unique");
        }
        registry
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for QUORUM-specific validation.

    use super::*;

    /// Assert that a QuorumResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &QuorumResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a QuorumResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &QuorumResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert that a QuorumResult failed with the given error kind.
    #[track_caller]
    pub fn assert_kind<T: std::fmt::Debug>(result: &QuorumResult<T>, kind: ErrorKind) {
        match result {
            Err(error) if error.kind() == kind => {}
            other => panic!("Expected {:?} error, got: {:?}", kind, other),
        }
    }

    /// Assert that a QuorumResult is a NotFound failure.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &QuorumResult<T>) {
        assert_kind(result, ErrorKind::NotFound);
    }

    /// Assert that a QuorumResult is an InvalidAction failure.
    #[track_caller]
    pub fn assert_invalid_action<T: std::fmt::Debug>(result: &QuorumResult<T>) {
        assert_kind(result, ErrorKind::InvalidAction);
    }

    /// Assert that a QuorumResult is a ValidationError failure.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &QuorumResult<T>) {
        assert_kind(result, ErrorKind::ValidationError);
    }

    /// Assert that a QuorumResult is an UpstreamFailure.
    #[track_caller]
    pub fn assert_upstream_failure<T: std::fmt::Debug>(result: &QuorumResult<T>) {
        assert_kind(result, ErrorKind::UpstreamFailure);
    }

    /// Assert that a QuorumResult is an InvariantViolation.
    #[track_caller]
    pub fn assert_invariant_violation<T: std::fmt::Debug>(result: &QuorumResult<T>) {
        assert_kind(result, ErrorKind::InvariantViolation);
    }

    /// Assert that task counters balance: completed + failed <= total.
    #[track_caller]
    pub fn assert_counters_balanced(performance: &PerformanceStats) {
        assert!(
            performance.is_balanced(),
            "Task counters out of balance: {} completed + {} failed > {} total",
            performance.completed_tasks,
            performance.failed_tasks,
            performance.total_tasks
        );
    }

    /// Assert that a plan has the expected status.
    #[track_caller]
    pub fn assert_plan_status(plan: &Plan, expected: PlanStatus) {
        assert_eq!(
            plan.status, expected,
            "Plan status mismatch: expected {:?}, got {:?}",
            expected, plan.status
        );
    }

    /// Assert that causal confidences never increase with depth.
    #[track_caller]
    pub fn assert_confidences_non_increasing(chain: &CausalChain) {
        for pair in chain.levels.windows(2) {
            assert!(
                pair[1].confidence <= pair[0].confidence,
                "Causal confidence increased with depth: {} -> {}",
                pair[0].confidence,
                pair[1].confidence
            );
        }
    }

    /// Assert that a CoreConfig passes validation.
    #[track_caller]
    pub fn assert_config_valid(config: &CoreConfig) {
        match config.validate() {
            Ok(()) => {}
            Err(e) => panic!("Config validation failed: {:?}", e),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = fixtures::default_config();
        assertions::assert_config_valid(&config);
    }

    #[test]
    fn test_operational_agent_fixture() {
        let agent = fixtures::operational_agent("Fixture Agent", AgentKind::Tester);
        assert!(agent.is_operational());
        assert_eq!(agent.status, AgentState::Idle);
    }

    #[test]
    fn test_offline_agent_fixture() {
        let agent = fixtures::offline_agent("Dormant Agent", AgentKind::Deployer);
        assert!(!agent.is_operational());
        assert_eq!(agent.status, AgentState::Offline);
    }

    #[test]
    fn test_draft_plan_fixture() {
        let plan = fixtures::draft_plan("Refactor ingestion");
        assertions::assert_plan_status(&plan, PlanStatus::Draft);
        assert_eq!(plan.steps.len(), 3);
        assert!(plan.validate().is_ok());
        assert_eq!(plan.steps[1].depends_on, vec![plan.steps[0].step_id]);
    }

    #[test]
    fn test_executing_plan_fixture() {
        let agent_id = AgentId::now_v7();
        let plan = fixtures::executing_plan("Refactor ingestion", agent_id);
        assertions::assert_plan_status(&plan, PlanStatus::Executing);
        assert_eq!(plan.adopted_by, Some(agent_id));
    }

    #[test]
    fn test_collaboration_event_fixture() {
        let initiator = AgentId::now_v7();
        let partner = AgentId::now_v7();
        let event = fixtures::collaboration_event(initiator, partner);
        assert_eq!(event.participants, vec![initiator, partner]);
        assert_eq!(event.outcome, OutcomeKind::Success);
        assert_eq!(event.lessons.len(), 1);
    }

    #[test]
    fn test_seeded_registry_fixture() {
        let registry = fixtures::seeded_registry();
        assert_eq!(registry.count().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_mock_completion_scripted_then_echo() {
        let provider = MockCompletionProvider::new("mock/model-a")
            .with_response("First scripted answer")
            .with_response("Second scripted answer");

        let request =
            CompletionRequest::new("mock/model-a", 0.7, 256).with_user("What changed?");
        let first = provider.complete(&request).await.unwrap();
        assert_eq!(first.content, "First scripted answer");

        let second = provider.complete(&request).await.unwrap();
        assert_eq!(second.content, "Second scripted answer");

        let echoed = provider.complete(&request).await.unwrap();
        assert_eq!(echoed.content, "Completion: What changed?");
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_completion_clone_shares_request_log() {
        let provider = MockCompletionProvider::new("mock/model-a");
        let recorder = provider.clone();

        let request =
            CompletionRequest::new("mock/model-a", 0.7, 256).with_user("What changed?");
        provider.complete(&request).await.unwrap();

        let seen = recorder.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].temperature, 0.7);
        assert_eq!(seen[0].max_tokens, 256);

        recorder.push_response("Scripted through the clone");
        let response = provider.complete(&request).await.unwrap();
        assert_eq!(response.content, "Scripted through the clone");
    }

    #[tokio::test]
    async fn test_mock_completion_failure_injection_is_one_shot() {
        let provider = MockCompletionProvider::new("mock/model-a");
        provider.fail_next();

        let request = CompletionRequest::new("mock/model-a", 0.7, 256).with_user("hello");
        let failed = provider.complete(&request).await;
        assertions::assert_upstream_failure(&failed);

        let recovered = provider.complete(&request).await;
        assertions::assert_ok(&recovered);
    }

    #[tokio::test]
    async fn test_mock_completion_substitutes_default_model() {
        let provider = MockCompletionProvider::new("mock/default-model");
        let request = CompletionRequest::new("", 0.7, 256).with_user("hello");
        let response = provider.complete(&request).await.unwrap();
        assert_eq!(response.model_id, "mock/default-model");
    }

    #[tokio::test]
    async fn test_mock_secret_store_delegates_and_fails_once() {
        let store = MockSecretStore::new();
        store.put("openai", "sk-first").await.unwrap();

        let credential = store.get("openai").await.unwrap();
        assert_eq!(credential.secret, "sk-first");
        assert_eq!(credential.version, 1);

        let rotated = store.rotate("openai", "sk-second").await.unwrap();
        assert_eq!(rotated.version, 2);

        store.fail_next();
        let failed = store.get("openai").await;
        assertions::assert_upstream_failure(&failed);

        let recovered = store.get("openai").await;
        assertions::assert_ok(&recovered);
    }

    #[test]
    fn test_assert_kind_matches_manufactured_error() {
        let result: QuorumResult<()> = Err(UpstreamError::ProviderNotConfigured {
            provider: "completion".to_string(),
        }
        .into());
        assertions::assert_upstream_failure(&result);
    }

    proptest! {
        /// Property: generated performance counters always balance.
        #[test]
        fn prop_generated_performance_stats_balance(
            performance in generators::arb_performance_stats()
        ) {
            prop_assert!(performance.is_balanced());
        }

        /// Property: generated coordination events always carry at least two
        /// distinct participants.
        #[test]
        fn prop_generated_events_have_distinct_participants(
            event in generators::arb_coordination_event()
        ) {
            let distinct: std::collections::HashSet<AgentId> =
                event.participants.iter().copied().collect();
            prop_assert!(distinct.len() >= 2);
        }

        /// Property: generated profiles keep activity coherent with status.
        #[test]
        fn prop_generated_profiles_are_coherent(profile in generators::arb_profile()) {
            prop_assert_eq!(profile.status == AgentState::Offline, !profile.is_active);
            prop_assert!(profile.performance.is_balanced());
        }
    }
}
