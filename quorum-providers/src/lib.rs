//! QUORUM Providers - External Collaborator Traits
//!
//! Provider-agnostic traits for text completion and credential storage.
//! This crate defines the interfaces the coordination core consumes; the
//! core never retries a failed call on behalf of a provider, so
//! implementations own their own rate limiting and backoff.
//!
//! Concrete implementations shipped here:
//! - `HttpCompletionProvider`: chat-completions client over HTTP
//! - `InMemorySecretStore`: process-local credential store

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use quorum_core::{QuorumError, QuorumResult, Timestamp, UpstreamError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

mod providers;

pub use providers::HttpCompletionProvider;

// ============================================================================
// MESSAGE AND REQUEST TYPES
// ============================================================================

/// Author role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions that frame the conversation
    System,
    /// Content supplied by the requesting agent
    User,
    /// Content produced by the model
    Assistant,
}

impl MessageRole {
    /// Wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request handed to a `CompletionProvider`.
///
/// `model_id` may be left empty, in which case the provider substitutes
/// its own default model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier, e.g. "openrouter/anthropic/claude-sonnet-4"
    pub model_id: String,
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f64,
    /// Output token ceiling
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a request with no messages.
    pub fn new(model_id: impl Into<String>, temperature: f64, max_tokens: u32) -> Self {
        Self {
            model_id: model_id.into(),
            messages: Vec::new(),
            temperature,
            max_tokens,
        }
    }

    /// Append a system message.
    pub fn with_system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::system(content));
        self
    }

    /// Append a user message.
    pub fn with_user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::user(content));
        self
    }
}

/// The result of a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Completion text
    pub content: String,
    /// Model that produced the completion
    pub model_id: String,
    /// Tokens consumed by the prompt
    pub input_tokens: i64,
    /// Tokens produced in the completion
    pub output_tokens: i64,
}

// ============================================================================
// COMPLETION PROVIDER TRAIT
// ============================================================================

/// Trait for completion providers.
/// Implementations must be thread-safe (Send + Sync).
///
/// The coordination core treats completion as fire-once: a failed request
/// is surfaced to the caller, never retried by the core. Providers that
/// want retries or rate limiting implement them internally.
///
/// # Example
/// ```ignore
/// struct MyProvider { /* ... */ }
///
/// #[async_trait]
/// impl CompletionProvider for MyProvider {
///     async fn complete(&self, request: &CompletionRequest) -> QuorumResult<CompletionResponse> {
///         // Call the backing service
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Execute a completion request.
    ///
    /// # Arguments
    /// * `request` - Model, messages, and sampling parameters
    ///
    /// # Returns
    /// * `Ok(CompletionResponse)` - Completion text and token usage
    /// * `Err(QuorumError::Upstream)` - If the request fails
    async fn complete(&self, request: &CompletionRequest) -> QuorumResult<CompletionResponse>;

    /// Model identifier this provider substitutes when a request leaves
    /// `model_id` empty.
    fn model_id(&self) -> &str;
}

// ============================================================================
// DEFAULT MODEL TABLE
// ============================================================================

/// Model used when neither the request nor the provider names one.
pub const FALLBACK_MODEL: &str = "openrouter/anthropic/claude-sonnet-4";

static DEFAULT_MODELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("openai", "openrouter/openai/gpt-4o"),
        ("anthropic", "openrouter/anthropic/claude-sonnet-4"),
        ("google", "openrouter/google/gemini-pro"),
        ("blackbox", "openrouter/meta-llama/llama-3.1-8b-instruct"),
    ])
});

/// Default chat model for a named provider.
/// Unknown providers fall back to `FALLBACK_MODEL`.
pub fn default_model_for(provider: &str) -> &'static str {
    DEFAULT_MODELS
        .get(provider)
        .copied()
        .unwrap_or(FALLBACK_MODEL)
}

// ============================================================================
// SECRET STORE
// ============================================================================

/// A stored provider credential.
///
/// Versions start at 1 and increment on every rotation. The secret itself
/// is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The secret material
    pub secret: String,
    /// Rotation counter, starts at 1
    pub version: u32,
    /// When the credential was first stored
    pub created_at: Timestamp,
    /// When the credential was last rotated, if ever
    pub last_rotated: Option<Timestamp>,
}

impl Credential {
    /// Create a fresh version-1 credential.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            version: 1,
            created_at: Utc::now(),
            last_rotated: None,
        }
    }

    /// Replace the secret, bumping the version and rotation timestamp.
    pub fn rotate(&mut self, new_secret: impl Into<String>) {
        self.secret = new_secret.into();
        self.version += 1;
        self.last_rotated = Some(Utc::now());
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &"[REDACTED]")
            .field("version", &self.version)
            .field("created_at", &self.created_at)
            .field("last_rotated", &self.last_rotated)
            .finish()
    }
}

/// Trait for credential stores.
/// Implementations must be thread-safe (Send + Sync).
///
/// Providers are keyed by name ("openai", "anthropic", ...). The core
/// never assumes a specific backend; `InMemorySecretStore` is the
/// process-local default.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the credential stored for a provider.
    ///
    /// # Returns
    /// * `Ok(Credential)` - The stored credential
    /// * `Err(QuorumError::Upstream)` - If no credential is stored
    async fn get(&self, provider: &str) -> QuorumResult<Credential>;

    /// Store a fresh version-1 credential for a provider.
    /// Replaces any existing credential and resets its version.
    async fn put(&self, provider: &str, secret: &str) -> QuorumResult<Credential>;

    /// Rotate the credential for a provider.
    /// Bumps the version and rotation timestamp.
    ///
    /// # Returns
    /// * `Ok(Credential)` - The rotated credential
    /// * `Err(QuorumError::Upstream)` - If no credential is stored
    async fn rotate(&self, provider: &str, new_secret: &str) -> QuorumResult<Credential>;

    /// Remove the credential for a provider. Removing a provider that has
    /// no credential is a no-op.
    async fn delete(&self, provider: &str) -> QuorumResult<()>;

    /// List the providers that currently have a credential stored.
    async fn list(&self) -> QuorumResult<Vec<String>>;
}

// ============================================================================
// IN-MEMORY SECRET STORE
// ============================================================================

/// Process-local secret store backed by a HashMap.
/// Thread-safe via RwLock.
pub struct InMemorySecretStore {
    credentials: RwLock<HashMap<String, Credential>>,
}

impl InMemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, provider: &str) -> QuorumResult<Credential> {
        let credentials = self
            .credentials
            .read()
            .map_err(|_| store_failed("get", provider, "lock poisoned"))?;
        credentials
            .get(provider)
            .cloned()
            .ok_or_else(|| store_failed("get", provider, "no credential stored"))
    }

    async fn put(&self, provider: &str, secret: &str) -> QuorumResult<Credential> {
        let credential = Credential::new(secret);
        let mut credentials = self
            .credentials
            .write()
            .map_err(|_| store_failed("put", provider, "lock poisoned"))?;
        credentials.insert(provider.to_string(), credential.clone());
        Ok(credential)
    }

    async fn rotate(&self, provider: &str, new_secret: &str) -> QuorumResult<Credential> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|_| store_failed("rotate", provider, "lock poisoned"))?;
        let credential = credentials
            .get_mut(provider)
            .ok_or_else(|| store_failed("rotate", provider, "no credential stored"))?;
        credential.rotate(new_secret);
        Ok(credential.clone())
    }

    async fn delete(&self, provider: &str) -> QuorumResult<()> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|_| store_failed("delete", provider, "lock poisoned"))?;
        credentials.remove(provider);
        Ok(())
    }

    async fn list(&self) -> QuorumResult<Vec<String>> {
        let credentials = self
            .credentials
            .read()
            .map_err(|_| store_failed("list", "*", "lock poisoned"))?;
        let mut providers: Vec<String> = credentials.keys().cloned().collect();
        providers.sort();
        Ok(providers)
    }
}

impl std::fmt::Debug for InMemorySecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.credentials.read().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("InMemorySecretStore")
            .field("providers", &count)
            .finish()
    }
}

fn store_failed(operation: &str, provider: &str, reason: impl Into<String>) -> QuorumError {
    QuorumError::Upstream(UpstreamError::SecretStoreFailed {
        operation: operation.to_string(),
        provider: provider.to_string(),
        reason: reason.into(),
    })
}

// ============================================================================
// PROVIDER REGISTRY
// ============================================================================

/// Registry for external collaborators.
/// Providers must be explicitly registered - no auto-discovery.
///
/// # Example
/// ```ignore
/// let mut registry = ProviderRegistry::new();
/// registry.register_completion(Box::new(my_completion_provider));
/// registry.register_secrets(Box::new(InMemorySecretStore::new()));
///
/// // Later, use the providers
/// let response = registry.completion()?.complete(&request).await?;
/// ```
pub struct ProviderRegistry {
    /// Registered completion provider (optional)
    completion: Option<Arc<dyn CompletionProvider>>,
    /// Registered secret store (optional)
    secrets: Option<Arc<dyn SecretStore>>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry.
    /// No providers are registered by default.
    pub fn new() -> Self {
        Self {
            completion: None,
            secrets: None,
        }
    }

    /// Register a completion provider.
    /// Replaces any previously registered completion provider.
    pub fn register_completion(&mut self, provider: Box<dyn CompletionProvider>) {
        self.completion = Some(Arc::from(provider));
    }

    /// Register a secret store.
    /// Replaces any previously registered secret store.
    pub fn register_secrets(&mut self, store: Box<dyn SecretStore>) {
        self.secrets = Some(Arc::from(store));
    }

    /// Get the registered completion provider.
    ///
    /// # Returns
    /// * `Ok(Arc<dyn CompletionProvider>)` - Shared handle to the provider
    /// * `Err(QuorumError::Upstream(UpstreamError::ProviderNotConfigured))` - If none registered
    pub fn completion(&self) -> QuorumResult<Arc<dyn CompletionProvider>> {
        self.completion.clone().ok_or_else(|| {
            QuorumError::Upstream(UpstreamError::ProviderNotConfigured {
                provider: "completion".to_string(),
            })
        })
    }

    /// Get the registered secret store.
    ///
    /// # Returns
    /// * `Ok(Arc<dyn SecretStore>)` - Shared handle to the store
    /// * `Err(QuorumError::Upstream(UpstreamError::ProviderNotConfigured))` - If none registered
    pub fn secrets(&self) -> QuorumResult<Arc<dyn SecretStore>> {
        self.secrets.clone().ok_or_else(|| {
            QuorumError::Upstream(UpstreamError::ProviderNotConfigured {
                provider: "secret store".to_string(),
            })
        })
    }

    /// Check if a completion provider is registered.
    pub fn has_completion(&self) -> bool {
        self.completion.is_some()
    }

    /// Check if a secret store is registered.
    pub fn has_secrets(&self) -> bool {
        self.secrets.is_some()
    }

    /// Clear the completion provider registration.
    pub fn clear_completion(&mut self) {
        self.completion = None;
    }

    /// Clear the secret store registration.
    pub fn clear_secrets(&mut self) {
        self.secrets = None;
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("completion", &self.completion.is_some())
            .field("secrets", &self.secrets.is_some())
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Completion provider that always answers with fixed text.
    struct StaticCompletion {
        answer: String,
    }

    #[async_trait]
    impl CompletionProvider for StaticCompletion {
        async fn complete(&self, request: &CompletionRequest) -> QuorumResult<CompletionResponse> {
            Ok(CompletionResponse {
                content: self.answer.clone(),
                model_id: request.model_id.clone(),
                input_tokens: 10,
                output_tokens: 5,
            })
        }

        fn model_id(&self) -> &str {
            "static-test-model"
        }
    }

    #[test]
    fn registry_new_is_empty() {
        let registry = ProviderRegistry::new();
        assert!(!registry.has_completion());
        assert!(!registry.has_secrets());
    }

    #[test]
    fn registry_register_completion() {
        let mut registry = ProviderRegistry::new();
        registry.register_completion(Box::new(StaticCompletion {
            answer: "ok".to_string(),
        }));
        assert!(registry.has_completion());
        assert!(!registry.has_secrets());
    }

    #[test]
    fn registry_clear() {
        let mut registry = ProviderRegistry::new();
        registry.register_completion(Box::new(StaticCompletion {
            answer: "ok".to_string(),
        }));
        registry.register_secrets(Box::new(InMemorySecretStore::new()));

        registry.clear_completion();
        assert!(!registry.has_completion());
        assert!(registry.has_secrets());

        registry.clear_secrets();
        assert!(!registry.has_secrets());
    }

    #[test]
    fn registry_unconfigured_completion_errors() {
        let registry = ProviderRegistry::new();
        let err = registry.completion().err().unwrap();
        assert!(matches!(
            err,
            QuorumError::Upstream(UpstreamError::ProviderNotConfigured { .. })
        ));
    }

    #[tokio::test]
    async fn registered_completion_is_usable() {
        let mut registry = ProviderRegistry::new();
        registry.register_completion(Box::new(StaticCompletion {
            answer: "the plan holds".to_string(),
        }));

        let request = CompletionRequest::new("test-model", 0.7, 100)
            .with_system("You are terse.")
            .with_user("Does the plan hold?");
        let response = registry.completion().unwrap().complete(&request).await.unwrap();
        assert_eq!(response.content, "the plan holds");
        assert_eq!(response.model_id, "test-model");
    }

    #[test]
    fn chat_message_constructors_set_roles() {
        assert_eq!(ChatMessage::system("a").role, MessageRole::System);
        assert_eq!(ChatMessage::user("b").role, MessageRole::User);
        assert_eq!(ChatMessage::assistant("c").role, MessageRole::Assistant);
    }

    #[test]
    fn message_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn default_model_table_covers_known_providers() {
        assert_eq!(default_model_for("openai"), "openrouter/openai/gpt-4o");
        assert_eq!(
            default_model_for("anthropic"),
            "openrouter/anthropic/claude-sonnet-4"
        );
        assert_eq!(default_model_for("google"), "openrouter/google/gemini-pro");
    }

    #[test]
    fn default_model_table_falls_back() {
        assert_eq!(default_model_for("unheard-of"), FALLBACK_MODEL);
    }

    #[tokio::test]
    async fn secret_store_put_then_get() {
        let store = InMemorySecretStore::new();
        store.put("openai", "sk-first").await.unwrap();

        let credential = store.get("openai").await.unwrap();
        assert_eq!(credential.secret, "sk-first");
        assert_eq!(credential.version, 1);
        assert!(credential.last_rotated.is_none());
    }

    #[tokio::test]
    async fn secret_store_rotate_bumps_version() {
        let store = InMemorySecretStore::new();
        store.put("openai", "sk-first").await.unwrap();

        let rotated = store.rotate("openai", "sk-second").await.unwrap();
        assert_eq!(rotated.secret, "sk-second");
        assert_eq!(rotated.version, 2);
        assert!(rotated.last_rotated.is_some());
    }

    #[tokio::test]
    async fn secret_store_rotate_missing_fails() {
        let store = InMemorySecretStore::new();
        let err = store.rotate("openai", "sk-new").await.err().unwrap();
        assert!(matches!(
            err,
            QuorumError::Upstream(UpstreamError::SecretStoreFailed { .. })
        ));
    }

    #[tokio::test]
    async fn secret_store_get_missing_fails() {
        let store = InMemorySecretStore::new();
        assert!(store.get("nobody").await.is_err());
    }

    #[tokio::test]
    async fn secret_store_delete_is_idempotent() {
        let store = InMemorySecretStore::new();
        store.put("openai", "sk-first").await.unwrap();

        store.delete("openai").await.unwrap();
        assert!(store.get("openai").await.is_err());

        // Second delete of the same provider still succeeds
        store.delete("openai").await.unwrap();
    }

    #[tokio::test]
    async fn secret_store_list_is_sorted() {
        let store = InMemorySecretStore::new();
        store.put("openai", "a").await.unwrap();
        store.put("anthropic", "b").await.unwrap();
        store.put("google", "c").await.unwrap();

        let providers = store.list().await.unwrap();
        assert_eq!(providers, vec!["anthropic", "google", "openai"]);
    }

    #[test]
    fn credential_debug_redacts_secret() {
        let credential = Credential::new("sk-very-secret");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
