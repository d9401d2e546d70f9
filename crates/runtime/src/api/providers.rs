//! Asynchronous abstraction over advisory decision providers.
//!
//! Runtime users plug in [`DecisionProvider`] implementations so agents can
//! be advised by a remote model, a rule-based mock, or a scripted fixture.
//! Whatever the provider returns is untrusted text; the brain validates it.
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Prompt pair sent to a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Transport-level provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider has no scripted responses left")]
    Exhausted,

    #[error("provider request failed: {0}")]
    Transport(String),
}

/// Trait for sourcing advisory decisions.
///
/// Different implementations can handle:
/// - Remote model calls
/// - Deterministic rule-based advice
/// - Scripted responses for tests
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Ask for a decision.
    ///
    /// # Arguments
    /// * `request` - System and user prompt describing the agent's situation
    ///
    /// # Returns
    /// The raw response body. It is expected to hold exactly one JSON object
    /// but nothing is assumed until the schema check has run.
    async fn decide(&self, request: &ProviderRequest) -> Result<String, ProviderError>;
}
