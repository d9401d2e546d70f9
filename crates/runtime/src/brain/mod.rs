//! Advisory brain: optional provider consults behind a deadline, strict
//! response validation and the deterministic fallback.
//!
//! Provider errors, timeouts and malformed payloads are handled the same way:
//! the failure is logged and the fallback answers from the same context. A
//! consult never fails the tick.
mod prompt;
mod schema;

pub use prompt::{SYSTEM_PROMPT, request_for, user_prompt};
pub use schema::{AdvisorySchemaError, parse_advisory};

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use kingdom_core::{
    AdvisoryDecision, DecisionConfig, DecisionContext, ErrorSeverity, fallback_decision,
};

use crate::api::{DecisionProvider, ProviderError};
use crate::config::{AdvisoryConfig, ProviderChoice};
use crate::providers::{MockProvider, OpenAiProvider, OpenAiSettings, ScriptedProvider};

/// Why a consult produced no usable advice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisoryFailure {
    #[error("schema rejected: {0}")]
    Schema(#[from] AdvisorySchemaError),

    #[error("no answer within {deadline_ms} ms")]
    Timeout { deadline_ms: u64 },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AdvisoryFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            AdvisoryFailure::Schema(_) => "schema",
            AdvisoryFailure::Timeout { .. } => "timeout",
            AdvisoryFailure::Provider(_) => "provider",
        }
    }

    /// Every advisory failure is absorbed by the fallback.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }
}

/// Consult counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrainStats {
    pub consults: u64,
    pub advisory: u64,
    pub fallbacks: u64,
    pub failures: u64,
}

pub struct AdvisoryBrain {
    provider: Option<Arc<dyn DecisionProvider>>,
    deadline: Duration,
    stats: BrainStats,
}

impl AdvisoryBrain {
    /// Brain that never calls out.
    pub fn fallback_only() -> Self {
        Self {
            provider: None,
            deadline: Duration::from_millis(AdvisoryConfig::default().deadline_ms),
            stats: BrainStats::default(),
        }
    }

    pub fn with_provider(provider: Arc<dyn DecisionProvider>, deadline: Duration) -> Self {
        Self {
            provider: Some(provider),
            deadline,
            stats: BrainStats::default(),
        }
    }

    /// Build the brain selected by configuration.
    pub fn from_config(config: &AdvisoryConfig) -> Self {
        let deadline = Duration::from_millis(config.deadline_ms);
        match config.provider {
            ProviderChoice::FallbackOnly => Self {
                deadline,
                ..Self::fallback_only()
            },
            ProviderChoice::Mock => Self::with_provider(Arc::new(MockProvider::new()), deadline),
            ProviderChoice::Scripted => Self::with_provider(
                Arc::new(ScriptedProvider::new(config.scripted_responses.clone())),
                deadline,
            ),
            ProviderChoice::OpenAi => {
                let settings = OpenAiSettings {
                    api_key: config
                        .api_key
                        .as_ref()
                        .map(|key| key.expose().to_owned())
                        .unwrap_or_default(),
                    model: config.model.clone(),
                    base_url: config.base_url.clone(),
                };
                match OpenAiProvider::new(settings) {
                    Ok(provider) => Self::with_provider(Arc::new(provider), deadline),
                    Err(error) => {
                        warn!(target: "kingdom::brain", %error, "openai provider unavailable, using fallback rules");
                        Self {
                            deadline,
                            ..Self::fallback_only()
                        }
                    }
                }
            }
        }
    }

    pub fn is_fallback_only(&self) -> bool {
        self.provider.is_none()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider
            .as_ref()
            .map(|provider| provider.name())
            .unwrap_or("fallback_only")
    }

    pub fn stats(&self) -> BrainStats {
        self.stats
    }

    /// Ask the provider once, bounded by the deadline.
    ///
    /// # Returns
    /// The validated decision, or the typed reason there is none. In
    /// fallback-only mode this is always [`ProviderError::Unavailable`].
    pub async fn consult(
        &self,
        ctx: &DecisionContext,
        config: &DecisionConfig,
    ) -> Result<AdvisoryDecision, AdvisoryFailure> {
        let Some(provider) = &self.provider else {
            return Err(ProviderError::Unavailable("fallback-only mode".into()).into());
        };
        let request = request_for(ctx, config);
        let raw = tokio::time::timeout(self.deadline, provider.decide(&request))
            .await
            .map_err(|_| AdvisoryFailure::Timeout {
                deadline_ms: self.deadline.as_millis() as u64,
            })??;
        Ok(parse_advisory(&raw, config)?)
    }

    /// Consult if a provider is configured, falling back on any failure.
    ///
    /// Total: always returns a decision.
    pub async fn decide(&mut self, ctx: &DecisionContext, config: &DecisionConfig) -> AdvisoryDecision {
        self.stats.consults += 1;
        if self.provider.is_none() {
            self.stats.fallbacks += 1;
            return fallback_decision(ctx, config);
        }

        match self.consult(ctx, config).await {
            Ok(decision) => {
                self.stats.advisory += 1;
                debug!(
                    target: "kingdom::brain",
                    agent = %ctx.agent,
                    action = decision.action.as_str(),
                    "advisory decision accepted"
                );
                decision
            }
            Err(failure) => {
                self.stats.failures += 1;
                self.stats.fallbacks += 1;
                warn!(
                    target: "kingdom::brain",
                    agent = %ctx.agent,
                    provider = self.provider_name(),
                    kind = failure.kind(),
                    error = %failure,
                    "advisory consult failed, using fallback"
                );
                fallback_decision(ctx, config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kingdom_core::{
        AdvisoryAction, AgentClass, ContextBuilder, DecisionSource, Position, SimTime, World,
    };

    use crate::api::ProviderRequest;

    struct Slow;

    #[async_trait]
    impl DecisionProvider for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn decide(&self, _request: &ProviderRequest) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(r#"{"action": "fight"}"#.into())
        }
    }

    fn critical_context() -> (DecisionContext, DecisionConfig) {
        let mut world = World::new();
        let hero = world.spawn_with(AgentClass::Warrior, Position::ORIGIN, |hero| {
            hero.stats.health = 10;
            hero.inventory.potions = 1;
        });
        let config = DecisionConfig::default();
        let ctx = ContextBuilder::new(&world, &config)
            .build(hero, SimTime(0))
            .unwrap();
        (ctx, config)
    }

    #[tokio::test]
    async fn test_fallback_only_never_consults() {
        let (ctx, config) = critical_context();
        let mut brain = AdvisoryBrain::fallback_only();
        let decision = brain.decide(&ctx, &config).await;
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert_eq!(decision.action, AdvisoryAction::UsePotion);
        assert_eq!(brain.stats().fallbacks, 1);
        assert_eq!(brain.stats().failures, 0);
    }

    #[tokio::test]
    async fn test_missing_action_falls_back() {
        let (ctx, config) = critical_context();
        let provider = ScriptedProvider::new(vec![r##"{"target": "#1", "reason": "?"}"##.into()]);
        let mut brain = AdvisoryBrain::with_provider(Arc::new(provider), Duration::from_millis(50));

        let failure = brain.consult(&ctx, &config).await.unwrap_err();
        assert_eq!(failure, AdvisoryFailure::Schema(AdvisorySchemaError::MissingAction));

        let decision = brain.decide(&ctx, &config).await;
        assert_eq!(decision.source, DecisionSource::Fallback);
    }

    #[tokio::test]
    async fn test_deadline_turns_slow_provider_into_fallback() {
        let (ctx, config) = critical_context();
        let mut brain = AdvisoryBrain::with_provider(Arc::new(Slow), Duration::from_millis(20));

        let failure = brain.consult(&ctx, &config).await.unwrap_err();
        assert_eq!(failure, AdvisoryFailure::Timeout { deadline_ms: 20 });

        let decision = brain.decide(&ctx, &config).await;
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert_eq!(decision, fallback_decision(&ctx, &config));
        assert_eq!(brain.stats().failures, 1);
    }

    #[test]
    fn test_openai_without_key_runs_fallback_only() {
        let config = AdvisoryConfig {
            provider: ProviderChoice::OpenAi,
            ..AdvisoryConfig::default()
        };
        let brain = AdvisoryBrain::from_config(&config);
        assert!(brain.is_fallback_only());
        assert_eq!(brain.provider_name(), "fallback_only");
    }

    #[test]
    fn test_openai_with_key_is_selected() {
        let config = AdvisoryConfig {
            provider: ProviderChoice::OpenAi,
            api_key: Some(crate::config::ApiKey::new("sk-test")),
            ..AdvisoryConfig::default()
        };
        let brain = AdvisoryBrain::from_config(&config);
        assert_eq!(brain.provider_name(), "openai");
    }

    #[tokio::test]
    async fn test_unreachable_openai_endpoint_falls_back() {
        let (ctx, config) = critical_context();
        let advisory = AdvisoryConfig {
            provider: ProviderChoice::OpenAi,
            api_key: Some(crate::config::ApiKey::new("sk-test")),
            base_url: "http://127.0.0.1:1/v1".into(),
            deadline_ms: 2_000,
            ..AdvisoryConfig::default()
        };
        let mut brain = AdvisoryBrain::from_config(&advisory);

        let decision = brain.decide(&ctx, &config).await;
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert_eq!(decision, fallback_decision(&ctx, &config));
        assert_eq!(brain.stats().failures, 1);
    }
}
