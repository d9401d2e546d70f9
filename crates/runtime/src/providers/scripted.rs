//! Provider that replays a fixed sequence of responses.
use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::api::{DecisionProvider, ProviderError, ProviderRequest};

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedResponse {
    /// Return this raw body.
    Body(String),
    /// Fail with this error.
    Fail(ProviderError),
}

/// Answers consults in order; [`ProviderError::Exhausted`] once empty.
#[derive(Debug)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    latency: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(bodies: Vec<String>) -> Self {
        Self::from_steps(bodies.into_iter().map(ScriptedResponse::Body).collect())
    }

    pub fn from_steps(steps: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(steps.into()),
            latency: None,
        }
    }

    /// Delay every answer, e.g. to exercise the brain's deadline.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait]
impl DecisionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn decide(&self, _request: &ProviderRequest) -> Result<String, ProviderError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.responses.lock().await.pop_front() {
            Some(ScriptedResponse::Body(body)) => Ok(body),
            Some(ScriptedResponse::Fail(error)) => Err(error),
            None => Err(ProviderError::Exhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            system_prompt: String::new(),
            user_prompt: String::new(),
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_then_exhausts() {
        let provider = ScriptedProvider::from_steps(vec![
            ScriptedResponse::Body("first".into()),
            ScriptedResponse::Fail(ProviderError::Transport("reset".into())),
        ]);
        assert_eq!(provider.decide(&request()).await.unwrap(), "first");
        assert_eq!(
            provider.decide(&request()).await,
            Err(ProviderError::Transport("reset".into()))
        );
        assert_eq!(provider.remaining().await, 0);
        assert_eq!(provider.decide(&request()).await, Err(ProviderError::Exhausted));
    }
}
