//! Runtime configuration structures and loaders.
//!
//! Sources, lowest to highest precedence: built-in defaults, a TOML file, then
//! process environment variables. [`RuntimeConfig::validate`] runs before a
//! simulation is built so a bad value stops startup instead of a running
//! world.
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use kingdom_core::DecisionConfig;

use crate::api::{Result, RuntimeError};

/// Which advisory provider the brain consults.
///
/// Unknown names are not an error: they select [`ProviderChoice::FallbackOnly`]
/// with a warning, so a run without a usable advisor still decides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ProviderChoice {
    /// Never call out; every consult is answered by the fallback rules.
    #[default]
    FallbackOnly,
    /// Deterministic rule-based provider that reads the prompt text.
    Mock,
    /// Replays `advisory.scripted_responses` in order.
    Scripted,
    /// OpenAI-compatible chat completions endpoint.
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderChoice {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderChoice::FallbackOnly => "fallback_only",
            ProviderChoice::Mock => "mock",
            ProviderChoice::Scripted => "scripted",
            ProviderChoice::OpenAi => "openai",
        }
    }
}

impl From<String> for ProviderChoice {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|unknown| {
            warn!(target: "kingdom::brain", provider = %unknown, "unknown provider, using fallback rules");
            ProviderChoice::FallbackOnly
        })
    }
}

impl fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderChoice {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fallback_only" | "fallback" | "none" => Ok(ProviderChoice::FallbackOnly),
            "mock" => Ok(ProviderChoice::Mock),
            "scripted" => Ok(ProviderChoice::Scripted),
            "openai" | "open_ai" => Ok(ProviderChoice::OpenAi),
            other => Err(other.to_owned()),
        }
    }
}

/// Advisory brain settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub provider: ProviderChoice,
    /// Deadline for one consult, in milliseconds.
    pub deadline_ms: u64,
    /// Responses replayed by the scripted provider.
    pub scripted_responses: Vec<String>,
    /// Model name sent to the `openai` provider.
    pub model: String,
    /// Endpoint root of the `openai` provider.
    pub base_url: String,
    /// Credential for the `openai` provider. Only ever read from the
    /// environment, never from or into a file.
    #[serde(skip)]
    pub api_key: Option<ApiKey>,
}

/// Provider credential; never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            provider: ProviderChoice::FallbackOnly,
            deadline_ms: 250,
            scripted_responses: Vec::new(),
            model: "gpt-3.5-turbo".to_owned(),
            base_url: "https://api.openai.com/v1".to_owned(),
            api_key: None,
        }
    }
}

/// Simulation clock and map settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Base seed every named stream derives from.
    pub seed: u64,
    /// Simulated milliseconds per tick.
    pub tick_ms: u64,
    pub map_width: i32,
    pub map_height: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_ms: 100,
            map_width: 48,
            map_height: 32,
        }
    }
}

/// Top-level configuration for a simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub decision: DecisionConfig,
    pub advisory: AdvisoryConfig,
    pub sim: SimConfig,
}

impl RuntimeConfig {
    /// Parse a TOML document. Missing tables and keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults, then the optional file, then the environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from process environment variables.
    ///
    /// Environment variables:
    /// - `KINGDOM_SEED` - Base seed for every named stream
    /// - `KINGDOM_PROVIDER` - `fallback_only`, `mock`, `scripted` or `openai`;
    ///   unknown names fall back to `fallback_only`
    /// - `KINGDOM_LLM_MODEL` - Model name for the `openai` provider
    /// - `KINGDOM_LLM_BASE_URL` - Endpoint root for the `openai` provider
    /// - `OPENAI_API_KEY` - Credential for the `openai` provider
    /// - `KINGDOM_TICK_MS` - Simulated milliseconds per tick
    /// - `KINGDOM_ADVISORY_DEADLINE_MS` - Deadline for one advisory consult
    /// - `KINGDOM_COMMIT_WINDOW_MS` - Commitment window duration
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    ///
    /// Unlike a silent parse, an unparsable value is an error: a typo in a
    /// seed should not quietly run a different world.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(seed) = read_override::<u64>(&lookup, "KINGDOM_SEED")? {
            self.sim.seed = seed;
        }
        if let Some(provider) = lookup("KINGDOM_PROVIDER") {
            self.advisory.provider = ProviderChoice::from(provider);
        }
        if let Some(model) = lookup("KINGDOM_LLM_MODEL").filter(|model| !model.trim().is_empty()) {
            self.advisory.model = model.trim().to_owned();
        }
        if let Some(url) = lookup("KINGDOM_LLM_BASE_URL").filter(|url| !url.trim().is_empty()) {
            self.advisory.base_url = url.trim().to_owned();
        }
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty()) {
            self.advisory.api_key = Some(ApiKey::new(key.trim()));
        }
        if let Some(tick_ms) = read_override::<u64>(&lookup, "KINGDOM_TICK_MS")? {
            self.sim.tick_ms = tick_ms;
        }
        if let Some(deadline) = read_override::<u64>(&lookup, "KINGDOM_ADVISORY_DEADLINE_MS")? {
            self.advisory.deadline_ms = deadline;
        }
        if let Some(window) = read_override::<u64>(&lookup, "KINGDOM_COMMIT_WINDOW_MS")? {
            self.decision.commitment_window_ms = window;
        }
        Ok(())
    }

    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.decision.validate()?;
        if self.sim.tick_ms == 0 {
            return Err(RuntimeError::InvalidConfig(
                "sim.tick_ms must be greater than zero".into(),
            ));
        }
        if self.sim.map_width <= 0 || self.sim.map_height <= 0 {
            return Err(RuntimeError::InvalidConfig(format!(
                "map must be non-empty, got {}x{}",
                self.sim.map_width, self.sim.map_height
            )));
        }
        if self.advisory.deadline_ms == 0 {
            return Err(RuntimeError::InvalidConfig(
                "advisory.deadline_ms must be greater than zero".into(),
            ));
        }
        if self.advisory.provider == ProviderChoice::Scripted
            && self.advisory.scripted_responses.is_empty()
        {
            return Err(RuntimeError::InvalidConfig(
                "scripted provider needs at least one response".into(),
            ));
        }
        Ok(())
    }
}

fn read_override<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>>
where
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| RuntimeError::InvalidEnv { key, value: raw })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RuntimeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.advisory.provider, ProviderChoice::FallbackOnly);
        assert_eq!(config.advisory.deadline_ms, 250);
        assert_eq!(config.sim.tick_ms, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [decision]
            commitment_window_ms = 3000

            [advisory]
            provider = "mock"

            [sim]
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.decision.commitment_window_ms, 3_000);
        assert_eq!(config.decision.hysteresis_margin, 10.0);
        assert_eq!(config.advisory.provider, ProviderChoice::Mock);
        assert_eq!(config.advisory.deadline_ms, 250);
        assert_eq!(config.sim.seed, 42);
        assert_eq!(config.sim.tick_ms, 100);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = RuntimeConfig::from_toml_str("[sim]\nseed = 1\n").unwrap();
        config
            .apply_overrides(lookup(&[
                ("KINGDOM_SEED", "9"),
                ("KINGDOM_PROVIDER", "fallback-only"),
                ("KINGDOM_COMMIT_WINDOW_MS", "2500"),
            ]))
            .unwrap();
        assert_eq!(config.sim.seed, 9);
        assert_eq!(config.advisory.provider, ProviderChoice::FallbackOnly);
        assert_eq!(config.decision.commitment_window_ms, 2_500);
    }

    #[test]
    fn test_unknown_provider_degrades_to_fallback() {
        let mut config = RuntimeConfig::default();
        config.advisory.provider = ProviderChoice::Mock;
        config
            .apply_overrides(lookup(&[("KINGDOM_PROVIDER", "claude")]))
            .unwrap();
        assert_eq!(config.advisory.provider, ProviderChoice::FallbackOnly);

        let from_file = RuntimeConfig::from_toml_str("[advisory]\nprovider = \"gemini\"\n").unwrap();
        assert_eq!(from_file.advisory.provider, ProviderChoice::FallbackOnly);
    }

    #[test]
    fn test_openai_settings_come_from_env() {
        let mut config = RuntimeConfig::from_toml_str(
            "[advisory]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\n",
        )
        .unwrap();
        assert_eq!(config.advisory.provider, ProviderChoice::OpenAi);
        assert_eq!(config.advisory.model, "gpt-4o-mini");
        assert!(config.advisory.api_key.is_none());

        config
            .apply_overrides(lookup(&[
                ("OPENAI_API_KEY", "sk-live"),
                ("KINGDOM_LLM_BASE_URL", "http://localhost:8080/v1"),
            ]))
            .unwrap();
        let key = config.advisory.api_key.as_ref().expect("key from env");
        assert_eq!(key.expose(), "sk-live");
        assert!(!format!("{config:?}").contains("sk-live"));
        assert_eq!(config.advisory.base_url, "http://localhost:8080/v1");
        assert_eq!(config.advisory.model, "gpt-4o-mini");
    }

    #[test]
    fn test_bad_env_value_fails() {
        let mut config = RuntimeConfig::default();
        let error = config
            .apply_overrides(lookup(&[("KINGDOM_TICK_MS", "fast")]))
            .unwrap_err();
        assert!(matches!(
            error,
            RuntimeError::InvalidEnv {
                key: "KINGDOM_TICK_MS",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_thresholds_fail_fast() {
        let config = RuntimeConfig::from_toml_str(
            "[decision]\ntier_medium = 150.0\ntier_high = 100.0\n",
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(RuntimeError::Config(_))));

        let mut scripted = RuntimeConfig::default();
        scripted.advisory.provider = ProviderChoice::Scripted;
        assert!(matches!(
            scripted.validate(),
            Err(RuntimeError::InvalidConfig(_))
        ));
    }
}
