//! Strict validation of provider responses.
//!
//! A response must be exactly one JSON object with a required `action` from
//! the configured whitelist and optional `target` and `reason` strings
//! (`reasoning` is accepted as an alias of `reason`). Any other shape is a
//! schema error. There is no repair: no code-fence stripping, no extraction
//! of an object embedded in prose.
use serde_json::Value;
use thiserror::Error;

use kingdom_core::{AdvisoryAction, AdvisoryDecision, DecisionConfig};

const KNOWN_FIELDS: [&str; 4] = ["action", "target", "reason", "reasoning"];

/// Why a provider response was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisorySchemaError {
    #[error("response is not a single JSON document: {0}")]
    Malformed(String),

    #[error("response must be a JSON object")]
    NotAnObject,

    #[error("response is missing `action`")]
    MissingAction,

    #[error("`action` must be a string")]
    ActionNotString,

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("action `{0}` is not enabled")]
    DisallowedAction(AdvisoryAction),

    #[error("unexpected field `{0}`")]
    UnexpectedField(String),
}

/// Validate `raw` and turn it into an advisory decision.
pub fn parse_advisory(raw: &str, config: &DecisionConfig) -> Result<AdvisoryDecision, AdvisorySchemaError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| AdvisorySchemaError::Malformed(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(AdvisorySchemaError::NotAnObject);
    };

    if let Some(unknown) = fields.keys().find(|key| !KNOWN_FIELDS.contains(&key.as_str())) {
        return Err(AdvisorySchemaError::UnexpectedField(unknown.clone()));
    }

    let action = match fields.get("action") {
        None | Some(Value::Null) => return Err(AdvisorySchemaError::MissingAction),
        Some(Value::String(text)) => text
            .trim()
            .to_ascii_lowercase()
            .parse::<AdvisoryAction>()
            .map_err(|_| AdvisorySchemaError::UnknownAction(text.clone()))?,
        Some(_) => return Err(AdvisorySchemaError::ActionNotString),
    };
    if !config.allows(action) {
        return Err(AdvisorySchemaError::DisallowedAction(action));
    }

    let target = coerce_text(fields.get("target"));
    let reason = ["reason", "reasoning"]
        .into_iter()
        .map(|key| coerce_text(fields.get(key)))
        .find(|text| !text.is_empty())
        .unwrap_or_default();
    Ok(AdvisoryDecision::advisory(action, target, reason))
}

/// Strings pass through trimmed; anything else becomes empty.
fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.trim().to_owned(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kingdom_core::DecisionSource;

    fn parse(raw: &str) -> Result<AdvisoryDecision, AdvisorySchemaError> {
        parse_advisory(raw, &DecisionConfig::default())
    }

    #[test]
    fn test_full_response() {
        let decision =
            parse(r##"{"action": "fight", "target": "#4", "reason": "It is weak"}"##).unwrap();
        assert_eq!(decision.action, AdvisoryAction::Fight);
        assert_eq!(decision.target, "#4");
        assert_eq!(decision.reason, "It is weak");
        assert_eq!(decision.source, DecisionSource::Advisory);
    }

    #[test]
    fn test_optional_fields_coerce_to_empty() {
        let decision = parse(r#"{"action": "explore", "target": 7, "reason": null}"#).unwrap();
        assert_eq!(decision.target, "");
        assert_eq!(decision.reason, "");

        let decision = parse(r#"{"action": "retreat", "reasoning": "too hurt"}"#).unwrap();
        assert_eq!(decision.reason, "too hurt");
    }

    #[test]
    fn test_first_nonempty_reason_wins() {
        let decision =
            parse(r#"{"action": "retreat", "reason": null, "reasoning": "too hurt"}"#).unwrap();
        assert_eq!(decision.reason, "too hurt");

        let decision =
            parse(r#"{"action": "retreat", "reason": " ", "reasoning": "outnumbered"}"#).unwrap();
        assert_eq!(decision.reason, "outnumbered");

        let decision =
            parse(r#"{"action": "retreat", "reason": "low health", "reasoning": "other"}"#).unwrap();
        assert_eq!(decision.reason, "low health");
    }

    #[test]
    fn test_missing_action_is_rejected() {
        assert_eq!(
            parse(r#"{"target": "castle", "reason": "safe"}"#),
            Err(AdvisorySchemaError::MissingAction)
        );
        assert_eq!(
            parse(r#"{"action": 3}"#),
            Err(AdvisorySchemaError::ActionNotString)
        );
    }

    #[test]
    fn test_unknown_action_and_fields_are_rejected() {
        assert_eq!(
            parse(r#"{"action": "dance"}"#),
            Err(AdvisorySchemaError::UnknownAction("dance".into()))
        );
        assert_eq!(
            parse(r#"{"action": "fight", "confidence": 0.9}"#),
            Err(AdvisorySchemaError::UnexpectedField("confidence".into()))
        );
    }

    #[test]
    fn test_non_object_shapes_are_rejected() {
        assert!(matches!(
            parse("Sure! Here is my answer"),
            Err(AdvisorySchemaError::Malformed(_))
        ));
        assert!(matches!(
            parse(r#"{"action": "fight"} {"action": "retreat"}"#),
            Err(AdvisorySchemaError::Malformed(_))
        ));
        assert!(matches!(
            parse("```json\n{\"action\": \"fight\"}\n```"),
            Err(AdvisorySchemaError::Malformed(_))
        ));
        assert_eq!(
            parse(r#"[{"action": "fight"}]"#),
            Err(AdvisorySchemaError::NotAnObject)
        );
    }

    #[test]
    fn test_whitelist_is_enforced() {
        let config = DecisionConfig {
            advisory_actions: vec![AdvisoryAction::Retreat, AdvisoryAction::UsePotion],
            ..DecisionConfig::default()
        };
        assert_eq!(
            parse_advisory(r#"{"action": "fight"}"#, &config),
            Err(AdvisorySchemaError::DisallowedAction(AdvisoryAction::Fight))
        );
        assert!(parse_advisory(r#"{"action": "USE_POTION"}"#, &config).is_ok());
    }
}
