//! Rule-based provider that reads the user prompt.
//!
//! Stands in for a remote model during development. It only sees the prompt
//! text, so it exercises the same request and validation path a real
//! provider would, and its answers depend on nothing but that text.
use async_trait::async_trait;
use serde_json::json;

use crate::api::{DecisionProvider, ProviderError, ProviderRequest};

#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DecisionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn decide(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let reading = Reading::parse(&request.user_prompt);
        let (action, target, reason) = reading.advise();
        Ok(json!({ "action": action, "target": target, "reason": reason }).to_string())
    }
}

/// What the mock picks out of a prompt.
#[derive(Debug, Default, PartialEq)]
struct Reading {
    health_pct: u32,
    potions: u32,
    brave: bool,
    cautious: bool,
    greedy: bool,
    enemy: Option<String>,
    safety: Option<String>,
    shop: Option<String>,
    in_combat: bool,
    outnumbered: bool,
    can_shop: bool,
}

impl Reading {
    fn parse(prompt: &str) -> Self {
        let mut reading = Reading {
            health_pct: 100,
            ..Reading::default()
        };
        for line in prompt.lines() {
            if let Some(rest) = line.strip_prefix("Agent ") {
                reading.brave = rest.contains("brave");
                reading.cautious = rest.contains("cautious");
                reading.greedy = rest.contains("greedy");
            } else if let Some(rest) = line.strip_prefix("Health: ") {
                reading.health_pct = between(rest, '(', '%')
                    .and_then(|pct| pct.parse().ok())
                    .unwrap_or(100);
            } else if line.starts_with("Gold: ") {
                reading.potions = line
                    .split("Potions: ")
                    .nth(1)
                    .and_then(|n| n.trim().parse().ok())
                    .unwrap_or(0);
            } else if let Some(rest) = line.strip_prefix("Nearby enemies: ") {
                reading.enemy = entity_ref(rest);
            } else if let Some(rest) = line.strip_prefix("Nearest safety: ") {
                reading.safety = entity_ref(rest);
            } else if let Some(rest) = line.strip_prefix("Shop: ") {
                reading.shop = entity_ref(rest);
            } else if let Some(rest) = line.strip_prefix("Situation: ") {
                reading.in_combat = rest.contains("in combat");
                reading.outnumbered = rest.contains("outnumbered");
                reading.can_shop = rest.contains("can afford potion");
            }
        }
        reading
    }

    fn advise(&self) -> (&'static str, String, &'static str) {
        let safety = self.safety.clone().unwrap_or_default();

        if self.health_pct < 25 {
            if self.potions > 0 {
                return ("use_potion", String::new(), "Badly hurt, drinking a potion");
            }
            return ("retreat", safety, "Badly hurt with no potion, falling back");
        }

        if self.in_combat && self.health_pct < 50 {
            if self.brave && !self.outnumbered {
                if let Some(enemy) = &self.enemy {
                    return ("fight", enemy.clone(), "Wounded but standing my ground");
                }
            }
            if self.potions > 0 {
                return ("use_potion", String::new(), "Patching up mid-fight");
            }
            return ("retreat", safety, "Too hurt to keep fighting");
        }

        if self.can_shop && self.potions < 2 && (self.health_pct < 80 || !self.greedy) {
            let shop = self.shop.clone().unwrap_or_default();
            return ("buy_item", shop, "Stocking up on potions while the market is close");
        }

        if let Some(enemy) = &self.enemy {
            if self.outnumbered && self.cautious {
                return ("retreat", safety, "Outnumbered, regrouping at safety");
            }
            if self.outnumbered && self.greedy {
                return ("explore", String::new(), "Not worth the risk, looking for loot");
            }
            return ("fight", enemy.clone(), "Enemy in reach");
        }

        ("explore", String::new(), "Nothing pressing, scouting ahead")
    }
}

fn between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)? + open.len_utf8();
    let end = text[start..].find(close)? + start;
    Some(&text[start..end])
}

/// First `#<digits>` in `text`.
fn entity_ref(text: &str) -> Option<String> {
    let start = text.find('#')?;
    let digits: String = text[start + 1..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    (!digits.is_empty()).then(|| format!("#{digits}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "Agent #5 (warrior, brave and aggressive)\n\
Health: 48/120 (40%)\n\
Attack: 14 Defense: 6\n\
Gold: 10 Potions: 0\n\
State: engaging_enemy\n\
Nearby enemies: goblin #7 at 1.0 tiles (hp 40/40)\n\
Allies nearby: 0\n\
Nearest safety: castle #1 at 9.0 tiles\n\
Situation: in combat, low health, enemies nearby";

    #[test]
    fn test_reading_picks_out_fields() {
        let reading = Reading::parse(PROMPT);
        assert_eq!(reading.health_pct, 40);
        assert_eq!(reading.potions, 0);
        assert!(reading.brave);
        assert_eq!(reading.enemy.as_deref(), Some("#7"));
        assert_eq!(reading.safety.as_deref(), Some("#1"));
        assert!(reading.in_combat);
        assert!(!reading.can_shop);
    }

    #[test]
    fn test_brave_agent_holds_ground_when_not_outnumbered() {
        let (action, target, _) = Reading::parse(PROMPT).advise();
        assert_eq!(action, "fight");
        assert_eq!(target, "#7");
    }

    #[test]
    fn test_cautious_agent_retreats() {
        let prompt = PROMPT.replace("brave and aggressive", "cautious and strategic");
        let (action, target, _) = Reading::parse(&prompt).advise();
        assert_eq!(action, "retreat");
        assert_eq!(target, "#1");
    }

    #[tokio::test]
    async fn test_response_is_a_single_object() {
        let request = ProviderRequest {
            system_prompt: String::new(),
            user_prompt: "Health: 100/100 (100%)\nNearby enemies: none\nSituation: calm".into(),
        };
        let raw = MockProvider::new().decide(&request).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["action"], "explore");
    }
}
