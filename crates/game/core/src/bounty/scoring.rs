use super::{BountyKind, Tier};
use crate::DecisionConfig;

/// Attractiveness of a bounty as seen by a prospective responder.
///
/// `reward × weight(kind) / (1 + saturation × responders)`: every agent
/// already responding makes the bounty less appealing to the next one.
pub fn attractiveness(kind: BountyKind, reward: u32, responders: u32, config: &DecisionConfig) -> f32 {
    let weight = config.bounty_weights.weight(kind);
    let penalty = 1.0 + config.responder_saturation * responders as f32;
    reward as f32 * weight / penalty
}

/// Map a score onto the fixed tier thresholds. Thresholds are inclusive.
pub fn tier_for(score: f32, config: &DecisionConfig) -> Tier {
    if score >= config.tier_high {
        Tier::High
    } else if score >= config.tier_medium {
        Tier::Med
    } else {
        Tier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responders_saturate_attractiveness() {
        let config = DecisionConfig::default();
        let alone = attractiveness(BountyKind::Explore, 60, 0, &config);
        let crowded = attractiveness(BountyKind::Explore, 60, 4, &config);
        assert!((alone - 60.0).abs() < 1e-4);
        assert!((crowded - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_kind_weight_applies() {
        let config = DecisionConfig::default();
        let lair = attractiveness(BountyKind::AttackLair, 100, 0, &config);
        assert!((lair - 130.0).abs() < 1e-3);
    }

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        let config = DecisionConfig::default();
        assert_eq!(tier_for(39.9, &config), Tier::Low);
        assert_eq!(tier_for(40.0, &config), Tier::Med);
        assert_eq!(tier_for(100.0, &config), Tier::High);
    }
}
