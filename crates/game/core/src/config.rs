//! Named tunables for the decision engine.
//!
//! Every threshold the state machine, bounty board, stuck detector and
//! advisory gate consult lives in [`DecisionConfig`]. Defaults mirror the
//! locked gameplay values; [`DecisionConfig::validate`] rejects combinations
//! that would make the engine misbehave so callers can fail fast at startup.

use thiserror::Error;

use crate::advisory::AdvisoryAction;
use crate::bounty::BountyKind;

/// Configuration failures detected before a simulation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("`{field}` = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("critical health ({critical}) must be below low health ({low})")]
    HealthThresholdOrder { critical: f32, low: f32 },

    #[error("medium tier threshold ({medium}) must be below high tier threshold ({high})")]
    TierThresholdOrder { medium: f32, high: f32 },

    #[error("advisory action whitelist is empty")]
    EmptyActionWhitelist,

    #[error("advisory action `{0}` is listed more than once")]
    DuplicateAction(AdvisoryAction),
}

/// Attractiveness multipliers per bounty kind.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BountyWeights {
    pub explore: f32,
    pub attack_lair: f32,
    pub defend_building: f32,
    pub hunt_enemy_type: f32,
}

impl BountyWeights {
    pub fn weight(&self, kind: BountyKind) -> f32 {
        match kind {
            BountyKind::Explore => self.explore,
            BountyKind::AttackLair => self.attack_lair,
            BountyKind::DefendBuilding => self.defend_building,
            BountyKind::HuntEnemyType => self.hunt_enemy_type,
        }
    }
}

impl Default for BountyWeights {
    fn default() -> Self {
        Self {
            explore: 1.0,
            attack_lair: 1.3,
            defend_building: 1.2,
            hunt_enemy_type: 1.1,
        }
    }
}

/// Decision engine tunables.
///
/// Durations are simulation milliseconds and distances are tiles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecisionConfig {
    // Commitment
    pub commitment_window_ms: u64,
    pub hysteresis_margin: f32,

    // Health thresholds (fraction of max health)
    pub critical_health: f32,
    pub low_health: f32,
    pub shelter_exit_health: f32,

    // Advisory gate
    pub advisory_cooldown_ms: u64,
    pub advisory_actions: Vec<AdvisoryAction>,
    pub shopping_gold: u32,

    // Stuck detection and recovery
    pub stuck_window_ms: u64,
    pub stuck_displacement_tiles: f32,
    pub stuck_progress_reset_tiles: f32,
    pub unstuck_max_attempts: u32,
    pub unstuck_backoff_ms: u64,

    // Bounty board
    pub bounty_refresh_interval_ms: u64,
    pub tier_medium: f32,
    pub tier_high: f32,
    pub responder_saturation: f32,
    pub bounty_weights: BountyWeights,

    // Sensing and interaction radii
    pub threat_radius_tiles: f32,
    pub context_radius_tiles: f32,
    pub shop_radius_tiles: f32,
    pub arrival_radius_tiles: f32,
    pub explore_claim_radius_tiles: f32,
    pub attack_range_tiles: f32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            commitment_window_ms: 1_500,
            hysteresis_margin: 10.0,

            critical_health: 0.25,
            low_health: 0.5,
            shelter_exit_health: 0.9,

            advisory_cooldown_ms: 2_000,
            advisory_actions: AdvisoryAction::ALL.to_vec(),
            shopping_gold: 30,

            stuck_window_ms: 2_000,
            stuck_displacement_tiles: 0.25,
            stuck_progress_reset_tiles: 1.5,
            unstuck_max_attempts: 3,
            unstuck_backoff_ms: 500,

            bounty_refresh_interval_ms: 500,
            tier_medium: 40.0,
            tier_high: 100.0,
            responder_saturation: 0.5,
            bounty_weights: BountyWeights::default(),

            threat_radius_tiles: 8.0,
            context_radius_tiles: 12.0,
            shop_radius_tiles: 6.0,
            arrival_radius_tiles: 1.5,
            explore_claim_radius_tiles: 2.0,
            attack_range_tiles: 1.5,
        }
    }
}

impl DecisionConfig {
    /// Check every tunable, returning the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_ms("commitment_window_ms", self.commitment_window_ms)?;
        positive_ms("advisory_cooldown_ms", self.advisory_cooldown_ms)?;
        positive_ms("stuck_window_ms", self.stuck_window_ms)?;
        positive_ms("bounty_refresh_interval_ms", self.bounty_refresh_interval_ms)?;
        if self.unstuck_max_attempts == 0 {
            return Err(ConfigError::NotPositive {
                field: "unstuck_max_attempts",
            });
        }

        in_range("hysteresis_margin", self.hysteresis_margin, 0.0, 1_000.0)?;
        in_range("critical_health", self.critical_health, 0.0, 1.0)?;
        in_range("low_health", self.low_health, 0.0, 1.0)?;
        in_range("shelter_exit_health", self.shelter_exit_health, 0.0, 1.0)?;
        in_range("responder_saturation", self.responder_saturation, 0.0, 100.0)?;
        if self.critical_health >= self.low_health {
            return Err(ConfigError::HealthThresholdOrder {
                critical: self.critical_health,
                low: self.low_health,
            });
        }

        positive_f32("tier_medium", self.tier_medium)?;
        if self.tier_medium >= self.tier_high || !self.tier_high.is_finite() {
            return Err(ConfigError::TierThresholdOrder {
                medium: self.tier_medium,
                high: self.tier_high,
            });
        }

        for (field, value) in [
            ("bounty_weights.explore", self.bounty_weights.explore),
            ("bounty_weights.attack_lair", self.bounty_weights.attack_lair),
            (
                "bounty_weights.defend_building",
                self.bounty_weights.defend_building,
            ),
            (
                "bounty_weights.hunt_enemy_type",
                self.bounty_weights.hunt_enemy_type,
            ),
            ("stuck_displacement_tiles", self.stuck_displacement_tiles),
            ("stuck_progress_reset_tiles", self.stuck_progress_reset_tiles),
            ("threat_radius_tiles", self.threat_radius_tiles),
            ("context_radius_tiles", self.context_radius_tiles),
            ("shop_radius_tiles", self.shop_radius_tiles),
            ("arrival_radius_tiles", self.arrival_radius_tiles),
            ("explore_claim_radius_tiles", self.explore_claim_radius_tiles),
            ("attack_range_tiles", self.attack_range_tiles),
        ] {
            positive_f32(field, value)?;
        }

        if self.advisory_actions.is_empty() {
            return Err(ConfigError::EmptyActionWhitelist);
        }
        for (index, action) in self.advisory_actions.iter().enumerate() {
            if self.advisory_actions[..index].contains(action) {
                return Err(ConfigError::DuplicateAction(*action));
            }
        }

        Ok(())
    }

    /// Whether `action` may be returned by an advisory provider.
    pub fn allows(&self, action: AdvisoryAction) -> bool {
        self.advisory_actions.contains(&action)
    }
}

fn positive_ms(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NotPositive { field });
    }
    Ok(())
}

fn positive_f32(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(ConfigError::NotPositive { field });
    }
    Ok(())
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(DecisionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_commitment_window_rejected() {
        let config = DecisionConfig {
            commitment_window_ms: 0,
            ..DecisionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "commitment_window_ms"
            })
        );
    }

    #[test]
    fn test_inverted_tiers_rejected() {
        let config = DecisionConfig {
            tier_medium: 120.0,
            tier_high: 100.0,
            ..DecisionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TierThresholdOrder { .. })
        ));
    }

    #[test]
    fn test_inverted_health_thresholds_rejected() {
        let config = DecisionConfig {
            critical_health: 0.6,
            ..DecisionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::HealthThresholdOrder { .. })
        ));
    }

    #[test]
    fn test_whitelist_rules() {
        let empty = DecisionConfig {
            advisory_actions: Vec::new(),
            ..DecisionConfig::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::EmptyActionWhitelist));

        let duplicated = DecisionConfig {
            advisory_actions: vec![AdvisoryAction::Fight, AdvisoryAction::Fight],
            ..DecisionConfig::default()
        };
        assert_eq!(
            duplicated.validate(),
            Err(ConfigError::DuplicateAction(AdvisoryAction::Fight))
        );
    }

    #[test]
    fn test_nan_radius_rejected() {
        let config = DecisionConfig {
            threat_radius_tiles: f32::NAN,
            ..DecisionConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "threat_radius_tiles"
            })
        );
    }
}
