//! Deterministic stand-in for the advisory provider.
//!
//! The fallback is total: every context yields a decision. It reads nothing
//! but the context and the configuration, so identical inputs always give an
//! identical decision.
use super::{AdvisoryAction, AdvisoryDecision};
use crate::engine::{DecisionContext, Situation};
use crate::state::StructureKind;
use crate::DecisionConfig;

/// Item name used when the fallback decides to shop.
pub const POTION_ITEM: &str = "Health Potion";

/// Produce a decision from fixed rules, in priority order:
///
/// 1. critical health: drink a potion, otherwise retreat to the nearest shelter
/// 2. low health while fighting: drink a potion, otherwise fall back to a market
/// 3. low health near an affordable shop with few potions: buy one
/// 4. enemies close and health fine: fight the nearest
/// 5. otherwise explore
pub fn fallback_decision(ctx: &DecisionContext, config: &DecisionConfig) -> AdvisoryDecision {
    let ratio = ctx.health_ratio();
    let has_potion = ctx.inventory.potions > 0;
    let low = ratio < config.low_health;

    if ratio < config.critical_health {
        if has_potion {
            return AdvisoryDecision::fallback(
                AdvisoryAction::UsePotion,
                "",
                "Fallback: Critical health, using potion",
            );
        }
        let shelter = ctx
            .nearest_safe_point()
            .map(|safe| safe.kind.as_ref().to_owned())
            .unwrap_or_default();
        return AdvisoryDecision::fallback(
            AdvisoryAction::Retreat,
            shelter,
            "Fallback: Critical health, retreating to safety",
        );
    }

    if low && ctx.has(Situation::IN_COMBAT) {
        if has_potion {
            return AdvisoryDecision::fallback(
                AdvisoryAction::UsePotion,
                "",
                "Fallback: Low health in combat, using potion",
            );
        }
        let market = ctx
            .nearest_shop()
            .map(|_| StructureKind::Marketplace.as_ref().to_owned())
            .or_else(|| ctx.nearest_safe_point().map(|safe| safe.kind.as_ref().to_owned()))
            .unwrap_or_default();
        return AdvisoryDecision::fallback(
            AdvisoryAction::Retreat,
            market,
            "Fallback: Low health in combat, retreating",
        );
    }

    if low && ctx.has(Situation::CAN_SHOP) && ctx.inventory.potions < 2 {
        return AdvisoryDecision::fallback(
            AdvisoryAction::BuyItem,
            POTION_ITEM,
            "Fallback: Low health near market, buying potion",
        );
    }

    if !low {
        if let Some(threat) = ctx.nearest_threat() {
            return AdvisoryDecision::fallback(
                AdvisoryAction::Fight,
                threat.id.to_string(),
                "Fallback: Enemy nearby, engaging",
            );
        }
    }

    AdvisoryDecision::fallback(
        AdvisoryAction::Explore,
        "",
        "Fallback: Nothing urgent, exploring",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ContextBuilder;
    use crate::state::{AgentClass, DecisionSource, Position, World};
    use crate::SimTime;

    fn decide(configure: impl FnOnce(&mut World) -> crate::EntityId) -> AdvisoryDecision {
        let mut world = World::new();
        let hero = configure(&mut world);
        let config = DecisionConfig::default();
        let ctx = ContextBuilder::new(&world, &config)
            .build(hero, SimTime(0))
            .unwrap();
        fallback_decision(&ctx, &config)
    }

    #[test]
    fn test_critical_with_potion_drinks() {
        let decision = decide(|world| {
            world.spawn_with(AgentClass::Warrior, Position::ORIGIN, |hero| {
                hero.stats.health = 10;
                hero.inventory.potions = 1;
            })
        });
        assert_eq!(decision.action, AdvisoryAction::UsePotion);
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert_eq!(decision.reason, "Fallback: Critical health, using potion");
    }

    #[test]
    fn test_critical_without_potion_retreats_to_nearest_shelter() {
        let decision = decide(|world| {
            world.add_structure(StructureKind::Castle, Position::new(5.0, 0.0), 500);
            world.add_structure(StructureKind::GuardTower, Position::new(2.0, 0.0), 200);
            world.spawn_with(AgentClass::Warrior, Position::ORIGIN, |hero| {
                hero.stats.health = 10;
            })
        });
        assert_eq!(decision.action, AdvisoryAction::Retreat);
        assert_eq!(decision.target, "guard_tower");
    }

    #[test]
    fn test_low_health_in_combat_retreats_to_market() {
        let decision = decide(|world| {
            world.add_structure(StructureKind::Castle, Position::new(5.0, 0.0), 500);
            world.add_structure(StructureKind::Marketplace, Position::new(9.0, 0.0), 300);
            world.spawn(AgentClass::Goblin, Position::new(1.0, 0.0));
            world.spawn_with(AgentClass::Warrior, Position::ORIGIN, |hero| {
                hero.stats.health = 50;
            })
        });
        assert_eq!(decision.action, AdvisoryAction::Retreat);
        assert_eq!(decision.target, "marketplace");
    }

    #[test]
    fn test_low_health_near_shop_buys_potion() {
        let decision = decide(|world| {
            world.add_structure(StructureKind::Marketplace, Position::new(4.0, 0.0), 300);
            world.spawn_with(AgentClass::Warrior, Position::ORIGIN, |hero| {
                hero.stats.health = 50;
                hero.inventory.gold = 40;
            })
        });
        assert_eq!(decision.action, AdvisoryAction::BuyItem);
        assert_eq!(decision.target, POTION_ITEM);
    }

    #[test]
    fn test_healthy_with_enemy_fights_nearest() {
        let decision = decide(|world| {
            world.spawn(AgentClass::Goblin, Position::new(5.0, 0.0));
            let near = world.spawn(AgentClass::Wolf, Position::new(2.0, 0.0));
            let hero = world.spawn(AgentClass::Warrior, Position::ORIGIN);
            assert_eq!(near.0 + 1, hero.0);
            hero
        });
        assert_eq!(decision.action, AdvisoryAction::Fight);
        assert_eq!(decision.target, "#2");
    }

    #[test]
    fn test_nothing_urgent_explores() {
        let decision = decide(|world| world.spawn(AgentClass::Ranger, Position::ORIGIN));
        assert_eq!(decision.action, AdvisoryAction::Explore);
        assert_eq!(decision.reason, "Fallback: Nothing urgent, exploring");
    }
}
