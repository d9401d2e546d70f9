//! Combat boundary.
//!
//! Every strike passes through [`CombatGate::authorize`], which re-checks the
//! rules independently of the state machine. In particular an agent inside a
//! building can neither deal nor receive damage, whatever state it reports.
mod damage;

pub use damage::{STRUCTURE_DEFENSE, damage};

use thiserror::Error;

use crate::state::{Agent, EntityId, Faction, Structure};
use crate::{DecisionConfig, SimTime};

/// Something that can be struck.
#[derive(Clone, Copy, Debug)]
pub enum Combatant<'a> {
    Agent(&'a Agent),
    Structure(&'a Structure),
}

impl Combatant<'_> {
    pub fn id(&self) -> EntityId {
        match self {
            Combatant::Agent(agent) => agent.id,
            Combatant::Structure(structure) => structure.id,
        }
    }
}

/// Why a strike was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombatRefusal {
    #[error("attacker {0} is inside a building")]
    AttackerSheltered(EntityId),

    #[error("attacker {0} is not in a combat state")]
    NotFighting(EntityId),

    #[error("attacker {0} is down")]
    AttackerDown(EntityId),

    #[error("target {0} is sheltered")]
    TargetSheltered(EntityId),

    #[error("target {0} is already down")]
    TargetDown(EntityId),

    #[error("target {0} is not hostile")]
    NotHostile(EntityId),

    #[error("target is {distance:.1} tiles away, range {range:.1}")]
    OutOfRange { distance: f32, range: f32 },

    #[error("attack not ready until {ready_at}")]
    Cooldown { ready_at: SimTime },
}

/// An authorized strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Strike {
    pub attacker: EntityId,
    pub victim: EntityId,
    pub damage: i32,
}

/// Stateless rule check at the point where damage is applied.
pub struct CombatGate;

impl CombatGate {
    /// Check every rule for `attacker` striking `victim` at `now`.
    pub fn authorize(
        attacker: &Agent,
        victim: Combatant<'_>,
        now: SimTime,
        config: &DecisionConfig,
    ) -> Result<Strike, CombatRefusal> {
        if attacker.is_inside_building() || attacker.sheltered_in.is_some() {
            return Err(CombatRefusal::AttackerSheltered(attacker.id));
        }
        if !attacker.is_alive() {
            return Err(CombatRefusal::AttackerDown(attacker.id));
        }
        if !attacker.state.is_combat() {
            return Err(CombatRefusal::NotFighting(attacker.id));
        }
        if now < attacker.next_attack_at {
            return Err(CombatRefusal::Cooldown {
                ready_at: attacker.next_attack_at,
            });
        }

        let (position, defense) = match victim {
            Combatant::Agent(target) => {
                if target.is_inside_building() || target.sheltered_in.is_some() {
                    return Err(CombatRefusal::TargetSheltered(target.id));
                }
                if !target.is_alive() {
                    return Err(CombatRefusal::TargetDown(target.id));
                }
                if !attacker.faction.is_hostile_to(target.faction) {
                    return Err(CombatRefusal::NotHostile(target.id));
                }
                (target.position, target.stats.defense)
            }
            Combatant::Structure(target) => {
                if !target.is_standing() {
                    return Err(CombatRefusal::TargetDown(target.id));
                }
                let hostile = match attacker.faction {
                    Faction::Hero => target.kind.is_lair(),
                    Faction::Enemy => !target.kind.is_lair(),
                };
                if !hostile {
                    return Err(CombatRefusal::NotHostile(target.id));
                }
                (target.position, STRUCTURE_DEFENSE)
            }
        };

        let distance = attacker.position.distance(position);
        if distance > config.attack_range_tiles {
            return Err(CombatRefusal::OutOfRange {
                distance,
                range: config.attack_range_tiles,
            });
        }

        Ok(Strike {
            attacker: attacker.id,
            victim: victim.id(),
            damage: damage(attacker.stats.attack, defense),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AgentClass, AgentState, Position, StructureKind, World};

    fn duel() -> (World, EntityId, EntityId) {
        let mut world = World::new();
        let hero = world.spawn_with(AgentClass::Warrior, Position::ORIGIN, |hero| {
            hero.state = AgentState::EngagingEnemy;
        });
        let goblin = world.spawn(AgentClass::Goblin, Position::new(1.0, 0.0));
        (world, hero, goblin)
    }

    #[test]
    fn test_strike_in_range_is_authorized() {
        let (world, hero, goblin) = duel();
        let strike = CombatGate::authorize(
            world.agent(hero).unwrap(),
            Combatant::Agent(world.agent(goblin).unwrap()),
            SimTime(0),
            &DecisionConfig::default(),
        )
        .unwrap();
        assert_eq!(strike.damage, 14 - 1);
    }

    #[test]
    fn test_sheltered_attacker_is_refused_even_if_state_says_fight() {
        let (mut world, hero, goblin) = duel();
        world.agent_mut(hero).unwrap().sheltered_in = Some(EntityId(99));
        let refusal = CombatGate::authorize(
            world.agent(hero).unwrap(),
            Combatant::Agent(world.agent(goblin).unwrap()),
            SimTime(0),
            &DecisionConfig::default(),
        )
        .unwrap_err();
        assert_eq!(refusal, CombatRefusal::AttackerSheltered(hero));
    }

    #[test]
    fn test_inside_building_state_is_refused() {
        let (mut world, hero, goblin) = duel();
        world.agent_mut(hero).unwrap().state = AgentState::InsideBuilding;
        let refusal = CombatGate::authorize(
            world.agent(hero).unwrap(),
            Combatant::Agent(world.agent(goblin).unwrap()),
            SimTime(0),
            &DecisionConfig::default(),
        )
        .unwrap_err();
        assert_eq!(refusal, CombatRefusal::AttackerSheltered(hero));
    }

    #[test]
    fn test_range_and_cooldown() {
        let (mut world, hero, goblin) = duel();
        world.agent_mut(goblin).unwrap().position = Position::new(5.0, 0.0);
        let config = DecisionConfig::default();
        let far = CombatGate::authorize(
            world.agent(hero).unwrap(),
            Combatant::Agent(world.agent(goblin).unwrap()),
            SimTime(0),
            &config,
        );
        assert!(matches!(far, Err(CombatRefusal::OutOfRange { .. })));

        world.agent_mut(goblin).unwrap().position = Position::new(1.0, 0.0);
        world.agent_mut(hero).unwrap().next_attack_at = SimTime(1_000);
        let early = CombatGate::authorize(
            world.agent(hero).unwrap(),
            Combatant::Agent(world.agent(goblin).unwrap()),
            SimTime(500),
            &config,
        );
        assert_eq!(
            early,
            Err(CombatRefusal::Cooldown {
                ready_at: SimTime(1_000)
            })
        );
    }

    #[test]
    fn test_heroes_only_strike_lairs() {
        let mut world = World::new();
        let castle = world.add_structure(StructureKind::Castle, Position::new(1.0, 0.0), 500);
        let lair = world.add_structure(StructureKind::Lair, Position::new(0.0, 1.0), 300);
        let hero = world.spawn_with(AgentClass::Warrior, Position::ORIGIN, |hero| {
            hero.state = AgentState::AttackingLair;
        });
        let config = DecisionConfig::default();
        let agent = world.agent(hero).unwrap();

        let on_castle = CombatGate::authorize(
            agent,
            Combatant::Structure(world.structure(castle).unwrap()),
            SimTime(0),
            &config,
        );
        assert_eq!(on_castle, Err(CombatRefusal::NotHostile(castle)));

        let on_lair = CombatGate::authorize(
            agent,
            Combatant::Structure(world.structure(lair).unwrap()),
            SimTime(0),
            &config,
        )
        .unwrap();
        assert_eq!(on_lair.damage, 14 - STRUCTURE_DEFENSE);
    }
}
