//! Strike resolution.
//!
//! Damage is applied only after [`CombatGate::authorize`] agrees, whatever
//! state the attacker reports.
use tracing::{debug, trace};

use kingdom_core::{
    AgentClass, AgentState, CombatGate, CombatRefusal, Combatant, EntityId, SimTime,
    StructureKind, Target,
};

use super::{Simulation, TickReport};

/// Deaths and destruction produced by a combat phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    EnemySlain {
        enemy: EntityId,
        class: AgentClass,
        killer: EntityId,
        /// Building the enemy was attacking when it died.
        was_targeting: Option<EntityId>,
    },
    HeroFell {
        hero: EntityId,
        killer: EntityId,
    },
    StructureDestroyed {
        structure: EntityId,
        kind: StructureKind,
        by: EntityId,
    },
}

impl Simulation {
    /// What `attacker` would strike this tick, if anything.
    fn victim_of(&self, attacker: EntityId) -> Option<EntityId> {
        let agent = self.world.agent(attacker)?;
        match (agent.state, agent.target?) {
            (_, Target::Entity(id)) => Some(id),
            (AgentState::AttackingLair, Target::Bounty(bounty)) => {
                self.world.board.get(bounty)?.target.structure()
            }
            _ => None,
        }
    }

    pub(super) fn combat_phase(&mut self, now: SimTime, report: &mut TickReport) -> Vec<WorldEvent> {
        let config = &self.config.decision;
        let mut events = Vec::new();

        for id in self.world.agent_ids() {
            let Some(victim) = self.victim_of(id) else {
                continue;
            };
            let Some(attacker) = self.world.agent(id) else {
                continue;
            };

            let combatant = match (self.world.agent(victim), self.world.structure(victim)) {
                (Some(agent), _) => Combatant::Agent(agent),
                (None, Some(structure)) => Combatant::Structure(structure),
                (None, None) => continue,
            };
            let strike = match CombatGate::authorize(attacker, combatant, now, config) {
                Ok(strike) => strike,
                Err(refusal @ (CombatRefusal::Cooldown { .. } | CombatRefusal::OutOfRange { .. })) => {
                    trace!(target: "kingdom::combat", agent = %id, %refusal, "strike not ready");
                    continue;
                }
                Err(refusal) => {
                    debug!(target: "kingdom::combat", agent = %id, %refusal, "strike refused");
                    continue;
                }
            };
            let cooldown = attacker.stats.attack_cooldown_ms;

            if let Some(attacker) = self.world.agent_mut(id) {
                attacker.next_attack_at = now.plus(cooldown);
            }
            report.strikes.push(strike);

            if let Some(target) = self.world.agent_mut(victim) {
                target.stats.health -= strike.damage;
                if target.stats.is_alive() {
                    continue;
                }
                let event = if target.is_hero() {
                    WorldEvent::HeroFell {
                        hero: victim,
                        killer: id,
                    }
                } else {
                    WorldEvent::EnemySlain {
                        enemy: victim,
                        class: target.class,
                        killer: id,
                        was_targeting: target.target.and_then(|t| t.entity()),
                    }
                };
                events.push(event);
            } else if let Some(structure) = self.world.structure_mut(victim) {
                structure.health -= strike.damage;
                if structure.is_standing() {
                    continue;
                }
                events.push(WorldEvent::StructureDestroyed {
                    structure: victim,
                    kind: structure.kind,
                    by: id,
                });
            }
        }

        events
    }
}
