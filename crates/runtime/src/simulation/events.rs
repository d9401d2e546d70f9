//! Applies deaths and destruction to the bounty board and the world.
use tracing::{debug, info};

use kingdom_core::{Despawned, Payout, SimTime};

use super::{Simulation, TickReport, WorldEvent};

impl Simulation {
    pub(super) fn apply_events(&mut self, events: Vec<WorldEvent>, now: SimTime, report: &mut TickReport) {
        for event in events {
            match event {
                WorldEvent::EnemySlain {
                    enemy,
                    class,
                    killer,
                    was_targeting,
                } => {
                    info!(target: "kingdom::combat", %enemy, %class, %killer, "enemy slain");
                    let payouts = self.world.board.on_enemy_slain(class, was_targeting, killer, now);
                    self.credit(payouts, report);
                    self.remove(enemy, now, report);
                }
                WorldEvent::HeroFell { hero, killer } => {
                    info!(target: "kingdom::combat", %hero, %killer, "hero fell");
                    self.remove(hero, now, report);
                }
                WorldEvent::StructureDestroyed {
                    structure,
                    kind,
                    by,
                } => {
                    info!(target: "kingdom::combat", %structure, %kind, %by, "structure destroyed");
                    if kind.is_lair() {
                        let payouts = self.world.board.on_lair_destroyed(structure, by, now);
                        self.credit(payouts, report);
                    }
                    self.remove(structure, now, report);
                }
            }
        }
    }

    /// Pay out rewards to their recipients.
    pub(super) fn credit(&mut self, payouts: Vec<Payout>, report: &mut TickReport) {
        for payout in payouts {
            if let Some(agent) = self.world.agent_mut(payout.recipient) {
                agent.inventory.gold = agent.inventory.gold.saturating_add(payout.reward);
            }
            info!(
                target: "kingdom::bounty",
                bounty = %payout.bounty,
                kind = %payout.kind,
                recipient = %payout.recipient,
                reward = payout.reward,
                "bounty completed"
            );
            report.payouts.push(payout);
        }
    }

    fn remove(&mut self, id: kingdom_core::EntityId, now: SimTime, report: &mut TickReport) {
        let Despawned { cleared, cancelled } = self.world.despawn(id, now);
        for bounty in cancelled {
            info!(target: "kingdom::bounty", %bounty, "bounty cancelled, target gone");
        }
        for entry in &cleared {
            debug!(
                target: "kingdom::tick",
                agent = %entry.agent,
                target = %entry.target,
                "stale target cleared"
            );
        }
        report.cleared.extend(cleared);
        report.deaths.push(id);
    }
}
