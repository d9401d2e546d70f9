//! Movement, stuck recovery and arrivals.
use tracing::{debug, info};

use kingdom_core::engine::{RecoveryStep, StuckStatus, observe, recover};
use kingdom_core::{
    Agent, AgentState, DecisionSource, EntityId, Position, SimTime, Target, Tile, POTION_ITEM,
};

use super::{RecoveryNote, Simulation, TickReport};
use crate::api::Result;

/// How far a wander point may lie from the agent, per axis.
const WANDER_RADIUS: i32 = 6;

/// Simulated milliseconds between two rest heals inside a building.
const REST_INTERVAL_MS: u64 = 1_000;

impl Simulation {
    /// Where the agent is heading, and how close counts as there.
    fn destination(&self, agent: &Agent) -> Option<(Position, f32)> {
        let target = agent.target?;
        let position = self.world.target_position(&target, agent.position)?;
        let config = &self.config.decision;
        let stop = if agent.state.is_combat() {
            config.attack_range_tiles * 0.8
        } else {
            config.arrival_radius_tiles * 0.5
        };
        Some((position, stop))
    }

    /// Give idle agents without a target a seeded wander point.
    fn pick_wander_point(&mut self, id: EntityId) {
        let (width, height) = (self.config.sim.map_width, self.config.sim.map_height);
        let Some(here) = self.world.agent(id).map(|agent| agent.position.tile()) else {
            return;
        };
        let stream = self.time.agent_stream(id, "wander");
        let dx = stream.range_i32(-WANDER_RADIUS, WANDER_RADIUS);
        let dy = stream.range_i32(-WANDER_RADIUS, WANDER_RADIUS);
        let spot = Tile::new(
            (here.x + dx).clamp(0, width - 1),
            (here.y + dy).clamp(0, height - 1),
        );
        if spot == here || !self.pathing.is_passable(spot) {
            return;
        }
        let now = self.time.now();
        if let Some(agent) = self.world.agent_mut(id) {
            agent.wander_to(spot.center(), now);
        }
    }

    /// Move every agent one step along its path.
    ///
    /// # Returns
    ///
    /// Agent ids in ascending order, each with whether it meant to move this
    /// tick. Blocked agents still mean to move; that is how the stuck
    /// detector sees them.
    pub(super) fn movement_phase(&mut self) -> Vec<(EntityId, bool)> {
        let step_secs = self.time.step_secs();
        let mut moving = Vec::new();

        for id in self.world.agent_ids() {
            let Some(agent) = self.world.agent(id) else {
                continue;
            };
            if !agent.is_alive() || agent.is_inside_building() {
                moving.push((id, false));
                continue;
            }
            if agent.state == AgentState::Idle && agent.target.is_none() {
                self.pick_wander_point(id);
            }

            let Some(agent) = self.world.agent(id) else {
                continue;
            };
            let Some((destination, stop)) = self.destination(agent) else {
                moving.push((id, false));
                continue;
            };
            if agent.position.distance(destination) <= stop && agent.navigation.waypoint.is_none() {
                moving.push((id, false));
                continue;
            }

            let from = agent.position.tile();
            let goal = destination.tile();
            let needs_path = agent.navigation.waypoint.is_none() && agent.navigation.goal != Some(goal);
            let route = needs_path.then(|| self.pathing.find_path(from, goal));

            let Some(agent) = self.world.agent_mut(id) else {
                continue;
            };
            match route {
                Some(Ok(path)) => {
                    agent.navigation.goal = Some(goal);
                    agent.navigation.path = path.into();
                    agent.navigation.blocked = false;
                }
                Some(Err(failure)) => {
                    debug!(target: "kingdom::tick", agent = %id, %failure, "path request failed");
                    agent.navigation.goal = Some(goal);
                    agent.navigation.path.clear();
                    agent.navigation.blocked = true;
                }
                None => {}
            }
            moving.push((id, true));
            if agent.navigation.blocked && agent.navigation.waypoint.is_none() {
                continue;
            }

            let mut budget = agent.stats.speed * step_secs;
            let mut position = agent.position;
            if let Some(waypoint) = agent.navigation.waypoint {
                position = position.step_toward(waypoint, budget);
                if position.distance(waypoint) <= f32::EPSILON {
                    agent.navigation.waypoint = None;
                    agent.navigation.goal = None;
                    agent.navigation.blocked = false;
                }
            } else {
                while budget > 0.0 {
                    let next = agent
                        .navigation
                        .path
                        .front()
                        .map(|tile| tile.center())
                        .unwrap_or(destination);
                    let distance = position.distance(next);
                    if distance > budget {
                        position = position.step_toward(next, budget);
                        break;
                    }
                    position = next;
                    budget -= distance;
                    if agent.navigation.path.pop_front().is_none() {
                        break;
                    }
                }
            }
            agent.position = position;
            agent.refresh_intent();
        }

        moving
    }

    /// Feed positions to the stuck detector and climb the recovery ladder.
    pub(super) fn stuck_phase(
        &mut self,
        moving: &[(EntityId, bool)],
        now: SimTime,
        report: &mut TickReport,
    ) -> Result<()> {
        for &(id, intends_to_move) in moving {
            let config = &self.config.decision;
            let Some(agent) = self.world.agent_mut(id) else {
                continue;
            };
            let status = observe(
                &mut agent.stuck,
                agent.position,
                intends_to_move,
                agent.target,
                now,
                config,
            );
            if status != StuckStatus::Stuck {
                continue;
            }

            let stream = self.time.agent_stream(id, "stuck");
            let step = recover(
                &mut agent.stuck,
                agent.position,
                self.pathing.as_ref(),
                stream,
                now,
                config,
            );
            debug!(
                target: "kingdom::stuck",
                agent = %id,
                step = step.label(),
                attempt = agent.stuck.attempts,
                "recovering"
            );
            report.recoveries.push(RecoveryNote {
                agent: id,
                step: step.label(),
            });

            match step {
                RecoveryStep::Repath => {
                    agent.navigation.goal = None;
                    agent.navigation.path.clear();
                    agent.navigation.blocked = false;
                }
                RecoveryStep::Sidestep(tile) => {
                    agent.navigation.waypoint = Some(tile.center());
                    agent.refresh_intent();
                }
                RecoveryStep::ResetToIdle => {
                    agent.reset_to_idle(now);
                    agent.stuck.reset(agent.position, now, None);
                    self.record(
                        id,
                        "reset_to_idle",
                        "Stuck, giving up on target",
                        DecisionSource::Heuristic,
                        report,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Explore claims, purchases, sheltering and resting.
    pub(super) fn arrivals_phase(&mut self, now: SimTime, report: &mut TickReport) -> Result<()> {
        let config = self.config.decision.clone();

        for id in self.world.agent_ids() {
            let Some(agent) = self.world.agent(id) else {
                continue;
            };
            if !agent.is_alive() {
                continue;
            }

            if agent.is_hero() && !agent.is_inside_building() {
                let position = agent.position;
                let payouts = self.world.board.on_proximity(id, position, &config, now);
                self.credit(payouts, report);
            }

            let Some(agent) = self.world.agent(id) else {
                continue;
            };
            let arrived = |spot: Position| agent.position.distance(spot) <= config.arrival_radius_tiles;
            match (agent.state, agent.target) {
                (AgentState::Shopping, Some(Target::Entity(shop))) => {
                    let Some(structure) = self.world.structure(shop) else {
                        continue;
                    };
                    if !arrived(structure.position) {
                        continue;
                    }
                    let price = structure.potion_price;
                    let Some(agent) = self.world.agent_mut(id) else {
                        continue;
                    };
                    let (action, reason) = if agent.inventory.gold >= price {
                        agent.inventory.gold -= price;
                        agent.inventory.potions += 1;
                        info!(target: "kingdom::tick", agent = %id, price, item = POTION_ITEM, "purchase");
                        ("buy_item", "Bought a health potion")
                    } else {
                        ("leave_shop", "Could not afford a potion")
                    };
                    agent.reset_to_idle(now);
                    self.record(id, action, reason, DecisionSource::Heuristic, report)?;
                }
                (AgentState::ReturningToSafety, Some(Target::Entity(shelter))) => {
                    let Some(structure) = self.world.structure(shelter) else {
                        continue;
                    };
                    if !structure.kind.is_shelter() || !arrived(structure.position) {
                        continue;
                    }
                    let Some(agent) = self.world.agent_mut(id) else {
                        continue;
                    };
                    agent.state = AgentState::InsideBuilding;
                    agent.sheltered_in = Some(shelter);
                    agent.next_rest_at = now.plus(REST_INTERVAL_MS);
                    agent.navigation.clear();
                    agent.refresh_intent();
                    self.record(
                        id,
                        "enter_shelter",
                        "Reached safety, resting inside",
                        DecisionSource::Heuristic,
                        report,
                    )?;
                }
                (AgentState::Idle | AgentState::ReturningToSafety, Some(Target::Position(spot))) => {
                    if !arrived(spot) {
                        continue;
                    }
                    if let Some(agent) = self.world.agent_mut(id) {
                        agent.reset_to_idle(now);
                    }
                }
                (AgentState::InsideBuilding, _) => {
                    if now < agent.next_rest_at {
                        continue;
                    }
                    let Some(agent) = self.world.agent_mut(id) else {
                        continue;
                    };
                    let amount = (agent.stats.max_health / 20).max(1);
                    agent.stats.heal(amount);
                    agent.next_rest_at = now.plus(REST_INTERVAL_MS);
                }
                _ => {}
            }
        }
        Ok(())
    }
}
