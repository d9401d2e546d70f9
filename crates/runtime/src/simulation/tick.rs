//! Tick driver and the decision phase.
use tracing::{debug, warn};

use kingdom_core::engine::{candidate_from_advisory, propose, resolve};
use kingdom_core::{
    AgentState, Commitment, ContextBuilder, DecisionError, DecisionSource, Effect, EntityId,
    SimTime, Verdict,
};

use super::{Simulation, TickReport};
use crate::api::{Result, RuntimeError};

/// Fraction of max health restored by one potion.
const POTION_HEAL_RATIO: f32 = 0.5;

impl Simulation {
    /// Run one fixed step.
    ///
    /// Per-agent failures are isolated: the agent is reset to idle and the
    /// tick goes on. Only journal I/O failures abort the tick.
    pub async fn tick(&mut self) -> Result<TickReport> {
        let now = self.time.now();
        let mut report = TickReport::new(self.time.tick(), now);

        for cleared in self.world.sweep_stale(now) {
            debug!(
                target: "kingdom::tick",
                agent = %cleared.agent,
                target = %cleared.target,
                "stale target cleared"
            );
            report.cleared.push(cleared);
        }

        if self
            .world
            .board
            .refresh_due(now, self.config.decision.bounty_refresh_interval_ms)
        {
            self.world.refresh_bounties(&self.config.decision, now);
        }

        for id in self.world.agent_ids() {
            match self.decide_agent(id, now, &mut report).await {
                Ok(()) => {}
                Err(RuntimeError::Decision(error)) => {
                    if error.severity().is_recoverable() {
                        debug!(target: "kingdom::tick", agent = %id, %error, "agent step reset");
                    } else {
                        warn!(target: "kingdom::tick", agent = %id, %error, "agent step failed");
                    }
                    report.errors += 1;
                    if let Some(agent) = self.world.agent_mut(id) {
                        agent.reset_to_idle(now);
                    }
                }
                Err(other) => return Err(other),
            }
        }

        let moving = self.movement_phase();
        self.stuck_phase(&moving, now, &mut report)?;
        let events = self.combat_phase(now, &mut report);
        self.apply_events(events, now, &mut report);
        self.arrivals_phase(now, &mut report)?;

        self.time.advance();
        Ok(report)
    }

    /// Build the context, propose, optionally consult, resolve and apply.
    async fn decide_agent(
        &mut self,
        id: EntityId,
        now: SimTime,
        report: &mut TickReport,
    ) -> Result<()> {
        let config = &self.config.decision;
        let agent = self
            .world
            .agent(id)
            .ok_or(DecisionError::UnknownAgent(id))?;
        if !agent.is_alive() {
            return Ok(());
        }
        if let Some(target) = agent.target.filter(|target| target.is_stale(&self.world)) {
            return Err(DecisionError::StaleReference { agent: id, target }.into());
        }

        let ctx = ContextBuilder::new(&self.world, config).build(id, now)?;
        let mut candidate = propose(agent, &ctx, config);

        if let Some(reason) = candidate.consult {
            let granted = self
                .world
                .agent_mut(id)
                .is_some_and(|agent| agent.consults.try_acquire(reason, now, config.advisory_cooldown_ms));
            if granted {
                report.consults += 1;
                debug!(target: "kingdom::brain", agent = %id, reason = reason.as_ref(), "consulting");
                let decision = self.brain.decide(&ctx, config).await;
                let agent = self
                    .world
                    .agent(id)
                    .ok_or(DecisionError::UnknownAgent(id))?;
                candidate = candidate_from_advisory(agent, &ctx, config, &decision);
            }
        }

        let agent = self
            .world
            .agent(id)
            .ok_or(DecisionError::UnknownAgent(id))?;
        let transition = resolve(agent, &ctx, config, candidate);
        if let Verdict::Hold(reason) = transition.verdict {
            debug!(target: "kingdom::tick", agent = %id, reason = reason.as_ref(), "commitment hold");
        }

        let meaningful = transition.verdict == Verdict::Switch
            || transition.source != DecisionSource::Heuristic
            || transition.changes(agent);

        let agent = self
            .world
            .agent_mut(id)
            .ok_or(DecisionError::UnknownAgent(id))?;
        if transition.verdict == Verdict::Switch {
            agent.commitment = Commitment::start(now, transition.priority, transition.score);
        }
        if transition.target != agent.target {
            agent.navigation.clear();
        }
        if agent.state == AgentState::InsideBuilding && transition.state != AgentState::InsideBuilding {
            agent.sheltered_in = None;
        }
        if transition.effect == Some(Effect::UsePotion) && agent.inventory.potions > 0 {
            agent.inventory.potions -= 1;
            let amount = (agent.stats.max_health as f32 * POTION_HEAL_RATIO) as i32;
            let healed = agent.stats.heal(amount);
            debug!(target: "kingdom::tick", agent = %id, healed, "potion used");
        }
        agent.state = transition.state;
        agent.target = transition.target;
        agent.refresh_intent();

        if meaningful {
            self.record(id, transition.action, &transition.reason, transition.source, report)?;
        }
        Ok(())
    }
}
