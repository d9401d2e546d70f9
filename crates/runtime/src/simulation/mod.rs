//! The simulation root: world, clock, brain, pathing and journal.
//!
//! [`Simulation::tick`] runs one fixed step. Phases run in a fixed order and
//! every phase visits agents in ascending id order:
//!
//! 1. clear stale targets
//! 2. refresh the bounty board on its cadence
//! 3. decide for every agent (advisory consults included)
//! 4. move
//! 5. detect and recover stuck agents
//! 6. resolve strikes through the combat gate
//! 7. apply deaths and destruction to the board and the world
//! 8. handle arrivals: explore claims, shopping, sheltering, resting
//!
//! The clock advances only after all phases ran, so every read of "now"
//! within a tick sees the same time.
mod combat;
mod events;
mod movement;
mod tick;

pub use combat::WorldEvent;

use std::sync::Arc;
use std::time::Duration;

use kingdom_core::{
    BountyEvalSnapshot, BountyId, BountyKind, BountyTarget, ClearedTarget, DecisionError,
    DecisionRecord, DecisionRecorder, DecisionSource, EntityId, IntentSnapshot, PathingService,
    Payout, SimTime, Strike, TimeSource, World,
};

use crate::api::{DecisionProvider, Result};
use crate::brain::{AdvisoryBrain, BrainStats};
use crate::config::RuntimeConfig;
use crate::journal::{DecisionJournal, JournalEntry};
use crate::observe::Observation;
use crate::pathing::{GridMap, GridPathing};
use crate::scenario::{Populated, Scenario};

/// Upper bound on report slots reserved up front by [`Simulation::run`].
const RUN_PREALLOC_TICKS: u64 = 4_096;

fn report_capacity(ticks: u64) -> usize {
    usize::try_from(ticks.min(RUN_PREALLOC_TICKS)).unwrap_or(0)
}

/// A recovery step taken for one agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoveryNote {
    pub agent: EntityId,
    pub step: &'static str,
}

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub at: SimTime,
    /// Decisions written to the journal.
    pub decisions: usize,
    pub consults: usize,
    pub recoveries: Vec<RecoveryNote>,
    pub payouts: Vec<Payout>,
    pub strikes: Vec<Strike>,
    /// Agents and structures removed this tick.
    pub deaths: Vec<EntityId>,
    pub cleared: Vec<ClearedTarget>,
    /// Agent steps that failed and were reset to idle.
    pub errors: usize,
}

impl TickReport {
    fn new(tick: u64, at: SimTime) -> Self {
        Self {
            tick,
            at,
            ..Self::default()
        }
    }
}

/// Owns everything a run needs and drives it one tick at a time.
pub struct Simulation {
    world: World,
    time: TimeSource,
    config: RuntimeConfig,
    brain: AdvisoryBrain,
    pathing: Arc<dyn PathingService>,
    journal: DecisionJournal,
    populated: Populated,
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for setup and tests between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn now(&self) -> SimTime {
        self.time.now()
    }

    pub fn tick_count(&self) -> u64 {
        self.time.tick()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn brain_stats(&self) -> BrainStats {
        self.brain.stats()
    }

    pub fn journal(&self) -> &DecisionJournal {
        &self.journal
    }

    pub fn pathing(&self) -> &dyn PathingService {
        self.pathing.as_ref()
    }

    /// Ids allocated by the scenario, if one was used.
    pub fn populated(&self) -> &Populated {
        &self.populated
    }

    /// Post a bounty at the current simulation time.
    pub fn place_bounty(
        &mut self,
        kind: BountyKind,
        target: BountyTarget,
        reward: u32,
    ) -> Result<BountyId> {
        let now = self.time.now();
        let id = self
            .world
            .board
            .place(kind, target, reward, now)
            .map_err(DecisionError::from)?;
        tracing::info!(target: "kingdom::bounty", bounty = %id, %kind, reward, "bounty placed");
        Ok(id)
    }

    pub fn observe(&self) -> Observation {
        Observation::capture(&self.world, self.time.tick(), self.time.now())
    }

    pub fn intent(&self, agent: EntityId) -> Option<IntentSnapshot> {
        self.world
            .agent(agent)
            .map(|agent| DecisionRecorder::snapshot(agent, self.time.now()))
    }

    /// Evaluation of `bounty`; safe defaults when it is unknown.
    pub fn bounty_eval(&self, bounty: BountyId) -> BountyEvalSnapshot {
        self.world.board.snapshot(bounty)
    }

    /// Run `ticks` ticks and return their reports.
    pub async fn run(&mut self, ticks: u64) -> Result<Vec<TickReport>> {
        let mut reports = Vec::with_capacity(report_capacity(ticks));
        for _ in 0..ticks {
            reports.push(self.tick().await?);
        }
        self.journal.flush()?;
        Ok(reports)
    }

    /// Store a decision on the agent and append it to the journal.
    fn record(
        &mut self,
        agent: EntityId,
        action: &str,
        reason: &str,
        source: DecisionSource,
        report: &mut TickReport,
    ) -> Result<()> {
        let now = self.time.now();
        let Some(subject) = self.world.agent_mut(agent) else {
            return Ok(());
        };
        let record = DecisionRecord::new(action, reason, now, source);
        DecisionRecorder::record(subject, record.clone());
        let entry = JournalEntry {
            tick: self.time.tick(),
            agent,
            state: subject.state,
            target: subject.target,
            record,
        };
        self.journal.append(entry)?;
        report.decisions += 1;
        Ok(())
    }
}

/// Builder for [`Simulation`].
pub struct SimulationBuilder {
    config: RuntimeConfig,
    world: Option<World>,
    map: Option<GridMap>,
    scenario: Option<Scenario>,
    provider: Option<Arc<dyn DecisionProvider>>,
    pathing: Option<Arc<dyn PathingService>>,
    journal: Option<DecisionJournal>,
}

impl SimulationBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            world: None,
            map: None,
            scenario: None,
            provider: None,
            pathing: None,
            journal: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from an existing world instead of an empty one.
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    /// Start from a prepared map instead of an open one of the configured size.
    pub fn map(mut self, map: GridMap) -> Self {
        self.map = Some(map);
        self
    }

    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    /// Use `provider` instead of the one selected by configuration.
    pub fn provider(mut self, provider: Arc<dyn DecisionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use a custom pathing service. Scenario walls then only validate
    /// placements; they do not reach the custom service.
    pub fn pathing(mut self, pathing: Arc<dyn PathingService>) -> Self {
        self.pathing = Some(pathing);
        self
    }

    pub fn journal(mut self, journal: DecisionJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Validate the configuration and assemble the simulation.
    ///
    /// # Errors
    ///
    /// Invalid configuration fails here, before any tick runs.
    pub fn build(self) -> Result<Simulation> {
        let config = self.config;
        config.validate()?;

        let time = TimeSource::new(config.sim.seed, config.sim.tick_ms);
        let mut world = self.world.unwrap_or_default();
        let mut map = self
            .map
            .unwrap_or_else(|| GridMap::open(config.sim.map_width, config.sim.map_height));

        let populated = match &self.scenario {
            Some(scenario) => scenario.populate(&mut world, &mut map, time.now())?,
            None => Populated::default(),
        };

        let brain = match self.provider {
            Some(provider) => AdvisoryBrain::with_provider(
                provider,
                Duration::from_millis(config.advisory.deadline_ms),
            ),
            None => AdvisoryBrain::from_config(&config.advisory),
        };
        let pathing = self
            .pathing
            .unwrap_or_else(|| Arc::new(GridPathing::new(map)));

        tracing::info!(
            target: "kingdom::tick",
            seed = config.sim.seed,
            tick_ms = config.sim.tick_ms,
            provider = brain.provider_name(),
            agents = world.agent_ids().len(),
            "simulation built"
        );

        Ok(Simulation {
            world,
            time,
            config,
            brain,
            pathing,
            journal: self.journal.unwrap_or_default(),
            populated,
        })
    }
}
