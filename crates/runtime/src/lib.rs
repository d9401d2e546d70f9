//! Tick-loop runtime for the kingdom decision engine.
//!
//! `kingdom-core` decides; this crate drives it. [`Simulation`] owns the
//! world, the clock and the advisory brain and runs fixed steps. Everything
//! with I/O or async lives here: provider calls with deadlines, response
//! validation, pathing, the decision journal, configuration loading and
//! logging setup.
//!
//! Modules are organized by responsibility:
//! - [`simulation`] hosts the tick loop and its builder
//! - [`brain`] consults providers and falls back deterministically
//! - [`providers`] holds the built-in decision providers
//! - [`api`] exposes the error type and the provider trait
//! - [`config`], [`scenario`] and [`logging`] set a run up
//! - [`journal`] and [`observe`] are read-only outputs
pub mod api;
pub mod brain;
pub mod config;
pub mod journal;
pub mod logging;
pub mod observe;
pub mod pathing;
pub mod providers;
pub mod scenario;
pub mod simulation;

pub use api::{DecisionProvider, ProviderError, ProviderRequest, Result, RuntimeError};
pub use brain::{AdvisoryBrain, AdvisoryFailure, AdvisorySchemaError, BrainStats, parse_advisory};
pub use config::{AdvisoryConfig, ApiKey, ProviderChoice, RuntimeConfig, SimConfig};
pub use journal::{DecisionJournal, JournalEntry};
pub use observe::{AgentObservation, BountyObservation, Observation};
pub use pathing::{GridMap, GridPathing};
pub use providers::{MockProvider, OpenAiProvider, OpenAiSettings, ScriptedProvider, ScriptedResponse};
pub use scenario::{AgentPlacement, BountyPlacement, Populated, Scenario, StructurePlacement};
pub use simulation::{RecoveryNote, Simulation, SimulationBuilder, TickReport, WorldEvent};
