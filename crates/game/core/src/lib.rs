//! Deterministic decision logic for autonomous kingdom agents.
//!
//! `kingdom-core` holds the rules: the per-agent state machine with
//! commitment and hysteresis, the bounty board, stuck detection, decision
//! records and the fallback advisor. Nothing here reads the wall clock or
//! unseeded randomness; simulated time and named PCG streams come from
//! [`env::TimeSource`]. The async advisory layer and the tick loop live in
//! `kingdom-runtime`, which depends on the types re-exported here.
pub mod advisory;
pub mod bounty;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod pathing;
pub mod state;

pub use advisory::{
    AdvisoryAction, AdvisoryDecision, ConsultLedger, ConsultReason, POTION_ITEM, fallback_decision,
};
pub use bounty::{
    Bounty, BountyBoard, BountyError, BountyEvalSnapshot, BountyKind, BountyStatus, BountyTarget,
    Payout, Tier,
};
pub use combat::{CombatGate, CombatRefusal, Combatant, Strike, damage};
pub use config::{BountyWeights, ConfigError, DecisionConfig};
pub use engine::{
    Candidate, Commitment, ContextBuilder, DecisionContext, Effect, HoldReason, Priority,
    RecoveryStep, Situation, StuckCounters, StuckStatus, Transition, Verdict,
};
pub use env::{PcgStream, SimTime, TimeSource, stream_tag};
pub use error::{DecisionError, ErrorSeverity};
pub use pathing::{PathingFailure, PathingService};
pub use state::{
    Agent, AgentClass, AgentState, BountyId, ClearedTarget, DecisionRecord, DecisionRecorder,
    DecisionSource, Despawned, EntityId, Faction, IntentLabel, IntentSnapshot, Inventory,
    LastDecisionView, Personality, Position, Stats, Structure, StructureKind, Target, Tile, World,
};
