//! World state: identifiers, agents, targets, decision records and the
//! entity registry.
mod agent;
mod record;
mod target;
mod types;
mod world;

pub use agent::{
    Agent, AgentClass, AgentState, Faction, IntentLabel, Inventory, Navigation, Personality, Stats,
};
pub use record::{
    ACTION_CAPACITY, DecisionRecord, DecisionRecorder, DecisionSource, IntentSnapshot,
    LastDecisionView, REASON_CAPACITY,
};
pub use target::{Target, TargetLookup};
pub use types::{BountyId, EntityId, Position, Tile};
pub use world::{
    ClearedTarget, DEFAULT_POTION_PRICE, Despawned, Structure, StructureKind, World,
};
