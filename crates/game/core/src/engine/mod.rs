//! Decision engine: context assembly, the state machine, commitment and stuck
//! recovery.
//!
//! Everything here is synchronous and pure over its inputs. The runtime owns
//! the tick loop and calls into these functions in ascending agent-id order.
pub mod commitment;
pub mod context;
pub mod state_machine;
pub mod stuck;

pub use commitment::{Challenger, Commitment, HoldReason, Priority, Verdict, arbitrate};
pub use context::{
    BountyView, ContextBuilder, DecisionContext, Situation, StructureView, ThreatView,
};
pub use state_machine::{
    Candidate, Effect, Transition, candidate_from_advisory, evaluate, propose, resolve, standing,
};
pub use stuck::{RecoveryStep, StuckCounters, StuckStatus, observe, recover};
