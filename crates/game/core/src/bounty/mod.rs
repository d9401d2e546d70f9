//! Player-posted bounties and the board that scores them.
//!
//! Responder counts and attractiveness are derived from agent targets on a
//! bounded cadence, never accumulated. Completion is event driven for every
//! kind except `explore`, which completes on proximity.
mod board;
mod scoring;

pub use board::{BountyBoard, BountyEvalSnapshot, Payout};
pub use scoring::{attractiveness, tier_for};

use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};
use thiserror::Error;

use crate::{AgentClass, BountyId, EntityId, Position, SimTime};

/// The four bounty kinds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, AsRefStr, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BountyKind {
    Explore,
    AttackLair,
    DefendBuilding,
    HuntEnemyType,
}

/// What a bounty points at.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "ref", rename_all = "snake_case"))]
pub enum BountyTarget {
    Location(Position),
    Structure(EntityId),
    EnemyClass(AgentClass),
}

impl BountyTarget {
    pub fn structure(&self) -> Option<EntityId> {
        match self {
            BountyTarget::Structure(id) => Some(*id),
            _ => None,
        }
    }
}

/// Coarse attractiveness bucket exposed to observers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Tier {
    #[default]
    Low,
    Med,
    High,
}

/// Lifecycle of a bounty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "status", rename_all = "snake_case"))]
pub enum BountyStatus {
    Open,
    Completed { by: EntityId, at: SimTime },
    Cancelled { at: SimTime },
}

/// A bounty and its derived evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounty {
    pub id: BountyId,
    pub kind: BountyKind,
    pub target: BountyTarget,
    pub reward: u32,
    pub placed_at: SimTime,
    pub status: BountyStatus,
    /// Agents whose target referenced this bounty at the last refresh.
    pub responders: u32,
    pub attractiveness: f32,
    pub tier: Tier,
}

impl Bounty {
    pub fn is_open(&self) -> bool {
        matches!(self.status, BountyStatus::Open)
    }
}

/// Bounty board failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BountyError {
    #[error("{kind} bounty cannot target {target:?}")]
    MismatchedTarget {
        kind: BountyKind,
        target: BountyTarget,
    },

    #[error("bounty reward must be greater than zero")]
    ZeroReward,

    #[error("{0} not found")]
    NotFound(BountyId),

    #[error("{0} is already closed")]
    AlreadyClosed(BountyId),
}
