//! Agent targets as an explicit tagged union.
use core::fmt;

use super::types::{BountyId, EntityId, Position};

/// What an agent is currently heading for or acting upon.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "ref", rename_all = "snake_case"))]
pub enum Target {
    /// A fixed point on the map.
    Position(Position),
    /// Another agent or a structure.
    Entity(EntityId),
    /// A bounty on the board.
    Bounty(BountyId),
}

/// Read-only view used to decide whether a target still resolves.
pub trait TargetLookup {
    fn entity_exists(&self, id: EntityId) -> bool;
    fn bounty_is_open(&self, id: BountyId) -> bool;
}

impl Target {
    /// Whether the referent no longer exists.
    ///
    /// Positions never go stale.
    pub fn is_stale(&self, lookup: &impl TargetLookup) -> bool {
        match self {
            Target::Position(_) => false,
            Target::Entity(id) => !lookup.entity_exists(*id),
            Target::Bounty(id) => !lookup.bounty_is_open(*id),
        }
    }

    /// Whether this target refers to `entity`.
    pub fn references_entity(&self, entity: EntityId) -> bool {
        matches!(self, Target::Entity(id) if *id == entity)
    }

    pub fn bounty(&self) -> Option<BountyId> {
        match self {
            Target::Bounty(id) => Some(*id),
            _ => None,
        }
    }

    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Target::Entity(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Position(pos) => write!(f, "position {pos}"),
            Target::Entity(id) => write!(f, "entity {id}"),
            Target::Bounty(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture;

    impl TargetLookup for Fixture {
        fn entity_exists(&self, id: EntityId) -> bool {
            id == EntityId(1)
        }

        fn bounty_is_open(&self, id: BountyId) -> bool {
            id == BountyId(1)
        }
    }

    #[test]
    fn test_staleness_per_variant() {
        assert!(!Target::Position(Position::ORIGIN).is_stale(&Fixture));
        assert!(!Target::Entity(EntityId(1)).is_stale(&Fixture));
        assert!(Target::Entity(EntityId(2)).is_stale(&Fixture));
        assert!(!Target::Bounty(BountyId(1)).is_stale(&Fixture));
        assert!(Target::Bounty(BountyId(9)).is_stale(&Fixture));
    }

    #[test]
    fn test_references_entity() {
        assert!(Target::Entity(EntityId(4)).references_entity(EntityId(4)));
        assert!(!Target::Bounty(BountyId(4)).references_entity(EntityId(4)));
    }
}
