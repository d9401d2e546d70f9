//! Entity registry: agents, structures and the bounty board.
//!
//! All collections are `BTreeMap`s keyed by id, so every pass over the world
//! visits entities in ascending id order.
use std::collections::BTreeMap;

use strum::{AsRefStr, Display, EnumIter};

use super::agent::{Agent, AgentClass, Faction};
use super::target::{Target, TargetLookup};
use super::types::{BountyId, EntityId, Position};
use crate::bounty::{BountyBoard, BountyTarget};
use crate::{DecisionConfig, SimTime};

/// Kinds of static structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StructureKind {
    Castle,
    Marketplace,
    GuardTower,
    Lair,
}

impl StructureKind {
    /// Heroes may retreat into and rest inside this structure.
    pub fn is_shelter(self) -> bool {
        matches!(
            self,
            StructureKind::Castle | StructureKind::Marketplace | StructureKind::GuardTower
        )
    }

    pub fn is_shop(self) -> bool {
        self == StructureKind::Marketplace
    }

    pub fn is_lair(self) -> bool {
        self == StructureKind::Lair
    }
}

/// A building or lair.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    pub id: EntityId,
    pub kind: StructureKind,
    pub position: Position,
    pub health: i32,
    pub max_health: i32,
    /// Price of a health potion; only meaningful for shops.
    pub potion_price: u32,
}

impl Structure {
    pub fn is_standing(&self) -> bool {
        self.health > 0
    }
}

/// Target cleared from an agent because its referent went away.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearedTarget {
    pub agent: EntityId,
    pub target: Target,
}

/// What a despawn invalidated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Despawned {
    pub cleared: Vec<ClearedTarget>,
    pub cancelled: Vec<BountyId>,
}

/// Default potion price at marketplaces.
pub const DEFAULT_POTION_PRICE: u32 = 20;

#[derive(Clone, Debug, Default)]
pub struct World {
    agents: BTreeMap<EntityId, Agent>,
    structures: BTreeMap<EntityId, Structure>,
    pub board: BountyBoard,
    next_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    /// Spawn an agent with class defaults.
    pub fn spawn(&mut self, class: AgentClass, position: Position) -> EntityId {
        self.spawn_with(class, position, |_| {})
    }

    /// Spawn an agent and adjust it before it enters the world.
    pub fn spawn_with(
        &mut self,
        class: AgentClass,
        position: Position,
        configure: impl FnOnce(&mut Agent),
    ) -> EntityId {
        let id = self.allocate_id();
        let mut agent = Agent::new(id, class, position);
        configure(&mut agent);
        agent.refresh_intent();
        self.agents.insert(id, agent);
        id
    }

    pub fn add_structure(&mut self, kind: StructureKind, position: Position, max_health: i32) -> EntityId {
        let id = self.allocate_id();
        self.structures.insert(
            id,
            Structure {
                id,
                kind,
                position,
                health: max_health,
                max_health,
                potion_price: DEFAULT_POTION_PRICE,
            },
        );
        id
    }

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn agent_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Agents in ascending id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn agents_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    /// Snapshot of agent ids, ascending, for loops that mutate the world.
    pub fn agent_ids(&self) -> Vec<EntityId> {
        self.agents.keys().copied().collect()
    }

    pub fn structure(&self, id: EntityId) -> Option<&Structure> {
        self.structures.get(&id)
    }

    pub fn structure_mut(&mut self, id: EntityId) -> Option<&mut Structure> {
        self.structures.get_mut(&id)
    }

    /// Structures in ascending id order.
    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.structures.values()
    }

    pub fn heroes(&self) -> impl Iterator<Item = &Agent> {
        self.agents().filter(|agent| agent.faction == Faction::Hero)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Agent> {
        self.agents().filter(|agent| agent.faction == Faction::Enemy)
    }

    pub fn entity_position(&self, id: EntityId) -> Option<Position> {
        self.agents
            .get(&id)
            .map(|agent| agent.position)
            .or_else(|| self.structures.get(&id).map(|structure| structure.position))
    }

    /// Where a bounty sends an agent standing at `from`.
    ///
    /// Hunt bounties resolve to the nearest living enemy of the named class
    /// (ties by id); `None` when no such enemy exists.
    pub fn bounty_position(&self, bounty: BountyId, from: Position) -> Option<Position> {
        let bounty = self.board.get(bounty)?;
        match bounty.target {
            BountyTarget::Location(position) => Some(position),
            BountyTarget::Structure(id) => self.structures.get(&id).map(|s| s.position),
            BountyTarget::EnemyClass(class) => self
                .enemies()
                .filter(|enemy| enemy.class == class && enemy.is_alive())
                .min_by(|a, b| {
                    from.distance(a.position)
                        .total_cmp(&from.distance(b.position))
                        .then_with(|| a.id.cmp(&b.id))
                })
                .map(|enemy| enemy.position),
        }
    }

    pub fn target_position(&self, target: &Target, from: Position) -> Option<Position> {
        match target {
            Target::Position(position) => Some(*position),
            Target::Entity(id) => self.entity_position(*id),
            Target::Bounty(id) => self.bounty_position(*id, from),
        }
    }

    /// Clear every agent target whose referent is gone.
    pub fn sweep_stale(&mut self, now: SimTime) -> Vec<ClearedTarget> {
        let world: &World = self;
        let stale: Vec<ClearedTarget> = world
            .agents
            .values()
            .filter_map(|agent| {
                let target = agent.target?;
                target.is_stale(world).then_some(ClearedTarget {
                    agent: agent.id,
                    target,
                })
            })
            .collect();
        for cleared in &stale {
            if let Some(agent) = self.agents.get_mut(&cleared.agent) {
                agent.reset_to_idle(now);
            }
        }
        stale
    }

    /// Remove an agent or structure and invalidate every reference to it.
    ///
    /// Bounties pointing at the entity are cancelled and agents targeting the
    /// entity, or one of the cancelled bounties, drop their target in the
    /// same call.
    pub fn despawn(&mut self, id: EntityId, now: SimTime) -> Despawned {
        self.agents.remove(&id);
        self.structures.remove(&id);

        let cancelled = self.board.invalidate_entity(id, now);
        let mut cleared = Vec::new();
        for agent in self.agents.values_mut() {
            let Some(target) = agent.target else {
                if agent.sheltered_in == Some(id) {
                    agent.reset_to_idle(now);
                }
                continue;
            };
            let dangling = match target {
                Target::Entity(entity) => entity == id,
                Target::Bounty(bounty) => cancelled.contains(&bounty),
                Target::Position(_) => false,
            };
            if dangling || agent.sheltered_in == Some(id) {
                cleared.push(ClearedTarget {
                    agent: agent.id,
                    target,
                });
                agent.reset_to_idle(now);
            }
        }
        Despawned { cleared, cancelled }
    }

    /// Re-derive bounty responders and attractiveness from agent targets.
    pub fn refresh_bounties(&mut self, config: &DecisionConfig, now: SimTime) {
        let targets = self.agents.values().filter_map(|agent| agent.target.as_ref());
        self.board.refresh(targets, config, now);
    }
}

impl TargetLookup for World {
    fn entity_exists(&self, id: EntityId) -> bool {
        self.agents.contains_key(&id) || self.structures.contains_key(&id)
    }

    fn bounty_is_open(&self, id: BountyId) -> bool {
        self.board.is_open(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounty::BountyKind;
    use crate::engine::{Commitment, Priority};
    use crate::state::AgentState;

    #[test]
    fn test_ids_are_unique_across_agents_and_structures() {
        let mut world = World::new();
        let castle = world.add_structure(StructureKind::Castle, Position::ORIGIN, 500);
        let hero = world.spawn(AgentClass::Warrior, Position::new(1.0, 1.0));
        assert_ne!(castle, hero);
        assert_eq!(world.agent_ids(), vec![hero]);
    }

    #[test]
    fn test_despawn_clears_entity_targets_same_call() {
        let mut world = World::new();
        let goblin = world.spawn(AgentClass::Goblin, Position::new(3.0, 3.0));
        let hero = world.spawn_with(AgentClass::Warrior, Position::ORIGIN, |agent| {
            agent.state = AgentState::EngagingEnemy;
            agent.target = Some(Target::Entity(goblin));
        });

        let despawned = world.despawn(goblin, SimTime(100));
        assert_eq!(
            despawned.cleared,
            vec![ClearedTarget {
                agent: hero,
                target: Target::Entity(goblin)
            }]
        );
        let hero = world.agent(hero).unwrap();
        assert!(hero.target.is_none());
        assert_eq!(hero.state, AgentState::Idle);
        assert_eq!(hero.commitment.priority, Priority::Idle);
    }

    #[test]
    fn test_despawn_structure_cancels_bounties_and_responders() {
        let mut world = World::new();
        let tower = world.add_structure(StructureKind::GuardTower, Position::ORIGIN, 200);
        let bounty = world
            .board
            .place(BountyKind::DefendBuilding, BountyTarget::Structure(tower), 60, SimTime(0))
            .unwrap();
        let hero = world.spawn_with(AgentClass::Ranger, Position::new(5.0, 5.0), |agent| {
            agent.state = AgentState::DefendingBuilding;
            agent.target = Some(Target::Bounty(bounty));
        });

        let despawned = world.despawn(tower, SimTime(10));
        assert_eq!(despawned.cancelled, vec![bounty]);
        assert!(world.agent(hero).unwrap().target.is_none());
        assert!(!world.board.is_open(bounty));
    }

    #[test]
    fn test_sweep_stale_resets_agents() {
        let mut world = World::new();
        let hero = world.spawn_with(AgentClass::Wizard, Position::ORIGIN, |agent| {
            agent.state = AgentState::PursuingBounty;
            agent.target = Some(Target::Bounty(BountyId(42)));
            agent.commitment = Commitment::start(SimTime(0), Priority::Bounty, 40.0);
        });
        let cleared = world.sweep_stale(SimTime(300));
        assert_eq!(cleared.len(), 1);
        let agent = world.agent(hero).unwrap();
        assert_eq!(agent.state, AgentState::Idle);
        assert_eq!(agent.commitment.priority, Priority::Idle);
        assert_eq!(agent.commitment.since, SimTime(300));
        assert!(world.sweep_stale(SimTime(400)).is_empty());
    }

    #[test]
    fn test_hunt_bounty_resolves_to_nearest_enemy_of_class() {
        let mut world = World::new();
        let far = world.spawn(AgentClass::Wolf, Position::new(10.0, 0.0));
        let near = world.spawn(AgentClass::Wolf, Position::new(3.0, 0.0));
        world.spawn(AgentClass::Goblin, Position::new(1.0, 0.0));
        let bounty = world
            .board
            .place(
                BountyKind::HuntEnemyType,
                BountyTarget::EnemyClass(AgentClass::Wolf),
                25,
                SimTime(0),
            )
            .unwrap();
        let position = world.bounty_position(bounty, Position::ORIGIN);
        assert_eq!(position, world.entity_position(near));
        assert_ne!(position, world.entity_position(far));
    }
}
