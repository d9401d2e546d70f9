//! Scenario setup: map walls, structures, agents and starting bounties.
//!
//! Scenarios carry no entity ids. Ids are allocated by the world when the
//! scenario is populated, and bounties refer to structures by their index in
//! [`Scenario::structures`].
use std::path::Path;

use serde::{Deserialize, Serialize};

use kingdom_core::{
    AgentClass, BountyId, BountyKind, BountyTarget, EntityId, Personality, Position, SimTime,
    StructureKind, Tile, World,
};

use crate::api::{Result, RuntimeError};
use crate::pathing::GridMap;

/// A structure to build.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructurePlacement {
    pub kind: StructureKind,
    pub position: Position,
    pub max_health: i32,
}

/// An agent to spawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentPlacement {
    pub class: AgentClass,
    pub position: Position,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub potions: u32,
}

/// A bounty posted when the scenario starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BountyPlacement {
    Explore { at: Position, reward: u32 },
    AttackLair { structure: usize, reward: u32 },
    DefendBuilding { structure: usize, reward: u32 },
    HuntEnemyType { class: AgentClass, reward: u32 },
}

/// Ids allocated while populating a world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Populated {
    pub structures: Vec<EntityId>,
    pub agents: Vec<EntityId>,
    pub bounties: Vec<BountyId>,
}

/// Scenario configuration for simulation setup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub walls: Vec<Tile>,
    pub structures: Vec<StructurePlacement>,
    pub agents: Vec<AgentPlacement>,
    pub bounties: Vec<BountyPlacement>,
}

impl Scenario {
    /// Small kingdom used by the headless client and the scenario tests.
    pub fn demo() -> Self {
        let building = |kind, x, y, max_health| StructurePlacement {
            kind,
            position: Position::new(x, y),
            max_health,
        };
        let agent = |class, x, y, personality, gold, potions| AgentPlacement {
            class,
            position: Position::new(x, y),
            personality,
            gold,
            potions,
        };

        Self {
            name: "demo".to_owned(),
            // Wall with a gap at y = 16.
            walls: (8..16).chain(17..24).map(|y| Tile::new(22, y)).collect(),
            structures: vec![
                building(StructureKind::Castle, 6.5, 16.5, 500),
                building(StructureKind::Marketplace, 10.5, 12.5, 300),
                building(StructureKind::GuardTower, 18.5, 8.5, 200),
                building(StructureKind::Lair, 36.5, 20.5, 300),
            ],
            agents: vec![
                agent(AgentClass::Warrior, 8.5, 16.5, Personality::Brave, 10, 1),
                agent(AgentClass::Ranger, 9.5, 18.5, Personality::Greedy, 45, 0),
                agent(AgentClass::Wizard, 7.5, 14.5, Personality::Cautious, 25, 1),
                agent(AgentClass::Goblin, 34.5, 20.5, Personality::Balanced, 0, 0),
                agent(AgentClass::Wolf, 30.5, 10.5, Personality::Balanced, 0, 0),
                agent(AgentClass::Skeleton, 38.5, 22.5, Personality::Balanced, 0, 0),
            ],
            bounties: vec![
                BountyPlacement::Explore {
                    at: Position::new(24.5, 4.5),
                    reward: 60,
                },
                BountyPlacement::AttackLair {
                    structure: 3,
                    reward: 150,
                },
                BountyPlacement::HuntEnemyType {
                    class: AgentClass::Wolf,
                    reward: 50,
                },
                BountyPlacement::DefendBuilding {
                    structure: 0,
                    reward: 80,
                },
            ],
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Build walls, structures and agents, then post the bounties.
    ///
    /// # Returns
    ///
    /// The allocated ids, in placement order.
    pub fn populate(&self, world: &mut World, map: &mut GridMap, now: SimTime) -> Result<Populated> {
        for wall in &self.walls {
            if !map.contains(*wall) {
                return Err(invalid(format!("wall {wall} is outside the map")));
            }
            map.add_wall(*wall);
        }

        let mut populated = Populated::default();
        for placement in &self.structures {
            if placement.max_health <= 0 {
                return Err(invalid(format!(
                    "{} needs positive max_health",
                    placement.kind
                )));
            }
            let id = world.add_structure(placement.kind, placement.position, placement.max_health);
            populated.structures.push(id);
        }

        for placement in &self.agents {
            let tile = placement.position.tile();
            if !map.contains(tile) || map.is_wall(tile) {
                return Err(invalid(format!(
                    "{} placed on impassable tile {tile}",
                    placement.class
                )));
            }
            let id = world.spawn_with(placement.class, placement.position, |agent| {
                agent.personality = placement.personality;
                agent.inventory.gold = placement.gold;
                agent.inventory.potions = placement.potions;
            });
            populated.agents.push(id);
        }

        for placement in &self.bounties {
            let (kind, target, reward) = self.resolve_bounty(placement, world, &populated.structures)?;
            let id = world
                .board
                .place(kind, target, reward, now)
                .map_err(|error| invalid(error.to_string()))?;
            populated.bounties.push(id);
        }

        tracing::info!(
            target: "kingdom::tick",
            scenario = %self.name,
            structures = populated.structures.len(),
            agents = populated.agents.len(),
            bounties = populated.bounties.len(),
            "scenario populated"
        );
        Ok(populated)
    }

    fn resolve_bounty(
        &self,
        placement: &BountyPlacement,
        world: &World,
        structures: &[EntityId],
    ) -> Result<(BountyKind, BountyTarget, u32)> {
        let structure = |index: usize, want_lair: bool| -> Result<EntityId> {
            let id = *structures
                .get(index)
                .ok_or_else(|| invalid(format!("bounty references missing structure {index}")))?;
            let kind = world
                .structure(id)
                .map(|s| s.kind)
                .ok_or_else(|| invalid(format!("structure {index} is gone")))?;
            if kind.is_lair() != want_lair {
                return Err(invalid(format!("structure {index} ({kind}) has the wrong kind")));
            }
            Ok(id)
        };

        Ok(match *placement {
            BountyPlacement::Explore { at, reward } => {
                (BountyKind::Explore, BountyTarget::Location(at), reward)
            }
            BountyPlacement::AttackLair { structure: index, reward } => (
                BountyKind::AttackLair,
                BountyTarget::Structure(structure(index, true)?),
                reward,
            ),
            BountyPlacement::DefendBuilding { structure: index, reward } => (
                BountyKind::DefendBuilding,
                BountyTarget::Structure(structure(index, false)?),
                reward,
            ),
            BountyPlacement::HuntEnemyType { class, reward } => {
                if class.faction() != kingdom_core::Faction::Enemy {
                    return Err(invalid(format!("cannot hunt {class}")));
                }
                (BountyKind::HuntEnemyType, BountyTarget::EnemyClass(class), reward)
            }
        })
    }
}

fn invalid(message: String) -> RuntimeError {
    RuntimeError::InvalidScenario(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_populates() {
        let mut world = World::new();
        let mut map = GridMap::open(48, 32);
        let populated = Scenario::demo()
            .populate(&mut world, &mut map, SimTime::ZERO)
            .unwrap();
        assert_eq!(populated.structures.len(), 4);
        assert_eq!(populated.agents.len(), 6);
        assert_eq!(populated.bounties.len(), 4);
        assert_eq!(world.heroes().count(), 3);
        assert!(map.is_wall(Tile::new(22, 8)));
        assert!(!map.is_wall(Tile::new(22, 16)));
    }

    #[test]
    fn test_toml_scenario() {
        let text = r#"
            name = "tiny"
            walls = [{ x = 3, y = 3 }]

            [[structures]]
            kind = "lair"
            position = { x = 5.5, y = 5.5 }
            max_health = 100

            [[agents]]
            class = "warrior"
            position = { x = 1.5, y = 1.5 }
            personality = "brave"

            [[bounties]]
            kind = "attack_lair"
            structure = 0
            reward = 90
        "#;
        let scenario = Scenario::from_toml_str(text).unwrap();
        assert_eq!(scenario.agents[0].personality, Personality::Brave);

        let mut world = World::new();
        let mut map = GridMap::open(10, 10);
        let populated = scenario.populate(&mut world, &mut map, SimTime::ZERO).unwrap();
        let bounty = world.board.get(populated.bounties[0]).unwrap();
        assert_eq!(bounty.kind, BountyKind::AttackLair);
        assert_eq!(bounty.target, BountyTarget::Structure(populated.structures[0]));
    }

    #[test]
    fn test_defend_on_lair_is_rejected() {
        let scenario = Scenario {
            structures: vec![StructurePlacement {
                kind: StructureKind::Lair,
                position: Position::new(2.5, 2.5),
                max_health: 50,
            }],
            bounties: vec![BountyPlacement::DefendBuilding {
                structure: 0,
                reward: 10,
            }],
            ..Scenario::default()
        };
        let error = scenario
            .populate(&mut World::new(), &mut GridMap::open(8, 8), SimTime::ZERO)
            .unwrap_err();
        assert!(matches!(error, RuntimeError::InvalidScenario(_)));
    }

    #[test]
    fn test_agent_on_wall_is_rejected() {
        let scenario = Scenario {
            walls: vec![Tile::new(1, 1)],
            agents: vec![AgentPlacement {
                class: AgentClass::Goblin,
                position: Position::new(1.5, 1.5),
                personality: Personality::Balanced,
                gold: 0,
                potions: 0,
            }],
            ..Scenario::default()
        };
        let error = scenario
            .populate(&mut World::new(), &mut GridMap::open(8, 8), SimTime::ZERO)
            .unwrap_err();
        assert!(matches!(error, RuntimeError::InvalidScenario(_)));
    }
}
