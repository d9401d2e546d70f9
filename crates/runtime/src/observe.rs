//! Read-only observability snapshots.
//!
//! Nothing here feeds back into decisions.
use serde::Serialize;

use kingdom_core::{
    AgentClass, AgentState, BountyEvalSnapshot, BountyKind, DecisionRecorder, Inventory,
    IntentSnapshot, Personality, Position, SimTime, World,
};

/// What an observer sees of one agent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentObservation {
    #[serde(flatten)]
    pub intent: IntentSnapshot,
    pub class: AgentClass,
    pub personality: Personality,
    pub state: AgentState,
    pub health: i32,
    pub max_health: i32,
    pub position: Position,
    pub inventory: Inventory,
}

/// What an observer sees of one bounty.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BountyObservation {
    #[serde(flatten)]
    pub eval: BountyEvalSnapshot,
    pub kind: BountyKind,
    pub reward: u32,
    pub open: bool,
}

/// Whole-world snapshot at one tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    pub tick: u64,
    pub now_ms: u64,
    pub agents: Vec<AgentObservation>,
    pub bounties: Vec<BountyObservation>,
}

impl Observation {
    pub fn capture(world: &World, tick: u64, now: SimTime) -> Self {
        let agents = world
            .agents()
            .map(|agent| AgentObservation {
                intent: DecisionRecorder::snapshot(agent, now),
                class: agent.class,
                personality: agent.personality,
                state: agent.state,
                health: agent.stats.health,
                max_health: agent.stats.max_health,
                position: agent.position,
                inventory: agent.inventory,
            })
            .collect();
        let bounties = world
            .board
            .iter()
            .map(|bounty| BountyObservation {
                eval: world.board.snapshot(bounty.id),
                kind: bounty.kind,
                reward: bounty.reward,
                open: bounty.is_open(),
            })
            .collect();
        Self {
            tick,
            now_ms: now.as_millis(),
            agents,
            bounties,
        }
    }

    pub fn agent(&self, id: kingdom_core::EntityId) -> Option<&AgentObservation> {
        self.agents.iter().find(|agent| agent.intent.agent == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kingdom_core::Position;

    #[test]
    fn test_fresh_agent_shows_placeholder() {
        let mut world = World::new();
        let hero = world.spawn(AgentClass::Ranger, Position::ORIGIN);
        let observation = Observation::capture(&world, 0, SimTime::ZERO);

        let json = serde_json::to_value(&observation).unwrap();
        let agent = &json["agents"][0];
        assert_eq!(agent["agent"], hero.raw());
        assert_eq!(agent["intent"], "idle");
        assert_eq!(agent["last_decision"]["action"], "none");
        assert_eq!(agent["last_decision"]["reason"], "no decision yet");
        assert!(json["bounties"].as_array().unwrap().is_empty());
    }
}
