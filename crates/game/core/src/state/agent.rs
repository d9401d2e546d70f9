//! Agents: heroes and enemies driven by the decision engine.
use std::collections::VecDeque;

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::record::DecisionRecord;
use super::target::Target;
use super::types::{EntityId, Position, Tile};
use crate::SimTime;
use crate::advisory::ConsultLedger;
use crate::engine::{Commitment, Priority, StuckCounters};

/// Which side an agent fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Faction {
    Hero,
    Enemy,
}

impl Faction {
    pub fn is_hostile_to(self, other: Faction) -> bool {
        self != other
    }
}

/// Agent archetype. Hunt bounties name an enemy class.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, AsRefStr, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AgentClass {
    Warrior,
    Ranger,
    Wizard,
    Goblin,
    Wolf,
    Skeleton,
}

impl AgentClass {
    pub fn faction(self) -> Faction {
        match self {
            AgentClass::Warrior | AgentClass::Ranger | AgentClass::Wizard => Faction::Hero,
            AgentClass::Goblin | AgentClass::Wolf | AgentClass::Skeleton => Faction::Enemy,
        }
    }

    /// Baseline stats for a freshly spawned agent of this class.
    pub fn base_stats(self) -> Stats {
        match self {
            AgentClass::Warrior => Stats::new(120, 14, 6, 2.0),
            AgentClass::Ranger => Stats::new(90, 12, 3, 2.6),
            AgentClass::Wizard => Stats::new(70, 18, 2, 2.2),
            AgentClass::Goblin => Stats::new(40, 8, 1, 2.0),
            AgentClass::Wolf => Stats::new(35, 9, 0, 2.8),
            AgentClass::Skeleton => Stats::new(60, 10, 3, 1.6),
        }
    }
}

/// Personality trait that biases heuristics and shapes advisory prompts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Personality {
    Brave,
    Cautious,
    Greedy,
    #[default]
    Balanced,
}

impl Personality {
    /// Prompt-facing description.
    pub fn description(self) -> &'static str {
        match self {
            Personality::Brave => "brave and aggressive",
            Personality::Cautious => "cautious and strategic",
            Personality::Greedy => "greedy but cowardly",
            Personality::Balanced => "balanced and reliable",
        }
    }

    /// Multiplier applied to bounty scores when choosing what to pursue.
    pub fn bounty_bias(self) -> f32 {
        match self {
            Personality::Greedy => 1.25,
            Personality::Cautious => 0.9,
            Personality::Brave | Personality::Balanced => 1.0,
        }
    }

    /// Extra score a personality grants to engaging a visible enemy.
    pub fn combat_bias(self) -> f32 {
        match self {
            Personality::Brave => 15.0,
            Personality::Greedy => -10.0,
            Personality::Cautious => -5.0,
            Personality::Balanced => 0.0,
        }
    }
}

/// Combat and movement stats.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    /// Tiles per simulated second.
    pub speed: f32,
    pub attack_cooldown_ms: u64,
}

impl Stats {
    pub const fn new(max_health: i32, attack: i32, defense: i32, speed: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            attack,
            defense,
            speed,
            attack_cooldown_ms: 1_000,
        }
    }

    /// Current health as a fraction of max health, in `[0, 1]`.
    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        (self.health.max(0) as f32 / self.max_health as f32).min(1.0)
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Restore up to `amount` health without exceeding max.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.health;
        self.health = (self.health + amount.max(0)).min(self.max_health);
        self.health - before
    }
}

/// Gold and consumables carried by an agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    pub gold: u32,
    pub potions: u32,
}

/// The closed state set of the per-agent state machine.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, AsRefStr, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AgentState {
    #[default]
    Idle,
    PursuingBounty,
    Shopping,
    ReturningToSafety,
    EngagingEnemy,
    DefendingBuilding,
    AttackingLair,
    InsideBuilding,
}

impl AgentState {
    /// States in which the agent may deal damage.
    pub fn is_combat(self) -> bool {
        matches!(
            self,
            AgentState::EngagingEnemy | AgentState::DefendingBuilding | AgentState::AttackingLair
        )
    }
}

/// Observable label describing what an agent is doing.
///
/// Always one of this closed set; there is no empty or free-form intent.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, AsRefStr, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IntentLabel {
    #[default]
    Idle,
    Exploring,
    PursuingBounty,
    Shopping,
    Retreating,
    Fighting,
    Defending,
    AssaultingLair,
    Sheltering,
    Recovering,
}

impl IntentLabel {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Derive the label from state and target.
    pub fn derive(state: AgentState, target: Option<&Target>, recovering: bool) -> IntentLabel {
        if recovering && state != AgentState::InsideBuilding {
            return IntentLabel::Recovering;
        }
        match state {
            AgentState::Idle => match target {
                Some(Target::Position(_)) => IntentLabel::Exploring,
                _ => IntentLabel::Idle,
            },
            AgentState::PursuingBounty => IntentLabel::PursuingBounty,
            AgentState::Shopping => IntentLabel::Shopping,
            AgentState::ReturningToSafety => IntentLabel::Retreating,
            AgentState::EngagingEnemy => IntentLabel::Fighting,
            AgentState::DefendingBuilding => IntentLabel::Defending,
            AgentState::AttackingLair => IntentLabel::AssaultingLair,
            AgentState::InsideBuilding => IntentLabel::Sheltering,
        }
    }
}

/// Movement bookkeeping owned by the runtime's movement system.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Navigation {
    /// Tile the current path leads to.
    pub goal: Option<Tile>,
    /// Remaining tiles to walk, front first.
    pub path: VecDeque<Tile>,
    /// Interim recovery waypoint; overrides the path while set.
    pub waypoint: Option<Position>,
    /// Last path request for `goal` failed.
    pub blocked: bool,
}

impl Navigation {
    pub fn clear(&mut self) {
        self.goal = None;
        self.path.clear();
        self.waypoint = None;
        self.blocked = false;
    }
}

/// A hero or enemy.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: EntityId,
    pub class: AgentClass,
    pub faction: Faction,
    pub personality: Personality,
    pub stats: Stats,
    pub inventory: Inventory,
    pub position: Position,
    pub state: AgentState,
    pub target: Option<Target>,
    pub intent: IntentLabel,
    pub last_decision: Option<DecisionRecord>,
    pub commitment: Commitment,
    pub stuck: StuckCounters,
    pub consults: ConsultLedger,
    pub navigation: Navigation,
    /// Building the agent is sheltering in while `state == InsideBuilding`.
    pub sheltered_in: Option<EntityId>,
    pub next_attack_at: SimTime,
    pub next_rest_at: SimTime,
}

impl Agent {
    /// Create an agent in the `idle` state with no decision recorded.
    pub fn new(id: EntityId, class: AgentClass, position: Position) -> Self {
        Self {
            id,
            class,
            faction: class.faction(),
            personality: Personality::default(),
            stats: class.base_stats(),
            inventory: Inventory::default(),
            position,
            state: AgentState::Idle,
            target: None,
            intent: IntentLabel::Idle,
            last_decision: None,
            commitment: Commitment::default(),
            stuck: StuckCounters::new(position, SimTime::ZERO),
            consults: ConsultLedger::new(),
            navigation: Navigation::default(),
            sheltered_in: None,
            next_attack_at: SimTime::ZERO,
            next_rest_at: SimTime::ZERO,
        }
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn with_inventory(mut self, gold: u32, potions: u32) -> Self {
        self.inventory = Inventory { gold, potions };
        self
    }

    pub fn with_stats(mut self, stats: Stats) -> Self {
        self.stats = stats;
        self
    }

    pub fn is_hero(&self) -> bool {
        self.faction == Faction::Hero
    }

    pub fn is_alive(&self) -> bool {
        self.stats.is_alive()
    }

    pub fn is_inside_building(&self) -> bool {
        self.state == AgentState::InsideBuilding
    }

    /// Recompute [`Self::intent`] from the current state and target.
    pub fn refresh_intent(&mut self) {
        let recovering = self.navigation.waypoint.is_some();
        self.intent = IntentLabel::derive(self.state, self.target.as_ref(), recovering);
    }

    /// Point the agent at a new idle destination and restart its commitment.
    pub fn wander_to(&mut self, spot: Position, now: SimTime) {
        self.state = AgentState::Idle;
        self.target = Some(Target::Position(spot));
        self.commitment = Commitment::start(now, Priority::Idle, 0.0);
        self.navigation.clear();
        self.refresh_intent();
    }

    /// Drop the target and fall back to `idle`, as after a stale reference.
    ///
    /// The commitment restarts at idle priority so the previous task no
    /// longer outranks new candidates.
    pub fn reset_to_idle(&mut self, now: SimTime) {
        self.state = AgentState::Idle;
        self.target = None;
        self.sheltered_in = None;
        self.commitment = Commitment::start(now, Priority::Idle, 0.0);
        self.navigation.clear();
        self.refresh_intent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BountyId;
    use strum::IntoEnumIterator;

    #[test]
    fn test_new_agent_is_idle_without_decision() {
        let agent = Agent::new(EntityId(1), AgentClass::Warrior, Position::ORIGIN);
        assert_eq!(agent.state, AgentState::Idle);
        assert_eq!(agent.intent, IntentLabel::Idle);
        assert!(agent.last_decision.is_none());
        assert!(agent.target.is_none());
        assert_eq!(agent.faction, Faction::Hero);
    }

    #[test]
    fn test_every_state_derives_a_nonempty_label() {
        let target = Target::Bounty(BountyId(1));
        for state in AgentState::iter() {
            for recovering in [false, true] {
                let label = IntentLabel::derive(state, Some(&target), recovering);
                assert!(!label.as_str().is_empty());
                assert!(IntentLabel::iter().any(|known| known == label));
            }
        }
    }

    #[test]
    fn test_idle_with_position_target_is_exploring() {
        let label = IntentLabel::derive(
            AgentState::Idle,
            Some(&Target::Position(Position::new(3.0, 3.0))),
            false,
        );
        assert_eq!(label, IntentLabel::Exploring);
    }

    #[test]
    fn test_reset_to_idle_restarts_commitment() {
        let mut agent = Agent::new(EntityId(1), AgentClass::Warrior, Position::ORIGIN);
        agent.state = AgentState::EngagingEnemy;
        agent.target = Some(Target::Entity(EntityId(7)));
        agent.commitment = Commitment::start(SimTime(100), Priority::Combat, 95.0);

        agent.reset_to_idle(SimTime(2_000));

        assert_eq!(agent.state, AgentState::Idle);
        assert!(agent.target.is_none());
        assert_eq!(agent.commitment, Commitment::start(SimTime(2_000), Priority::Idle, 0.0));
        assert_eq!(agent.intent, IntentLabel::Idle);
    }

    #[test]
    fn test_wander_to_replaces_stale_commitment() {
        let mut agent = Agent::new(EntityId(1), AgentClass::Ranger, Position::ORIGIN);
        agent.commitment = Commitment::start(SimTime(0), Priority::Combat, 95.0);

        agent.wander_to(Position::new(30.5, 4.5), SimTime(800));

        assert_eq!(agent.target, Some(Target::Position(Position::new(30.5, 4.5))));
        assert_eq!(agent.commitment.priority, Priority::Idle);
        assert_eq!(agent.commitment.since, SimTime(800));
        assert_eq!(agent.intent, IntentLabel::Exploring);
    }

    #[test]
    fn test_health_ratio_and_heal_clamp() {
        let mut stats = Stats::new(100, 10, 2, 2.0);
        stats.health = 20;
        assert!((stats.health_ratio() - 0.2).abs() < 1e-6);
        assert_eq!(stats.heal(500), 80);
        assert_eq!(stats.health, 100);
        stats.health = -5;
        assert_eq!(stats.health_ratio(), 0.0);
    }

    #[test]
    fn test_personality_descriptions() {
        assert_eq!(Personality::Greedy.description(), "greedy but cowardly");
        assert_eq!(Personality::default(), Personality::Balanced);
    }
}
