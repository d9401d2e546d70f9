//! Per-consult situational snapshot.
//!
//! A [`DecisionContext`] is rebuilt from the world every time an agent
//! decides. It is never stored. Every list in it is sorted by distance with
//! ties broken by ascending id, so two identical worlds produce identical
//! contexts.
use std::fmt::Write as _;

use bitflags::bitflags;

use crate::bounty::{BountyKind, Tier};
use crate::error::DecisionError;
use crate::state::{
    Agent, AgentClass, AgentState, BountyId, EntityId, Faction, Inventory, Personality, Position,
    Stats, StructureKind, Target, World,
};
use crate::{DecisionConfig, SimTime};

bitflags! {
    /// Situation flags derived while building a context.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Situation: u16 {
        const IN_COMBAT       = 1 << 0;
        const LOW_HEALTH      = 1 << 1;
        const CRITICAL_HEALTH = 1 << 2;
        const HAS_POTIONS     = 1 << 3;
        const CAN_SHOP        = 1 << 4;
        const NEAR_SAFETY     = 1 << 5;
        const ENEMIES_NEARBY  = 1 << 6;
        const OUTNUMBERED     = 1 << 7;
    }
}

impl Situation {
    /// Prompt-facing names of the set flags, in bit order.
    pub fn labels(self) -> Vec<&'static str> {
        [
            (Situation::IN_COMBAT, "in combat"),
            (Situation::LOW_HEALTH, "low health"),
            (Situation::CRITICAL_HEALTH, "critical health"),
            (Situation::HAS_POTIONS, "has potions"),
            (Situation::CAN_SHOP, "can afford potion"),
            (Situation::NEAR_SAFETY, "near safety"),
            (Situation::ENEMIES_NEARBY, "enemies nearby"),
            (Situation::OUTNUMBERED, "outnumbered"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, label)| label)
        .collect()
    }
}

/// A hostile agent within sensing range.
#[derive(Clone, Debug, PartialEq)]
pub struct ThreatView {
    pub id: EntityId,
    pub class: AgentClass,
    pub position: Position,
    pub distance: f32,
    pub health: i32,
    pub max_health: i32,
    /// Entity the threat is currently targeting.
    pub targeting: Option<EntityId>,
}

/// A structure relevant to the deciding agent.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureView {
    pub id: EntityId,
    pub kind: StructureKind,
    pub position: Position,
    pub distance: f32,
    pub potion_price: u32,
}

/// An open bounty as seen from the deciding agent.
#[derive(Clone, Debug, PartialEq)]
pub struct BountyView {
    pub id: BountyId,
    pub kind: BountyKind,
    pub reward: u32,
    /// `None` when the bounty cannot currently be located (hunt with no prey).
    pub position: Option<Position>,
    pub distance: Option<f32>,
    pub attractiveness: f32,
    pub tier: Tier,
    pub responders: u32,
}

/// Everything an agent may consider when deciding.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionContext {
    pub now: SimTime,
    pub agent: EntityId,
    pub class: AgentClass,
    pub faction: Faction,
    pub personality: Personality,
    pub state: AgentState,
    pub target: Option<Target>,
    pub position: Position,
    pub stats: Stats,
    pub inventory: Inventory,
    pub sheltered_in: Option<EntityId>,
    /// Hostile agents within the threat radius.
    pub threats: Vec<ThreatView>,
    /// Friendly agents within the context radius, excluding self.
    pub allies_nearby: u32,
    /// Shelters on the map (heroes only).
    pub safe_points: Vec<StructureView>,
    /// Marketplaces on the map (heroes only).
    pub shops: Vec<StructureView>,
    /// Non-lair buildings within the threat radius (enemies only).
    pub attackable: Vec<StructureView>,
    /// Open bounties in ranked order (heroes only).
    pub bounties: Vec<BountyView>,
    pub situation: Situation,
}

impl DecisionContext {
    pub fn health_ratio(&self) -> f32 {
        self.stats.health_ratio()
    }

    pub fn has(&self, flag: Situation) -> bool {
        self.situation.contains(flag)
    }

    pub fn nearest_threat(&self) -> Option<&ThreatView> {
        self.threats.first()
    }

    pub fn threat(&self, id: EntityId) -> Option<&ThreatView> {
        self.threats.iter().find(|threat| threat.id == id)
    }

    pub fn nearest_safe_point(&self) -> Option<&StructureView> {
        self.safe_points.first()
    }

    pub fn nearest_shop(&self) -> Option<&StructureView> {
        self.shops.first()
    }

    pub fn bounty(&self, id: BountyId) -> Option<&BountyView> {
        self.bounties.iter().find(|bounty| bounty.id == id)
    }

    /// Compact, human-readable summary used to build advisory prompts.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let health_pct = (self.health_ratio() * 100.0).round() as i32;
        let _ = writeln!(
            out,
            "Agent {} ({}, {})",
            self.agent,
            self.class,
            self.personality.description()
        );
        let _ = writeln!(
            out,
            "Health: {}/{} ({}%)",
            self.stats.health.max(0),
            self.stats.max_health,
            health_pct
        );
        let _ = writeln!(
            out,
            "Attack: {} Defense: {}",
            self.stats.attack, self.stats.defense
        );
        let _ = writeln!(
            out,
            "Gold: {} Potions: {}",
            self.inventory.gold, self.inventory.potions
        );
        let _ = writeln!(out, "State: {}", self.state);

        if self.threats.is_empty() {
            let _ = writeln!(out, "Nearby enemies: none");
        } else {
            let listed: Vec<String> = self
                .threats
                .iter()
                .map(|t| {
                    format!(
                        "{} {} at {:.1} tiles (hp {}/{})",
                        t.class, t.id, t.distance, t.health, t.max_health
                    )
                })
                .collect();
            let _ = writeln!(out, "Nearby enemies: {}", listed.join("; "));
        }
        let _ = writeln!(out, "Allies nearby: {}", self.allies_nearby);

        match self.nearest_safe_point() {
            Some(safe) => {
                let _ = writeln!(
                    out,
                    "Nearest safety: {} {} at {:.1} tiles",
                    safe.kind, safe.id, safe.distance
                );
            }
            None => {
                let _ = writeln!(out, "Nearest safety: none");
            }
        }
        if let Some(shop) = self.nearest_shop() {
            let _ = writeln!(
                out,
                "Shop: {} {} at {:.1} tiles, Health Potion {} gold",
                shop.kind, shop.id, shop.distance, shop.potion_price
            );
        }
        if !self.bounties.is_empty() {
            let listed: Vec<String> = self
                .bounties
                .iter()
                .map(|b| {
                    let distance = b
                        .distance
                        .map(|d| format!("{d:.1} tiles"))
                        .unwrap_or_else(|| "unknown distance".to_owned());
                    format!(
                        "{} {} reward {} ({}, {} responders) at {}",
                        b.id, b.kind, b.reward, b.tier, b.responders, distance
                    )
                })
                .collect();
            let _ = writeln!(out, "Bounties: {}", listed.join("; "));
        }

        let labels = self.situation.labels();
        if labels.is_empty() {
            let _ = write!(out, "Situation: calm");
        } else {
            let _ = write!(out, "Situation: {}", labels.join(", "));
        }
        out
    }
}

/// Assembles [`DecisionContext`]s from a [`World`].
pub struct ContextBuilder<'a> {
    world: &'a World,
    config: &'a DecisionConfig,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(world: &'a World, config: &'a DecisionConfig) -> Self {
        Self { world, config }
    }

    /// Build the context for `agent` at `now`.
    ///
    /// Fails only when the agent itself is gone.
    pub fn build(&self, agent: EntityId, now: SimTime) -> Result<DecisionContext, DecisionError> {
        let me = self
            .world
            .agent(agent)
            .ok_or(DecisionError::UnknownAgent(agent))?;
        let config = self.config;

        let threats = self.threats(me);
        let allies_nearby = self
            .world
            .agents()
            .filter(|other| other.id != me.id && other.faction == me.faction && other.is_alive())
            .filter(|other| me.position.distance(other.position) <= config.context_radius_tiles)
            .count() as u32;

        let is_hero = me.is_hero();
        let safe_points = if is_hero {
            self.structures(me.position, |kind| kind.is_shelter(), f32::INFINITY)
        } else {
            Vec::new()
        };
        let shops = if is_hero {
            self.structures(me.position, |kind| kind.is_shop(), f32::INFINITY)
        } else {
            Vec::new()
        };
        let attackable = if is_hero {
            Vec::new()
        } else {
            self.structures(
                me.position,
                |kind| !kind.is_lair(),
                config.threat_radius_tiles,
            )
        };
        let bounties = if is_hero {
            self.bounties(me.position)
        } else {
            Vec::new()
        };

        let ratio = me.stats.health_ratio();
        let mut situation = Situation::empty();
        situation.set(Situation::CRITICAL_HEALTH, ratio < config.critical_health);
        situation.set(Situation::LOW_HEALTH, ratio < config.low_health);
        situation.set(Situation::HAS_POTIONS, me.inventory.potions > 0);
        situation.set(Situation::ENEMIES_NEARBY, !threats.is_empty());
        situation.set(
            Situation::IN_COMBAT,
            me.state.is_combat()
                || threats
                    .iter()
                    .any(|t| t.distance <= config.attack_range_tiles * 2.0),
        );
        situation.set(
            Situation::CAN_SHOP,
            shops.first().is_some_and(|shop| {
                shop.distance <= config.shop_radius_tiles && me.inventory.gold >= shop.potion_price
            }),
        );
        situation.set(
            Situation::NEAR_SAFETY,
            safe_points
                .first()
                .is_some_and(|safe| safe.distance <= config.arrival_radius_tiles * 2.0),
        );
        situation.set(
            Situation::OUTNUMBERED,
            threats.len() as u32 > allies_nearby + 1,
        );

        Ok(DecisionContext {
            now,
            agent: me.id,
            class: me.class,
            faction: me.faction,
            personality: me.personality,
            state: me.state,
            target: me.target,
            position: me.position,
            stats: me.stats,
            inventory: me.inventory,
            sheltered_in: me.sheltered_in,
            threats,
            allies_nearby,
            safe_points,
            shops,
            attackable,
            bounties,
            situation,
        })
    }

    fn threats(&self, me: &Agent) -> Vec<ThreatView> {
        let mut threats: Vec<ThreatView> = self
            .world
            .agents()
            .filter(|other| other.faction.is_hostile_to(me.faction))
            .filter(|other| other.is_alive() && !other.is_inside_building())
            .filter_map(|other| {
                let distance = me.position.distance(other.position);
                (distance <= self.config.threat_radius_tiles).then(|| ThreatView {
                    id: other.id,
                    class: other.class,
                    position: other.position,
                    distance,
                    health: other.stats.health,
                    max_health: other.stats.max_health,
                    targeting: other.target.as_ref().and_then(Target::entity),
                })
            })
            .collect();
        threats.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
        threats
    }

    fn structures(
        &self,
        from: Position,
        include: impl Fn(StructureKind) -> bool,
        radius: f32,
    ) -> Vec<StructureView> {
        let mut views: Vec<StructureView> = self
            .world
            .structures()
            .filter(|s| s.is_standing() && include(s.kind))
            .filter_map(|s| {
                let distance = from.distance(s.position);
                (distance <= radius).then(|| StructureView {
                    id: s.id,
                    kind: s.kind,
                    position: s.position,
                    distance,
                    potion_price: s.potion_price,
                })
            })
            .collect();
        views.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
        views
    }

    fn bounties(&self, from: Position) -> Vec<BountyView> {
        self.world
            .board
            .ranked()
            .into_iter()
            .map(|bounty| {
                let position = self.world.bounty_position(bounty.id, from);
                BountyView {
                    id: bounty.id,
                    kind: bounty.kind,
                    reward: bounty.reward,
                    position,
                    distance: position.map(|p| from.distance(p)),
                    attractiveness: bounty.attractiveness,
                    tier: bounty.tier,
                    responders: bounty.responders,
                }
            })
            .collect()
    }
}
