//! Board of active bounties with deterministic, target-indexed evaluation.
use std::collections::{BTreeMap, HashMap};

use super::scoring::{attractiveness, tier_for};
use super::{Bounty, BountyError, BountyKind, BountyStatus, BountyTarget, Tier};
use crate::{AgentClass, BountyId, DecisionConfig, EntityId, Position, SimTime, Target};

/// Reward owed to a hero for completing a bounty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Payout {
    pub bounty: BountyId,
    pub kind: BountyKind,
    pub recipient: EntityId,
    pub reward: u32,
}

/// Read-only evaluation exposed to observers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BountyEvalSnapshot {
    pub bounty_id: BountyId,
    pub responders: u32,
    pub attractiveness_score: f32,
    pub attractiveness_tier: Tier,
}

impl BountyEvalSnapshot {
    /// Safe default for bounties the board has not evaluated (or never had).
    pub fn unknown(bounty_id: BountyId) -> Self {
        Self {
            bounty_id,
            responders: 0,
            attractiveness_score: 0.0,
            attractiveness_tier: Tier::Low,
        }
    }
}

/// Holds bounties keyed by id.
///
/// Mutated only by the tick loop (refresh, proximity) and completion event
/// handlers. Closed bounties stay on the board so observers can still see how
/// they ended.
#[derive(Clone, Debug, Default)]
pub struct BountyBoard {
    bounties: BTreeMap<BountyId, Bounty>,
    next_id: u32,
    last_refresh: Option<SimTime>,
}

impl BountyBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a new bounty.
    ///
    /// # Arguments
    ///
    /// * `kind` - Bounty kind; must agree with the shape of `target`
    /// * `target` - Location, structure or enemy class the bounty points at
    /// * `reward` - Gold paid on completion (non-zero)
    /// * `now` - Placement time
    ///
    /// # Returns
    ///
    /// The id of the new bounty. It starts with zero responders and a low tier
    /// until the next refresh.
    pub fn place(
        &mut self,
        kind: BountyKind,
        target: BountyTarget,
        reward: u32,
        now: SimTime,
    ) -> Result<BountyId, BountyError> {
        let matches = matches!(
            (kind, target),
            (BountyKind::Explore, BountyTarget::Location(_))
                | (BountyKind::AttackLair, BountyTarget::Structure(_))
                | (BountyKind::DefendBuilding, BountyTarget::Structure(_))
                | (BountyKind::HuntEnemyType, BountyTarget::EnemyClass(_))
        );
        if !matches {
            return Err(BountyError::MismatchedTarget { kind, target });
        }
        if reward == 0 {
            return Err(BountyError::ZeroReward);
        }

        self.next_id += 1;
        let id = BountyId(self.next_id);
        self.bounties.insert(
            id,
            Bounty {
                id,
                kind,
                target,
                reward,
                placed_at: now,
                status: BountyStatus::Open,
                responders: 0,
                attractiveness: 0.0,
                tier: Tier::Low,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: BountyId) -> Option<&Bounty> {
        self.bounties.get(&id)
    }

    pub fn is_open(&self, id: BountyId) -> bool {
        self.bounties.get(&id).is_some_and(Bounty::is_open)
    }

    /// Every bounty, ascending by id.
    pub fn iter(&self) -> impl Iterator<Item = &Bounty> {
        self.bounties.values()
    }

    /// Open bounties, ascending by id.
    pub fn open(&self) -> impl Iterator<Item = &Bounty> {
        self.bounties.values().filter(|bounty| bounty.is_open())
    }

    /// Open bounties ordered by attractiveness (descending), ties by id.
    pub fn ranked(&self) -> Vec<&Bounty> {
        let mut ranked: Vec<&Bounty> = self.open().collect();
        ranked.sort_by(|a, b| {
            b.attractiveness
                .total_cmp(&a.attractiveness)
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked
    }

    /// Whether the refresh cadence has elapsed.
    pub fn refresh_due(&self, now: SimTime, interval_ms: u64) -> bool {
        match self.last_refresh {
            Some(last) => now.since(last) >= interval_ms,
            None => true,
        }
    }

    pub fn last_refresh(&self) -> Option<SimTime> {
        self.last_refresh
    }

    /// Recompute responders, attractiveness and tier for every open bounty.
    ///
    /// One pass over the agents' targets builds a per-bounty count, one pass
    /// over the bounties reads it back: O(agents + bounties).
    pub fn refresh<'a, I>(&mut self, targets: I, config: &DecisionConfig, now: SimTime)
    where
        I: IntoIterator<Item = &'a Target>,
    {
        // determinism-guard: lookup-only
        let mut counts: HashMap<BountyId, u32> = HashMap::with_capacity(self.bounties.len());
        for target in targets {
            if let Target::Bounty(id) = target {
                *counts.entry(*id).or_insert(0) += 1;
            }
        }

        for bounty in self.bounties.values_mut() {
            if !bounty.is_open() {
                continue;
            }
            bounty.responders = counts.get(&bounty.id).copied().unwrap_or(0);
            bounty.attractiveness =
                attractiveness(bounty.kind, bounty.reward, bounty.responders, config);
            bounty.tier = tier_for(bounty.attractiveness, config);
        }
        self.last_refresh = Some(now);
    }

    pub fn snapshot(&self, id: BountyId) -> BountyEvalSnapshot {
        match self.bounties.get(&id) {
            Some(bounty) => BountyEvalSnapshot {
                bounty_id: id,
                responders: bounty.responders,
                attractiveness_score: bounty.attractiveness,
                attractiveness_tier: bounty.tier,
            },
            None => BountyEvalSnapshot::unknown(id),
        }
    }

    /// Close `id` in favor of `by`.
    pub fn complete(&mut self, id: BountyId, by: EntityId, now: SimTime) -> Result<Payout, BountyError> {
        let bounty = self.bounties.get_mut(&id).ok_or(BountyError::NotFound(id))?;
        if !bounty.is_open() {
            return Err(BountyError::AlreadyClosed(id));
        }
        bounty.status = BountyStatus::Completed { by, at: now };
        bounty.responders = 0;
        Ok(Payout {
            bounty: id,
            kind: bounty.kind,
            recipient: by,
            reward: bounty.reward,
        })
    }

    /// Withdraw `id` without paying anyone.
    pub fn cancel(&mut self, id: BountyId, now: SimTime) -> Result<(), BountyError> {
        let bounty = self.bounties.get_mut(&id).ok_or(BountyError::NotFound(id))?;
        if !bounty.is_open() {
            return Err(BountyError::AlreadyClosed(id));
        }
        bounty.status = BountyStatus::Cancelled { at: now };
        bounty.responders = 0;
        Ok(())
    }

    /// Complete `explore` bounties reached by `hero`.
    ///
    /// Only explore bounties complete on proximity. Callers visit heroes in
    /// ascending id order so the first hero in range claims the reward.
    pub fn on_proximity(
        &mut self,
        hero: EntityId,
        position: Position,
        config: &DecisionConfig,
        now: SimTime,
    ) -> Vec<Payout> {
        let reached: Vec<BountyId> = self
            .open()
            .filter(|bounty| bounty.kind == BountyKind::Explore)
            .filter(|bounty| match bounty.target {
                BountyTarget::Location(spot) => {
                    position.distance(spot) <= config.explore_claim_radius_tiles
                }
                _ => false,
            })
            .map(|bounty| bounty.id)
            .collect();
        self.complete_all(reached, hero, now)
    }

    /// A lair was destroyed by `destroyer`: pay its `attack_lair` bounties.
    pub fn on_lair_destroyed(&mut self, lair: EntityId, destroyer: EntityId, now: SimTime) -> Vec<Payout> {
        let ids = self.open_matching(|bounty| {
            bounty.kind == BountyKind::AttackLair && bounty.target.structure() == Some(lair)
        });
        self.complete_all(ids, destroyer, now)
    }

    /// An enemy died to `killer`.
    ///
    /// Completes the oldest open hunt bounty for the enemy's class and every
    /// defend bounty on the building the enemy was attacking.
    pub fn on_enemy_slain(
        &mut self,
        class: AgentClass,
        was_targeting: Option<EntityId>,
        killer: EntityId,
        now: SimTime,
    ) -> Vec<Payout> {
        let mut ids: Vec<BountyId> = self
            .open()
            .find(|bounty| {
                bounty.kind == BountyKind::HuntEnemyType
                    && bounty.target == BountyTarget::EnemyClass(class)
            })
            .map(|bounty| bounty.id)
            .into_iter()
            .collect();

        if let Some(building) = was_targeting {
            ids.extend(self.open_matching(|bounty| {
                bounty.kind == BountyKind::DefendBuilding
                    && bounty.target.structure() == Some(building)
            }));
        }
        ids.sort();
        self.complete_all(ids, killer, now)
    }

    /// Cancel every open bounty that references `entity`.
    ///
    /// Called when an entity is removed from the world; returns the ids that
    /// were cancelled so agents pointing at them can be cleared.
    pub fn invalidate_entity(&mut self, entity: EntityId, now: SimTime) -> Vec<BountyId> {
        let ids = self.open_matching(|bounty| bounty.target.structure() == Some(entity));
        for id in &ids {
            if let Some(bounty) = self.bounties.get_mut(id) {
                bounty.status = BountyStatus::Cancelled { at: now };
                bounty.responders = 0;
            }
        }
        ids
    }

    fn open_matching(&self, predicate: impl Fn(&Bounty) -> bool) -> Vec<BountyId> {
        self.open()
            .filter(|bounty| predicate(bounty))
            .map(|bounty| bounty.id)
            .collect()
    }

    fn complete_all(&mut self, ids: Vec<BountyId>, by: EntityId, now: SimTime) -> Vec<Payout> {
        ids.into_iter()
            .filter_map(|id| self.complete(id, by, now).ok())
            .collect()
    }
}
