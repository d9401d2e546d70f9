//! Per-agent state machine.
//!
//! Evaluation runs in two stages:
//!
//! 1. [`propose`] walks a priority-ordered rule list and returns the first
//!    rule's [`Candidate`], like a selector node over condition/action leaves.
//! 2. [`resolve`] weighs that candidate against the agent's commitment and
//!    produces the [`Transition`] to apply.
//!
//! Both stages are pure functions of the context, the agent's committed
//! state and the configuration. Missing data degrades to conservative
//! choices: with no visible threat an agent cannot start engaging.
use super::commitment::{Challenger, HoldReason, Priority, Verdict, arbitrate};
use super::context::{BountyView, DecisionContext, Situation, StructureView, ThreatView};
use crate::advisory::{AdvisoryAction, AdvisoryDecision, ConsultReason};
use crate::bounty::{BountyKind, attractiveness};
use crate::state::{Agent, AgentState, DecisionSource, EntityId, Faction, Target};
use crate::DecisionConfig;

/// Side effect applied alongside a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Drink a health potion.
    UsePotion,
}

/// What a rule would like the agent to do.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub state: AgentState,
    pub target: Option<Target>,
    pub priority: Priority,
    pub score: f32,
    pub action: &'static str,
    pub reason: String,
    pub source: DecisionSource,
    pub effect: Option<Effect>,
    /// Set when the situation is important enough to ask for advice.
    pub consult: Option<ConsultReason>,
}

impl Candidate {
    fn new(
        state: AgentState,
        target: Option<Target>,
        priority: Priority,
        score: f32,
        action: &'static str,
        reason: &str,
    ) -> Self {
        Self {
            state,
            target,
            priority,
            score,
            action,
            reason: reason.to_owned(),
            source: DecisionSource::Heuristic,
            effect: None,
            consult: None,
        }
    }

    fn with_consult(mut self, reason: ConsultReason) -> Self {
        self.consult = Some(reason);
        self
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }
}

/// The outcome of an evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: AgentState,
    pub target: Option<Target>,
    pub priority: Priority,
    pub score: f32,
    pub action: &'static str,
    pub reason: String,
    pub source: DecisionSource,
    pub effect: Option<Effect>,
    pub verdict: Verdict,
}

impl Transition {
    /// Whether applying this transition changes anything about `agent`.
    pub fn changes(&self, agent: &Agent) -> bool {
        self.state != agent.state || self.target != agent.target || self.effect.is_some()
    }

    /// Whether this transition deals damage.
    pub fn is_hostile(&self) -> bool {
        self.state.is_combat()
    }
}

type Rule = fn(&Agent, &DecisionContext, &DecisionConfig) -> Option<Candidate>;

const HERO_RULES: &[Rule] = &[shelter, survival, combat, bounty, shopping, idle];
const ENEMY_RULES: &[Rule] = &[combat, siege, idle];

/// Evaluate the agent: propose, then resolve against its commitment.
pub fn evaluate(agent: &Agent, ctx: &DecisionContext, config: &DecisionConfig) -> Transition {
    resolve(agent, ctx, config, propose(agent, ctx, config))
}

/// Run the rule list and return the first matching candidate.
pub fn propose(agent: &Agent, ctx: &DecisionContext, config: &DecisionConfig) -> Candidate {
    let rules = match agent.faction {
        Faction::Hero => HERO_RULES,
        Faction::Enemy => ENEMY_RULES,
    };
    rules
        .iter()
        .find_map(|rule| rule(agent, ctx, config))
        .unwrap_or_else(|| rest(agent))
}

/// Weigh `candidate` against the agent's current commitment.
pub fn resolve(
    agent: &Agent,
    ctx: &DecisionContext,
    config: &DecisionConfig,
    candidate: Candidate,
) -> Transition {
    let standing = standing(agent, ctx, config);

    let verdict = if agent.is_inside_building() && candidate.state.is_combat() {
        Verdict::Hold(HoldReason::Sheltered)
    } else {
        arbitrate(
            agent.target.as_ref(),
            standing,
            &agent.commitment,
            Challenger {
                target: candidate.target.as_ref(),
                priority: candidate.priority,
                score: candidate.score,
            },
            ctx.now,
            config,
        )
    };

    match verdict {
        Verdict::Switch | Verdict::Retain => Transition {
            state: candidate.state,
            target: candidate.target,
            priority: candidate.priority,
            score: candidate.score,
            action: candidate.action,
            reason: candidate.reason,
            source: candidate.source,
            effect: candidate.effect,
            verdict,
        },
        Verdict::Hold(reason) => Transition {
            state: agent.state,
            target: agent.target,
            priority: agent.commitment.priority,
            score: standing.unwrap_or(agent.commitment.score),
            action: "hold",
            reason: reason.describe().to_owned(),
            source: DecisionSource::Heuristic,
            effect: None,
            verdict,
        },
    }
}

/// Translate a validated advisory (or fallback) decision into a candidate.
///
/// Free-text targets are resolved against the context: `"#<id>"` names an
/// entity, a kind or class name picks the nearest match, anything else falls
/// back to the nearest sensible choice. Actions that cannot be carried out
/// degrade to exploring.
pub fn candidate_from_advisory(
    agent: &Agent,
    ctx: &DecisionContext,
    config: &DecisionConfig,
    decision: &AdvisoryDecision,
) -> Candidate {
    let candidate = match decision.action {
        AdvisoryAction::UsePotion if ctx.inventory.potions > 0 => Some(drink(agent)),
        AdvisoryAction::UsePotion | AdvisoryAction::Retreat => {
            let shelter = pick_structure(&ctx.safe_points, &decision.target);
            retreat_to(ctx, shelter)
        }
        AdvisoryAction::BuyItem => pick_structure(&ctx.shops, &decision.target).map(go_shopping),
        AdvisoryAction::Fight => pick_threat(ctx, &decision.target).map(|threat| engage(agent, threat)),
        AdvisoryAction::Explore => bounty(agent, ctx, config),
    };

    let mut candidate = match candidate {
        Some(mut candidate) => {
            candidate.action = decision.action.as_str();
            candidate
        }
        None => explore(agent),
    };
    if !decision.reason.is_empty() {
        candidate.reason = decision.reason.clone();
    }
    candidate.source = decision.source;
    candidate.consult = None;
    candidate
}

/// Score of the current target if it is still worth pursuing.
pub fn standing(agent: &Agent, ctx: &DecisionContext, config: &DecisionConfig) -> Option<f32> {
    let target = agent.target?;
    let ratio = ctx.health_ratio();
    match (agent.state, target) {
        (AgentState::InsideBuilding, _) | (AgentState::ReturningToSafety, Target::Position(_)) => {
            (ratio < config.shelter_exit_health).then_some(survival_score(0.0))
        }
        (AgentState::ReturningToSafety, Target::Entity(id)) => ctx
            .safe_points
            .iter()
            .find(|safe| safe.id == id)
            .filter(|_| ratio < config.shelter_exit_health)
            .map(|safe| survival_score(safe.distance)),
        (AgentState::EngagingEnemy, Target::Entity(id)) => match ctx.threat(id) {
            Some(threat) => Some(combat_score(agent, threat)),
            None => ctx
                .attackable
                .iter()
                .find(|building| building.id == id)
                .map(|building| siege_score(building.distance)),
        },
        (
            AgentState::PursuingBounty | AgentState::AttackingLair | AgentState::DefendingBuilding,
            Target::Bounty(id),
        ) => ctx.bounty(id).map(|view| bounty_score(agent, view, config)),
        (AgentState::Shopping, Target::Entity(id)) => ctx
            .shops
            .iter()
            .find(|shop| shop.id == id)
            .filter(|shop| ctx.inventory.gold >= shop.potion_price)
            .map(|_| SHOPPING_SCORE),
        (AgentState::Idle, Target::Position(spot)) => {
            (ctx.position.distance(spot) > config.arrival_radius_tiles).then_some(0.0)
        }
        _ => None,
    }
}

const SHOPPING_SCORE: f32 = 20.0;

fn survival_score(distance: f32) -> f32 {
    1_000.0 - distance
}

fn combat_score(agent: &Agent, threat: &ThreatView) -> f32 {
    let focus = if threat.targeting == Some(agent.id) {
        20.0
    } else {
        0.0
    };
    100.0 - threat.distance * 5.0 + agent.personality.combat_bias() + focus
}

fn siege_score(distance: f32) -> f32 {
    50.0 - distance * 5.0
}

/// Pull of a bounty on `agent`, counting only the other responders.
///
/// The board's responder count includes the agent once it has taken the
/// bounty, so the current target and its rivals are scored on the same basis.
fn bounty_score(agent: &Agent, view: &BountyView, config: &DecisionConfig) -> f32 {
    let others = if agent.target == Some(Target::Bounty(view.id)) {
        view.responders.saturating_sub(1)
    } else {
        view.responders
    };
    let pull = attractiveness(view.kind, view.reward, others, config);
    pull * agent.personality.bounty_bias() - view.distance.unwrap_or(0.0) * 0.5
}

fn bounty_state(kind: BountyKind) -> AgentState {
    match kind {
        BountyKind::Explore | BountyKind::HuntEnemyType => AgentState::PursuingBounty,
        BountyKind::AttackLair => AgentState::AttackingLair,
        BountyKind::DefendBuilding => AgentState::DefendingBuilding,
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Sheltered heroes rest until healthy, then step outside.
fn shelter(agent: &Agent, ctx: &DecisionContext, config: &DecisionConfig) -> Option<Candidate> {
    if !agent.is_inside_building() {
        return None;
    }
    if ctx.health_ratio() >= config.shelter_exit_health {
        return Some(Candidate::new(
            AgentState::Idle,
            None,
            Priority::Idle,
            0.0,
            "leave_shelter",
            "Rested, leaving shelter",
        ));
    }
    Some(Candidate::new(
        AgentState::InsideBuilding,
        agent.target,
        Priority::Survival,
        survival_score(0.0),
        "rest",
        "Resting inside",
    ))
}

/// Critical health: drink if possible, otherwise run.
fn survival(agent: &Agent, ctx: &DecisionContext, _config: &DecisionConfig) -> Option<Candidate> {
    if !ctx.has(Situation::CRITICAL_HEALTH) {
        return None;
    }
    if ctx.has(Situation::HAS_POTIONS) {
        return Some(drink(agent));
    }
    retreat_to(ctx, ctx.nearest_safe_point())
}

/// Fight the most pressing visible enemy.
fn combat(agent: &Agent, ctx: &DecisionContext, config: &DecisionConfig) -> Option<Candidate> {
    let threat = ctx.threats.iter().max_by(|a, b| {
        combat_score(agent, a)
            .total_cmp(&combat_score(agent, b))
            .then_with(|| b.id.cmp(&a.id))
    })?;
    let candidate = engage(agent, threat);
    if agent.is_hero() && ctx.health_ratio() < config.low_health {
        return Some(candidate.with_consult(ConsultReason::LowHealthInCombat));
    }
    Some(candidate)
}

/// Pursue the best-scoring open bounty.
fn bounty(agent: &Agent, ctx: &DecisionContext, config: &DecisionConfig) -> Option<Candidate> {
    let best = ctx
        .bounties
        .iter()
        .filter(|view| view.position.is_some())
        .max_by(|a, b| {
            bounty_score(agent, a, config)
                .total_cmp(&bounty_score(agent, b, config))
                .then_with(|| b.id.cmp(&a.id))
        })?;
    Some(Candidate::new(
        bounty_state(best.kind),
        Some(Target::Bounty(best.id)),
        Priority::Bounty,
        bounty_score(agent, best, config),
        "pursue_bounty",
        match best.kind {
            BountyKind::Explore => "Heading out to explore for a bounty",
            BountyKind::AttackLair => "Assaulting a lair for a bounty",
            BountyKind::DefendBuilding => "Defending a building for a bounty",
            BountyKind::HuntEnemyType => "Hunting enemies for a bounty",
        },
    ))
}

/// Enough gold and a market in reach.
fn shopping(_agent: &Agent, ctx: &DecisionContext, config: &DecisionConfig) -> Option<Candidate> {
    if !ctx.has(Situation::CAN_SHOP)
        || ctx.inventory.gold < config.shopping_gold
        || ctx.inventory.potions >= 2
    {
        return None;
    }
    let shop = ctx.nearest_shop()?;
    Some(go_shopping(shop).with_consult(ConsultReason::ShoppingOpportunity))
}

/// Enemies attack nearby buildings when no hero is in sight.
fn siege(_agent: &Agent, ctx: &DecisionContext, _config: &DecisionConfig) -> Option<Candidate> {
    let building = ctx.attackable.first()?;
    Some(Candidate::new(
        AgentState::EngagingEnemy,
        Some(Target::Entity(building.id)),
        Priority::Combat,
        siege_score(building.distance),
        "attack_building",
        "Attacking a nearby building",
    ))
}

/// Keep walking to an unreached wander point, otherwise stand idle.
fn idle(agent: &Agent, ctx: &DecisionContext, config: &DecisionConfig) -> Option<Candidate> {
    if let Some(Target::Position(spot)) = agent.target {
        if agent.state == AgentState::Idle
            && ctx.position.distance(spot) > config.arrival_radius_tiles
        {
            return Some(Candidate::new(
                AgentState::Idle,
                agent.target,
                Priority::Idle,
                0.0,
                "explore",
                "Exploring",
            ));
        }
    }
    let candidate = rest(agent);
    if agent.is_hero() {
        return Some(candidate.with_consult(ConsultReason::IdleWithoutGoal));
    }
    Some(candidate)
}

fn rest(_agent: &Agent) -> Candidate {
    Candidate::new(
        AgentState::Idle,
        None,
        Priority::Idle,
        0.0,
        "idle",
        "Nothing to do",
    )
}

fn explore(agent: &Agent) -> Candidate {
    let mut candidate = rest(agent);
    candidate.action = "explore";
    candidate.reason = "Exploring".to_owned();
    candidate
}

fn drink(agent: &Agent) -> Candidate {
    Candidate::new(
        agent.state,
        agent.target,
        Priority::Survival,
        survival_score(0.0),
        "use_potion",
        "Critical health, drinking a potion",
    )
    .with_effect(Effect::UsePotion)
}

fn retreat_to(ctx: &DecisionContext, shelter: Option<&StructureView>) -> Option<Candidate> {
    if let Some(safe) = shelter {
        return Some(Candidate::new(
            AgentState::ReturningToSafety,
            Some(Target::Entity(safe.id)),
            Priority::Survival,
            survival_score(safe.distance),
            "retreat",
            "Critical health, retreating to safety",
        ));
    }
    let threat = ctx.nearest_threat()?;
    Some(Candidate::new(
        AgentState::ReturningToSafety,
        Some(Target::Position(ctx.position.away_from(threat.position, 6.0))),
        Priority::Survival,
        survival_score(0.0),
        "retreat",
        "Critical health, fleeing",
    ))
}

fn engage(agent: &Agent, threat: &ThreatView) -> Candidate {
    Candidate::new(
        AgentState::EngagingEnemy,
        Some(Target::Entity(threat.id)),
        Priority::Combat,
        combat_score(agent, threat),
        "fight",
        "Engaging nearby enemy",
    )
}

fn go_shopping(shop: &StructureView) -> Candidate {
    Candidate::new(
        AgentState::Shopping,
        Some(Target::Entity(shop.id)),
        Priority::Idle,
        SHOPPING_SCORE,
        "buy_item",
        "Heading to market for a potion",
    )
}

/// Parse `"#<id>"` out of free text.
fn parse_entity_ref(text: &str) -> Option<EntityId> {
    let start = text.find('#')?;
    let digits: String = text[start + 1..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().map(EntityId)
}

fn pick_structure<'c>(options: &'c [StructureView], hint: &str) -> Option<&'c StructureView> {
    let hint = hint.trim().to_ascii_lowercase();
    if let Some(id) = parse_entity_ref(&hint) {
        if let Some(found) = options.iter().find(|view| view.id == id) {
            return Some(found);
        }
    }
    if !hint.is_empty() {
        if let Some(found) = options
            .iter()
            .find(|view| hint.contains(view.kind.as_ref()) || hint.contains(&view.kind.as_ref().replace('_', " ")))
        {
            return Some(found);
        }
    }
    options.first()
}

fn pick_threat<'c>(ctx: &'c DecisionContext, hint: &str) -> Option<&'c ThreatView> {
    let hint = hint.trim().to_ascii_lowercase();
    if let Some(threat) = parse_entity_ref(&hint).and_then(|id| ctx.threat(id)) {
        return Some(threat);
    }
    if !hint.is_empty() {
        if let Some(threat) = ctx
            .threats
            .iter()
            .find(|threat| hint.contains(threat.class.as_ref()))
        {
            return Some(threat);
        }
    }
    ctx.nearest_threat()
}
