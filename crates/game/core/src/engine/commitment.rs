//! Commitment windows and hysteresis against target oscillation.
//!
//! Every target change stamps a [`Commitment`]. While its window is open only
//! a strictly higher-priority candidate may take over. After the window, an
//! equal-priority candidate must beat the current target's standing by the
//! configured hysteresis margin.
use strum::{AsRefStr, Display};

use crate::{DecisionConfig, SimTime, Target};

/// Transition priority, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    /// Exploration, wandering and shopping.
    #[default]
    Idle,
    /// Pursuing a bounty.
    Bounty,
    /// Fighting a visible enemy.
    Combat,
    /// Self-preservation at critical health.
    Survival,
}

/// Stamp left by the last target change.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Commitment {
    pub since: SimTime,
    pub priority: Priority,
    pub score: f32,
}

impl Commitment {
    pub fn start(now: SimTime, priority: Priority, score: f32) -> Self {
        Self {
            since: now,
            priority,
            score,
        }
    }

    /// Whether the minimum commitment window is still running.
    pub fn in_window(&self, now: SimTime, window_ms: u64) -> bool {
        now.since(self.since) < window_ms
    }
}

/// Why a candidate was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum HoldReason {
    /// Minimum window has not elapsed.
    CommitmentWindow,
    /// Candidate did not clear the hysteresis margin.
    BelowHysteresis,
    /// Current activity outranks the candidate.
    Outranked,
    /// Candidate would attack from inside a building.
    Sheltered,
}

impl HoldReason {
    pub fn describe(self) -> &'static str {
        match self {
            HoldReason::CommitmentWindow => "Holding target: commitment window open",
            HoldReason::BelowHysteresis => "Holding target: alternative not clearly better",
            HoldReason::Outranked => "Holding target: current task takes priority",
            HoldReason::Sheltered => "Holding position: no fighting from inside a building",
        }
    }
}

/// Outcome of weighing a candidate against the current commitment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Adopt the candidate target and restart the commitment.
    Switch,
    /// Candidate keeps the current target; the commitment is untouched.
    Retain,
    /// Keep the current target and state.
    Hold(HoldReason),
}

/// The candidate side of an arbitration.
#[derive(Clone, Copy, Debug)]
pub struct Challenger<'a> {
    pub target: Option<&'a Target>,
    pub priority: Priority,
    pub score: f32,
}

/// Decide whether `challenger` may replace the current target.
///
/// # Arguments
///
/// * `current` - The agent's current target
/// * `standing` - Score of the current target if it is still viable, `None`
///   when it no longer makes sense to pursue
/// * `commitment` - Stamp from the last target change
/// * `challenger` - Proposed target, priority and score
pub fn arbitrate(
    current: Option<&Target>,
    standing: Option<f32>,
    commitment: &Commitment,
    challenger: Challenger<'_>,
    now: SimTime,
    config: &DecisionConfig,
) -> Verdict {
    if challenger.target == current {
        return Verdict::Retain;
    }
    let Some(standing) = standing.filter(|_| current.is_some()) else {
        return Verdict::Switch;
    };
    if challenger.priority > commitment.priority {
        return Verdict::Switch;
    }
    if challenger.priority < commitment.priority {
        return Verdict::Hold(HoldReason::Outranked);
    }
    if commitment.in_window(now, config.commitment_window_ms) {
        return Verdict::Hold(HoldReason::CommitmentWindow);
    }
    if challenger.score > standing + config.hysteresis_margin {
        Verdict::Switch
    } else {
        Verdict::Hold(HoldReason::BelowHysteresis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BountyId;

    const CURRENT: Target = Target::Bounty(BountyId(1));
    const OTHER: Target = Target::Bounty(BountyId(2));

    fn bounty_commitment() -> Commitment {
        Commitment::start(SimTime(1_000), Priority::Bounty, 50.0)
    }

    fn challenger(target: &Target, priority: Priority, score: f32) -> Challenger<'_> {
        Challenger {
            target: Some(target),
            priority,
            score,
        }
    }

    #[test]
    fn test_same_target_is_retained() {
        let verdict = arbitrate(
            Some(&CURRENT),
            Some(50.0),
            &bounty_commitment(),
            challenger(&CURRENT, Priority::Bounty, 999.0),
            SimTime(1_100),
            &DecisionConfig::default(),
        );
        assert_eq!(verdict, Verdict::Retain);
    }

    #[test]
    fn test_better_bounty_waits_for_window() {
        let config = DecisionConfig::default();
        let verdict = arbitrate(
            Some(&CURRENT),
            Some(50.0),
            &bounty_commitment(),
            challenger(&OTHER, Priority::Bounty, 500.0),
            SimTime(2_499),
            &config,
        );
        assert_eq!(verdict, Verdict::Hold(HoldReason::CommitmentWindow));

        let after = arbitrate(
            Some(&CURRENT),
            Some(50.0),
            &bounty_commitment(),
            challenger(&OTHER, Priority::Bounty, 500.0),
            SimTime(2_500),
            &config,
        );
        assert_eq!(after, Verdict::Switch);
    }

    #[test]
    fn test_hysteresis_margin_after_window() {
        let config = DecisionConfig::default();
        let close = arbitrate(
            Some(&CURRENT),
            Some(50.0),
            &bounty_commitment(),
            challenger(&OTHER, Priority::Bounty, 60.0),
            SimTime(5_000),
            &config,
        );
        assert_eq!(close, Verdict::Hold(HoldReason::BelowHysteresis));
    }

    #[test]
    fn test_survival_interrupts_inside_window() {
        let flee = Target::Position(crate::Position::new(0.0, 0.0));
        let verdict = arbitrate(
            Some(&CURRENT),
            Some(50.0),
            &bounty_commitment(),
            challenger(&flee, Priority::Survival, 0.0),
            SimTime(1_001),
            &DecisionConfig::default(),
        );
        assert_eq!(verdict, Verdict::Switch);
    }

    #[test]
    fn test_lower_priority_is_outranked() {
        let commitment = Commitment::start(SimTime(0), Priority::Survival, 900.0);
        let verdict = arbitrate(
            Some(&CURRENT),
            Some(900.0),
            &commitment,
            challenger(&OTHER, Priority::Combat, 100.0),
            SimTime(60_000),
            &DecisionConfig::default(),
        );
        assert_eq!(verdict, Verdict::Hold(HoldReason::Outranked));
    }

    #[test]
    fn test_non_viable_current_target_switches() {
        let verdict = arbitrate(
            Some(&CURRENT),
            None,
            &bounty_commitment(),
            challenger(&OTHER, Priority::Idle, 0.0),
            SimTime(1_001),
            &DecisionConfig::default(),
        );
        assert_eq!(verdict, Verdict::Switch);
    }
}
