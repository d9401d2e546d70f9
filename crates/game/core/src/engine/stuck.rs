//! Stuck detection and the deterministic recovery ladder.
//!
//! An agent is stuck when it intends to move yet its net displacement stays
//! under a threshold for the detection window. Recovery escalates one rung
//! per attempt, with attempts spaced by a backoff:
//!
//! 1. request a fresh path
//! 2. sidestep to a seeded-random adjacent passable tile
//! 3. give up on the target and go idle
//!
//! The attempt counter is per goal. It resets when the goal changes or the
//! agent makes real progress.
use crate::pathing::PathingService;
use crate::{DecisionConfig, PcgStream, Position, SimTime, Target, Tile};

/// Per-agent stuck bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct StuckCounters {
    /// Position the displacement window is measured from.
    pub anchor: Position,
    pub anchor_at: SimTime,
    /// Position recovery progress is measured from.
    pub progress_origin: Position,
    pub goal: Option<Target>,
    pub attempts: u32,
    pub last_attempt_at: Option<SimTime>,
}

impl StuckCounters {
    pub fn new(position: Position, now: SimTime) -> Self {
        Self {
            anchor: position,
            anchor_at: now,
            progress_origin: position,
            goal: None,
            attempts: 0,
            last_attempt_at: None,
        }
    }

    /// Forget everything and start measuring from `position`.
    pub fn reset(&mut self, position: Position, now: SimTime, goal: Option<Target>) {
        *self = Self::new(position, now);
        self.goal = goal;
    }
}

/// Result of observing an agent for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StuckStatus {
    /// No movement intended; nothing to measure.
    Resting,
    /// Displacement since the anchor is healthy.
    Moving,
    /// Inside the window, or waiting out the backoff.
    Watching,
    /// Stuck and due for a recovery attempt.
    Stuck,
}

/// One rung of the recovery ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryStep {
    Repath,
    Sidestep(Tile),
    ResetToIdle,
}

impl RecoveryStep {
    pub fn label(&self) -> &'static str {
        match self {
            RecoveryStep::Repath => "repath",
            RecoveryStep::Sidestep(_) => "sidestep",
            RecoveryStep::ResetToIdle => "reset_to_idle",
        }
    }
}

/// Update counters with this tick's position.
///
/// # Arguments
///
/// * `intends_to_move` - Agent has a destination it has not reached
/// * `goal` - Target the movement serves; a change resets the counters
pub fn observe(
    counters: &mut StuckCounters,
    position: Position,
    intends_to_move: bool,
    goal: Option<Target>,
    now: SimTime,
    config: &DecisionConfig,
) -> StuckStatus {
    if counters.goal != goal {
        counters.reset(position, now, goal);
    }
    if !intends_to_move {
        counters.anchor = position;
        counters.anchor_at = now;
        return StuckStatus::Resting;
    }

    if position.distance(counters.progress_origin) >= config.stuck_progress_reset_tiles {
        counters.progress_origin = position;
        counters.attempts = 0;
        counters.last_attempt_at = None;
    }

    if position.distance(counters.anchor) > config.stuck_displacement_tiles {
        counters.anchor = position;
        counters.anchor_at = now;
        return StuckStatus::Moving;
    }

    if now.since(counters.anchor_at) < config.stuck_window_ms {
        return StuckStatus::Watching;
    }
    match counters.last_attempt_at {
        Some(last) if now.since(last) < config.unstuck_backoff_ms => StuckStatus::Watching,
        _ => StuckStatus::Stuck,
    }
}

/// Take the next rung of the ladder.
///
/// The sidestep tile is drawn from `stream`, which callers look up under the
/// agent's `"agent:<id>:stuck"` tag. With no passable neighbor the ladder
/// skips straight to [`RecoveryStep::ResetToIdle`].
pub fn recover(
    counters: &mut StuckCounters,
    position: Position,
    pathing: &dyn PathingService,
    stream: &mut PcgStream,
    now: SimTime,
    config: &DecisionConfig,
) -> RecoveryStep {
    counters.attempts += 1;
    counters.last_attempt_at = Some(now);

    if counters.attempts >= config.unstuck_max_attempts {
        return RecoveryStep::ResetToIdle;
    }
    if counters.attempts == 1 {
        return RecoveryStep::Repath;
    }

    let here = position.tile();
    let open: Vec<Tile> = here
        .neighbors8()
        .into_iter()
        .filter(|tile| pathing.is_passable(*tile))
        .collect();
    match stream.choose(&open) {
        Some(tile) => RecoveryStep::Sidestep(*tile),
        None => RecoveryStep::ResetToIdle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathing::PathingFailure;

    struct OpenField;

    impl PathingService for OpenField {
        fn find_path(&self, _from: Tile, to: Tile) -> Result<Vec<Tile>, PathingFailure> {
            Ok(vec![to])
        }

        fn is_passable(&self, _tile: Tile) -> bool {
            true
        }
    }

    struct Walled;

    impl PathingService for Walled {
        fn find_path(&self, from: Tile, to: Tile) -> Result<Vec<Tile>, PathingFailure> {
            Err(PathingFailure::Unreachable { from, to })
        }

        fn is_passable(&self, _tile: Tile) -> bool {
            false
        }
    }

    const GOAL: Option<Target> = Some(Target::Position(Position { x: 9.0, y: 9.0 }));

    #[test]
    fn test_trips_after_window_without_displacement() {
        let config = DecisionConfig::default();
        let here = Position::new(1.5, 1.5);
        let mut counters = StuckCounters::new(here, SimTime(0));

        assert_eq!(
            observe(&mut counters, here, true, GOAL, SimTime(0), &config),
            StuckStatus::Watching
        );
        assert_eq!(
            observe(&mut counters, here, true, GOAL, SimTime(1_999), &config),
            StuckStatus::Watching
        );
        assert_eq!(
            observe(&mut counters, here, true, GOAL, SimTime(2_000), &config),
            StuckStatus::Stuck
        );
    }

    #[test]
    fn test_movement_keeps_detector_quiet() {
        let config = DecisionConfig::default();
        let mut counters = StuckCounters::new(Position::ORIGIN, SimTime(0));
        observe(&mut counters, Position::ORIGIN, true, GOAL, SimTime(0), &config);
        for step in 1..40u64 {
            let position = Position::new(step as f32 * 0.3, 0.0);
            let status = observe(&mut counters, position, true, GOAL, SimTime(step * 100), &config);
            assert_eq!(status, StuckStatus::Moving);
        }
    }

    #[test]
    fn test_ladder_escalates_in_order() {
        let config = DecisionConfig::default();
        let here = Position::new(4.5, 4.5);
        let mut counters = StuckCounters::new(here, SimTime(0));
        let mut stream = PcgStream::for_tag(3, "agent:1:stuck");

        let first = recover(&mut counters, here, &OpenField, &mut stream, SimTime(2_000), &config);
        assert_eq!(first, RecoveryStep::Repath);

        let second = recover(&mut counters, here, &OpenField, &mut stream, SimTime(2_500), &config);
        match second {
            RecoveryStep::Sidestep(tile) => assert_eq!(tile.chebyshev(here.tile()), 1),
            other => panic!("expected sidestep, got {other:?}"),
        }

        let third = recover(&mut counters, here, &OpenField, &mut stream, SimTime(3_000), &config);
        assert_eq!(third, RecoveryStep::ResetToIdle);
    }

    #[test]
    fn test_sidestep_without_open_neighbor_resets() {
        let config = DecisionConfig::default();
        let mut counters = StuckCounters::new(Position::ORIGIN, SimTime(0));
        counters.attempts = 1;
        let mut stream = PcgStream::from_seed(3);
        let step = recover(&mut counters, Position::ORIGIN, &Walled, &mut stream, SimTime(0), &config);
        assert_eq!(step, RecoveryStep::ResetToIdle);
    }

    #[test]
    fn test_backoff_spaces_attempts() {
        let config = DecisionConfig::default();
        let here = Position::new(1.5, 1.5);
        let mut counters = StuckCounters::new(here, SimTime(0));
        observe(&mut counters, here, true, GOAL, SimTime(0), &config);
        assert_eq!(
            observe(&mut counters, here, true, GOAL, SimTime(2_000), &config),
            StuckStatus::Stuck
        );
        counters.attempts = 1;
        counters.last_attempt_at = Some(SimTime(2_000));
        assert_eq!(
            observe(&mut counters, here, true, GOAL, SimTime(2_400), &config),
            StuckStatus::Watching
        );
        assert_eq!(
            observe(&mut counters, here, true, GOAL, SimTime(2_500), &config),
            StuckStatus::Stuck
        );
    }

    #[test]
    fn test_goal_change_and_progress_reset_attempts() {
        let config = DecisionConfig::default();
        let mut counters = StuckCounters::new(Position::ORIGIN, SimTime(0));
        observe(&mut counters, Position::ORIGIN, true, GOAL, SimTime(0), &config);
        counters.attempts = 2;

        observe(&mut counters, Position::new(2.0, 0.0), true, GOAL, SimTime(100), &config);
        assert_eq!(counters.attempts, 0);

        counters.attempts = 2;
        let other = Some(Target::Position(Position::new(0.0, 9.0)));
        observe(&mut counters, Position::new(2.0, 0.0), true, other, SimTime(200), &config);
        assert_eq!(counters.attempts, 0);
    }
}
