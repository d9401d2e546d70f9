//! Bounded last-decision records and the observability views built on them.
//!
//! Records are written after a decision is applied and read only by
//! observers. Nothing in the decision path reads them back.
use arrayvec::ArrayString;
use strum::{AsRefStr, Display, IntoStaticStr};

use super::agent::{Agent, IntentLabel};
use super::types::EntityId;
use crate::SimTime;

/// Maximum bytes kept for a decision's action label.
pub const ACTION_CAPACITY: usize = 24;

/// Maximum bytes kept for a decision's reason text.
pub const REASON_CAPACITY: usize = 96;

/// Where a decision came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DecisionSource {
    /// Validated response from the advisory provider.
    Advisory,
    /// Deterministic rules standing in for the provider.
    Fallback,
    /// The state machine's own transition rules.
    Heuristic,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Fully populated record of one applied decision.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecisionRecord {
    pub action: ArrayString<ACTION_CAPACITY>,
    pub reason: ArrayString<REASON_CAPACITY>,
    pub at: SimTime,
    pub source: DecisionSource,
}

impl DecisionRecord {
    /// Build a record, truncating text on a character boundary.
    pub fn new(action: &str, reason: &str, at: SimTime, source: DecisionSource) -> Self {
        Self {
            action: truncated(action),
            reason: truncated(reason),
            at,
            source,
        }
    }

    /// Age of the record at `now`.
    pub fn age_ms(&self, now: SimTime) -> u64 {
        now.since(self.at)
    }
}

fn truncated<const CAP: usize>(text: &str) -> ArrayString<CAP> {
    let mut out = ArrayString::<CAP>::new();
    for ch in text.chars() {
        if out.try_push(ch).is_err() {
            break;
        }
    }
    out
}

/// Observer-facing `{action, reason, age}` triple.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LastDecisionView {
    pub action: String,
    pub reason: String,
    pub age_ms: u64,
    pub source: Option<DecisionSource>,
}

impl LastDecisionView {
    /// Placeholder shown before an agent has decided anything.
    pub fn placeholder() -> Self {
        Self {
            action: "none".to_owned(),
            reason: "no decision yet".to_owned(),
            age_ms: 0,
            source: None,
        }
    }

    pub fn from_record(record: Option<&DecisionRecord>, now: SimTime) -> Self {
        match record {
            Some(record) => Self {
                action: record.action.to_string(),
                reason: record.reason.to_string(),
                age_ms: record.age_ms(now),
                source: Some(record.source),
            },
            None => Self::placeholder(),
        }
    }
}

/// Per-agent intent snapshot for UI and debugging.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntentSnapshot {
    pub agent: EntityId,
    pub intent: IntentLabel,
    pub last_decision: LastDecisionView,
}

/// Writes and reads decision records on agents.
pub struct DecisionRecorder;

impl DecisionRecorder {
    /// Store `record` as the agent's last decision.
    pub fn record(agent: &mut Agent, record: DecisionRecord) {
        agent.last_decision = Some(record);
    }

    pub fn snapshot(agent: &Agent, now: SimTime) -> IntentSnapshot {
        IntentSnapshot {
            agent: agent.id,
            intent: agent.intent,
            last_decision: LastDecisionView::from_record(agent.last_decision.as_ref(), now),
        }
    }
}
