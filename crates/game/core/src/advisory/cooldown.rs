use std::collections::BTreeMap;

use strum::{AsRefStr, EnumIter};

use crate::SimTime;

/// Situations important enough to consult the advisory provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConsultReason {
    /// Health under the low threshold while fighting.
    LowHealthInCombat,
    /// Enough gold to shop and a marketplace close by.
    ShoppingOpportunity,
    /// Hero standing around with nothing to do.
    IdleWithoutGoal,
}

/// Per-agent record of when each kind of consult last happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsultLedger {
    last: BTreeMap<ConsultReason, SimTime>,
}

impl ConsultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a consult for `reason` would be allowed at `now`.
    pub fn is_ready(&self, reason: ConsultReason, now: SimTime, cooldown_ms: u64) -> bool {
        match self.last.get(&reason) {
            Some(at) => now.since(*at) >= cooldown_ms,
            None => true,
        }
    }

    /// Claim the consult slot for `reason`, returning `false` while cooling down.
    pub fn try_acquire(&mut self, reason: ConsultReason, now: SimTime, cooldown_ms: u64) -> bool {
        if !self.is_ready(reason, now, cooldown_ms) {
            return false;
        }
        self.last.insert(reason, now);
        true
    }

    pub fn last_consult(&self, reason: ConsultReason) -> Option<SimTime> {
        self.last.get(&reason).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_blocks_repeat_consults() {
        let mut ledger = ConsultLedger::new();
        assert!(ledger.try_acquire(ConsultReason::LowHealthInCombat, SimTime(0), 2_000));
        assert!(!ledger.try_acquire(ConsultReason::LowHealthInCombat, SimTime(1_999), 2_000));
        assert!(ledger.try_acquire(ConsultReason::LowHealthInCombat, SimTime(2_000), 2_000));
    }

    #[test]
    fn test_reasons_cool_down_independently() {
        let mut ledger = ConsultLedger::new();
        assert!(ledger.try_acquire(ConsultReason::LowHealthInCombat, SimTime(0), 2_000));
        assert!(ledger.try_acquire(ConsultReason::ShoppingOpportunity, SimTime(10), 2_000));
        assert_eq!(
            ledger.last_consult(ConsultReason::ShoppingOpportunity),
            Some(SimTime(10))
        );
    }
}
