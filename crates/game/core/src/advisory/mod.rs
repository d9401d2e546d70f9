//! Advisory decision vocabulary shared by the runtime brain and the
//! deterministic fallback.
//!
//! The decision tier never talks to a provider itself. It defines what a valid
//! advisory decision looks like ([`AdvisoryDecision`]), when a consult is worth
//! making ([`ConsultReason`], [`ConsultLedger`]) and what to do when the
//! provider cannot be trusted ([`fallback_decision`]).
mod cooldown;
mod fallback;

pub use cooldown::{ConsultLedger, ConsultReason};
pub use fallback::{POTION_ITEM, fallback_decision};

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::state::DecisionSource;

/// Whitelisted actions an advisory provider may choose from.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AdvisoryAction {
    Fight,
    Retreat,
    BuyItem,
    UsePotion,
    Explore,
}

impl AdvisoryAction {
    pub const ALL: [AdvisoryAction; 5] = [
        AdvisoryAction::Fight,
        AdvisoryAction::Retreat,
        AdvisoryAction::BuyItem,
        AdvisoryAction::UsePotion,
        AdvisoryAction::Explore,
    ];

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// A validated `{action, target, reason}` triple.
///
/// `target` and `reason` are free text already coerced to strings; an absent
/// or non-string value becomes the empty string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvisoryDecision {
    pub action: AdvisoryAction,
    pub target: String,
    pub reason: String,
    pub source: DecisionSource,
}

impl AdvisoryDecision {
    pub fn advisory(action: AdvisoryAction, target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
            reason: reason.into(),
            source: DecisionSource::Advisory,
        }
    }

    pub fn fallback(action: AdvisoryAction, target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
            reason: reason.into(),
            source: DecisionSource::Fallback,
        }
    }
}
