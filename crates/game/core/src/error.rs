//! Common error infrastructure for kingdom-core.
//!
//! Domain-specific errors (`ConfigError`, `BountyError`, `PathingFailure`) are
//! defined next to the code that raises them. [`DecisionError`] gathers them
//! for callers that drive a whole agent step and need one type to isolate.
//!
//! # Design Principles
//!
//! - **Isolation**: A per-agent error never escapes that agent's step
//! - **Severity Classification**: Errors are categorized for recovery strategies
//! - **No panics**: Every failure in the decision path is a value

use thiserror::Error;

use crate::bounty::BountyError;
use crate::config::ConfigError;
use crate::pathing::PathingFailure;
use crate::{EntityId, Target};

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: Resolves itself after a clear-and-retry (stale target, blocked path)
/// - **Validation**: Invalid input that should be rejected without retry
/// - **Internal**: Unexpected state inconsistencies that require investigation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Failures raised while deciding for a single agent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecisionError {
    #[error("agent {0} does not exist")]
    UnknownAgent(EntityId),

    #[error("agent {agent} referenced stale {target}")]
    StaleReference { agent: EntityId, target: Target },

    #[error(transparent)]
    Pathing(#[from] PathingFailure),

    #[error(transparent)]
    Bounty(#[from] BountyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DecisionError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DecisionError::StaleReference { .. } | DecisionError::Pathing(_) => {
                ErrorSeverity::Recoverable
            }
            DecisionError::Bounty(_) | DecisionError::Config(_) => ErrorSeverity::Validation,
            DecisionError::UnknownAgent(_) => ErrorSeverity::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BountyId, Tile};

    #[test]
    fn test_severity_mapping() {
        let stale = DecisionError::StaleReference {
            agent: EntityId(1),
            target: Target::Bounty(BountyId(2)),
        };
        assert!(stale.severity().is_recoverable());

        let pathing: DecisionError = PathingFailure::OutOfBounds(Tile::new(-1, 0)).into();
        assert_eq!(pathing.severity(), ErrorSeverity::Recoverable);

        assert_eq!(
            DecisionError::UnknownAgent(EntityId(9)).severity().as_str(),
            "internal"
        );
    }
}
