//! Pathing seam. The decision tier consumes paths; it does not compute them.
use thiserror::Error;

use crate::Tile;

/// Why a path request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathingFailure {
    #[error("no path from {from} to {to}")]
    Unreachable { from: Tile, to: Tile },

    #[error("tile {0} is outside the map")]
    OutOfBounds(Tile),

    #[error("destination {0} is not passable")]
    BlockedDestination(Tile),
}

/// Stateless path oracle.
///
/// Implementations must be deterministic: the same map and request always
/// produce the same path.
pub trait PathingService: Send + Sync {
    /// Find a path from `from` to `to`.
    ///
    /// # Returns
    ///
    /// Tiles to walk in order, excluding `from` and ending at `to`. An empty
    /// path means the agent is already there.
    fn find_path(&self, from: Tile, to: Tile) -> Result<Vec<Tile>, PathingFailure>;

    /// Whether an agent may stand on `tile`.
    fn is_passable(&self, tile: Tile) -> bool;
}
