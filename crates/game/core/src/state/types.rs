//! Identifier and spatial primitives shared by every decision-tier module.
use core::fmt;

/// Unique identifier for anything that lives in the world: heroes, enemies,
/// buildings and lairs share one id space.
///
/// Ids are allocated monotonically by [`World`](crate::World) and never reused,
/// so an id that fails to resolve always means its referent is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(pub u32);

impl EntityId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a bounty posted on the [`BountyBoard`](crate::BountyBoard).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BountyId(pub u32);

impl fmt::Display for BountyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bounty#{}", self.0)
    }
}

/// Continuous world position measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in tiles.
    pub fn distance(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Tile containing this position.
    pub fn tile(self) -> Tile {
        Tile::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Moves toward `goal` by at most `step` tiles, stopping on it.
    pub fn step_toward(self, goal: Position, step: f32) -> Position {
        let distance = self.distance(goal);
        if distance <= step || distance <= f32::EPSILON {
            return goal;
        }
        let ratio = step / distance;
        Position::new(
            self.x + (goal.x - self.x) * ratio,
            self.y + (goal.y - self.y) * ratio,
        )
    }

    /// Point `distance` tiles from `self`, directly away from `threat`.
    pub fn away_from(self, threat: Position, distance: f32) -> Position {
        let dx = self.x - threat.x;
        let dy = self.y - threat.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            return Position::new(self.x + distance, self.y);
        }
        Position::new(self.x + dx / len * distance, self.y + dy / len * distance)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Discrete grid cell used by pathing and stuck recovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    /// Neighbor offsets in a fixed clockwise order starting north.
    ///
    /// Recovery and pathing iterate neighbors in this order so seeded picks
    /// stay reproducible.
    pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
    ];

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Center of the tile in continuous coordinates.
    pub fn center(self) -> Position {
        Position::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Tile {
        Tile::new(self.x + dx, self.y + dy)
    }

    /// All eight neighbors in [`Self::NEIGHBOR_OFFSETS`] order.
    pub fn neighbors8(self) -> [Tile; 8] {
        Self::NEIGHBOR_OFFSETS.map(|(dx, dy)| self.offset(dx, dy))
    }

    /// Chebyshev distance (king moves).
    pub fn chebyshev(self, other: Tile) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}
