//! Grid map served through [`kingdom_core::PathingService`].
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use kingdom_core::{PathingFailure, PathingService, Tile};

/// Static walkability grid.
///
/// Holds the immutable map layout; agents and structures never block tiles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridMap {
    width: i32,
    height: i32,
    walls: BTreeSet<Tile>,
}

impl GridMap {
    /// Open map of the given size.
    pub fn open(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
            walls: BTreeSet::new(),
        }
    }

    pub fn with_walls(mut self, walls: impl IntoIterator<Item = Tile>) -> Self {
        self.walls.extend(walls);
        self
    }

    pub fn add_wall(&mut self, tile: Tile) {
        self.walls.insert(tile);
    }

    /// Wall in the ring of eight tiles around `center`.
    pub fn seal_around(&mut self, center: Tile) {
        self.walls.extend(center.neighbors8());
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, tile: Tile) -> bool {
        (0..self.width).contains(&tile.x) && (0..self.height).contains(&tile.y)
    }

    pub fn is_wall(&self, tile: Tile) -> bool {
        self.walls.contains(&tile)
    }
}

/// Breadth-first pathing over a [`GridMap`].
///
/// Neighbors are expanded in [`Tile::NEIGHBOR_OFFSETS`] order, so equal-length
/// routes always resolve the same way. Diagonal steps may not cut a wall
/// corner.
#[derive(Clone, Debug)]
pub struct GridPathing {
    map: GridMap,
}

impl GridPathing {
    pub fn new(map: GridMap) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    fn can_step(&self, from: Tile, to: Tile) -> bool {
        if !self.is_passable(to) {
            return false;
        }
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if dx != 0 && dy != 0 {
            return self.is_passable(from.offset(dx, 0)) && self.is_passable(from.offset(0, dy));
        }
        true
    }
}

impl PathingService for GridPathing {
    fn find_path(&self, from: Tile, to: Tile) -> Result<Vec<Tile>, PathingFailure> {
        if !self.map.contains(to) {
            return Err(PathingFailure::OutOfBounds(to));
        }
        if !self.map.contains(from) {
            return Err(PathingFailure::OutOfBounds(from));
        }
        if self.map.is_wall(to) {
            return Err(PathingFailure::BlockedDestination(to));
        }
        if from == to {
            return Ok(Vec::new());
        }

        let mut came_from: BTreeMap<Tile, Tile> = BTreeMap::new();
        let mut frontier = VecDeque::from([from]);
        came_from.insert(from, from);

        while let Some(current) = frontier.pop_front() {
            if current == to {
                let mut path = vec![to];
                let mut step = to;
                while let Some(&previous) = came_from.get(&step) {
                    if previous == from {
                        break;
                    }
                    path.push(previous);
                    step = previous;
                }
                path.reverse();
                return Ok(path);
            }
            for next in current.neighbors8() {
                if came_from.contains_key(&next) || !self.can_step(current, next) {
                    continue;
                }
                came_from.insert(next, current);
                frontier.push_back(next);
            }
        }
        Err(PathingFailure::Unreachable { from, to })
    }

    fn is_passable(&self, tile: Tile) -> bool {
        self.map.contains(tile) && !self.map.is_wall(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line() {
        let pathing = GridPathing::new(GridMap::open(10, 10));
        let path = pathing.find_path(Tile::new(1, 1), Tile::new(4, 1)).unwrap();
        assert_eq!(path, vec![Tile::new(2, 1), Tile::new(3, 1), Tile::new(4, 1)]);
        assert!(pathing.find_path(Tile::new(2, 2), Tile::new(2, 2)).unwrap().is_empty());
    }

    #[test]
    fn test_routes_around_walls_without_cutting_corners() {
        let map = GridMap::open(10, 10).with_walls((0..4).map(|y| Tile::new(3, y)));
        let pathing = GridPathing::new(map);
        let path = pathing.find_path(Tile::new(1, 1), Tile::new(5, 1)).unwrap();
        assert_eq!(path.last(), Some(&Tile::new(5, 1)));
        assert!(path.iter().all(|tile| pathing.is_passable(*tile)));
        assert!(path.contains(&Tile::new(3, 4)));
    }

    #[test]
    fn test_sealed_destination_is_unreachable() {
        let mut map = GridMap::open(10, 10);
        map.seal_around(Tile::new(7, 7));
        let pathing = GridPathing::new(map);
        assert_eq!(
            pathing.find_path(Tile::new(1, 1), Tile::new(7, 7)),
            Err(PathingFailure::Unreachable {
                from: Tile::new(1, 1),
                to: Tile::new(7, 7)
            })
        );
        assert_eq!(
            pathing.find_path(Tile::new(1, 1), Tile::new(6, 6)),
            Err(PathingFailure::BlockedDestination(Tile::new(6, 6)))
        );
        assert_eq!(
            pathing.find_path(Tile::new(1, 1), Tile::new(12, 1)),
            Err(PathingFailure::OutOfBounds(Tile::new(12, 1)))
        );
    }

    #[test]
    fn test_same_request_same_path() {
        let map = GridMap::open(12, 12).with_walls([Tile::new(5, 5), Tile::new(5, 6)]);
        let pathing = GridPathing::new(map);
        let a = pathing.find_path(Tile::new(0, 0), Tile::new(11, 11)).unwrap();
        let b = pathing.find_path(Tile::new(0, 0), Tile::new(11, 11)).unwrap();
        assert_eq!(a, b);
    }
}
