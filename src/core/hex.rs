//! Hex-grid geometry
//!
//! Axial coordinates with pointy-side-up columns: facing 0 is north and
//! directions advance clockwise (0 N, 1 NE, 2 SE, 3 S, 4 SW, 5 NW).

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the six hex-side directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Facing(u8);

impl Facing {
    pub const NORTH: Facing = Facing(0);
    pub const NORTH_EAST: Facing = Facing(1);
    pub const SOUTH_EAST: Facing = Facing(2);
    pub const SOUTH: Facing = Facing(3);
    pub const SOUTH_WEST: Facing = Facing(4);
    pub const NORTH_WEST: Facing = Facing(5);

    /// Build a facing from any integer, wrapping modulo 6
    pub fn new(dir: i32) -> Self {
        Facing(dir.rem_euclid(6) as u8)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Rotate by `steps` hex sides (positive is clockwise)
    pub fn rotated(&self, steps: i32) -> Self {
        Facing::new(self.0 as i32 + steps)
    }

    pub fn turned_left(&self) -> Self {
        self.rotated(-1)
    }

    pub fn turned_right(&self) -> Self {
        self.rotated(1)
    }

    pub fn opposite(&self) -> Self {
        self.rotated(3)
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axial hex coordinate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

const DIRECTION_OFFSETS: [(i32, i32); 6] = [(0, -1), (1, -1), (1, 0), (0, 1), (-1, 1), (-1, 0)];

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord { q: 0, r: 0 };

    pub fn new(q: i32, r: i32) -> Self {
        HexCoord { q, r }
    }

    /// The adjacent hex in the given direction
    pub fn translated(&self, dir: Facing) -> Self {
        let (dq, dr) = DIRECTION_OFFSETS[dir.as_u8() as usize];
        HexCoord {
            q: self.q + dq,
            r: self.r + dr,
        }
    }

    pub fn neighbours(&self) -> [HexCoord; 6] {
        [0, 1, 2, 3, 4, 5].map(|d| self.translated(Facing::new(d)))
    }

    /// Number of hex steps between two coordinates
    pub fn distance(&self, other: HexCoord) -> u32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        ((dq.abs() + (dq + dr).abs() + dr.abs()) / 2) as u32
    }

    /// Distance from the origin
    pub fn norm(&self) -> u32 {
        self.distance(HexCoord::ORIGIN)
    }

    /// Direction of an adjacent hex, if `other` is adjacent
    pub fn direction_to(&self, other: HexCoord) -> Option<Facing> {
        (0..6)
            .map(Facing::new)
            .find(|dir| self.translated(*dir) == other)
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.q, self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_wraps() {
        assert_eq!(Facing::NORTH.turned_left(), Facing::NORTH_WEST);
        assert_eq!(Facing::NORTH_WEST.turned_right(), Facing::NORTH);
        assert_eq!(Facing::new(-7), Facing::NORTH_WEST);
        assert_eq!(Facing::NORTH_EAST.opposite(), Facing::SOUTH_WEST);
    }

    #[test]
    fn test_translation_is_reversible() {
        let start = HexCoord::new(2, -3);
        for d in 0..6 {
            let dir = Facing::new(d);
            assert_eq!(start.translated(dir).translated(dir.opposite()), start);
            assert_eq!(start.direction_to(start.translated(dir)), Some(dir));
        }
    }

    #[test]
    fn test_neighbours_are_adjacent() {
        let hex = HexCoord::new(1, 1);
        for n in hex.neighbours() {
            assert_eq!(hex.distance(n), 1);
        }
    }

    #[test]
    fn test_distance() {
        assert_eq!(HexCoord::ORIGIN.distance(HexCoord::new(0, -2)), 2);
        assert_eq!(HexCoord::ORIGIN.distance(HexCoord::new(1, -2)), 2);
        assert_eq!(HexCoord::new(-2, 2).norm(), 2);
        assert_eq!(HexCoord::new(3, 0).distance(HexCoord::new(0, 3)), 3);
    }
}
