//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for civilizations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CivId(pub u32);

/// Unique identifier for units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Unique identifier for cities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CityId(pub u32);

/// Game turn counter
pub type Turn = u32;

/// A tile coordinate on the world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance: the metric for ranged attacks and the A* heuristic
    pub fn manhattan_distance(&self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance: the metric for 8-neighborhood adjacency
    pub fn chebyshev_distance(&self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_civ_id_equality() {
        let a = CivId(1);
        let b = CivId(1);
        let c = CivId(2);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<UnitId, &str> = HashMap::new();
        map.insert(UnitId(1), "warrior");
        assert_eq!(map.get(&UnitId(1)), Some(&"warrior"));
    }

    #[test]
    fn test_manhattan_distance() {
        let a = Position::new(0, 0);
        let b = Position::new(3, -4);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(b.manhattan_distance(a), 7);
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = Position::new(2, 2);
        assert_eq!(a.chebyshev_distance(Position::new(3, 3)), 1);
        assert_eq!(a.chebyshev_distance(Position::new(2, 5)), 3);
    }
}
