//! Rectangular tile grid with bounds-checked access and neighbor queries

use serde::{Deserialize, Serialize};

use crate::core::types::Position;
use crate::world::tile::{Terrain, Tile};

/// Row-major tile storage. Occupancy fields on tiles are derived
/// indices; `crate::sim::state` is the only module that mutates them,
/// keeping them in sync with the entity arenas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

/// 4-neighborhood offsets in scan order
const ORTHOGONAL: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
/// Diagonal offsets, appended for the 8-neighborhood
const DIAGONAL: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

impl WorldGrid {
    pub fn new(width: u32, height: u32, default_terrain: Terrain) -> Self {
        let tiles = vec![Tile::new(default_terrain); (width * height) as usize];
        Self {
            width,
            height,
            tiles,
        }
    }

    /// Builds a grid from row-major tiles; `tiles.len()` must equal
    /// `width * height`.
    pub fn from_tiles(width: u32, height: u32, tiles: Vec<Tile>) -> Self {
        debug_assert_eq!(tiles.len(), (width * height) as usize);
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> usize {
        (pos.y as u32 * self.width + pos.x as u32) as usize
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        if self.in_bounds(pos) {
            Some(&self.tiles[self.index(pos)])
        } else {
            None
        }
    }

    pub fn tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            Some(&mut self.tiles[idx])
        } else {
            None
        }
    }

    /// In-bounds neighbor positions, orthogonal first then diagonal,
    /// in a fixed scan order
    pub fn neighbors(&self, pos: Position, include_diagonal: bool) -> Vec<Position> {
        let mut out = Vec::with_capacity(if include_diagonal { 8 } else { 4 });
        for (dx, dy) in ORTHOGONAL {
            let n = pos.offset(dx, dy);
            if self.in_bounds(n) {
                out.push(n);
            }
        }
        if include_diagonal {
            for (dx, dy) in DIAGONAL {
                let n = pos.offset(dx, dy);
                if self.in_bounds(n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// All positions in row-major scan order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| Position {
                x: x as i32,
                y: y as i32,
            })
        })
    }

    /// Positions within Chebyshev distance `radius` of `center`,
    /// excluding `center` itself
    pub fn positions_within(&self, center: Position, radius: i32) -> Vec<Position> {
        let mut out = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let p = center.offset(dx, dy);
                if self.in_bounds(p) {
                    out.push(p);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_checks() {
        let grid = WorldGrid::new(4, 3, Terrain::Plains);
        assert!(grid.tile(Position { x: 3, y: 2 }).is_some());
        assert!(grid.tile(Position { x: 4, y: 2 }).is_none());
        assert!(grid.tile(Position { x: -1, y: 0 }).is_none());
    }

    #[test]
    fn test_neighbor_counts() {
        let grid = WorldGrid::new(5, 5, Terrain::Plains);
        let center = Position { x: 2, y: 2 };
        assert_eq!(grid.neighbors(center, false).len(), 4);
        assert_eq!(grid.neighbors(center, true).len(), 8);

        let corner = Position { x: 0, y: 0 };
        assert_eq!(grid.neighbors(corner, false).len(), 2);
        assert_eq!(grid.neighbors(corner, true).len(), 3);
    }

    #[test]
    fn test_positions_within_radius() {
        let grid = WorldGrid::new(10, 10, Terrain::Plains);
        let center = Position { x: 5, y: 5 };
        // 5x5 window minus the center itself
        assert_eq!(grid.positions_within(center, 2).len(), 24);
    }
}
