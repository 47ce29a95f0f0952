//! A* pathfinding over the world grid
//!
//! g-score is cumulative terrain movement cost for entering each tile,
//! the heuristic is Manhattan distance, and ties on f-score break by
//! insertion order so a fixed grid always yields the same path.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};

use crate::core::types::Position;
use crate::data::GameData;
use crate::world::grid::WorldGrid;

/// Finds the cheapest path from `start` to `goal`, inclusive of both
/// endpoints. Impassable terrain is never expanded, and `allowed` is
/// consulted per candidate tile for unit-specific passability. Returns
/// `None` when the open set empties before reaching the goal; callers
/// treat that as a normal outcome, not an error.
pub fn find_path(
    grid: &WorldGrid,
    data: &GameData,
    start: Position,
    goal: Position,
    allowed: impl Fn(Position) -> bool,
) -> Option<Vec<Position>> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    // (f, seq, pos): seq keeps expansion FIFO among equal f-scores
    let mut open: BinaryHeap<Reverse<(u32, u64, Position)>> = BinaryHeap::new();
    let mut seq: u64 = 0;
    let mut g_score: AHashMap<Position, u32> = AHashMap::new();
    let mut came_from: AHashMap<Position, Position> = AHashMap::new();
    let mut closed: AHashSet<Position> = AHashSet::new();

    g_score.insert(start, 0);
    open.push(Reverse((heuristic(start, goal), seq, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == goal {
            return Some(reconstruct(&came_from, current));
        }
        if !closed.insert(current) {
            continue;
        }

        let current_g = g_score[&current];
        for next in grid.neighbors(current, false) {
            if closed.contains(&next) {
                continue;
            }
            let Some(tile) = grid.tile(next) else { continue };
            let terrain = data.terrain(tile.terrain);
            if !terrain.is_passable() || !allowed(next) {
                continue;
            }
            let tentative = current_g + terrain.movement_cost;
            if g_score.get(&next).map_or(true, |&g| tentative < g) {
                g_score.insert(next, tentative);
                came_from.insert(next, current);
                seq += 1;
                open.push(Reverse((tentative + heuristic(next, goal), seq, next)));
            }
        }
    }

    None
}

fn heuristic(from: Position, to: Position) -> u32 {
    from.manhattan_distance(to) as u32
}

fn reconstruct(came_from: &AHashMap<Position, Position>, goal: Position) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
