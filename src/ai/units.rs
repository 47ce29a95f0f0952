//! AI unit orders: settlers, workers, military
//!
//! Units act in id order. Sleeping units are skipped; fortified
//! military wake only when a war target is available.

use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;

use tracing::debug;

use crate::ai::priorities::Priorities;
use crate::combat::{self, AttackTarget};
use crate::core::types::{CivId, Position, UnitId};
use crate::data::{Ability, GameData, UnitSpec};
use crate::entity::unit::UnitStatus;
use crate::sim::state::{GameState, MIN_CITY_SEPARATION};
use crate::world::tile::Terrain;

/// Search radius for settler sites and worker jobs
const SEARCH_RADIUS: i32 = 10;

pub fn run_units(state: &mut GameState, civ_id: CivId, p: &Priorities, data: &GameData) {
    let ids: Vec<UnitId> = state
        .units
        .values()
        .filter(|u| u.owner == civ_id)
        .map(|u| u.id)
        .collect();
    for id in ids {
        let Ok(unit) = state.unit(id) else { continue };
        if unit.has_acted || unit.status == UnitStatus::Sleeping {
            continue;
        }
        let spec = data.unit_or_default(&unit.kind);
        if spec.has_ability(Ability::FoundCity) {
            settler_turn(state, id, civ_id, data);
        } else if spec.has_ability(Ability::BuildImprovement) {
            worker_turn(state, id, civ_id, data);
        } else if spec.is_military() {
            military_turn(state, id, civ_id, &spec, p, data);
        } else {
            let _ = state.fortify_unit(id);
        }
    }
}

// ---- settlers -------------------------------------------------------

/// Windowed site quality; `None` when the spot does not qualify
fn site_score(state: &GameState, pos: Position, data: &GameData) -> Option<f64> {
    let tile = state.world.tile(pos)?;
    if !tile.terrain.is_land() || tile.city.is_some() {
        return None;
    }
    if state
        .cities
        .values()
        .any(|c| c.pos.chebyshev_distance(pos) < MIN_CITY_SEPARATION)
    {
        return None;
    }

    let mut resources = 0;
    let mut food = 0;
    let mut production = 0;
    let mut window = state.world.positions_within(pos, 2);
    window.push(pos);
    for p in window {
        let Some(t) = state.world.tile(p) else { continue };
        if t.resource.is_some() {
            resources += 1;
        }
        let y = t.yields(data);
        food += y.food;
        production += y.production;
    }
    if resources < 2 && food < 6 && production < 4 {
        return None;
    }
    Some(f64::from(resources) * 30.0 + f64::from(food) * 2.0 + f64::from(production) * 2.0)
}

fn next_city_name(state: &GameState, civ_id: CivId) -> String {
    let (name, count) = state
        .civ(civ_id)
        .map(|c| (c.name.clone(), c.cities.len()))
        .unwrap_or_else(|_| ("Colony".to_string(), 0));
    if count == 0 {
        name
    } else {
        format!("{} {}", name, count + 1)
    }
}

fn settler_turn(state: &mut GameState, id: UnitId, civ_id: CivId, data: &GameData) {
    let Ok(unit) = state.unit(id) else { return };
    let from = unit.pos;

    // Found on the spot when it qualifies.
    if site_score(state, from, data).is_some() {
        let name = next_city_name(state, civ_id);
        if state.found_city(id, &name, data).is_ok() {
            return;
        }
    }

    let mut best: Option<(OrderedFloat<f64>, Position)> = None;
    for pos in state.world.positions_within(from, SEARCH_RADIUS) {
        let Some(score) = site_score(state, pos, data) else { continue };
        let dist = f64::from(from.chebyshev_distance(pos));
        let scored = OrderedFloat(score / (1.0 + 0.1 * dist));
        if best.map(|(b, _)| scored > b).unwrap_or(true) {
            best = Some((scored, pos));
        }
    }

    match best {
        Some((_, site)) => {
            debug!(unit = id.0, ?site, "settler heading to site");
            if let Ok(reached) = state.move_toward(id, site, data) {
                if reached == site && site_score(state, site, data).is_some() {
                    let name = next_city_name(state, civ_id);
                    let _ = state.found_city(id, &name, data);
                }
            }
        }
        // Nothing nearby qualifies; hold position and retry next turn.
        None => {
            let _ = state.fortify_unit(id);
        }
    }
}

// ---- workers --------------------------------------------------------

/// Fixed terrain to improvement table
fn terrain_improvement(terrain: Terrain) -> Option<&'static str> {
    match terrain {
        Terrain::Plains => Some("farm"),
        Terrain::Hills => Some("mine"),
        Terrain::Forest => Some("lumber_mill"),
        Terrain::Desert => Some("trading_post"),
        Terrain::Mountains | Terrain::Water => None,
    }
}

/// Best improvement the civilization can build here right now: the
/// resource's harvester when unlocked, else the terrain default
fn improvement_for_tile(
    state: &GameState,
    civ_id: CivId,
    pos: Position,
    data: &GameData,
) -> Option<String> {
    let tile = state.world.tile(pos)?;
    let mut candidates: Vec<String> = Vec::new();
    if let Some(resource) = &tile.resource {
        if let Some(improvement) = data.resource(resource).and_then(|r| r.improvement.clone()) {
            candidates.push(improvement);
        }
    }
    if let Some(improvement) = terrain_improvement(tile.terrain) {
        candidates.push(improvement.to_string());
    }
    candidates
        .into_iter()
        .find(|i| state.improvement_unlocked(civ_id, i, data))
}

/// Tile a worker should head for: owned, unimproved, workable land
fn wants_worker(state: &GameState, civ_id: CivId, pos: Position) -> bool {
    state
        .world
        .tile(pos)
        .map(|t| {
            t.owner == Some(civ_id)
                && t.city.is_none()
                && t.improvement.is_none()
                && terrain_improvement(t.terrain).is_some()
        })
        .unwrap_or(false)
}

fn worker_turn(state: &mut GameState, id: UnitId, civ_id: CivId, data: &GameData) {
    let Ok(unit) = state.unit(id) else { return };
    let from = unit.pos;

    if wants_worker(state, civ_id, from) {
        if let Some(improvement) = improvement_for_tile(state, civ_id, from, data) {
            if state.build_improvement(id, &improvement, data).is_ok() {
                return;
            }
        }
    }

    let target = state
        .world
        .positions_within(from, SEARCH_RADIUS)
        .into_iter()
        .filter(|pos| wants_worker(state, civ_id, *pos))
        .min_by_key(|pos| (from.chebyshev_distance(*pos), pos.y, pos.x));
    match target {
        Some(goal) => {
            let _ = state.move_toward(id, goal, data);
        }
        None => {
            let _ = state.sleep_unit(id);
        }
    }
}

// ---- military -------------------------------------------------------

enum Target {
    Unit(UnitId, Position, i32),
    City(crate::core::types::CityId, Position, i32),
}

impl Target {
    fn pos(&self) -> Position {
        match self {
            Target::Unit(_, p, _) | Target::City(_, p, _) => *p,
        }
    }

    fn defense(&self) -> i32 {
        match self {
            Target::Unit(_, _, d) | Target::City(_, _, d) => *d,
        }
    }

    fn attack_target(&self) -> AttackTarget {
        match self {
            Target::Unit(id, _, _) => AttackTarget::Unit(*id),
            Target::City(id, _, _) => AttackTarget::City(*id),
        }
    }
}

fn nearest_enemy_unit(
    state: &GameState,
    civ_id: CivId,
    from: Position,
    data: &GameData,
) -> Option<Target> {
    state
        .units
        .values()
        .filter(|u| u.owner != civ_id && state.at_war(civ_id, u.owner))
        .min_by_key(|u| (from.chebyshev_distance(u.pos), u.id))
        .map(|u| {
            let strength = data.unit_or_default(&u.kind).strength;
            Target::Unit(u.id, u.pos, strength)
        })
}

fn nearest_enemy_city(
    state: &GameState,
    civ_id: CivId,
    from: Position,
    data: &GameData,
) -> Option<Target> {
    state
        .cities
        .values()
        .filter(|c| c.owner != civ_id && state.at_war(civ_id, c.owner))
        .min_by_key(|c| (from.chebyshev_distance(c.pos), c.id))
        .map(|c| Target::City(c.id, c.pos, c.defense_strength(data)))
}

fn in_attack_range(spec: &UnitSpec, from: Position, to: Position) -> bool {
    if spec.range > 0 {
        from.manhattan_distance(to) <= spec.range
    } else {
        from.chebyshev_distance(to) == 1
    }
}

fn military_turn(
    state: &mut GameState,
    id: UnitId,
    civ_id: CivId,
    spec: &UnitSpec,
    p: &Priorities,
    data: &GameData,
) {
    let Ok(unit) = state.unit(id) else { return };
    let from = unit.pos;
    let offensive = p.military >= p.defense;

    // Offensive posture hunts cities first, defensive intercepts units.
    let target = if offensive {
        nearest_enemy_city(state, civ_id, from, data)
            .or_else(|| nearest_enemy_unit(state, civ_id, from, data))
    } else {
        nearest_enemy_unit(state, civ_id, from, data)
            .or_else(|| nearest_enemy_city(state, civ_id, from, data))
    };

    match target {
        Some(target) => {
            let ratio = f64::from(spec.attack_strength()) / f64::from(target.defense().max(1));
            let willing = ratio >= 1.0 - 0.3 * p.military;
            if !willing {
                retreat(state, id, civ_id, from, data);
                return;
            }
            if in_attack_range(spec, from, target.pos()) {
                let _ = combat::resolve_attack(state, id, target.attack_target(), data);
                return;
            }
            let goal = target.pos();
            if let Ok(reached) = state.move_toward(id, goal, data) {
                let Ok(unit) = state.unit(id) else { return };
                if !unit.has_acted && in_attack_range(spec, reached, goal) {
                    let _ = combat::resolve_attack(state, id, target.attack_target(), data);
                }
            }
        }
        None => peacetime_posture(state, id, civ_id, from, p, data),
    }
}

/// Fall back toward the closest friendly city and dig in
fn retreat(state: &mut GameState, id: UnitId, civ_id: CivId, from: Position, data: &GameData) {
    let home = state
        .cities
        .values()
        .filter(|c| c.owner == civ_id)
        .min_by_key(|c| (from.chebyshev_distance(c.pos), c.id))
        .map(|c| c.pos);
    if let Some(home) = home {
        let _ = state.move_toward(id, home, data);
    }
    let _ = state.fortify_unit(id);
}

fn peacetime_posture(
    state: &mut GameState,
    id: UnitId,
    civ_id: CivId,
    from: Position,
    p: &Priorities,
    data: &GameData,
) {
    if p.defense > p.military {
        // Garrison duty near the closest city.
        let home = state
            .cities
            .values()
            .filter(|c| c.owner == civ_id)
            .min_by_key(|c| (from.chebyshev_distance(c.pos), c.id))
            .map(|c| c.pos);
        match home {
            Some(home) if from.chebyshev_distance(home) > 2 => {
                let _ = state.move_toward(id, home, data);
            }
            _ => {
                let _ = state.fortify_unit(id);
            }
        }
    } else {
        // Patrol: wander one step at a time.
        let options: Vec<Position> = state
            .world
            .neighbors(from, true)
            .into_iter()
            .filter(|pos| state.passable_for(civ_id, *pos, data))
            .collect();
        if let Some(&step) = options.choose(&mut state.rng) {
            let _ = state.step_unit(id, step, data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::civ::{Civilization, Personality};
    use crate::world::grid::WorldGrid;

    fn two_civ_state(size: u32) -> (GameState, GameData) {
        let data = GameData::builtin();
        let state = GameState::from_world(
            WorldGrid::new(size, size, Terrain::Plains),
            vec![
                Civilization::new(CivId(0), "Roma", "Caesar", Personality::Aggressive, true),
                Civilization::new(CivId(1), "Hellas", "Perikles", Personality::Balanced, true),
            ],
            17,
        );
        (state, data)
    }

    #[test]
    fn test_settler_founds_on_open_plains() {
        let (mut state, data) = two_civ_state(16);
        let settler = state
            .spawn_unit(CivId(0), "settler", Position { x: 8, y: 8 }, &data)
            .unwrap();
        let p = crate::ai::priorities::compute(&state, CivId(0));
        run_units(&mut state, CivId(0), &p, &data);
        // All-plains windows carry food 9+, so the start tile qualifies.
        assert!(state.units.get(&settler).is_none());
        assert_eq!(state.civ(CivId(0)).unwrap().cities.len(), 1);
        state.validate().unwrap();
    }

    #[test]
    fn test_worker_improves_owned_tile() {
        let (mut state, data) = two_civ_state(16);
        let settler = state
            .spawn_unit(CivId(0), "settler", Position { x: 8, y: 8 }, &data)
            .unwrap();
        state.found_city(settler, "Roma", &data).unwrap();
        state
            .civ_mut(CivId(0))
            .unwrap()
            .technologies
            .insert("agriculture".into());
        let worker = state
            .spawn_unit(CivId(0), "worker", Position { x: 8, y: 7 }, &data)
            .unwrap();
        let p = crate::ai::priorities::compute(&state, CivId(0));
        run_units(&mut state, CivId(0), &p, &data);
        let pos = state.unit(worker).unwrap().pos;
        assert_eq!(
            state.world.tile(pos).unwrap().improvement.as_deref(),
            Some("farm")
        );
    }

    #[test]
    fn test_military_advances_on_distant_enemy_unit() {
        let (mut state, data) = two_civ_state(16);
        crate::diplomacy::declare_war(&mut state, CivId(0), CivId(1)).unwrap();
        let warrior = state
            .spawn_unit(CivId(0), "warrior", Position { x: 2, y: 5 }, &data)
            .unwrap();
        let enemy_pos = Position { x: 9, y: 5 };
        state.spawn_unit(CivId(1), "warrior", enemy_pos, &data).unwrap();
        let p = crate::ai::priorities::compute(&state, CivId(0));
        run_units(&mut state, CivId(0), &p, &data);
        let pos = state.unit(warrior).unwrap().pos;
        assert_ne!(pos, Position { x: 2, y: 5 });
        assert!(pos.chebyshev_distance(enemy_pos) < 7);
    }

    #[test]
    fn test_military_advances_on_distant_enemy_city() {
        let (mut state, data) = two_civ_state(16);
        crate::diplomacy::declare_war(&mut state, CivId(0), CivId(1)).unwrap();
        let settler = state
            .spawn_unit(CivId(1), "settler", Position { x: 12, y: 5 }, &data)
            .unwrap();
        state.found_city(settler, "Athenai", &data).unwrap();
        let warrior = state
            .spawn_unit(CivId(0), "warrior", Position { x: 2, y: 5 }, &data)
            .unwrap();
        let p = crate::ai::priorities::compute(&state, CivId(0));
        run_units(&mut state, CivId(0), &p, &data);
        let pos = state.unit(warrior).unwrap().pos;
        assert!(pos.chebyshev_distance(Position { x: 12, y: 5 }) < 10);
    }

    #[test]
    fn test_military_attacks_adjacent_enemy_at_war() {
        let (mut state, data) = two_civ_state(12);
        crate::diplomacy::declare_war(&mut state, CivId(0), CivId(1)).unwrap();
        state
            .spawn_unit(CivId(0), "warrior", Position { x: 5, y: 5 }, &data)
            .unwrap();
        let enemy = state
            .spawn_unit(CivId(1), "warrior", Position { x: 6, y: 5 }, &data)
            .unwrap();
        let p = crate::ai::priorities::compute(&state, CivId(0));
        run_units(&mut state, CivId(0), &p, &data);
        // Equal strength, high military priority: the attack goes in.
        assert!(state.unit(enemy).unwrap().health < 100);
    }
}
