//! AI city production selection

use ordered_float::OrderedFloat;
use rand::Rng;
use tracing::debug;

use crate::ai::priorities::Priorities;
use crate::core::types::{CityId, CivId};
use crate::data::{Ability, GameData};
use crate::entity::city::ProductionItem;
use crate::sim::state::GameState;
use crate::tech;

/// Snapshot counts the scoring terms depend on
struct CivCounts {
    cities: usize,
    population: u32,
    workers: usize,
    military: usize,
}

fn counts(state: &GameState, civ_id: CivId, data: &GameData) -> CivCounts {
    let mut workers = 0;
    let mut military = 0;
    for unit in state.units.values().filter(|u| u.owner == civ_id) {
        let spec = data.unit_or_default(&unit.kind);
        if spec.has_ability(Ability::BuildImprovement) {
            workers += 1;
        }
        if spec.is_military() {
            military += 1;
        }
    }
    CivCounts {
        cities: state.civ(civ_id).map(|c| c.cities.len()).unwrap_or(0),
        population: state.total_population(civ_id),
        workers,
        military,
    }
}

fn score_unit(spec: &crate::data::UnitSpec, p: &Priorities, c: &CivCounts) -> f64 {
    let mut score = 50.0 / f64::from(spec.cost.max(1));
    if spec.has_ability(Ability::FoundCity) {
        if c.population > 3 && c.cities < 6 {
            score += 100.0 * p.expansion;
        } else {
            score -= 50.0;
        }
    } else if spec.has_ability(Ability::BuildImprovement) {
        if (c.workers as f64) < c.cities as f64 * 1.5 {
            score += 80.0 * p.economy;
        } else {
            score -= 30.0;
        }
    } else if spec.is_military() {
        if c.military < c.cities * 3 {
            score += 70.0 * p.military.max(p.defense);
        } else {
            score += 30.0 * p.military;
        }
        if spec.range > 1 {
            score += 20.0;
        }
        score += f64::from(spec.attack_strength()) * 0.5;
    }
    score
}

fn score_building(spec: &crate::data::BuildingSpec, p: &Priorities) -> f64 {
    let mut score = 50.0 / f64::from(spec.cost.max(1));
    let e = &spec.effects;
    score += f64::from(e.gold) * 10.0 * p.economy;
    score += f64::from(e.science) * 12.0 * p.science;
    score += f64::from(e.production) * 8.0 * (p.military + p.expansion) / 2.0;
    score += f64::from(e.food) * 10.0 * p.expansion;
    score += f64::from(e.culture) * 8.0;
    score += f64::from(spec.defense) * 5.0 * p.defense;
    if spec.is_wonder {
        score += 50.0;
    }
    score
}

/// Fills every idle production slot of the civilization's cities.
/// The top-scored item wins 70% of the time, otherwise one of the top
/// three is taken uniformly.
pub fn choose_production(state: &mut GameState, civ_id: CivId, p: &Priorities, data: &GameData) {
    let idle: Vec<CityId> = state
        .cities
        .values()
        .filter(|c| c.owner == civ_id && c.producing.is_none())
        .map(|c| c.id)
        .collect();
    for city in idle {
        choose_for_city(state, civ_id, city, p, data);
    }
}

fn choose_for_city(
    state: &mut GameState,
    civ_id: CivId,
    city_id: CityId,
    p: &Priorities,
    data: &GameData,
) {
    let c = counts(state, civ_id, data);
    let mut scored: Vec<(OrderedFloat<f64>, ProductionItem)> = Vec::new();
    {
        let Ok(civ) = state.civ(civ_id) else { return };
        let Ok(city) = state.city(city_id) else { return };
        for (id, spec) in &data.units {
            if !tech::meets_requirement(civ, &spec.requires_tech) {
                continue;
            }
            scored.push((
                OrderedFloat(score_unit(spec, p, &c)),
                ProductionItem::Unit(id.clone()),
            ));
        }
        for (id, spec) in &data.buildings {
            if city.has_building(id) || !tech::meets_requirement(civ, &spec.requires_tech) {
                continue;
            }
            if let Some(required) = &spec.requires_building {
                if !city.has_building(required) {
                    continue;
                }
            }
            scored.push((
                OrderedFloat(score_building(spec, p)),
                ProductionItem::Building(id.clone()),
            ));
        }
    }
    if scored.is_empty() {
        return;
    }
    scored.sort_by(|a, b| b.cmp(a));

    let pick = if state.rng.gen_bool(0.7) {
        0
    } else {
        state.rng.gen_range(0..scored.len().min(3))
    };
    let item = scored[pick].1.clone();
    debug!(civ = civ_id.0, city = city_id.0, ?item, "production chosen");
    let _ = state.start_production(city_id, item, data);
}
