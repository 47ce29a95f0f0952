//! AI research selection

use ordered_float::OrderedFloat;
use rand::Rng;
use tracing::debug;

use crate::ai::priorities::Priorities;
use crate::core::types::CivId;
use crate::data::GameData;
use crate::sim::state::GameState;
use crate::tech;

/// Deterministic part of the tech score, before jitter
pub fn score_tech(tech_id: &str, p: &Priorities, data: &GameData) -> f64 {
    let spec = data.tech_or_default(tech_id);
    let mut score = 100.0 / f64::from(spec.cost.max(1));

    for unlock in &spec.unlocks {
        if let Some(unit) = data.unit(unlock) {
            if unit.is_military() {
                score += 20.0 * p.military;
            } else {
                score += 10.0 * p.expansion;
            }
        } else if let Some(building) = data.building(unlock) {
            if building.is_wonder {
                score += 25.0;
            }
            if building.effects.gold > 0 {
                score += 15.0 * p.economy;
            }
            if building.effects.science > 0 {
                score += 15.0 * p.science;
            }
        } else {
            // Tile improvement unlock.
            score += 10.0 * (p.economy + p.expansion) / 2.0;
        }
    }

    score * f64::from(spec.era.research_weight())
}

/// Picks and starts the next research project, if the slot is free.
/// The top-scored tech wins 80% of the time, otherwise one of the top
/// three is taken uniformly.
pub fn choose_research(state: &mut GameState, civ_id: CivId, p: &Priorities, data: &GameData) {
    let available: Vec<String> = {
        let Ok(civ) = state.civ(civ_id) else { return };
        if civ.research.is_some() {
            return;
        }
        tech::available_techs(civ, data)
            .into_iter()
            .map(str::to_string)
            .collect()
    };
    if available.is_empty() {
        return;
    }

    let mut scored: Vec<(OrderedFloat<f64>, String)> = available
        .into_iter()
        .map(|id| {
            let jitter = state.rng.gen_range(0.9..1.1);
            (OrderedFloat(score_tech(&id, p, data) * jitter), id)
        })
        .collect();
    scored.sort_by(|a, b| b.cmp(a));

    let pick = if state.rng.gen_bool(0.8) {
        0
    } else {
        state.rng.gen_range(0..scored.len().min(3))
    };
    let chosen = scored[pick].1.clone();
    debug!(civ = civ_id.0, tech = %chosen, "research chosen");
    if let Ok(civ) = state.civ_mut(civ_id) {
        let _ = tech::start_research(civ, &chosen, data);
    }
}
