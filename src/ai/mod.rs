//! Heuristic AI
//!
//! One decision pass per AI civilization per turn: compute the
//! priority vector, then let it drive research, production, unit
//! orders, and diplomacy in that order.

pub mod diplomacy;
pub mod priorities;
pub mod production;
pub mod research;
pub mod units;

use tracing::debug;

use crate::core::types::CivId;
use crate::data::GameData;
use crate::sim::state::GameState;

pub fn take_turn(state: &mut GameState, civ_id: CivId, data: &GameData) {
    let p = priorities::compute(state, civ_id);
    debug!(civ = civ_id.0, ?p, "ai priorities");
    research::choose_research(state, civ_id, &p, data);
    production::choose_production(state, civ_id, &p, data);
    units::run_units(state, civ_id, &p, data);
    diplomacy::run_diplomacy(state, civ_id, &p, data);
}
