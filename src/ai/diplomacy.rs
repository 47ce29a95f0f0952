//! AI diplomacy proposals
//!
//! Opinion scoring is pure; the dice for each probabilistic proposal
//! are drawn from the game RNG here, at the decision site, so a fixed
//! seed reproduces a run exactly.

use rand::Rng;
use tracing::debug;

use crate::ai::priorities::Priorities;
use crate::core::types::CivId;
use crate::data::GameData;
use crate::diplomacy::{self, RelationState, TradeTerms};
use crate::sim::state::GameState;

const WAR_OPINION: i32 = -50;
const FRIENDSHIP_OPINION: i32 = 50;
const WAR_CHANCE: f64 = 0.2;
const TRADE_CHANCE: f64 = 0.3;
const FRIENDSHIP_CHANCE: f64 = 0.4;
/// Gold asked for one surplus resource
const RESOURCE_PRICE: i32 = 40;

pub fn run_diplomacy(state: &mut GameState, civ_id: CivId, p: &Priorities, data: &GameData) {
    let others: Vec<CivId> = state
        .living_civs()
        .map(|c| c.id)
        .filter(|id| *id != civ_id)
        .collect();

    for other in others {
        let opinion = diplomacy::opinion(state, civ_id, other, data);
        debug!(civ = civ_id.0, other = other.0, opinion, "opinion");
        let relation = state.relation(civ_id, other);

        if opinion < WAR_OPINION && p.military > 0.7 {
            if relation != RelationState::War && state.rng.gen_bool(WAR_CHANCE) {
                let _ = diplomacy::declare_war(state, civ_id, other);
            }
            continue;
        }

        if opinion > FRIENDSHIP_OPINION {
            let already = matches!(relation, RelationState::Friendship { .. });
            if !already && relation != RelationState::War && state.rng.gen_bool(FRIENDSHIP_CHANCE) {
                let _ = diplomacy::declare_friendship(state, civ_id, other);
            }
            continue;
        }

        if opinion >= 0 && relation != RelationState::War && state.rng.gen_bool(TRADE_CHANCE) {
            try_resource_sale(state, civ_id, other, data);
        }
    }
}

/// Offers one harvested resource for a flat gold price, when the
/// buyer can afford it
fn try_resource_sale(state: &mut GameState, seller: CivId, buyer: CivId, data: &GameData) {
    let Some(resource) = diplomacy::tradeable_resources(state, seller, data)
        .into_iter()
        .next()
    else {
        return;
    };
    let buyer_gold = state.civ(buyer).map(|c| c.gold).unwrap_or(0);
    if buyer_gold < RESOURCE_PRICE {
        return;
    }
    let offer = TradeTerms {
        resources: vec![resource],
        ..TradeTerms::default()
    };
    let ask = TradeTerms {
        gold: RESOURCE_PRICE,
        ..TradeTerms::default()
    };
    let _ = diplomacy::propose_trade(state, seller, buyer, offer, ask, data);
}
