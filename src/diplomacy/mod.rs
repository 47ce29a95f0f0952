//! Diplomacy: pair relation state machine, trades, opinion scoring
//!
//! Relations are tracked per unordered civilization pair. Denouncements
//! are directional records kept separately so both civilizations can
//! denounce each other independently. All timed states expire during
//! the end-of-turn sweep.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{ActionError, ActionResult};
use crate::core::types::{CivId, Turn};
use crate::data::{GameData, ResourceKind};
use crate::entity::civ::Personality;
use crate::sim::events::GameEvent;
use crate::sim::state::GameState;

pub const TRUCE_TURNS: Turn = 10;
pub const FRIENDSHIP_TURNS: Turn = 30;
pub const DENOUNCE_TURNS: Turn = 20;
pub const TRADE_TURNS: Turn = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RelationState {
    #[default]
    Peace,
    War,
    Truce {
        until: Turn,
    },
    Friendship {
        until: Turn,
    },
}

/// One side's contribution to a trade
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTerms {
    /// Lump sum transferred when the deal is struck
    pub gold: i32,
    pub gold_per_turn: i32,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeAgreement {
    pub a: CivId,
    pub b: CivId,
    pub a_gives: TradeTerms,
    pub b_gives: TradeTerms,
    pub expires: Turn,
}

// ---- transitions ----------------------------------------------------

pub fn declare_war(state: &mut GameState, by: CivId, on: CivId) -> ActionResult<()> {
    if by == on {
        return Err(ActionError::SelfTarget);
    }
    if state.at_war(by, on) {
        return Err(ActionError::AlreadyAtWar);
    }
    state.set_relation(by, on, RelationState::War);
    cancel_trades_between(state, by, on);
    if let Ok(civ) = state.civ_mut(by) {
        civ.war_history.insert(on);
    }
    if let Ok(civ) = state.civ_mut(on) {
        civ.war_history.insert(by);
    }
    info!(by = by.0, on = on.0, "war declared");
    state.push_event(GameEvent::WarDeclared { by, on });
    Ok(())
}

/// Ends a war and opens a truce
pub fn make_peace(state: &mut GameState, a: CivId, b: CivId) -> ActionResult<()> {
    if !state.at_war(a, b) {
        return Err(ActionError::NotAtWar);
    }
    let until = state.turn + TRUCE_TURNS;
    state.set_relation(a, b, RelationState::Truce { until });
    info!(a = a.0, b = b.0, until, "peace made");
    state.push_event(GameEvent::PeaceMade { a, b });
    Ok(())
}

pub fn declare_friendship(state: &mut GameState, a: CivId, b: CivId) -> ActionResult<()> {
    if a == b {
        return Err(ActionError::SelfTarget);
    }
    match state.relation(a, b) {
        RelationState::War => return Err(ActionError::AtWar),
        RelationState::Friendship { .. } => return Err(ActionError::AlreadyFriends),
        _ => {}
    }
    let until = state.turn + FRIENDSHIP_TURNS;
    state.set_relation(a, b, RelationState::Friendship { until });
    // Friendship wipes standing denouncements in both directions.
    state.denouncements.remove(&(a, b));
    state.denouncements.remove(&(b, a));
    info!(a = a.0, b = b.0, until, "friendship declared");
    state.push_event(GameEvent::FriendshipDeclared { a, b });
    Ok(())
}

pub fn denounce(state: &mut GameState, by: CivId, target: CivId) -> ActionResult<()> {
    if by == target {
        return Err(ActionError::SelfTarget);
    }
    if state.has_denounced(by, target) {
        return Err(ActionError::AlreadyDenounced);
    }
    if let RelationState::Friendship { .. } = state.relation(by, target) {
        state.set_relation(by, target, RelationState::Peace);
    }
    let until = state.turn + DENOUNCE_TURNS;
    state.denouncements.insert((by, target), until);
    info!(by = by.0, target = target.0, until, "denouncement");
    state.push_event(GameEvent::Denounced { by, target });
    Ok(())
}

// ---- trades ---------------------------------------------------------

/// What one side's terms are worth to the civilization receiving them
pub fn terms_value(state: &GameState, receiver: CivId, terms: &TradeTerms, data: &GameData) -> f64 {
    let mut value = f64::from(terms.gold) + f64::from(terms.gold_per_turn) * 10.0;
    let at_war = state
        .civs
        .iter()
        .any(|c| c.id != receiver && state.at_war(receiver, c.id));
    for resource in &terms.resources {
        let kind = data.resource(resource).map(|r| r.kind).unwrap_or_default();
        value += match kind {
            ResourceKind::Luxury => 100.0,
            ResourceKind::Strategic => {
                if at_war {
                    120.0
                } else {
                    80.0
                }
            }
            ResourceKind::Bonus => 50.0,
        };
    }
    value
}

/// Net value of a proposal from the evaluator's side, scaled by its
/// standing toward the proposer. Pure: same snapshot, same answer.
pub fn evaluate_trade(
    state: &GameState,
    evaluator: CivId,
    proposer: CivId,
    gets: &TradeTerms,
    gives: &TradeTerms,
    data: &GameData,
) -> f64 {
    let net = terms_value(state, evaluator, gets, data) - terms_value(state, proposer, gives, data);
    let modifier = match state.relation(evaluator, proposer) {
        RelationState::Friendship { .. } => 1.2,
        _ if state.has_denounced(evaluator, proposer) => 0.8,
        _ => 1.0,
    };
    net * modifier
}

/// Proposes a trade to `to`. AI recipients accept iff the evaluated net
/// value is positive; human recipients always accept (the front end
/// asked them already). On acceptance lump sums transfer immediately
/// and the agreement runs for 30 turns.
pub fn propose_trade(
    state: &mut GameState,
    from: CivId,
    to: CivId,
    from_gives: TradeTerms,
    to_gives: TradeTerms,
    data: &GameData,
) -> ActionResult<()> {
    if from == to {
        return Err(ActionError::SelfTarget);
    }
    if state.at_war(from, to) {
        return Err(ActionError::AtWar);
    }
    let recipient_is_ai = state.civ(to).map(|c| c.is_ai).unwrap_or(false);
    if recipient_is_ai {
        let net = evaluate_trade(state, to, from, &from_gives, &to_gives, data);
        debug!(from = from.0, to = to.0, net, "trade evaluated");
        if net <= 0.0 {
            return Err(ActionError::Rejected);
        }
    }

    if let Ok(civ) = state.civ_mut(from) {
        civ.gold -= from_gives.gold;
        civ.gold += to_gives.gold;
    }
    if let Ok(civ) = state.civ_mut(to) {
        civ.gold -= to_gives.gold;
        civ.gold += from_gives.gold;
    }
    let expires = state.turn + TRADE_TURNS;
    state.trades.push(TradeAgreement {
        a: from,
        b: to,
        a_gives: from_gives,
        b_gives: to_gives,
        expires,
    });
    info!(from = from.0, to = to.0, expires, "trade agreed");
    state.push_event(GameEvent::TradeAgreed { from, to });
    Ok(())
}

fn cancel_trades_between(state: &mut GameState, a: CivId, b: CivId) {
    let mut ended = Vec::new();
    state.trades.retain(|t| {
        let between = (t.a == a && t.b == b) || (t.a == b && t.b == a);
        if between {
            ended.push((t.a, t.b));
        }
        !between
    });
    for (from, to) in ended {
        state.push_event(GameEvent::TradeEnded { from, to });
    }
}

/// Resource ids the civilization can put on the table: resources on
/// owned tiles carrying the harvesting improvement
pub fn tradeable_resources(state: &GameState, civ: CivId, data: &GameData) -> Vec<String> {
    let mut out = Vec::new();
    for pos in state.world.positions() {
        let Some(tile) = state.world.tile(pos) else { continue };
        if tile.owner != Some(civ) {
            continue;
        }
        let Some(resource) = &tile.resource else { continue };
        let Some(spec) = data.resource(resource) else { continue };
        let harvested = match &spec.improvement {
            Some(required) => tile.improvement.as_deref() == Some(required.as_str()),
            None => true,
        };
        if harvested && !out.contains(resource) {
            out.push(resource.clone());
        }
    }
    out
}

// ---- upkeep ---------------------------------------------------------

/// End-of-turn sweep: expire truces, friendships, and denouncements,
/// pay per-turn trade gold, and cancel trades whose payer is broke
pub fn upkeep(state: &mut GameState) {
    let turn = state.turn;

    let keys: Vec<(CivId, CivId)> = state.relations.keys().copied().collect();
    for key in keys {
        let expired = match state.relations[&key] {
            RelationState::Truce { until } | RelationState::Friendship { until } => turn >= until,
            _ => false,
        };
        if expired {
            state.relations.insert(key, RelationState::Peace);
            debug!(a = key.0 .0, b = key.1 .0, "timed relation expired");
        }
    }
    state.denouncements.retain(|_, until| turn < *until);

    // Per-turn payments; a side that cannot pay voids the agreement.
    let mut ended = Vec::new();
    let trades = std::mem::take(&mut state.trades);
    for trade in trades {
        if turn >= trade.expires {
            ended.push((trade.a, trade.b));
            continue;
        }
        let a_can_pay = state.civ(trade.a).map(|c| c.gold >= trade.a_gives.gold_per_turn).unwrap_or(false);
        let b_can_pay = state.civ(trade.b).map(|c| c.gold >= trade.b_gives.gold_per_turn).unwrap_or(false);
        if !a_can_pay || !b_can_pay {
            ended.push((trade.a, trade.b));
            continue;
        }
        if let Ok(civ) = state.civ_mut(trade.a) {
            civ.gold += trade.b_gives.gold_per_turn - trade.a_gives.gold_per_turn;
        }
        if let Ok(civ) = state.civ_mut(trade.b) {
            civ.gold += trade.a_gives.gold_per_turn - trade.b_gives.gold_per_turn;
        }
        state.trades.push(trade);
    }
    for (from, to) in ended {
        state.push_event(GameEvent::TradeEnded { from, to });
    }
}

// ---- opinion --------------------------------------------------------

/// How `of` feels about `about`. Pure scoring; thresholds and dice live
/// with the AI decision code.
pub fn opinion(state: &GameState, of: CivId, about: CivId, data: &GameData) -> i32 {
    let mut score = 10;

    match state.relation(of, about) {
        RelationState::War => score -= 100,
        RelationState::Friendship { .. } => score += 50,
        RelationState::Truce { .. } => score -= 20,
        RelationState::Peace => {}
    }
    if state.has_denounced(about, of) {
        score -= 50;
    }
    score += 10 * state.trades_between(of, about) as i32;
    if let Ok(civ) = state.civ(of) {
        if civ.war_history.contains(&about) {
            score -= 30;
        }
    }
    score += match state.civ(of).map(|c| c.personality) {
        Ok(Personality::Friendly) => 10,
        Ok(Personality::Aggressive) => -10,
        _ => 0,
    };

    // Land competition: their city within 10 tiles of one of ours.
    let crowded = state.cities.values().filter(|c| c.owner == of).any(|ours| {
        state
            .cities
            .values()
            .filter(|c| c.owner == about)
            .any(|theirs| ours.pos.chebyshev_distance(theirs.pos) <= 10)
    });
    if crowded {
        score -= 20;
    }

    // Fear of a much stronger military.
    let ours = state.military_strength(of, data).max(1);
    let theirs = state.military_strength(about, data);
    let ratio = f64::from(theirs) / f64::from(ours);
    if ratio > 2.0 {
        score -= 20;
    } else if ratio > 1.5 {
        score -= 10;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::civ::Civilization;
    use crate::world::grid::WorldGrid;
    use crate::world::tile::Terrain;

    fn pair_state() -> (GameState, GameData) {
        let data = GameData::builtin();
        let state = GameState::from_world(
            WorldGrid::new(12, 12, Terrain::Plains),
            vec![
                Civilization::new(CivId(0), "Roma", "Caesar", Personality::Balanced, true),
                Civilization::new(CivId(1), "Hellas", "Perikles", Personality::Balanced, true),
            ],
            3,
        );
        (state, data)
    }

    #[test]
    fn test_war_is_symmetric_and_exclusive() {
        let (mut state, _) = pair_state();
        declare_war(&mut state, CivId(0), CivId(1)).unwrap();
        assert!(state.at_war(CivId(0), CivId(1)));
        assert!(state.at_war(CivId(1), CivId(0)));
        assert_eq!(
            declare_war(&mut state, CivId(1), CivId(0)),
            Err(ActionError::AlreadyAtWar)
        );
        assert!(state.civ(CivId(0)).unwrap().war_history.contains(&CivId(1)));
        assert!(state.civ(CivId(1)).unwrap().war_history.contains(&CivId(0)));
    }

    #[test]
    fn test_peace_requires_war_and_opens_truce() {
        let (mut state, _) = pair_state();
        assert_eq!(
            make_peace(&mut state, CivId(0), CivId(1)),
            Err(ActionError::NotAtWar)
        );
        declare_war(&mut state, CivId(0), CivId(1)).unwrap();
        make_peace(&mut state, CivId(0), CivId(1)).unwrap();
        assert_eq!(
            state.relation(CivId(0), CivId(1)),
            RelationState::Truce {
                until: 1 + TRUCE_TURNS
            }
        );
    }

    #[test]
    fn test_friendship_blocked_by_war() {
        let (mut state, _) = pair_state();
        declare_war(&mut state, CivId(0), CivId(1)).unwrap();
        assert_eq!(
            declare_friendship(&mut state, CivId(0), CivId(1)),
            Err(ActionError::AtWar)
        );
    }

    #[test]
    fn test_denounce_breaks_friendship_and_expires() {
        let (mut state, _) = pair_state();
        declare_friendship(&mut state, CivId(0), CivId(1)).unwrap();
        denounce(&mut state, CivId(0), CivId(1)).unwrap();
        assert_eq!(state.relation(CivId(0), CivId(1)), RelationState::Peace);
        assert!(state.has_denounced(CivId(0), CivId(1)));

        state.turn += DENOUNCE_TURNS;
        upkeep(&mut state);
        assert!(!state.has_denounced(CivId(0), CivId(1)));
    }

    #[test]
    fn test_ai_accepts_only_favorable_trades() {
        let (mut state, data) = pair_state();
        let generous = TradeTerms {
            gold: 100,
            ..TradeTerms::default()
        };
        let nothing = TradeTerms::default();
        state.civ_mut(CivId(0)).unwrap().gold = 100;
        propose_trade(&mut state, CivId(0), CivId(1), generous, nothing.clone(), &data).unwrap();
        assert_eq!(state.civ(CivId(1)).unwrap().gold, 100);
        assert_eq!(state.civ(CivId(0)).unwrap().gold, 0);

        let greedy = TradeTerms {
            gold: 100,
            ..TradeTerms::default()
        };
        assert_eq!(
            propose_trade(&mut state, CivId(0), CivId(1), nothing, greedy, &data),
            Err(ActionError::Rejected)
        );
    }

    #[test]
    fn test_trade_cancelled_when_payer_is_broke() {
        let (mut state, data) = pair_state();
        state.civ_mut(CivId(0)).unwrap().gold = 2;
        let gpt = TradeTerms {
            gold_per_turn: 2,
            ..TradeTerms::default()
        };
        propose_trade(&mut state, CivId(0), CivId(1), gpt, TradeTerms::default(), &data).unwrap();

        upkeep(&mut state);
        assert_eq!(state.trades.len(), 1);
        assert_eq!(state.civ(CivId(0)).unwrap().gold, 0);

        upkeep(&mut state);
        assert!(state.trades.is_empty());
    }

    #[test]
    fn test_opinion_terms() {
        let (mut state, data) = pair_state();
        let base = opinion(&state, CivId(0), CivId(1), &data);
        assert_eq!(base, 10);

        declare_war(&mut state, CivId(0), CivId(1)).unwrap();
        // War plus permanent war history.
        assert_eq!(opinion(&state, CivId(0), CivId(1), &data), 10 - 100 - 30);

        make_peace(&mut state, CivId(0), CivId(1)).unwrap();
        assert_eq!(opinion(&state, CivId(0), CivId(1), &data), 10 - 20 - 30);
    }
}
