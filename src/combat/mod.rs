//! Combat resolution
//!
//! Damage is `clamp(30 * attack / max(1, defense), 1, 99)`. Melee
//! attacks against an adjacent surviving unit draw a counter-attack
//! with the roles swapped; ranged attacks never do, even at distance 1.
//! That asymmetry is long-standing observed behavior and is kept as is.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{ActionError, ActionResult};
use crate::core::types::{CityId, CivId, Position, UnitId};
use crate::data::GameData;
use crate::sim::events::GameEvent;
use crate::sim::state::GameState;

/// The two things a unit can attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackTarget {
    Unit(UnitId),
    City(CityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombatOutcome {
    pub damage_dealt: i32,
    pub counter_damage: i32,
    pub defender_killed: bool,
    pub attacker_killed: bool,
    pub city_captured: bool,
}

pub fn damage(attack: i32, defense: i32) -> i32 {
    let raw = (30.0 * f64::from(attack) / f64::from(defense.max(1))) as i32;
    raw.clamp(1, 99)
}

/// Validates and resolves one attack. The attack consumes the
/// attacker's action and movement whatever the outcome; a failed
/// precondition mutates nothing.
pub fn resolve_attack(
    state: &mut GameState,
    attacker_id: UnitId,
    target: AttackTarget,
    data: &GameData,
) -> ActionResult<CombatOutcome> {
    let attacker = state.unit(attacker_id).map_err(|_| ActionError::NoValidTarget)?;
    if attacker.has_acted {
        return Err(ActionError::AlreadyActed);
    }
    let attacker_owner = attacker.owner;
    let attacker_pos = attacker.pos;
    let attacker_spec = data.unit_or_default(&attacker.kind);

    let (target_owner, target_pos, defense) = match target {
        AttackTarget::Unit(id) => {
            let unit = state.unit(id).map_err(|_| ActionError::NoValidTarget)?;
            let spec = data.unit_or_default(&unit.kind);
            (unit.owner, unit.pos, spec.strength)
        }
        AttackTarget::City(id) => {
            let city = state.city(id).map_err(|_| ActionError::NoValidTarget)?;
            (city.owner, city.pos, city.defense_strength(data))
        }
    };
    if target_owner == attacker_owner {
        return Err(ActionError::SelfTarget);
    }
    check_range(&attacker_spec, attacker_pos, target_pos)?;

    // Striking a foreign unit or city is itself a declaration of war.
    if !state.at_war(attacker_owner, target_owner) {
        crate::diplomacy::declare_war(state, attacker_owner, target_owner)?;
    }

    // From here on the action is spent regardless of outcome.
    {
        let attacker = state.unit_mut(attacker_id).map_err(|_| ActionError::NoValidTarget)?;
        attacker.has_acted = true;
        attacker.moves_left = 0;
        attacker.disturb();
    }

    let mut outcome = CombatOutcome {
        damage_dealt: damage(attacker_spec.attack_strength(), defense),
        ..CombatOutcome::default()
    };

    match target {
        AttackTarget::Unit(defender_id) => {
            resolve_against_unit(state, attacker_id, defender_id, &mut outcome, data)?;
        }
        AttackTarget::City(city_id) => {
            resolve_against_city(state, attacker_id, city_id, &mut outcome)?;
        }
    }

    info!(
        attacker = attacker_id.0,
        ?target,
        dealt = outcome.damage_dealt,
        counter = outcome.counter_damage,
        "attack resolved"
    );
    Ok(outcome)
}

fn check_range(
    spec: &crate::data::UnitSpec,
    from: Position,
    to: Position,
) -> ActionResult<()> {
    if spec.range > 0 {
        if from.manhattan_distance(to) > spec.range {
            return Err(ActionError::OutOfRange);
        }
    } else if from.chebyshev_distance(to) != 1 {
        return Err(ActionError::OutOfRange);
    }
    Ok(())
}

fn resolve_against_unit(
    state: &mut GameState,
    attacker_id: UnitId,
    defender_id: UnitId,
    outcome: &mut CombatOutcome,
    data: &GameData,
) -> ActionResult<()> {
    let (attacker_owner, attacker_pos, attacker_spec) = {
        let attacker = state.unit(attacker_id).map_err(|_| ActionError::NoValidTarget)?;
        (attacker.owner, attacker.pos, data.unit_or_default(&attacker.kind))
    };

    let (defender_owner, defender_pos, defender_spec, defender_alive) = {
        let defender = state.unit_mut(defender_id).map_err(|_| ActionError::NoValidTarget)?;
        defender.health -= outcome.damage_dealt;
        (
            defender.owner,
            defender.pos,
            data.unit_or_default(&defender.kind),
            defender.is_alive(),
        )
    };

    // Counter-attack: melee attackers only, and only if the defender
    // survived the blow.
    if attacker_spec.ranged_strength == 0
        && attacker_pos.chebyshev_distance(defender_pos) == 1
        && defender_alive
    {
        outcome.counter_damage = damage(defender_spec.attack_strength(), attacker_spec.strength);
        let attacker = state.unit_mut(attacker_id).map_err(|_| ActionError::NoValidTarget)?;
        attacker.health -= outcome.counter_damage;
        if !attacker.is_alive() {
            outcome.attacker_killed = true;
            kill_unit(state, attacker_id, defender_owner)?;
        }
    }

    if !defender_alive {
        outcome.defender_killed = true;
        kill_unit(state, defender_id, attacker_owner)?;
    }
    Ok(())
}

fn resolve_against_city(
    state: &mut GameState,
    attacker_id: UnitId,
    city_id: CityId,
    outcome: &mut CombatOutcome,
) -> ActionResult<()> {
    let attacker_owner = state
        .unit(attacker_id)
        .map_err(|_| ActionError::NoValidTarget)?
        .owner;
    let captured = {
        let city = state.city_mut(city_id).map_err(|_| ActionError::NoValidTarget)?;
        city.health -= outcome.damage_dealt;
        city.health <= 0
    };
    if captured {
        outcome.city_captured = true;
        state
            .capture_city(city_id, attacker_owner)
            .map_err(|_| ActionError::NoValidTarget)?;
    }
    Ok(())
}

fn kill_unit(state: &mut GameState, unit_id: UnitId, by: CivId) -> ActionResult<()> {
    let unit = state
        .remove_unit(unit_id)
        .map_err(|_| ActionError::NoValidTarget)?;
    state.push_event(GameEvent::UnitKilled {
        unit: unit_id,
        owner: unit.owner,
        by,
    });
    Ok(())
}
