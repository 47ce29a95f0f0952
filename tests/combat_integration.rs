//! Combat integration tests

use civforge::combat::{damage, resolve_attack, AttackTarget};
use civforge::core::error::ActionError;
use civforge::core::types::{CivId, Position};
use civforge::data::{GameData, UnitSpec};
use civforge::diplomacy::declare_war;
use civforge::entity::civ::{Civilization, Personality};
use civforge::sim::events::GameEvent;
use civforge::sim::state::GameState;
use civforge::world::grid::WorldGrid;
use civforge::world::tile::Terrain;

use proptest::prelude::*;

fn battle_data() -> GameData {
    let mut data = GameData::builtin();
    data.units.insert(
        "champion".into(),
        UnitSpec {
            name: "Champion".into(),
            cost: 70,
            strength: 20,
            ..UnitSpec::default()
        },
    );
    data
}

fn battlefield() -> (GameState, GameData) {
    let data = battle_data();
    let mut state = GameState::from_world(
        WorldGrid::new(10, 10, Terrain::Plains),
        vec![
            Civilization::new(CivId(0), "Roma", "Caesar", Personality::Aggressive, false),
            Civilization::new(CivId(1), "Hellas", "Perikles", Personality::Defensive, false),
        ],
        41,
    );
    declare_war(&mut state, CivId(0), CivId(1)).unwrap();
    (state, data)
}

#[test]
fn test_melee_exchange_matches_formula() {
    let (mut state, data) = battlefield();
    let attacker = state
        .spawn_unit(CivId(0), "champion", Position { x: 4, y: 4 }, &data)
        .unwrap();
    let defender = state
        .spawn_unit(CivId(1), "warrior", Position { x: 5, y: 4 }, &data)
        .unwrap();

    let outcome = resolve_attack(&mut state, attacker, AttackTarget::Unit(defender), &data).unwrap();
    // 30 * 20/10 and the 30 * 10/20 counter.
    assert_eq!(outcome.damage_dealt, 60);
    assert_eq!(outcome.counter_damage, 15);
    assert_eq!(state.unit(defender).unwrap().health, 40);
    assert_eq!(state.unit(attacker).unwrap().health, 85);

    let spent = state.unit(attacker).unwrap();
    assert!(spent.has_acted);
    assert_eq!(spent.moves_left, 0);
}

#[test]
fn test_ranged_attack_at_distance_one_draws_no_counter() {
    let (mut state, data) = battlefield();
    let archer = state
        .spawn_unit(CivId(0), "archer", Position { x: 4, y: 4 }, &data)
        .unwrap();
    let defender = state
        .spawn_unit(CivId(1), "warrior", Position { x: 5, y: 4 }, &data)
        .unwrap();

    let outcome = resolve_attack(&mut state, archer, AttackTarget::Unit(defender), &data).unwrap();
    assert!(outcome.damage_dealt > 0);
    assert_eq!(outcome.counter_damage, 0);
    assert_eq!(state.unit(archer).unwrap().health, 100);
}

#[test]
fn test_dead_units_leave_no_dangling_references() {
    let (mut state, data) = battlefield();
    let attacker = state
        .spawn_unit(CivId(0), "champion", Position { x: 4, y: 4 }, &data)
        .unwrap();
    let defender = state
        .spawn_unit(CivId(1), "warrior", Position { x: 5, y: 4 }, &data)
        .unwrap();
    state.unit_mut(defender).unwrap().health = 10;

    let outcome = resolve_attack(&mut state, attacker, AttackTarget::Unit(defender), &data).unwrap();
    assert!(outcome.defender_killed);
    assert_eq!(outcome.counter_damage, 0);
    assert!(state.unit(defender).is_err());
    assert_eq!(state.world.tile(Position { x: 5, y: 4 }).unwrap().unit, None);
    assert!(!state.civ(CivId(1)).unwrap().units.contains(&defender));
    state.validate().unwrap();
}

#[test]
fn test_attack_spends_the_single_action() {
    let (mut state, data) = battlefield();
    let attacker = state
        .spawn_unit(CivId(0), "warrior", Position { x: 4, y: 4 }, &data)
        .unwrap();
    let defender = state
        .spawn_unit(CivId(1), "warrior", Position { x: 5, y: 4 }, &data)
        .unwrap();

    resolve_attack(&mut state, attacker, AttackTarget::Unit(defender), &data).unwrap();
    assert_eq!(
        resolve_attack(&mut state, attacker, AttackTarget::Unit(defender), &data),
        Err(ActionError::AlreadyActed)
    );

}

#[test]
fn test_first_strike_opens_the_war() {
    // Same layout, no declared war beforehand.
    let data = battle_data();
    let mut state = GameState::from_world(
        WorldGrid::new(10, 10, Terrain::Plains),
        vec![
            Civilization::new(CivId(0), "Roma", "Caesar", Personality::Balanced, false),
            Civilization::new(CivId(1), "Hellas", "Perikles", Personality::Balanced, false),
        ],
        43,
    );
    let a = state
        .spawn_unit(CivId(0), "warrior", Position { x: 4, y: 4 }, &data)
        .unwrap();
    let d = state
        .spawn_unit(CivId(1), "warrior", Position { x: 5, y: 4 }, &data)
        .unwrap();
    let far = state
        .spawn_unit(CivId(0), "warrior", Position { x: 1, y: 1 }, &data)
        .unwrap();

    // A failed strike must not start a war as a side effect.
    assert_eq!(
        resolve_attack(&mut state, far, AttackTarget::Unit(d), &data),
        Err(ActionError::OutOfRange)
    );
    assert!(!state.at_war(CivId(0), CivId(1)));

    let outcome = resolve_attack(&mut state, a, AttackTarget::Unit(d), &data).unwrap();
    assert!(outcome.damage_dealt > 0);
    assert!(state.at_war(CivId(0), CivId(1)));
    assert!(state.civ(CivId(1)).unwrap().war_history.contains(&CivId(0)));
    let events = state.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::WarDeclared { by, on } if *by == CivId(0) && *on == CivId(1))));
}

#[test]
fn test_city_capture_at_zero_health() {
    let (mut state, data) = battlefield();
    let settler = state
        .spawn_unit(CivId(1), "settler", Position { x: 5, y: 5 }, &data)
        .unwrap();
    let city = state.found_city(settler, "Athenai", &data).unwrap();
    state.city_mut(city).unwrap().health = 20;

    let attacker = state
        .spawn_unit(CivId(0), "champion", Position { x: 4, y: 5 }, &data)
        .unwrap();
    let outcome = resolve_attack(&mut state, attacker, AttackTarget::City(city), &data).unwrap();
    assert!(outcome.city_captured);

    let captured = state.city(city).unwrap();
    assert_eq!(captured.owner, CivId(0));
    assert_eq!(captured.health, 50);
    state.validate().unwrap();
}

#[test]
fn test_out_of_range_attacks_mutate_nothing() {
    let (mut state, data) = battlefield();
    let attacker = state
        .spawn_unit(CivId(0), "warrior", Position { x: 2, y: 2 }, &data)
        .unwrap();
    let defender = state
        .spawn_unit(CivId(1), "warrior", Position { x: 7, y: 7 }, &data)
        .unwrap();
    assert_eq!(
        resolve_attack(&mut state, attacker, AttackTarget::Unit(defender), &data),
        Err(ActionError::OutOfRange)
    );
    let unit = state.unit(attacker).unwrap();
    assert!(!unit.has_acted);
    assert_eq!(state.unit(defender).unwrap().health, 100);
}

proptest! {
    #[test]
    fn prop_damage_always_in_bounds(attack in 0i32..10_000, defense in 0i32..10_000) {
        let d = damage(attack, defense);
        prop_assert!((1..=99).contains(&d));
    }
}
