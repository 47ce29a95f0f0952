//! Turn sequencing
//!
//! The global order is fixed and load-bearing for reproducibility:
//! human end-of-turn, then each AI civilization in roster order
//! (end-of-turn, decisions, start-of-turn), then the diplomacy sweep,
//! the turn counter, and a start-of-turn for every civilization.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::ai;
use crate::core::error::Result;
use crate::core::types::{CityId, CivId, Position, UnitId};
use crate::data::GameData;
use crate::diplomacy;
use crate::entity::city::ProductionItem;
use crate::sim::events::GameEvent;
use crate::sim::state::GameState;

/// Runs one full game turn
pub fn advance_turn(state: &mut GameState, data: &GameData) -> Result<()> {
    let alive_before: BTreeSet<CivId> = state.living_civs().map(|c| c.id).collect();
    let (humans, ais): (Vec<CivId>, Vec<CivId>) = {
        let ids: Vec<(CivId, bool)> = state.civs.iter().map(|c| (c.id, c.is_ai)).collect();
        (
            ids.iter().filter(|(_, ai)| !ai).map(|(id, _)| *id).collect(),
            ids.iter().filter(|(_, ai)| *ai).map(|(id, _)| *id).collect(),
        )
    };

    for civ in &humans {
        end_of_turn(state, *civ, data)?;
    }
    for civ in &ais {
        end_of_turn(state, *civ, data)?;
        ai::take_turn(state, *civ, data);
        start_of_turn(state, *civ, data)?;
    }

    diplomacy::upkeep(state);
    state.turn += 1;
    for civ in humans.iter().chain(ais.iter()) {
        start_of_turn(state, *civ, data)?;
    }

    for civ in alive_before {
        if state.civ(civ).map(|c| c.is_defeated()).unwrap_or(false) {
            info!(civ = civ.0, "civilization defeated");
            state.push_event(GameEvent::CivDefeated { civ });
        }
    }

    state.push_event(GameEvent::TurnEnded { turn: state.turn });
    debug_assert!(state.validate().is_ok());
    info!(turn = state.turn, "turn advanced");
    Ok(())
}

/// Resets unit moves and acted flags (fortified units heal), then
/// ticks city production
pub fn start_of_turn(state: &mut GameState, civ_id: CivId, data: &GameData) -> Result<()> {
    let unit_ids: Vec<UnitId> = state
        .units
        .values()
        .filter(|u| u.owner == civ_id)
        .map(|u| u.id)
        .collect();
    for id in unit_ids {
        let spec = data.unit_or_default(&state.unit(id)?.kind);
        state.unit_mut(id)?.begin_turn(&spec);
    }

    let city_ids: Vec<CityId> = state
        .cities
        .values()
        .filter(|c| c.owner == civ_id)
        .map(|c| c.id)
        .collect();
    for id in city_ids {
        let production = state.city_yields(state.city(id)?, data).production;
        let completed = state.city_mut(id)?.accumulate_production(production, data);
        if let Some(item) = completed {
            finish_production(state, id, item, data)?;
        }
    }
    Ok(())
}

fn finish_production(
    state: &mut GameState,
    city_id: CityId,
    item: ProductionItem,
    data: &GameData,
) -> Result<()> {
    state.push_event(GameEvent::ProductionCompleted {
        city: city_id,
        item: item.clone(),
    });
    match item {
        ProductionItem::Building(id) => {
            state.city_mut(city_id)?.buildings.push(id);
        }
        ProductionItem::Unit(kind) => {
            let (owner, pos) = {
                let city = state.city(city_id)?;
                (city.owner, city.pos)
            };
            if let Some(spot) = free_spot(state, pos, owner, data) {
                state.spawn_unit(owner, &kind, spot, data)?;
            } else {
                // No room around the city; the unit is lost and the
                // invested production with it.
                debug!(city = city_id.0, kind, "no free tile for new unit");
            }
        }
    }
    Ok(())
}

/// The city tile itself when free, else the first free neighbor
fn free_spot(state: &GameState, pos: Position, owner: CivId, data: &GameData) -> Option<Position> {
    if state.passable_for(owner, pos, data) {
        return Some(pos);
    }
    state
        .world
        .neighbors(pos, true)
        .into_iter()
        .find(|p| state.passable_for(owner, *p, data))
}

/// Research progress, city growth, and the civilization's treasury
pub fn end_of_turn(state: &mut GameState, civ_id: CivId, data: &GameData) -> Result<()> {
    let city_ids: Vec<CityId> = state
        .cities
        .values()
        .filter(|c| c.owner == civ_id)
        .map(|c| c.id)
        .collect();

    // Base income of 1 keeps young civilizations solvent.
    let mut gold = 1;
    let mut science = 0;
    let mut culture = 0;
    for id in &city_ids {
        let yields = state.city_yields(state.city(*id)?, data);
        gold += yields.gold;
        science += yields.science;
        culture += yields.culture;
        let city = state.city_mut(*id)?;
        if city.accumulate_food(yields.food) {
            let population = city.population;
            state.push_event(GameEvent::PopulationGrew {
                city: *id,
                population,
            });
        }
    }

    let unit_upkeep: i32 = state
        .units
        .values()
        .filter(|u| u.owner == civ_id)
        .map(|u| data.unit_or_default(&u.kind).maintenance as i32)
        .sum();
    let building_upkeep: i32 = city_ids
        .iter()
        .filter_map(|id| state.cities.get(id))
        .flat_map(|c| c.buildings.iter())
        .map(|b| data.building_or_default(b).maintenance as i32)
        .sum();
    gold -= unit_upkeep + building_upkeep;

    let population = state.total_population(civ_id);
    let civ = state.civ_mut(civ_id)?;
    civ.gold += gold;
    civ.culture += culture;
    civ.science_per_turn = science;
    civ.happiness = -(city_ids.len() as i32) - (population as i32) / 2;

    let completed = crate::tech::advance_research(civ, science, data);
    if let Some(tech) = completed {
        state.push_event(GameEvent::ResearchCompleted { civ: civ_id, tech });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::civ::{Civilization, Personality};
    use crate::world::grid::WorldGrid;
    use crate::world::tile::Terrain;

    fn solo_state(terrain: Terrain) -> (GameState, GameData) {
        let data = GameData::builtin();
        let state = GameState::from_world(
            WorldGrid::new(10, 10, terrain),
            vec![Civilization::new(
                CivId(0),
                "Roma",
                "Caesar",
                Personality::Balanced,
                false,
            )],
            31,
        );
        (state, data)
    }

    #[test]
    fn test_production_tick_spawns_unit() {
        let (mut state, data) = solo_state(Terrain::Plains);
        let settler = state
            .spawn_unit(CivId(0), "settler", Position { x: 5, y: 5 }, &data)
            .unwrap();
        let city = state.found_city(settler, "Roma", &data).unwrap();
        state
            .start_production(city, ProductionItem::Unit("warrior".into()), &data)
            .unwrap();
        state.city_mut(city).unwrap().production_stock = 39;

        start_of_turn(&mut state, CivId(0), &data).unwrap();
        assert!(state.city(city).unwrap().producing.is_none());
        assert_eq!(state.civ(CivId(0)).unwrap().units.len(), 1);
        state.validate().unwrap();
    }

    #[test]
    fn test_end_of_turn_pays_maintenance() {
        let (mut state, data) = solo_state(Terrain::Desert);
        state
            .spawn_unit(CivId(0), "warrior", Position { x: 1, y: 1 }, &data)
            .unwrap();
        state.civ_mut(CivId(0)).unwrap().gold = 10;
        end_of_turn(&mut state, CivId(0), &data).unwrap();
        // Base income 1, warrior upkeep 1.
        assert_eq!(state.civ(CivId(0)).unwrap().gold, 10);
    }

    #[test]
    fn test_research_progresses_at_end_of_turn() {
        let (mut state, data) = solo_state(Terrain::Plains);
        let settler = state
            .spawn_unit(CivId(0), "settler", Position { x: 5, y: 5 }, &data)
            .unwrap();
        state.found_city(settler, "Roma", &data).unwrap();
        {
            let civ = state.civ_mut(CivId(0)).unwrap();
            crate::tech::start_research(civ, "pottery", &data).unwrap();
        }
        end_of_turn(&mut state, CivId(0), &data).unwrap();
        let civ = state.civ(CivId(0)).unwrap();
        assert!(civ.research.as_ref().unwrap().progress > 0);
        assert_eq!(civ.science_per_turn, 1);
    }

    #[test]
    fn test_advance_turn_increments_and_reports() {
        let (mut state, data) = solo_state(Terrain::Plains);
        state
            .spawn_unit(CivId(0), "warrior", Position { x: 2, y: 2 }, &data)
            .unwrap();
        advance_turn(&mut state, &data).unwrap();
        assert_eq!(state.turn, 2);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::TurnEnded { turn: 2 }));
    }
}
