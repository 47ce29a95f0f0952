//! Game state: the single source of truth for all entities
//!
//! Units, cities, and civilizations live in arenas keyed by id. Tile
//! occupancy and per-civilization rosters are derived indices that only
//! the mutators in this module touch, so the bidirectional references
//! can be checked in one place (`validate`).

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::core::config::GameConfig;
use crate::core::error::{ActionError, ActionResult, Result, SimError};
use crate::core::types::{CityId, CivId, Position, Turn, UnitId};
use crate::data::{Ability, GameData};
use crate::diplomacy::{RelationState, TradeAgreement};
use crate::entity::city::{City, CITY_MAX_HEALTH};
use crate::entity::civ::Civilization;
use crate::entity::unit::Unit;
use crate::path;
use crate::sim::events::GameEvent;
use crate::world::grid::WorldGrid;
use crate::worldgen::Generator;

/// Minimum Chebyshev distance between any two cities
pub const MIN_CITY_SEPARATION: i32 = 4;
/// Minimum distance between starting positions
const MIN_START_SEPARATION: i32 = 8;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GameState {
    pub world: WorldGrid,
    pub civs: Vec<Civilization>,
    pub units: BTreeMap<UnitId, Unit>,
    pub cities: BTreeMap<CityId, City>,
    /// Pair relation keyed by (smaller, larger) civ id
    pub relations: BTreeMap<(CivId, CivId), RelationState>,
    /// Directional denouncement records: (by, target) -> expiry turn
    pub denouncements: BTreeMap<(CivId, CivId), Turn>,
    pub trades: Vec<TradeAgreement>,
    pub turn: Turn,
    pub rng: ChaCha8Rng,
    #[serde(skip)]
    events: Vec<GameEvent>,
    next_unit_id: u32,
    next_city_id: u32,
}

impl GameState {
    /// Generates a world from the config and places each civilization's
    /// starting settler and warrior
    pub fn new(config: &GameConfig, data: &GameData) -> Result<Self> {
        let world = Generator::new(data, config.resource_chance).generate(
            config.width,
            config.height,
            config.seed,
        );
        let civs = config
            .civs
            .iter()
            .enumerate()
            .map(|(i, setup)| {
                Civilization::new(
                    CivId(i as u32),
                    &setup.name,
                    &setup.leader,
                    setup.personality,
                    setup.is_ai,
                )
            })
            .collect();

        let mut state = Self {
            world,
            civs,
            units: BTreeMap::new(),
            cities: BTreeMap::new(),
            relations: BTreeMap::new(),
            denouncements: BTreeMap::new(),
            trades: Vec::new(),
            turn: 1,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: Vec::new(),
            next_unit_id: 1,
            next_city_id: 1,
        };
        state.place_starting_units(data)?;
        Ok(state)
    }

    /// Builds a state over a prepared world with no starting units.
    /// Used for scripted scenarios and tests.
    pub fn from_world(world: WorldGrid, civs: Vec<Civilization>, seed: u64) -> Self {
        Self {
            world,
            civs,
            units: BTreeMap::new(),
            cities: BTreeMap::new(),
            relations: BTreeMap::new(),
            denouncements: BTreeMap::new(),
            trades: Vec::new(),
            turn: 1,
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: Vec::new(),
            next_unit_id: 1,
            next_city_id: 1,
        }
    }

    fn place_starting_units(&mut self, data: &GameData) -> Result<()> {
        let land: Vec<Position> = self
            .world
            .positions()
            .filter(|p| {
                self.world
                    .tile(*p)
                    .map(|t| data.terrain(t.terrain).is_passable())
                    .unwrap_or(false)
            })
            .collect();
        if land.is_empty() {
            return Err(SimError::InvariantViolation(
                "generated world has no passable tiles".into(),
            ));
        }

        let mut starts: Vec<Position> = Vec::new();
        // Relax the separation requirement rather than fail on small maps.
        for separation in (0..=MIN_START_SEPARATION).rev() {
            starts.clear();
            for _ in 0..200 {
                if starts.len() == self.civs.len() {
                    break;
                }
                let candidate = land[self.rng.gen_range(0..land.len())];
                let far_enough = starts
                    .iter()
                    .all(|s| s.chebyshev_distance(candidate) >= separation);
                if far_enough && !starts.contains(&candidate) {
                    starts.push(candidate);
                }
            }
            if starts.len() == self.civs.len() {
                break;
            }
        }
        if starts.len() < self.civs.len() {
            return Err(SimError::InvariantViolation(
                "could not place starting positions".into(),
            ));
        }

        let civ_ids: Vec<CivId> = self.civs.iter().map(|c| c.id).collect();
        for (civ, start) in civ_ids.into_iter().zip(starts) {
            self.spawn_unit(civ, "settler", start, data)?;
            let escort = self
                .world
                .neighbors(start, true)
                .into_iter()
                .find(|p| self.tile_free_for_unit(*p, data));
            if let Some(pos) = escort {
                self.spawn_unit(civ, "warrior", pos, data)?;
            }
            info!(civ = civ.0, ?start, "civilization placed");
        }
        Ok(())
    }

    // ---- accessors --------------------------------------------------

    pub fn civ(&self, id: CivId) -> Result<&Civilization> {
        self.civs
            .iter()
            .find(|c| c.id == id)
            .ok_or(SimError::CivNotFound(id))
    }

    pub fn civ_mut(&mut self, id: CivId) -> Result<&mut Civilization> {
        self.civs
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SimError::CivNotFound(id))
    }

    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(&id).ok_or(SimError::UnitNotFound(id))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units.get_mut(&id).ok_or(SimError::UnitNotFound(id))
    }

    pub fn city(&self, id: CityId) -> Result<&City> {
        self.cities.get(&id).ok_or(SimError::CityNotFound(id))
    }

    pub fn city_mut(&mut self, id: CityId) -> Result<&mut City> {
        self.cities.get_mut(&id).ok_or(SimError::CityNotFound(id))
    }

    /// Civilizations still in the game, in roster order
    pub fn living_civs(&self) -> impl Iterator<Item = &Civilization> {
        self.civs.iter().filter(|c| !c.is_defeated())
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- relations --------------------------------------------------

    pub fn relation_key(a: CivId, b: CivId) -> (CivId, CivId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn relation(&self, a: CivId, b: CivId) -> RelationState {
        self.relations
            .get(&Self::relation_key(a, b))
            .copied()
            .unwrap_or(RelationState::Peace)
    }

    pub fn set_relation(&mut self, a: CivId, b: CivId, state: RelationState) {
        self.relations.insert(Self::relation_key(a, b), state);
    }

    pub fn at_war(&self, a: CivId, b: CivId) -> bool {
        matches!(self.relation(a, b), RelationState::War)
    }

    pub fn has_denounced(&self, by: CivId, target: CivId) -> bool {
        self.denouncements.contains_key(&(by, target))
    }

    /// Active trades touching both civilizations
    pub fn trades_between(&self, a: CivId, b: CivId) -> usize {
        self.trades
            .iter()
            .filter(|t| (t.a == a && t.b == b) || (t.a == b && t.b == a))
            .count()
    }

    // ---- aggregates -------------------------------------------------

    pub fn total_population(&self, civ: CivId) -> u32 {
        self.cities
            .values()
            .filter(|c| c.owner == civ)
            .map(|c| c.population)
            .sum()
    }

    /// Sum of the stronger of melee/ranged strength over all units
    pub fn military_strength(&self, civ: CivId, data: &GameData) -> i32 {
        self.units
            .values()
            .filter(|u| u.owner == civ)
            .map(|u| {
                let spec = data.unit_or_default(&u.kind);
                spec.strength.max(spec.ranged_strength)
            })
            .sum()
    }

    /// Per-turn city output: worked tiles (the city tile plus the
    /// owned ring around it) plus population science and buildings
    pub fn city_yields(&self, city: &City, data: &GameData) -> crate::data::Yields {
        let mut total = city.building_yields(data);
        if let Some(tile) = self.world.tile(city.pos) {
            total += tile.yields(data);
        }
        for pos in self.world.positions_within(city.pos, 1) {
            if let Some(tile) = self.world.tile(pos) {
                if tile.owner == Some(city.owner) {
                    total += tile.yields(data);
                }
            }
        }
        total
    }

    // ---- unit mutation ----------------------------------------------

    fn tile_free_for_unit(&self, pos: Position, data: &GameData) -> bool {
        self.world
            .tile(pos)
            .map(|t| data.terrain(t.terrain).is_passable() && t.unit.is_none())
            .unwrap_or(false)
    }

    /// Creates a unit on a free passable tile and indexes it on the
    /// tile and the owner's roster
    pub fn spawn_unit(
        &mut self,
        owner: CivId,
        kind: &str,
        pos: Position,
        data: &GameData,
    ) -> Result<UnitId> {
        if !self.tile_free_for_unit(pos, data) {
            return Err(SimError::InvariantViolation(format!(
                "cannot spawn unit at occupied or impassable {pos}"
            )));
        }
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        let spec = data.unit_or_default(kind);
        let unit = Unit::new(id, kind, owner, pos, &spec);
        self.units.insert(id, unit);
        if let Some(tile) = self.world.tile_mut(pos) {
            tile.unit = Some(id);
        }
        self.civ_mut(owner)?.units.insert(id);
        self.push_event(GameEvent::UnitCreated {
            civ: owner,
            unit: id,
            kind: kind.to_string(),
        });
        Ok(id)
    }

    /// Removes a unit from the arena, its tile, and its owner's roster
    /// in one operation
    pub fn remove_unit(&mut self, id: UnitId) -> Result<Unit> {
        let unit = self.units.remove(&id).ok_or(SimError::UnitNotFound(id))?;
        if let Some(tile) = self.world.tile_mut(unit.pos) {
            if tile.unit == Some(id) {
                tile.unit = None;
            }
        }
        self.civ_mut(unit.owner)?.units.remove(&id);
        Ok(unit)
    }

    /// Moves a unit one step to an adjacent tile, spending movement
    pub fn step_unit(&mut self, id: UnitId, to: Position, data: &GameData) -> ActionResult<()> {
        let unit = self.units.get(&id).ok_or(ActionError::NoValidTarget)?;
        if unit.moves_left == 0 {
            return Err(ActionError::NoMovesLeft);
        }
        if unit.pos.chebyshev_distance(to) != 1 {
            return Err(ActionError::OutOfRange);
        }
        let tile = self.world.tile(to).ok_or(ActionError::OutOfBounds)?;
        let terrain = data.terrain(tile.terrain);
        if !terrain.is_passable() {
            return Err(ActionError::Impassable);
        }
        if tile.unit.is_some() {
            return Err(ActionError::TileOccupied);
        }
        if let Some(city) = tile.city {
            let owner = self.cities.get(&city).map(|c| c.owner);
            if owner != Some(unit.owner) {
                return Err(ActionError::TileOccupied);
            }
        }

        let from = unit.pos;
        let cost = terrain.movement_cost;
        if let Some(t) = self.world.tile_mut(from) {
            t.unit = None;
        }
        if let Some(t) = self.world.tile_mut(to) {
            t.unit = Some(id);
        }
        let unit = self.units.get_mut(&id).ok_or(ActionError::NoValidTarget)?;
        unit.pos = to;
        unit.moves_left = unit.moves_left.saturating_sub(cost);
        unit.disturb();
        Ok(())
    }

    /// Walks a unit toward `goal` along the cheapest path until it runs
    /// out of movement or the path is blocked. The goal itself may be
    /// occupied (an enemy unit or city being closed on); the walk then
    /// stops on the last free tile before it. Returns the final tile.
    pub fn move_toward(&mut self, id: UnitId, goal: Position, data: &GameData) -> ActionResult<Position> {
        let unit = self.units.get(&id).ok_or(ActionError::NoValidTarget)?;
        let owner = unit.owner;
        let start = unit.pos;
        let path = path::find_path(&self.world, data, start, goal, |p| {
            p == start || p == goal || self.passable_for(owner, p, data)
        })
        .ok_or(ActionError::NoValidTarget)?;

        let mut reached = start;
        for step in path.into_iter().skip(1) {
            if step == goal && !self.passable_for(owner, goal, data) {
                break;
            }
            match self.step_unit(id, step, data) {
                Ok(()) => reached = step,
                Err(ActionError::NoMovesLeft) => break,
                // A unit moved into the path since it was computed.
                Err(ActionError::TileOccupied) => break,
                Err(e) => return Err(e),
            }
        }
        debug!(unit = id.0, ?goal, ?reached, "unit moved");
        Ok(reached)
    }

    /// Tile can be entered by a unit of `civ`: passable, free of other
    /// units, and not an enemy city
    pub fn passable_for(&self, civ: CivId, pos: Position, data: &GameData) -> bool {
        let Some(tile) = self.world.tile(pos) else {
            return false;
        };
        if !data.terrain(tile.terrain).is_passable() || tile.unit.is_some() {
            return false;
        }
        match tile.city {
            Some(city) => self.cities.get(&city).map(|c| c.owner) == Some(civ),
            None => true,
        }
    }

    pub fn fortify_unit(&mut self, id: UnitId) -> ActionResult<()> {
        let unit = self.units.get_mut(&id).ok_or(ActionError::NoValidTarget)?;
        unit.fortify();
        Ok(())
    }

    pub fn sleep_unit(&mut self, id: UnitId) -> ActionResult<()> {
        let unit = self.units.get_mut(&id).ok_or(ActionError::NoValidTarget)?;
        unit.sleep();
        Ok(())
    }

    pub fn wake_unit(&mut self, id: UnitId) -> ActionResult<()> {
        let unit = self.units.get_mut(&id).ok_or(ActionError::NoValidTarget)?;
        unit.wake();
        Ok(())
    }

    /// Builds `improvement` on the unit's tile. Requires the worker
    /// ability, an owned tile without a city or existing improvement,
    /// and a known unlocking tech when one gates the improvement.
    pub fn build_improvement(
        &mut self,
        unit_id: UnitId,
        improvement: &str,
        data: &GameData,
    ) -> ActionResult<()> {
        let unit = self.units.get(&unit_id).ok_or(ActionError::NoValidTarget)?;
        let spec = data.unit_or_default(&unit.kind);
        if !spec.has_ability(Ability::BuildImprovement) {
            return Err(ActionError::MissingAbility);
        }
        if unit.has_acted {
            return Err(ActionError::AlreadyActed);
        }
        let owner = unit.owner;
        let pos = unit.pos;
        let tile = self.world.tile(pos).ok_or(ActionError::OutOfBounds)?;
        if tile.owner != Some(owner) {
            return Err(ActionError::NotOwnedTile);
        }
        if tile.city.is_some() || tile.improvement.is_some() {
            return Err(ActionError::AlreadyImproved);
        }
        if !self.improvement_unlocked(owner, improvement, data) {
            return Err(ActionError::MissingPrerequisite);
        }

        if let Some(tile) = self.world.tile_mut(pos) {
            tile.improvement = Some(improvement.to_string());
        }
        let unit = self.units.get_mut(&unit_id).ok_or(ActionError::NoValidTarget)?;
        unit.has_acted = true;
        unit.moves_left = 0;
        debug!(unit = unit_id.0, improvement, %pos, "improvement built");
        Ok(())
    }

    /// An improvement gated by a tech unlock needs that tech known;
    /// improvements no tech lists are free from the start
    pub fn improvement_unlocked(&self, civ: CivId, improvement: &str, data: &GameData) -> bool {
        let gating: Vec<&String> = data
            .techs
            .iter()
            .filter(|(_, spec)| spec.unlocks.iter().any(|u| u == improvement))
            .map(|(id, _)| id)
            .collect();
        if gating.is_empty() {
            return true;
        }
        match self.civ(civ) {
            Ok(c) => gating.iter().any(|t| c.knows_tech(t)),
            Err(_) => false,
        }
    }

    /// Queues an item in a city's single production slot
    pub fn start_production(
        &mut self,
        city_id: CityId,
        item: crate::entity::city::ProductionItem,
        data: &GameData,
    ) -> ActionResult<()> {
        use crate::entity::city::ProductionItem;
        let city = self.cities.get(&city_id).ok_or(ActionError::NoValidTarget)?;
        if city.producing.is_some() {
            return Err(ActionError::ProductionBusy);
        }
        let owner = city.owner;
        match &item {
            ProductionItem::Unit(id) => {
                let spec = data.unit(id).ok_or(ActionError::ItemUnavailable)?;
                let civ = self.civ(owner).map_err(|_| ActionError::NoValidTarget)?;
                if !crate::tech::meets_requirement(civ, &spec.requires_tech) {
                    return Err(ActionError::MissingPrerequisite);
                }
            }
            ProductionItem::Building(id) => {
                let spec = data.building(id).ok_or(ActionError::ItemUnavailable)?;
                if city.has_building(id) {
                    return Err(ActionError::ItemUnavailable);
                }
                if let Some(required) = &spec.requires_building {
                    if !city.has_building(required) {
                        return Err(ActionError::MissingPrerequisite);
                    }
                }
                let civ = self.civ(owner).map_err(|_| ActionError::NoValidTarget)?;
                if !crate::tech::meets_requirement(civ, &spec.requires_tech) {
                    return Err(ActionError::MissingPrerequisite);
                }
            }
        }
        let city = self.cities.get_mut(&city_id).ok_or(ActionError::NoValidTarget)?;
        city.producing = Some(item);
        Ok(())
    }

    pub fn clear_production(&mut self, city_id: CityId) -> ActionResult<()> {
        let city = self.cities.get_mut(&city_id).ok_or(ActionError::NoValidTarget)?;
        city.producing = None;
        Ok(())
    }

    // ---- city mutation ----------------------------------------------

    /// Consumes a settler to found a city, claiming the founding tile
    /// and the unowned ring around it
    pub fn found_city(&mut self, unit_id: UnitId, name: &str, data: &GameData) -> ActionResult<CityId> {
        let unit = self.units.get(&unit_id).ok_or(ActionError::NoValidTarget)?;
        let spec = data.unit_or_default(&unit.kind);
        if !spec.has_ability(Ability::FoundCity) {
            return Err(ActionError::MissingAbility);
        }
        if unit.has_acted {
            return Err(ActionError::AlreadyActed);
        }
        let pos = unit.pos;
        let owner = unit.owner;
        let tile = self.world.tile(pos).ok_or(ActionError::OutOfBounds)?;
        if !tile.terrain.is_land() || tile.city.is_some() {
            return Err(ActionError::UnsuitableTile);
        }
        if self
            .cities
            .values()
            .any(|c| c.pos.chebyshev_distance(pos) < MIN_CITY_SEPARATION)
        {
            return Err(ActionError::TooCloseToCity);
        }

        // The settler is consumed first so the tile occupancy is clear.
        let _ = self.remove_unit(unit_id).map_err(|_| ActionError::NoValidTarget)?;

        let id = CityId(self.next_city_id);
        self.next_city_id += 1;
        self.cities.insert(id, City::new(id, name, owner, pos));
        if let Some(tile) = self.world.tile_mut(pos) {
            tile.city = Some(id);
            tile.owner = Some(owner);
        }
        for ring in self.world.positions_within(pos, 1) {
            if let Some(tile) = self.world.tile_mut(ring) {
                if tile.owner.is_none() {
                    tile.owner = Some(owner);
                }
            }
        }
        if let Ok(civ) = self.civ_mut(owner) {
            civ.cities.insert(id);
        }
        info!(city = id.0, name, civ = owner.0, %pos, "city founded");
        self.push_event(GameEvent::CityFounded {
            civ: owner,
            city: id,
            pos,
        });
        Ok(id)
    }

    /// Transfers a city to the conqueror at half health
    pub fn capture_city(&mut self, city_id: CityId, to: CivId) -> Result<()> {
        let (from, pos) = {
            let city = self.city(city_id)?;
            (city.owner, city.pos)
        };
        self.civ_mut(from)?.cities.remove(&city_id);
        self.civ_mut(to)?.cities.insert(city_id);
        let city = self.city_mut(city_id)?;
        city.owner = to;
        city.health = CITY_MAX_HEALTH / 2;
        city.producing = None;
        city.production_stock = 0;
        if let Some(tile) = self.world.tile_mut(pos) {
            tile.owner = Some(to);
        }
        info!(city = city_id.0, from = from.0, to = to.0, "city captured");
        self.push_event(GameEvent::CityCaptured {
            city: city_id,
            from,
            to,
        });
        Ok(())
    }

    // ---- consistency ------------------------------------------------

    /// Checks every bidirectional reference between the arenas, the
    /// grid occupancy fields, and the civilization rosters
    pub fn validate(&self) -> Result<()> {
        for (id, unit) in &self.units {
            let tile = self
                .world
                .tile(unit.pos)
                .ok_or_else(|| SimError::InvariantViolation(format!("unit {id:?} off-map")))?;
            if tile.unit != Some(*id) {
                return Err(SimError::InvariantViolation(format!(
                    "unit {id:?} not indexed on its tile"
                )));
            }
            if !self.civ(unit.owner)?.units.contains(id) {
                return Err(SimError::InvariantViolation(format!(
                    "unit {id:?} missing from owner roster"
                )));
            }
        }
        for (id, city) in &self.cities {
            let tile = self
                .world
                .tile(city.pos)
                .ok_or_else(|| SimError::InvariantViolation(format!("city {id:?} off-map")))?;
            if tile.city != Some(*id) {
                return Err(SimError::InvariantViolation(format!(
                    "city {id:?} not indexed on its tile"
                )));
            }
            if !self.civ(city.owner)?.cities.contains(id) {
                return Err(SimError::InvariantViolation(format!(
                    "city {id:?} missing from owner roster"
                )));
            }
        }
        for civ in &self.civs {
            for unit in &civ.units {
                if self.units.get(unit).map(|u| u.owner) != Some(civ.id) {
                    return Err(SimError::InvariantViolation(format!(
                        "roster of civ {:?} lists foreign or dead unit {unit:?}",
                        civ.id
                    )));
                }
            }
            for city in &civ.cities {
                if self.cities.get(city).map(|c| c.owner) != Some(civ.id) {
                    return Err(SimError::InvariantViolation(format!(
                        "roster of civ {:?} lists foreign or dead city {city:?}",
                        civ.id
                    )));
                }
            }
        }
        Ok(())
    }
}
