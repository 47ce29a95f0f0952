//! City entities: growth accumulator, production queue, defense

use serde::{Deserialize, Serialize};

use crate::core::types::{CityId, CivId, Position};
use crate::data::{GameData, Yields};

pub const CITY_MAX_HEALTH: i32 = 100;
pub const CITY_BASE_DEFENSE: i32 = 10;
/// Food needed to grow is population times this factor
pub const GROWTH_FACTOR: i32 = 10;

/// What a city is currently producing. Ordered so scoring ties break
/// the same way every run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionItem {
    Unit(String),
    Building(String),
}

impl ProductionItem {
    pub fn cost(&self, data: &GameData) -> u32 {
        match self {
            ProductionItem::Unit(id) => data.unit_or_default(id).cost,
            ProductionItem::Building(id) => data.building_or_default(id).cost,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub owner: CivId,
    pub pos: Position,
    pub population: u32,
    pub health: i32,
    pub food: i32,
    pub production_stock: i32,
    pub buildings: Vec<String>,
    pub producing: Option<ProductionItem>,
}

impl City {
    pub fn new(id: CityId, name: &str, owner: CivId, pos: Position) -> Self {
        Self {
            id,
            name: name.to_string(),
            owner,
            pos,
            population: 1,
            health: CITY_MAX_HEALTH,
            food: 0,
            production_stock: 0,
            buildings: Vec::new(),
            producing: None,
        }
    }

    pub fn has_building(&self, id: &str) -> bool {
        self.buildings.iter().any(|b| b == id)
    }

    /// Total per-turn output: worked-tile yields are summed by the
    /// caller (which owns the grid); this adds population science,
    /// building effects, and the base city tile
    pub fn building_yields(&self, data: &GameData) -> Yields {
        let mut total = Yields {
            science: self.population as i32,
            ..Yields::default()
        };
        for building in &self.buildings {
            if let Some(spec) = data.building(building) {
                total += spec.effects;
            }
        }
        total
    }

    pub fn defense_strength(&self, data: &GameData) -> i32 {
        let walls: i32 = self
            .buildings
            .iter()
            .filter_map(|b| data.building(b))
            .map(|spec| spec.defense)
            .sum();
        CITY_BASE_DEFENSE + self.population as i32 + walls
    }

    /// Food required before the next population point
    pub fn growth_threshold(&self) -> i32 {
        self.population as i32 * GROWTH_FACTOR
    }

    /// Accumulates food and grows when the threshold is met; surplus
    /// does not carry over. Returns true on growth.
    pub fn accumulate_food(&mut self, food: i32) -> bool {
        self.food += food;
        if self.food >= self.growth_threshold() {
            self.population += 1;
            self.food = 0;
            true
        } else {
            false
        }
    }

    /// Adds production toward the current item; returns the finished
    /// item when its cost is met
    pub fn accumulate_production(&mut self, production: i32, data: &GameData) -> Option<ProductionItem> {
        let item = self.producing.as_ref()?;
        let cost = item.cost(data) as i32;
        self.production_stock += production.max(0);
        if self.production_stock >= cost {
            self.production_stock -= cost;
            self.producing.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city() -> City {
        City::new(CityId(1), "Testopolis", CivId(0), Position { x: 5, y: 5 })
    }

    #[test]
    fn test_growth_resets_food() {
        let mut c = city();
        assert!(!c.accumulate_food(8));
        assert!(c.accumulate_food(2));
        assert_eq!(c.population, 2);
        assert_eq!(c.food, 0);
        // Threshold scales with population.
        assert_eq!(c.growth_threshold(), 20);
    }

    #[test]
    fn test_production_completes_and_clears_slot() {
        let data = GameData::builtin();
        let mut c = city();
        c.producing = Some(ProductionItem::Unit("warrior".into()));
        assert!(c.accumulate_production(30, &data).is_none());
        let done = c.accumulate_production(15, &data);
        assert_eq!(done, Some(ProductionItem::Unit("warrior".into())));
        assert!(c.producing.is_none());
        // Cost 40, 45 invested: 5 carries over.
        assert_eq!(c.production_stock, 5);
    }

    #[test]
    fn test_defense_scales_with_walls_and_population() {
        let data = GameData::builtin();
        let mut c = city();
        assert_eq!(c.defense_strength(&data), 11);
        c.population = 4;
        c.buildings.push("walls".into());
        assert_eq!(c.defense_strength(&data), 19);
    }
}
