//! Map tiles and terrain classification

use serde::{Deserialize, Serialize};

use crate::core::types::{CityId, CivId, UnitId};
use crate::data::{GameData, Yields};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Plains,
    Hills,
    Mountains,
    Forest,
    Desert,
    Water,
}

impl Terrain {
    pub fn is_land(&self) -> bool {
        !matches!(self, Terrain::Water)
    }
}

/// One map cell, with derived occupancy indices kept in sync by the
/// game state mutators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    pub resource: Option<String>,
    pub improvement: Option<String>,
    pub owner: Option<CivId>,
    pub unit: Option<UnitId>,
    pub city: Option<CityId>,
}

impl Tile {
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            resource: None,
            improvement: None,
            owner: None,
            unit: None,
            city: None,
        }
    }

    /// Combined output: terrain base, plus resource, plus improvement
    pub fn yields(&self, data: &GameData) -> Yields {
        let terrain = data.terrain(self.terrain);
        let mut total = Yields {
            food: terrain.food,
            production: terrain.production,
            gold: terrain.gold,
            ..Yields::default()
        };
        if let Some(resource) = &self.resource {
            if let Some(spec) = data.resource(resource) {
                total += spec.yields;
            }
        }
        if let Some(improvement) = &self.improvement {
            total += improvement_yields(improvement);
        }
        total
    }
}

/// Flat bonus granted by a worker-built improvement
pub fn improvement_yields(improvement: &str) -> Yields {
    match improvement {
        "farm" | "pasture" => Yields {
            food: 1,
            ..Yields::default()
        },
        "mine" | "lumber_mill" => Yields {
            production: 1,
            ..Yields::default()
        },
        "trading_post" => Yields {
            gold: 1,
            ..Yields::default()
        },
        _ => Yields::default(),
    }
}
