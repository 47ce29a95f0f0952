//! Civilizations: roster indices, treasury, research slot

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{CityId, CivId, UnitId};

/// Leader temperament; drives AI priority deltas and the opinion
/// personality term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[default]
    Balanced,
    Aggressive,
    Defensive,
    Expansionist,
    Scientific,
    Friendly,
}

/// Single-slot research accumulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Research {
    pub tech: String,
    pub progress: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Civilization {
    pub id: CivId,
    pub name: String,
    pub leader: String,
    pub personality: Personality,
    pub is_ai: bool,
    pub gold: i32,
    pub culture: i32,
    /// Recomputed each turn, kept for standings display
    pub science_per_turn: i32,
    pub happiness: i32,
    pub technologies: BTreeSet<String>,
    pub research: Option<Research>,
    /// Derived roster indices, maintained by the game state mutators
    pub units: BTreeSet<UnitId>,
    pub cities: BTreeSet<CityId>,
    /// Civilizations this one has ever been at war with; never pruned
    pub war_history: BTreeSet<CivId>,
}

impl Civilization {
    pub fn new(id: CivId, name: &str, leader: &str, personality: Personality, is_ai: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            leader: leader.to_string(),
            personality,
            is_ai,
            gold: 0,
            culture: 0,
            science_per_turn: 0,
            happiness: 0,
            technologies: BTreeSet::new(),
            research: None,
            units: BTreeSet::new(),
            cities: BTreeSet::new(),
            war_history: BTreeSet::new(),
        }
    }

    pub fn knows_tech(&self, tech: &str) -> bool {
        self.technologies.contains(tech)
    }

    /// A civilization with nothing left on the map is out of the game
    pub fn is_defeated(&self) -> bool {
        self.units.is_empty() && self.cities.is_empty()
    }
}
