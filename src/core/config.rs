//! Game setup configuration with documented constants

use serde::{Deserialize, Serialize};

use crate::entity::civ::Personality;

/// Configuration for a new game
///
/// Identical configuration (including seed) always produces an identical
/// starting state, which the save/replay contract depends on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// World width in tiles
    pub width: u32,
    /// World height in tiles
    pub height: u32,
    /// Seed for terrain, resources, starting positions and all AI rolls
    pub seed: u64,
    /// Per-tile probability of a resource during world generation
    ///
    /// Only resources whose valid-terrain list contains the tile's terrain
    /// are eligible; a roll with no eligible resource places nothing.
    pub resource_chance: f64,
    /// The civilizations to spawn, in processing order.
    /// The first non-AI entry (if any) is the human player.
    pub civs: Vec<CivSetup>,
}

/// One civilization in the starting roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CivSetup {
    pub name: String,
    pub leader: String,
    pub personality: Personality,
    pub is_ai: bool,
}

impl CivSetup {
    pub fn ai(name: &str, leader: &str, personality: Personality) -> Self {
        Self {
            name: name.to_string(),
            leader: leader.to_string(),
            personality,
            is_ai: true,
        }
    }

    pub fn human(name: &str, leader: &str) -> Self {
        Self {
            name: name.to_string(),
            leader: leader.to_string(),
            personality: Personality::Balanced,
            is_ai: false,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            seed: 12345,
            resource_chance: 0.1,
            civs: vec![
                CivSetup::human("Roma", "Caesar"),
                CivSetup::ai("Hellas", "Alexandros", Personality::Aggressive),
                CivSetup::ai("Babylon", "Hammurabi", Personality::Scientific),
                CivSetup::ai("Kemet", "Hatshepsut", Personality::Expansionist),
            ],
        }
    }
}
