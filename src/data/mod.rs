//! Static game data tables
//!
//! The simulation core consumes five tables (technologies, units, buildings,
//! terrains, resources) loaded once at startup into immutable typed structs.
//! Lookups for missing keys fall back to documented defaults and log a
//! warning rather than aborting turn processing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::Result;
use crate::world::tile::Terrain;

/// Movement cost at or above which terrain is impassable
pub const IMPASSABLE_COST: u32 = 999;

/// Historical era of a technology, used by AI research weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    #[default]
    Ancient,
    Classical,
    Medieval,
    Renaissance,
    Industrial,
    Modern,
    Atomic,
    Information,
}

impl Era {
    /// Earlier eras are weighted higher so the AI fills in its tree
    /// before chasing late-game technologies.
    pub fn research_weight(&self) -> f32 {
        match self {
            Era::Ancient => 1.2,
            Era::Classical => 1.1,
            Era::Medieval => 1.0,
            Era::Renaissance => 0.9,
            Era::Industrial => 0.8,
            Era::Modern => 0.7,
            Era::Atomic => 0.6,
            Era::Information => 0.5,
        }
    }
}

/// Per-turn resource output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Yields {
    pub food: i32,
    pub production: i32,
    pub gold: i32,
    pub science: i32,
    pub culture: i32,
}

impl std::ops::Add for Yields {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            food: self.food + rhs.food,
            production: self.production + rhs.production,
            gold: self.gold + rhs.gold,
            science: self.science + rhs.science,
            culture: self.culture + rhs.culture,
        }
    }
}

impl std::ops::AddAssign for Yields {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TechSpec {
    pub name: String,
    pub cost: u32,
    pub prerequisites: Vec<String>,
    /// Unit/building ids this technology makes available
    pub unlocks: Vec<String>,
    pub era: Era,
}

impl Default for TechSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            cost: 50,
            prerequisites: Vec::new(),
            unlocks: Vec::new(),
            era: Era::Ancient,
        }
    }
}

/// Special capability of a unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    FoundCity,
    BuildImprovement,
    AntiCavalry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSpec {
    pub name: String,
    pub cost: u32,
    pub maintenance: u32,
    pub movement: u32,
    pub strength: i32,
    pub ranged_strength: i32,
    pub range: i32,
    pub abilities: Vec<Ability>,
    pub requires_tech: Option<String>,
}

impl Default for UnitSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            cost: 50,
            maintenance: 1,
            movement: 2,
            strength: 0,
            ranged_strength: 0,
            range: 0,
            abilities: Vec::new(),
            requires_tech: None,
        }
    }
}

impl UnitSpec {
    pub fn is_military(&self) -> bool {
        self.strength > 0 || self.ranged_strength > 0
    }

    /// Ranged strength when present, melee strength otherwise
    pub fn attack_strength(&self) -> i32 {
        if self.ranged_strength > 0 {
            self.ranged_strength
        } else {
            self.strength
        }
    }

    pub fn has_ability(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingSpec {
    pub name: String,
    pub cost: u32,
    pub maintenance: u32,
    pub effects: Yields,
    pub defense: i32,
    pub requires_tech: Option<String>,
    pub requires_building: Option<String>,
    pub is_wonder: bool,
}

impl Default for BuildingSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            cost: 60,
            maintenance: 1,
            effects: Yields::default(),
            defense: 0,
            requires_tech: None,
            requires_building: None,
            is_wonder: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSpec {
    pub movement_cost: u32,
    pub food: i32,
    pub production: i32,
    pub gold: i32,
}

impl Default for TerrainSpec {
    fn default() -> Self {
        Self {
            movement_cost: 1,
            food: 0,
            production: 0,
            gold: 0,
        }
    }
}

impl TerrainSpec {
    pub fn is_passable(&self) -> bool {
        self.movement_cost < IMPASSABLE_COST
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[default]
    Bonus,
    Luxury,
    Strategic,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSpec {
    pub name: String,
    pub yields: Yields,
    pub valid_terrains: Vec<Terrain>,
    pub requires_tech: Option<String>,
    pub kind: ResourceKind,
    /// Improvement that harvests this resource, if any
    pub improvement: Option<String>,
}

/// All static tables, loaded once and never mutated during a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub techs: BTreeMap<String, TechSpec>,
    pub units: BTreeMap<String, UnitSpec>,
    pub buildings: BTreeMap<String, BuildingSpec>,
    pub terrains: BTreeMap<Terrain, TerrainSpec>,
    pub resources: BTreeMap<String, ResourceSpec>,
}

impl GameData {
    /// Load tables from a directory of JSON files, falling back to the
    /// builtin table for any file that is absent.
    ///
    /// Expected files: `technologies.json`, `units.json`, `buildings.json`,
    /// `terrains.json`, `resources.json`.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut data = Self::builtin();

        if let Some(table) = load_table(dir, "technologies.json")? {
            data.techs = table;
        }
        if let Some(table) = load_table(dir, "units.json")? {
            data.units = table;
        }
        if let Some(table) = load_table(dir, "buildings.json")? {
            data.buildings = table;
        }
        if let Some(table) = load_table(dir, "terrains.json")? {
            data.terrains = table;
        }
        if let Some(table) = load_table(dir, "resources.json")? {
            data.resources = table;
        }

        Ok(data)
    }

    pub fn tech(&self, id: &str) -> Option<&TechSpec> {
        self.techs.get(id)
    }

    /// Lookup with the documented default fallback (cost 50, no prerequisites)
    pub fn tech_or_default(&self, id: &str) -> TechSpec {
        self.techs.get(id).cloned().unwrap_or_else(|| {
            warn!(tech = id, "unknown technology id, using defaults");
            TechSpec {
                name: id.to_string(),
                ..TechSpec::default()
            }
        })
    }

    pub fn unit(&self, id: &str) -> Option<&UnitSpec> {
        self.units.get(id)
    }

    /// Lookup with the documented default fallback (cost 50, movement 2, civilian)
    pub fn unit_or_default(&self, id: &str) -> UnitSpec {
        self.units.get(id).cloned().unwrap_or_else(|| {
            warn!(unit = id, "unknown unit id, using defaults");
            UnitSpec {
                name: id.to_string(),
                ..UnitSpec::default()
            }
        })
    }

    pub fn building(&self, id: &str) -> Option<&BuildingSpec> {
        self.buildings.get(id)
    }

    /// Lookup with the documented default fallback (cost 60, empty effects)
    pub fn building_or_default(&self, id: &str) -> BuildingSpec {
        self.buildings.get(id).cloned().unwrap_or_else(|| {
            warn!(building = id, "unknown building id, using defaults");
            BuildingSpec {
                name: id.to_string(),
                ..BuildingSpec::default()
            }
        })
    }

    pub fn terrain(&self, terrain: Terrain) -> TerrainSpec {
        self.terrains.get(&terrain).copied().unwrap_or_else(|| {
            warn!(?terrain, "terrain missing from table, using defaults");
            TerrainSpec::default()
        })
    }

    pub fn resource(&self, id: &str) -> Option<&ResourceSpec> {
        self.resources.get(id)
    }

    /// The builtin tables used when no data directory is supplied
    pub fn builtin() -> Self {
        Self {
            techs: builtin_techs(),
            units: builtin_units(),
            buildings: builtin_buildings(),
            terrains: builtin_terrains(),
            resources: builtin_resources(),
        }
    }
}

fn load_table<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<Option<T>> {
    let path = dir.join(file);
    if !path.exists() {
        debug!(file, "data file absent, keeping builtin table");
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn tech(name: &str, cost: u32, prereqs: &[&str], unlocks: &[&str], era: Era) -> TechSpec {
    TechSpec {
        name: name.to_string(),
        cost,
        prerequisites: prereqs.iter().map(|s| s.to_string()).collect(),
        unlocks: unlocks.iter().map(|s| s.to_string()).collect(),
        era,
    }
}

fn builtin_techs() -> BTreeMap<String, TechSpec> {
    let mut t = BTreeMap::new();
    t.insert(
        "agriculture".into(),
        tech("Agriculture", 50, &[], &["farm"], Era::Ancient),
    );
    t.insert(
        "animal_husbandry".into(),
        tech("Animal Husbandry", 60, &[], &["pasture"], Era::Ancient),
    );
    t.insert(
        "mining".into(),
        tech("Mining", 60, &[], &["mine"], Era::Ancient),
    );
    t.insert(
        "pottery".into(),
        tech("Pottery", 50, &[], &["granary"], Era::Ancient),
    );
    t.insert(
        "archery".into(),
        tech("Archery", 70, &["animal_husbandry"], &["archer"], Era::Ancient),
    );
    t.insert(
        "bronze_working".into(),
        tech(
            "Bronze Working",
            80,
            &["mining"],
            &["spearman", "barracks"],
            Era::Ancient,
        ),
    );
    t.insert(
        "masonry".into(),
        tech("Masonry", 80, &["mining"], &["walls", "pyramids"], Era::Ancient),
    );
    t.insert(
        "wheel".into(),
        tech("The Wheel", 80, &["animal_husbandry"], &["water_mill"], Era::Ancient),
    );
    t.insert(
        "iron_working".into(),
        tech("Iron Working", 90, &["bronze_working"], &[], Era::Classical),
    );
    t.insert(
        "writing".into(),
        tech("Writing", 120, &["pottery"], &["library"], Era::Classical),
    );
    t.insert(
        "currency".into(),
        tech("Currency", 100, &["bronze_working"], &["market"], Era::Classical),
    );
    t
}

fn builtin_units() -> BTreeMap<String, UnitSpec> {
    let mut u = BTreeMap::new();
    u.insert(
        "settler".into(),
        UnitSpec {
            name: "Settler".into(),
            cost: 80,
            abilities: vec![Ability::FoundCity],
            ..UnitSpec::default()
        },
    );
    u.insert(
        "worker".into(),
        UnitSpec {
            name: "Worker".into(),
            cost: 50,
            abilities: vec![Ability::BuildImprovement],
            ..UnitSpec::default()
        },
    );
    u.insert(
        "warrior".into(),
        UnitSpec {
            name: "Warrior".into(),
            cost: 40,
            strength: 10,
            ..UnitSpec::default()
        },
    );
    u.insert(
        "archer".into(),
        UnitSpec {
            name: "Archer".into(),
            cost: 60,
            maintenance: 2,
            strength: 5,
            ranged_strength: 15,
            range: 2,
            requires_tech: Some("archery".into()),
            ..UnitSpec::default()
        },
    );
    u.insert(
        "spearman".into(),
        UnitSpec {
            name: "Spearman".into(),
            cost: 50,
            strength: 15,
            abilities: vec![Ability::AntiCavalry],
            requires_tech: Some("bronze_working".into()),
            ..UnitSpec::default()
        },
    );
    u
}

fn builtin_buildings() -> BTreeMap<String, BuildingSpec> {
    let mut b = BTreeMap::new();
    b.insert(
        "granary".into(),
        BuildingSpec {
            name: "Granary".into(),
            cost: 60,
            effects: Yields {
                food: 2,
                ..Yields::default()
            },
            requires_tech: Some("pottery".into()),
            ..BuildingSpec::default()
        },
    );
    b.insert(
        "monument".into(),
        BuildingSpec {
            name: "Monument".into(),
            cost: 40,
            effects: Yields {
                culture: 2,
                ..Yields::default()
            },
            ..BuildingSpec::default()
        },
    );
    b.insert(
        "library".into(),
        BuildingSpec {
            name: "Library".into(),
            cost: 80,
            effects: Yields {
                science: 2,
                ..Yields::default()
            },
            requires_tech: Some("writing".into()),
            ..BuildingSpec::default()
        },
    );
    b.insert(
        "barracks".into(),
        BuildingSpec {
            name: "Barracks".into(),
            cost: 70,
            requires_tech: Some("bronze_working".into()),
            ..BuildingSpec::default()
        },
    );
    b.insert(
        "walls".into(),
        BuildingSpec {
            name: "Walls".into(),
            cost: 100,
            defense: 5,
            requires_tech: Some("masonry".into()),
            ..BuildingSpec::default()
        },
    );
    b.insert(
        "market".into(),
        BuildingSpec {
            name: "Market".into(),
            cost: 120,
            effects: Yields {
                gold: 3,
                ..Yields::default()
            },
            requires_tech: Some("currency".into()),
            ..BuildingSpec::default()
        },
    );
    b.insert(
        "water_mill".into(),
        BuildingSpec {
            name: "Water Mill".into(),
            cost: 100,
            effects: Yields {
                food: 1,
                production: 1,
                ..Yields::default()
            },
            requires_tech: Some("wheel".into()),
            ..BuildingSpec::default()
        },
    );
    b.insert(
        "pyramids".into(),
        BuildingSpec {
            name: "Pyramids".into(),
            cost: 220,
            effects: Yields {
                culture: 2,
                ..Yields::default()
            },
            requires_tech: Some("masonry".into()),
            is_wonder: true,
            ..BuildingSpec::default()
        },
    );
    b
}

fn builtin_terrains() -> BTreeMap<Terrain, TerrainSpec> {
    let mut t = BTreeMap::new();
    t.insert(
        Terrain::Plains,
        TerrainSpec {
            movement_cost: 1,
            food: 1,
            production: 1,
            gold: 0,
        },
    );
    t.insert(
        Terrain::Hills,
        TerrainSpec {
            movement_cost: 2,
            food: 0,
            production: 2,
            gold: 0,
        },
    );
    t.insert(
        Terrain::Mountains,
        TerrainSpec {
            movement_cost: IMPASSABLE_COST,
            food: 0,
            production: 0,
            gold: 0,
        },
    );
    t.insert(
        Terrain::Forest,
        TerrainSpec {
            movement_cost: 2,
            food: 1,
            production: 1,
            gold: 0,
        },
    );
    t.insert(
        Terrain::Desert,
        TerrainSpec {
            movement_cost: 1,
            food: 0,
            production: 0,
            gold: 0,
        },
    );
    t.insert(
        Terrain::Water,
        TerrainSpec {
            movement_cost: IMPASSABLE_COST,
            food: 1,
            production: 0,
            gold: 1,
        },
    );
    t
}

fn builtin_resources() -> BTreeMap<String, ResourceSpec> {
    let mut r = BTreeMap::new();
    r.insert(
        "cattle".into(),
        ResourceSpec {
            name: "Cattle".into(),
            yields: Yields {
                food: 1,
                ..Yields::default()
            },
            valid_terrains: vec![Terrain::Plains],
            requires_tech: Some("animal_husbandry".into()),
            improvement: Some("pasture".into()),
            ..ResourceSpec::default()
        },
    );
    r.insert(
        "wheat".into(),
        ResourceSpec {
            name: "Wheat".into(),
            yields: Yields {
                food: 2,
                ..Yields::default()
            },
            valid_terrains: vec![Terrain::Plains],
            requires_tech: Some("agriculture".into()),
            improvement: Some("farm".into()),
            ..ResourceSpec::default()
        },
    );
    r.insert(
        "iron".into(),
        ResourceSpec {
            name: "Iron".into(),
            yields: Yields {
                production: 1,
                ..Yields::default()
            },
            valid_terrains: vec![Terrain::Plains, Terrain::Hills],
            requires_tech: Some("iron_working".into()),
            kind: ResourceKind::Strategic,
            improvement: Some("mine".into()),
            ..ResourceSpec::default()
        },
    );
    r.insert(
        "horses".into(),
        ResourceSpec {
            name: "Horses".into(),
            yields: Yields {
                production: 1,
                ..Yields::default()
            },
            valid_terrains: vec![Terrain::Plains],
            requires_tech: Some("animal_husbandry".into()),
            kind: ResourceKind::Strategic,
            improvement: Some("pasture".into()),
            ..ResourceSpec::default()
        },
    );
    r.insert(
        "stone".into(),
        ResourceSpec {
            name: "Stone".into(),
            yields: Yields {
                production: 1,
                ..Yields::default()
            },
            valid_terrains: vec![Terrain::Plains, Terrain::Hills],
            requires_tech: Some("mining".into()),
            improvement: Some("mine".into()),
            ..ResourceSpec::default()
        },
    );
    r.insert(
        "gold_ore".into(),
        ResourceSpec {
            name: "Gold Ore".into(),
            yields: Yields {
                gold: 2,
                ..Yields::default()
            },
            valid_terrains: vec![Terrain::Hills],
            requires_tech: Some("mining".into()),
            kind: ResourceKind::Luxury,
            improvement: Some("mine".into()),
            ..ResourceSpec::default()
        },
    );
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_consistent() {
        let data = GameData::builtin();

        // Every prerequisite and unlock must resolve somewhere.
        for (id, spec) in &data.techs {
            for prereq in &spec.prerequisites {
                assert!(data.techs.contains_key(prereq), "{id}: missing prereq {prereq}");
            }
            for unlock in &spec.unlocks {
                assert!(
                    data.units.contains_key(unlock)
                        || data.buildings.contains_key(unlock)
                        || matches!(unlock.as_str(), "farm" | "mine" | "pasture"),
                    "{id}: dangling unlock {unlock}"
                );
            }
        }

        // Required techs on units/buildings must exist.
        for spec in data.units.values() {
            if let Some(t) = &spec.requires_tech {
                assert!(data.techs.contains_key(t));
            }
        }
        for spec in data.buildings.values() {
            if let Some(t) = &spec.requires_tech {
                assert!(data.techs.contains_key(t));
            }
        }

        // Resources only name terrains present in the terrain table.
        for spec in data.resources.values() {
            for terrain in &spec.valid_terrains {
                assert!(data.terrains.contains_key(terrain));
            }
        }
    }

    #[test]
    fn test_missing_key_falls_back_to_defaults() {
        let data = GameData::builtin();
        let spec = data.unit_or_default("chariot");
        assert_eq!(spec.cost, 50);
        assert_eq!(spec.movement, 2);
        assert!(!spec.is_military());

        let tech = data.tech_or_default("flight");
        assert_eq!(tech.cost, 50);
        assert!(tech.prerequisites.is_empty());
    }

    #[test]
    fn test_attack_strength_prefers_ranged() {
        let data = GameData::builtin();
        let archer = data.unit("archer").unwrap();
        assert_eq!(archer.attack_strength(), 15);
        let warrior = data.unit("warrior").unwrap();
        assert_eq!(warrior.attack_strength(), 10);
    }
}
