//! Unit entities

use serde::{Deserialize, Serialize};

use crate::core::types::{CivId, Position, UnitId};
use crate::data::UnitSpec;

pub const UNIT_MAX_HEALTH: i32 = 100;
/// Health restored per turn while fortified
pub const FORTIFY_HEAL: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Active,
    /// Holding position; heals each turn and skips AI orders
    Fortified,
    /// Skipped until explicitly woken
    Sleeping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Key into the unit data table
    pub kind: String,
    pub owner: CivId,
    pub pos: Position,
    pub health: i32,
    pub moves_left: u32,
    pub has_acted: bool,
    pub status: UnitStatus,
}

impl Unit {
    pub fn new(id: UnitId, kind: &str, owner: CivId, pos: Position, spec: &UnitSpec) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            owner,
            pos,
            health: UNIT_MAX_HEALTH,
            moves_left: spec.movement,
            has_acted: false,
            status: UnitStatus::Active,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Start-of-turn reset: moves restore, the acted flag clears, and
    /// fortified units heal
    pub fn begin_turn(&mut self, spec: &UnitSpec) {
        self.moves_left = spec.movement;
        self.has_acted = false;
        if self.status == UnitStatus::Fortified {
            self.health = (self.health + FORTIFY_HEAL).min(UNIT_MAX_HEALTH);
        }
    }

    pub fn fortify(&mut self) {
        self.status = UnitStatus::Fortified;
        self.moves_left = 0;
    }

    pub fn sleep(&mut self) {
        self.status = UnitStatus::Sleeping;
    }

    pub fn wake(&mut self) {
        self.status = UnitStatus::Active;
    }

    /// Moving or attacking breaks fortification
    pub fn disturb(&mut self) {
        if self.status != UnitStatus::Active {
            self.status = UnitStatus::Active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameData;

    #[test]
    fn test_fortified_unit_heals_on_begin_turn() {
        let data = GameData::builtin();
        let spec = data.unit("warrior").unwrap();
        let mut unit = Unit::new(
            UnitId(1),
            "warrior",
            CivId(0),
            Position { x: 0, y: 0 },
            spec,
        );
        unit.health = 45;
        unit.fortify();
        unit.begin_turn(spec);
        assert_eq!(unit.health, 55);

        unit.health = 95;
        unit.begin_turn(spec);
        assert_eq!(unit.health, 100);
    }

    #[test]
    fn test_begin_turn_resets_actions() {
        let data = GameData::builtin();
        let spec = data.unit("warrior").unwrap();
        let mut unit = Unit::new(
            UnitId(1),
            "warrior",
            CivId(0),
            Position { x: 0, y: 0 },
            spec,
        );
        unit.moves_left = 0;
        unit.has_acted = true;
        unit.begin_turn(spec);
        assert_eq!(unit.moves_left, spec.movement);
        assert!(!unit.has_acted);
    }
}
