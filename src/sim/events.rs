//! Simulation event records
//!
//! The core appends inert, typed records as things happen; a front end
//! drains them after each turn. Nothing inside the simulation reacts to
//! events, so dropping them never changes outcomes.

use serde::{Deserialize, Serialize};

use crate::core::types::{CityId, CivId, Position, Turn, UnitId};
use crate::entity::city::ProductionItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    TurnEnded {
        turn: Turn,
    },
    ResearchCompleted {
        civ: CivId,
        tech: String,
    },
    CityFounded {
        civ: CivId,
        city: CityId,
        pos: Position,
    },
    CityCaptured {
        city: CityId,
        from: CivId,
        to: CivId,
    },
    PopulationGrew {
        city: CityId,
        population: u32,
    },
    ProductionCompleted {
        city: CityId,
        item: ProductionItem,
    },
    UnitCreated {
        civ: CivId,
        unit: UnitId,
        kind: String,
    },
    UnitKilled {
        unit: UnitId,
        owner: CivId,
        by: CivId,
    },
    WarDeclared {
        by: CivId,
        on: CivId,
    },
    PeaceMade {
        a: CivId,
        b: CivId,
    },
    FriendshipDeclared {
        a: CivId,
        b: CivId,
    },
    Denounced {
        by: CivId,
        target: CivId,
    },
    TradeAgreed {
        from: CivId,
        to: CivId,
    },
    TradeEnded {
        from: CivId,
        to: CivId,
    },
    CivDefeated {
        civ: CivId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_discriminant() {
        let event = GameEvent::UnitCreated {
            civ: CivId(0),
            unit: UnitId(3),
            kind: "warrior".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"unit_created\""));
        assert!(json.contains("\"kind\":\"warrior\""));
        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
