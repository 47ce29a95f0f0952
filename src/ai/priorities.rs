//! AI priority vector
//!
//! Five weights in [0.1, 1.0] start at 0.5, shift by a fixed
//! personality table, then by situational modifiers. Everything
//! downstream (research, production, unit orders, diplomacy) reads
//! this vector.

use crate::core::types::CivId;
use crate::entity::civ::Personality;
use crate::sim::state::GameState;

const BASE: f64 = 0.5;
const MIN: f64 = 0.1;
const MAX: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Priorities {
    pub expansion: f64,
    pub military: f64,
    pub economy: f64,
    pub science: f64,
    pub defense: f64,
}

impl Priorities {
    fn uniform() -> Self {
        Self {
            expansion: BASE,
            military: BASE,
            economy: BASE,
            science: BASE,
            defense: BASE,
        }
    }

    fn clamp(&mut self) {
        self.expansion = self.expansion.clamp(MIN, MAX);
        self.military = self.military.clamp(MIN, MAX);
        self.economy = self.economy.clamp(MIN, MAX);
        self.science = self.science.clamp(MIN, MAX);
        self.defense = self.defense.clamp(MIN, MAX);
    }
}

pub fn compute(state: &GameState, civ_id: CivId) -> Priorities {
    let mut p = Priorities::uniform();
    let Ok(civ) = state.civ(civ_id) else {
        return p;
    };

    match civ.personality {
        Personality::Balanced => {}
        Personality::Aggressive => {
            p.military += 0.3;
            p.defense += 0.1;
            p.economy -= 0.1;
        }
        Personality::Defensive => {
            p.defense += 0.3;
            p.military += 0.1;
            p.expansion -= 0.1;
        }
        Personality::Expansionist => {
            p.expansion += 0.3;
            p.economy += 0.1;
            p.military -= 0.1;
        }
        Personality::Scientific => {
            p.science += 0.3;
            p.economy += 0.1;
            p.military -= 0.1;
        }
        Personality::Friendly => {
            p.economy += 0.2;
            p.science += 0.1;
            p.military -= 0.2;
        }
    }

    let at_war = state
        .civs
        .iter()
        .any(|other| other.id != civ_id && state.at_war(civ_id, other.id));
    if at_war {
        p.military += 0.2;
        p.defense += 0.2;
        p.expansion -= 0.2;
        p.science -= 0.1;
    }

    // Behind in tech relative to the field.
    let living: Vec<_> = state.living_civs().collect();
    if !living.is_empty() {
        let avg = living
            .iter()
            .map(|c| c.technologies.len() as f64)
            .sum::<f64>()
            / living.len() as f64;
        if (civ.technologies.len() as f64) < avg * 0.9 {
            p.science += 0.2;
        }
    }

    if civ.cities.len() < 3 {
        p.expansion += 0.2;
    }
    if civ.gold < 100 {
        p.economy += 0.2;
    }

    p.clamp();
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::civ::Civilization;
    use crate::world::grid::WorldGrid;
    use crate::world::tile::Terrain;

    fn state_with(personality: Personality) -> GameState {
        GameState::from_world(
            WorldGrid::new(8, 8, Terrain::Plains),
            vec![
                Civilization::new(CivId(0), "Roma", "Caesar", personality, true),
                Civilization::new(CivId(1), "Hellas", "Perikles", Personality::Balanced, true),
            ],
            5,
        )
    }

    #[test]
    fn test_priorities_stay_in_bounds() {
        let state = state_with(Personality::Aggressive);
        let p = compute(&state, CivId(0));
        for v in [p.expansion, p.military, p.economy, p.science, p.defense] {
            assert!((0.1..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_war_raises_military_posture() {
        let mut state = state_with(Personality::Balanced);
        let peace = compute(&state, CivId(0));
        crate::diplomacy::declare_war(&mut state, CivId(0), CivId(1)).unwrap();
        let war = compute(&state, CivId(0));
        assert!(war.military > peace.military);
        assert!(war.defense > peace.defense);
        assert!(war.expansion < peace.expansion);
    }

    #[test]
    fn test_aggressive_outweighs_balanced_military() {
        let balanced = compute(&state_with(Personality::Balanced), CivId(0));
        let aggressive = compute(&state_with(Personality::Aggressive), CivId(0));
        assert!(aggressive.military > balanced.military);
    }
}
