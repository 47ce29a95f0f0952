//! Research: a single-slot accumulator per civilization

use tracing::info;

use crate::core::error::{ActionError, ActionResult};
use crate::data::GameData;
use crate::entity::civ::{Civilization, Research};

/// Begins researching `tech`. Fails if another research is active, the
/// tech is already known, or a prerequisite is missing.
pub fn start_research(civ: &mut Civilization, tech: &str, data: &GameData) -> ActionResult<()> {
    if let Some(active) = &civ.research {
        if active.tech != tech {
            return Err(ActionError::ResearchBusy);
        }
        return Ok(());
    }
    if civ.knows_tech(tech) {
        return Err(ActionError::AlreadyKnown);
    }
    let spec = data.tech_or_default(tech);
    for prereq in &spec.prerequisites {
        if !civ.knows_tech(prereq) {
            return Err(ActionError::MissingPrerequisite);
        }
    }
    civ.research = Some(Research {
        tech: tech.to_string(),
        progress: 0,
    });
    Ok(())
}

/// Adds a turn's science to the active research. A researching
/// civilization always makes at least 1 point of progress. Returns the
/// completed tech id, if any.
pub fn advance_research(civ: &mut Civilization, science: i32, data: &GameData) -> Option<String> {
    let active = civ.research.as_mut()?;
    active.progress += science.max(1) as u32;
    let cost = data.tech_or_default(&active.tech).cost;
    if active.progress < cost {
        return None;
    }
    let done = active.tech.clone();
    civ.research = None;
    civ.technologies.insert(done.clone());
    info!(civ = civ.id.0, tech = %done, "research completed");
    Some(done)
}

/// Techs the civilization could start now: unknown, with every
/// prerequisite already known
pub fn available_techs<'a>(civ: &Civilization, data: &'a GameData) -> Vec<&'a str> {
    data.techs
        .iter()
        .filter(|(id, spec)| {
            !civ.knows_tech(id) && spec.prerequisites.iter().all(|p| civ.knows_tech(p))
        })
        .map(|(id, _)| id.as_str())
        .collect()
}

/// True if the civilization meets the tech requirement, if any
pub fn meets_requirement(civ: &Civilization, requires: &Option<String>) -> bool {
    requires.as_ref().map_or(true, |t| civ.knows_tech(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CivId;
    use crate::entity::civ::Personality;

    fn civ() -> Civilization {
        Civilization::new(CivId(0), "Roma", "Caesar", Personality::Balanced, true)
    }

    #[test]
    fn test_prerequisites_gate_research() {
        let data = GameData::builtin();
        let mut civ = civ();
        assert_eq!(
            start_research(&mut civ, "archery", &data),
            Err(ActionError::MissingPrerequisite)
        );
        civ.technologies.insert("animal_husbandry".into());
        start_research(&mut civ, "archery", &data).unwrap();
    }

    #[test]
    fn test_single_slot() {
        let data = GameData::builtin();
        let mut civ = civ();
        start_research(&mut civ, "pottery", &data).unwrap();
        assert_eq!(
            start_research(&mut civ, "mining", &data),
            Err(ActionError::ResearchBusy)
        );
        // Restarting the active tech is a no-op.
        start_research(&mut civ, "pottery", &data).unwrap();
    }

    #[test]
    fn test_completion_appends_once() {
        let data = GameData::builtin();
        let mut civ = civ();
        start_research(&mut civ, "pottery", &data).unwrap();
        assert_eq!(advance_research(&mut civ, 30, &data), None);
        assert_eq!(advance_research(&mut civ, 30, &data), Some("pottery".into()));
        assert!(civ.knows_tech("pottery"));
        assert!(civ.research.is_none());
        assert_eq!(
            start_research(&mut civ, "pottery", &data),
            Err(ActionError::AlreadyKnown)
        );
    }

    #[test]
    fn test_science_floor_while_researching() {
        let data = GameData::builtin();
        let mut civ = civ();
        start_research(&mut civ, "pottery", &data).unwrap();
        advance_research(&mut civ, 0, &data);
        assert_eq!(civ.research.as_ref().unwrap().progress, 1);
    }

    #[test]
    fn test_available_techs_expand_with_knowledge() {
        let data = GameData::builtin();
        let mut civ = civ();
        let before = available_techs(&civ, &data);
        assert!(before.contains(&"mining"));
        assert!(!before.contains(&"bronze_working"));
        civ.technologies.insert("mining".into());
        let after = available_techs(&civ, &data);
        assert!(after.contains(&"bronze_working"));
        assert!(!after.contains(&"mining"));
    }
}
