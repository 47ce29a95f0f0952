use thiserror::Error;

use crate::core::types::{CityId, CivId, UnitId};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Civilization not found: {0:?}")]
    CivNotFound(CivId),

    #[error("Unit not found: {0:?}")]
    UnitNotFound(UnitId),

    #[error("City not found: {0:?}")]
    CityNotFound(CityId),

    #[error("State invariant violated: {0}")]
    InvariantViolation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Reason a requested action could not be performed.
///
/// These are expected, recoverable outcomes: the request is rejected without
/// mutating any state, and the caller (UI or AI) decides what to do next.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    #[error("unit has no moves left")]
    NoMovesLeft,

    #[error("unit has already acted this turn")]
    AlreadyActed,

    #[error("target is out of range")]
    OutOfRange,

    #[error("coordinates are outside the world")]
    OutOfBounds,

    #[error("terrain is impassable")]
    Impassable,

    #[error("tile is occupied by a foreign unit or city")]
    TileOccupied,

    #[error("no valid target on the tile")]
    NoValidTarget,

    #[error("unit lacks the required ability")]
    MissingAbility,

    #[error("too close to an existing city")]
    TooCloseToCity,

    #[error("tile cannot hold a city")]
    UnsuitableTile,

    #[error("tile is not owned by this civilization")]
    NotOwnedTile,

    #[error("tile already has an improvement")]
    AlreadyImproved,

    #[error("another item is already in production")]
    ProductionBusy,

    #[error("item is not available to this city")]
    ItemUnavailable,

    #[error("another technology is already being researched")]
    ResearchBusy,

    #[error("technology is already known")]
    AlreadyKnown,

    #[error("a prerequisite technology is missing")]
    MissingPrerequisite,

    #[error("civilizations are already at war")]
    AlreadyAtWar,

    #[error("civilizations are not at war")]
    NotAtWar,

    #[error("action is illegal while at war")]
    AtWar,

    #[error("civilizations already declared friendship")]
    AlreadyFriends,

    #[error("civilization was already denounced")]
    AlreadyDenounced,

    #[error("a civilization cannot target itself")]
    SelfTarget,

    #[error("the other party rejected the proposal")]
    Rejected,
}

pub type ActionResult<T> = std::result::Result<T, ActionError>;
