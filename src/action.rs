use crate::entity::PlayerId;
use crate::position::Direction;
use std::fmt;
use thiserror::Error;

/// An already-decoded player request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move {
        player: PlayerId,
        direction: Direction,
    },
    Undo,
    Exit,
    /// Input that could not be decoded; the message is shown to the user.
    InvalidInput(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { player, direction } => write!(f, "{} {}", player, direction),
            Action::Undo => write!(f, "Undo"),
            Action::Exit => write!(f, "Exit"),
            Action::InvalidInput(msg) => write!(f, "InvalidInput({})", msg),
        }
    }
}

/// Why an action was rejected. Rejections never change the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("Player {0} not found.")]
    PlayerNotFound(PlayerId),

    #[error("You hit a wall.")]
    BlockedByWall,

    #[error("You hit another player.")]
    BlockedByPlayer,

    #[error("You cannot move other players' boxes.")]
    BlockedByForeignBox,

    #[error("Failed to push the box.")]
    PushBlocked,

    #[error("You have run out of your undo quota.")]
    UndoQuotaExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Success(Action),
    Failed { action: Action, reason: Failure },
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success(_))
    }

    pub fn action(&self) -> &Action {
        match self {
            ActionResult::Success(action) | ActionResult::Failed { action, .. } => action,
        }
    }

    pub fn failure(&self) -> Option<Failure> {
        match self {
            ActionResult::Success(_) => None,
            ActionResult::Failed { reason, .. } => Some(*reason),
        }
    }
}
