use std::fmt;

use dungeon_sdk::DungeonError;
use thiserror::Error;

use crate::editor::EditError;

/// User-triggered operations that are guarded against concurrent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Join,
    Submit,
    Save,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Join => "join",
            Operation::Submit => "action submission",
            Operation::Save => "save",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid edit: {0}")]
    Edit(#[from] EditError),
    #[error("transport error: {0}")]
    Transport(#[from] DungeonError),
    #[error("player '{player}' not found in game '{game}'")]
    NotFound { game: String, player: String },
    #[error("not joined to a game")]
    NotJoined,
    #[error("already joined game '{0}'")]
    AlreadyJoined(String),
    #[error("{0} already in progress")]
    Busy(Operation),
}

impl SyncError {
    /// Input problems the user can fix by changing what they typed.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_) | SyncError::Edit(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}
