//! Client-side session synchronization for the dungeon game.
//!
//! Responsibilities:
//! - joining a game and keeping the narrative/player/location snapshot in step
//!   with the backend through checksum polling
//! - submitting player actions and refreshing immediately afterwards
//! - staging character sheet edits locally until an explicit save
//!
//! All state lives in a [`SyncController`] instance; presentation layers
//! observe it through [`SyncController::subscribe`].

pub mod controller;
pub mod editor;
pub mod error;
pub mod state;

pub use controller::{
    PollOutcome, SaveOutcome, SyncConfig, SyncController, DEFAULT_POLL_INTERVAL,
};
pub use editor::{CharacterEditor, EditError, ItemField, RemoteMerge, SheetField};
pub use error::{Operation, SyncError};
pub use state::{PlayerStatus, Session, SessionState, NO_DM_RESPONSE, PLAYER_NOT_FOUND_HINT};
