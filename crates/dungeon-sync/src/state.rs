use dungeon_sdk::{HistoryResponse, LocationView, PlayerSheet, PlayerStateResponse};

use crate::editor::{CharacterEditor, RemoteMerge};

pub const NO_DM_RESPONSE: &str = "No response from DM.";
pub const PLAYER_NOT_FOUND_HINT: &str =
    "Please ask the DM to add your player in the game, provide relevant info about you.";

/// Which game and which player this client is acting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub game_id: String,
    pub player_name: String,
}

impl Session {
    pub fn new(game_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            player_name: player_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayerStatus {
    #[default]
    Pending,
    Loaded,
    NotFound,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub session: Option<Session>,
    pub history: Vec<String>,
    pub player: PlayerStatus,
    pub editor: Option<CharacterEditor>,
    pub location: Option<LocationView>,
    /// Bumped on every change so observers can cheaply tell snapshots apart.
    pub revision: u64,
}

impl SessionState {
    pub fn is_joined(&self) -> bool {
        self.session.is_some()
    }

    pub fn narrative(&self) -> String {
        if self.history.is_empty() {
            NO_DM_RESPONSE.to_string()
        } else {
            self.history.join("\n")
        }
    }

    pub fn sheet(&self) -> Option<&PlayerSheet> {
        self.editor.as_ref().map(CharacterEditor::sheet)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.editor
            .as_ref()
            .is_some_and(CharacterEditor::has_unsaved_changes)
    }

    pub(crate) fn apply(&mut self, snapshot: Snapshot) -> Option<RemoteMerge> {
        self.history = snapshot.history;
        self.revision += 1;
        match snapshot.player {
            PlayerLookup::Found { sheet, location } => {
                self.player = PlayerStatus::Loaded;
                self.location = location;
                match self.editor.as_mut() {
                    Some(editor) => Some(editor.accept_remote(sheet)),
                    None => {
                        self.editor = Some(CharacterEditor::new(sheet));
                        Some(RemoteMerge::Replaced)
                    }
                }
            }
            PlayerLookup::Missing => {
                self.player = PlayerStatus::NotFound;
                self.editor = None;
                self.location = None;
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum PlayerLookup {
    Found {
        sheet: PlayerSheet,
        location: Option<LocationView>,
    },
    Missing,
}

/// Result of one refresh cycle, applied to [`SessionState`] in one step.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub history: Vec<String>,
    pub player: PlayerLookup,
}

impl Snapshot {
    pub fn new(history: HistoryResponse, player: PlayerStateResponse) -> Self {
        let PlayerStateResponse {
            player_state,
            player_location,
            all_npcs_in_location,
        } = player;
        let player = match player_state {
            Some(sheet) => PlayerLookup::Found {
                sheet,
                location: player_location.map(|mut location| {
                    location.npcs = all_npcs_in_location;
                    location
                }),
            },
            None => PlayerLookup::Missing,
        };
        Self {
            history: history.history,
            player,
        }
    }
}
