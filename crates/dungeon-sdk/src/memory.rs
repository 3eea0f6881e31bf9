use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backend::GameBackend;
use crate::model::{
    Ack, ChecksumResponse, ChecksumToken, HistoryResponse, LocationView, LocationsStateResponse,
    NpcSummary, NpcsStateResponse, PlayerSheet, PlayerStateResponse, PlayersStateResponse,
};
use crate::{DungeonError, DungeonResult};

#[derive(Debug, Default, Clone)]
struct GameRecord {
    history: Vec<String>,
    players: BTreeMap<String, PlayerSheet>,
    npcs: BTreeMap<String, NpcSummary>,
    locations: BTreeMap<String, LocationView>,
    checksum: u64,
}

impl GameRecord {
    fn touch(&mut self) {
        self.checksum += 1;
    }
}

/// In-memory backend for tests and offline sandbox play.
///
/// Behaves like the game server: registering a player only acknowledges,
/// reading history creates the game, every mutation bumps an integer checksum,
/// and player updates merge the submitted fields over the stored sheet.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    games: Mutex<HashMap<String, GameRecord>>,
}

impl InMemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push_history(&self, game_id: &str, line: impl Into<String>) {
        let mut games = self.games.lock().await;
        let game = games.entry(game_id.to_string()).or_default();
        game.history.push(line.into());
        game.touch();
    }

    pub async fn upsert_player(&self, game_id: &str, sheet: PlayerSheet) {
        let mut games = self.games.lock().await;
        let game = games.entry(game_id.to_string()).or_default();
        game.players.insert(sheet.name.clone(), sheet);
        game.touch();
    }

    pub async fn upsert_npc(&self, game_id: &str, npc: NpcSummary) {
        let mut games = self.games.lock().await;
        let game = games.entry(game_id.to_string()).or_default();
        game.npcs.insert(npc.name.clone(), npc);
        game.touch();
    }

    pub async fn upsert_location(&self, game_id: &str, location: LocationView) {
        let mut games = self.games.lock().await;
        let game = games.entry(game_id.to_string()).or_default();
        game.locations.insert(location.name.clone(), location);
        game.touch();
    }

    pub async fn player(&self, game_id: &str, player_name: &str) -> Option<PlayerSheet> {
        let games = self.games.lock().await;
        games
            .get(game_id)
            .and_then(|game| game.players.get(player_name))
            .cloned()
    }

    pub async fn checksum(&self, game_id: &str) -> Option<u64> {
        self.games.lock().await.get(game_id).map(|game| game.checksum)
    }
}

fn game_not_found() -> DungeonError {
    DungeonError::Backend("Game not found".into())
}

fn to_value<T: serde::Serialize>(value: &T) -> DungeonResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|err| DungeonError::Backend(err.to_string()))
}

#[async_trait]
impl GameBackend for InMemoryBackend {
    /// Acknowledges only. Characters exist once the DM (or a test) puts
    /// them into the game.
    async fn add_player(&self, _game_id: &str, player_name: &str) -> DungeonResult<Ack> {
        Ok(Ack {
            message: Some(format!("Player {player_name} added successfully.")),
            dm_response: None,
        })
    }

    async fn player_action(
        &self,
        game_id: &str,
        player_name: &str,
        action: &str,
    ) -> DungeonResult<Ack> {
        let mut games = self.games.lock().await;
        let game = games.entry(game_id.to_string()).or_default();
        let response = format!("{player_name}: {action}");
        game.history.push(response.clone());
        game.touch();
        Ok(Ack {
            message: None,
            dm_response: Some(response),
        })
    }

    async fn game_history(&self, game_id: &str) -> DungeonResult<HistoryResponse> {
        let mut games = self.games.lock().await;
        let game = games.entry(game_id.to_string()).or_default();
        Ok(HistoryResponse {
            history: game.history.clone(),
        })
    }

    async fn players_state(&self, game_id: &str) -> DungeonResult<PlayersStateResponse> {
        let games = self.games.lock().await;
        let game = games.get(game_id).ok_or_else(game_not_found)?;
        Ok(PlayersStateResponse {
            players_state: to_value(&game.players)?,
        })
    }

    async fn npcs_state(&self, game_id: &str) -> DungeonResult<NpcsStateResponse> {
        let games = self.games.lock().await;
        let game = games.get(game_id).ok_or_else(game_not_found)?;
        Ok(NpcsStateResponse {
            npcs_state: to_value(&game.npcs)?,
        })
    }

    async fn locations_state(&self, game_id: &str) -> DungeonResult<LocationsStateResponse> {
        let games = self.games.lock().await;
        let game = games.get(game_id).ok_or_else(game_not_found)?;
        Ok(LocationsStateResponse {
            locations_state: to_value(&game.locations)?,
        })
    }

    async fn player_state(
        &self,
        player_name: &str,
        game_id: &str,
    ) -> DungeonResult<PlayerStateResponse> {
        let games = self.games.lock().await;
        let game = games.get(game_id).ok_or_else(game_not_found)?;
        let player_state = game.players.get(player_name).cloned();
        let location_name = player_state
            .as_ref()
            .and_then(|sheet| sheet.location.clone());
        let player_location = location_name
            .as_ref()
            .and_then(|name| game.locations.get(name))
            .cloned();
        let all_npcs_in_location = game
            .npcs
            .values()
            .filter(|npc| npc.location == location_name)
            .cloned()
            .collect();
        Ok(PlayerStateResponse {
            player_state,
            player_location,
            all_npcs_in_location,
        })
    }

    async fn game_checksum(&self, game_id: &str) -> DungeonResult<ChecksumResponse> {
        let games = self.games.lock().await;
        let game = games.get(game_id).ok_or_else(game_not_found)?;
        Ok(ChecksumResponse {
            game_checksum: Some(ChecksumToken::new(game.checksum)),
        })
    }

    async fn update_player(
        &self,
        game_id: &str,
        player_name: &str,
        player_state: &PlayerSheet,
    ) -> DungeonResult<Ack> {
        let mut games = self.games.lock().await;
        let game = games.get_mut(game_id).ok_or_else(game_not_found)?;
        let Some(current) = game.players.get(player_name) else {
            return Ok(Ack {
                message: Some("Player updated successfully".into()),
                dm_response: None,
            });
        };

        let serde_json::Value::Object(mut merged) = to_value(current)? else {
            return Err(DungeonError::Backend("player sheet is not an object".into()));
        };
        if let serde_json::Value::Object(incoming) = to_value(player_state)? {
            merged.extend(incoming);
        }
        let sheet: PlayerSheet = serde_json::from_value(serde_json::Value::Object(merged))
            .map_err(|err| DungeonError::Backend(err.to_string()))?;
        game.players.insert(player_name.to_string(), sheet);
        game.history
            .push(format!("Player {player_name} state updated."));
        game.touch();
        Ok(Ack {
            message: Some("Player updated successfully".into()),
            dm_response: None,
        })
    }
}
