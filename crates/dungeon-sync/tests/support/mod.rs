use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dungeon_sdk::{
    Ack, ChecksumResponse, ChecksumToken, DungeonError, DungeonResult, GameBackend,
    HistoryResponse, LocationView, LocationsStateResponse, NpcsStateResponse, PlayerSheet,
    PlayerStateResponse, PlayersStateResponse,
};
use serde_json::Value;
use tokio::sync::Semaphore;

/// Backend double whose answers are set by the test and which counts every
/// call per operation.
#[derive(Default)]
pub struct ScriptedBackend {
    checksum: Mutex<Option<Value>>,
    history: Mutex<Vec<String>>,
    player: Mutex<Option<PlayerSheet>>,
    location: Mutex<Option<LocationView>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    gates: Mutex<HashMap<&'static str, Arc<Semaphore>>>,
    actions: Mutex<Vec<String>>,
    saved: Mutex<Vec<PlayerSheet>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self::default();
        *backend.checksum.lock().unwrap() = Some(Value::from(0));
        Arc::new(backend)
    }

    pub fn set_checksum(&self, value: impl Into<Value>) {
        *self.checksum.lock().unwrap() = Some(value.into());
    }

    pub fn clear_checksum(&self) {
        *self.checksum.lock().unwrap() = None;
    }

    pub fn set_history(&self, lines: &[&str]) {
        *self.history.lock().unwrap() = lines.iter().map(|line| line.to_string()).collect();
    }

    pub fn set_player(&self, sheet: Option<PlayerSheet>) {
        *self.player.lock().unwrap() = sheet;
    }

    pub fn set_location(&self, location: Option<LocationView>) {
        *self.location.lock().unwrap() = location;
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().unwrap().remove(operation);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or_default()
    }

    /// Makes calls to `operation` wait, after being counted, until the
    /// returned semaphore gets permits or `release` is called.
    pub fn hold(&self, operation: &'static str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().unwrap().insert(operation, gate.clone());
        gate
    }

    pub fn release(&self, operation: &'static str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(operation) {
            gate.add_permits(1_000);
        }
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    pub fn saved(&self) -> Vec<PlayerSheet> {
        self.saved.lock().unwrap().clone()
    }

    fn enter(&self, operation: &'static str) -> DungeonResult<()> {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;
        if self.failing.lock().unwrap().contains(operation) {
            return Err(DungeonError::Backend(format!("{operation} unavailable")));
        }
        Ok(())
    }

    async fn pass_gate(&self, operation: &'static str) -> DungeonResult<()> {
        let gate = self.gates.lock().unwrap().get(operation).cloned();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|err| DungeonError::Backend(err.to_string()))?
                .forget();
        }
        Ok(())
    }
}

pub fn hero(hp: i64) -> PlayerSheet {
    PlayerSheet {
        name: "Hero".into(),
        description: "Player".into(),
        level: 1,
        race: "Human".into(),
        class_type: "Warrior".into(),
        hp,
        location: Some("Forest".into()),
        ..PlayerSheet::default()
    }
}

#[async_trait]
impl GameBackend for ScriptedBackend {
    async fn add_player(&self, _game_id: &str, player_name: &str) -> DungeonResult<Ack> {
        self.enter("add_player")?;
        self.pass_gate("add_player").await?;
        Ok(Ack {
            message: Some(format!("Player {player_name} added successfully.")),
            dm_response: None,
        })
    }

    async fn player_action(
        &self,
        _game_id: &str,
        _player_name: &str,
        action: &str,
    ) -> DungeonResult<Ack> {
        self.enter("player_action")?;
        self.actions.lock().unwrap().push(action.to_string());
        self.history.lock().unwrap().push(format!("DM: {action}"));
        Ok(Ack::default())
    }

    async fn game_history(&self, _game_id: &str) -> DungeonResult<HistoryResponse> {
        self.enter("game_history")?;
        self.pass_gate("game_history").await?;
        Ok(HistoryResponse {
            history: self.history.lock().unwrap().clone(),
        })
    }

    async fn players_state(&self, _game_id: &str) -> DungeonResult<PlayersStateResponse> {
        self.enter("players_state")?;
        Ok(PlayersStateResponse::default())
    }

    async fn npcs_state(&self, _game_id: &str) -> DungeonResult<NpcsStateResponse> {
        self.enter("npcs_state")?;
        Ok(NpcsStateResponse::default())
    }

    async fn locations_state(&self, _game_id: &str) -> DungeonResult<LocationsStateResponse> {
        self.enter("locations_state")?;
        Ok(LocationsStateResponse::default())
    }

    async fn player_state(
        &self,
        _player_name: &str,
        _game_id: &str,
    ) -> DungeonResult<PlayerStateResponse> {
        self.enter("player_state")?;
        Ok(PlayerStateResponse {
            player_state: self.player.lock().unwrap().clone(),
            player_location: self.location.lock().unwrap().clone(),
            all_npcs_in_location: Vec::new(),
        })
    }

    async fn game_checksum(&self, _game_id: &str) -> DungeonResult<ChecksumResponse> {
        self.enter("game_checksum")?;
        Ok(ChecksumResponse {
            game_checksum: self.checksum.lock().unwrap().clone().map(ChecksumToken::new),
        })
    }

    async fn update_player(
        &self,
        _game_id: &str,
        _player_name: &str,
        player_state: &PlayerSheet,
    ) -> DungeonResult<Ack> {
        self.enter("update_player")?;
        self.pass_gate("update_player").await?;
        self.saved.lock().unwrap().push(player_state.clone());
        *self.player.lock().unwrap() = Some(player_state.clone());
        Ok(Ack::default())
    }
}
