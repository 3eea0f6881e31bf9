use async_trait::async_trait;

use crate::model::{
    Ack, ChecksumResponse, HistoryResponse, LocationsStateResponse, NpcsStateResponse,
    PlayerSheet, PlayerStateResponse, PlayersStateResponse,
};
use crate::{DungeonClient, DungeonResult};

/// Logical operations offered by a game backend.
#[async_trait]
pub trait GameBackend: Send + Sync {
    async fn add_player(&self, game_id: &str, player_name: &str) -> DungeonResult<Ack>;

    async fn player_action(
        &self,
        game_id: &str,
        player_name: &str,
        action: &str,
    ) -> DungeonResult<Ack>;

    async fn game_history(&self, game_id: &str) -> DungeonResult<HistoryResponse>;

    async fn players_state(&self, game_id: &str) -> DungeonResult<PlayersStateResponse>;

    async fn npcs_state(&self, game_id: &str) -> DungeonResult<NpcsStateResponse>;

    async fn locations_state(&self, game_id: &str) -> DungeonResult<LocationsStateResponse>;

    async fn player_state(
        &self,
        player_name: &str,
        game_id: &str,
    ) -> DungeonResult<PlayerStateResponse>;

    async fn game_checksum(&self, game_id: &str) -> DungeonResult<ChecksumResponse>;

    async fn update_player(
        &self,
        game_id: &str,
        player_name: &str,
        player_state: &PlayerSheet,
    ) -> DungeonResult<Ack>;
}

#[async_trait]
impl GameBackend for DungeonClient {
    async fn add_player(&self, game_id: &str, player_name: &str) -> DungeonResult<Ack> {
        DungeonClient::add_player(self, game_id, player_name).await
    }

    async fn player_action(
        &self,
        game_id: &str,
        player_name: &str,
        action: &str,
    ) -> DungeonResult<Ack> {
        DungeonClient::player_action(self, game_id, player_name, action).await
    }

    async fn game_history(&self, game_id: &str) -> DungeonResult<HistoryResponse> {
        DungeonClient::game_history(self, game_id).await
    }

    async fn players_state(&self, game_id: &str) -> DungeonResult<PlayersStateResponse> {
        DungeonClient::players_state(self, game_id).await
    }

    async fn npcs_state(&self, game_id: &str) -> DungeonResult<NpcsStateResponse> {
        DungeonClient::npcs_state(self, game_id).await
    }

    async fn locations_state(&self, game_id: &str) -> DungeonResult<LocationsStateResponse> {
        DungeonClient::locations_state(self, game_id).await
    }

    async fn player_state(
        &self,
        player_name: &str,
        game_id: &str,
    ) -> DungeonResult<PlayerStateResponse> {
        DungeonClient::player_state(self, player_name, game_id).await
    }

    async fn game_checksum(&self, game_id: &str) -> DungeonResult<ChecksumResponse> {
        DungeonClient::game_checksum(self, game_id).await
    }

    async fn update_player(
        &self,
        game_id: &str,
        player_name: &str,
        player_state: &PlayerSheet,
    ) -> DungeonResult<Ack> {
        DungeonClient::update_player(self, game_id, player_name, player_state).await
    }
}
