use anyhow::Context;
use dungeon_sdk::GameBackend;
use serde_json::Value;

use crate::cli::InspectView;

/// Fetches one whole-game view and returns it as pretty JSON.
pub async fn fetch(
    backend: &dyn GameBackend,
    view: InspectView,
    game_id: &str,
) -> anyhow::Result<String> {
    let value = match view {
        InspectView::Players => backend.players_state(game_id).await?.players_state,
        InspectView::Npcs => backend.npcs_state(game_id).await?.npcs_state,
        InspectView::Locations => backend.locations_state(game_id).await?.locations_state,
        InspectView::History => Value::from(backend.game_history(game_id).await?.history),
        InspectView::Checksum => backend
            .game_checksum(game_id)
            .await?
            .game_checksum
            .map(|token| token.as_value().clone())
            .unwrap_or(Value::Null),
    };
    serde_json::to_string_pretty(&value).context("encoding inspect output")
}
