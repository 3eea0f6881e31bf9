use std::sync::Arc;

use dungeon_sdk::{InMemoryBackend, Item, LocationView, NpcSummary, PlayerSheet};

const START: &str = "Crossroads Inn";

/// Builds an offline backend with one small scene to wander around in.
pub async fn seeded(game_id: &str, player_name: &str) -> Arc<InMemoryBackend> {
    let backend = InMemoryBackend::new();
    backend
        .upsert_location(
            game_id,
            LocationView {
                name: START.into(),
                description: "A smoky common room. Rain drums on the shutters.".into(),
                items: vec![item("Tankard", "Dented pewter", 0.5, 1.0, 0)],
                neighbours: vec!["Muddy Road".into(), "Cellar".into()],
                visited: true,
                ..LocationView::default()
            },
        )
        .await;
    backend
        .upsert_location(
            game_id,
            LocationView {
                name: "Cellar".into(),
                description: "Barrels, cobwebs and something scratching.".into(),
                neighbours: vec![START.into()],
                ..LocationView::default()
            },
        )
        .await;
    backend
        .upsert_npc(
            game_id,
            NpcSummary {
                name: "Marta".into(),
                description: "The innkeeper".into(),
                hp: 8,
                attack: 1,
                defense: 2,
                level: 2,
                mood: "wary".into(),
                money: 40,
                location: Some(START.into()),
                dialogue: vec!["Rooms are two silver. Trouble is extra.".into()],
                inventory: vec![item("Cellar key", "Heavy iron", 0.2, 5.0, 0)],
                ..NpcSummary::default()
            },
        )
        .await;
    backend
        .upsert_player(
            game_id,
            PlayerSheet {
                name: player_name.to_string(),
                description: "A traveller in a wet cloak".into(),
                level: 1,
                race: "Human".into(),
                class_type: "Peasant".into(),
                hp: 10,
                attack: 1,
                defense: 1,
                money: 10,
                max_weight_to_carry: 10.0,
                location: Some(START.into()),
                inventory: vec![item("Bread", "Half a loaf", 0.3, 1.0, 2)],
                ..PlayerSheet::default()
            },
        )
        .await;
    backend
        .push_history(game_id, "DM: You step out of the rain into the Crossroads Inn.")
        .await;
    backend
}

fn item(name: &str, description: &str, weight: f64, value: f64, health: i64) -> Item {
    Item {
        name: name.into(),
        description: description.into(),
        weight,
        value,
        health,
    }
}
