use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use dungeon_sdk::{ChecksumToken, DungeonClient, DungeonError, PlayerSheet};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorder {
    fn push(&self, route: &str, value: Value) {
        self.calls.lock().unwrap().push((route.to_string(), value));
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

async fn add_player(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("add_player", body);
    Json(json!({"message": "Player Hero added successfully."}))
}

async fn player_action(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("player_action", body);
    Json(json!({"dm_response": "The door creaks open."}))
}

async fn update_player(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.push("update_player", body);
    Json(json!({"message": "Player updated successfully"}))
}

async fn game_history(
    State(rec): State<Recorder>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.push("game_history", json!(query));
    Json(json!({"history": ["Welcome.", "A goblin appears."]}))
}

async fn player_state(
    State(rec): State<Recorder>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.push("player_state", json!({"name": name, "query": query}));
    if name == "Ghost" {
        return Json(json!({
            "player_state": null,
            "player_location": null,
            "all_npcs_in_location": []
        }));
    }
    Json(json!({
        "player_state": {
            "name": name,
            "description": "Player",
            "hp": 10,
            "attack": 1,
            "defense": 1,
            "level": 0,
            "money": 10,
            "inventory": [],
            "max_weight_to_carry": 10,
            "location": "Forest",
            "race": "Human",
            "class_type": "Peasant"
        },
        "player_location": {
            "name": "Forest",
            "description": "Tall trees.",
            "items": [],
            "npcs": [],
            "neighbours": ["Cave", "Mountain"],
            "visited": false
        },
        "all_npcs_in_location": [
            {"name": "Goblin", "description": "Small and green.", "hp": 5, "attack": 2,
             "defense": 1, "level": 1, "money": 0, "inventory": [], "max_weight_to_carry": 10,
             "location": "Forest", "dialogue": ["Hello there, traveler!"], "mood": "neutral"}
        ]
    }))
}

async fn game_checksum(
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match query.get("game_id").map(String::as_str) {
        Some("missing") => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Game not found"})),
        )),
        _ => Ok(Json(json!({"game_checksum": 7}))),
    }
}

async fn listing(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "players_state": {"Hero": {"game": query.get("game_id")}},
        "npcs_state": {"Goblin": {"hp": 5}},
        "locations_state": {"Forest": {"visited": true}}
    }))
}

async fn spawn_backend() -> (DungeonClient, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/add_player/", post(add_player))
        .route("/player_action/", post(player_action))
        .route("/update_player/", post(update_player))
        .route("/game_history/", get(game_history))
        .route("/player_state/:name", get(player_state))
        .route("/game_checksum/", get(game_checksum))
        .route("/players_state/", get(listing))
        .route("/npcs_state/", get(listing))
        .route("/locations_state/", get(listing))
        .with_state(recorder.clone());
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind backend listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    let client = DungeonClient::new(format!("http://{addr}")).expect("client");
    (client, recorder)
}

#[tokio::test]
async fn posts_join_action_and_update_bodies() {
    let (client, recorder) = spawn_backend().await;

    let ack = client.add_player("G1", "Hero").await.expect("add player");
    assert_eq!(
        ack.message.as_deref(),
        Some("Player Hero added successfully.")
    );
    let ack = client
        .player_action("G1", "Hero", "open the door")
        .await
        .expect("player action");
    assert_eq!(ack.dm_response.as_deref(), Some("The door creaks open."));

    let sheet = PlayerSheet {
        name: "Hero".into(),
        hp: 12,
        ..PlayerSheet::default()
    };
    client
        .update_player("G1", "Hero", &sheet)
        .await
        .expect("update player");

    let calls = recorder.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0, "add_player");
    assert_eq!(calls[0].1, json!({"game_id": "G1", "player_name": "Hero"}));
    assert_eq!(calls[1].0, "player_action");
    assert_eq!(
        calls[1].1,
        json!({"game_id": "G1", "player_name": "Hero", "action": "open the door"})
    );
    assert_eq!(calls[2].0, "update_player");
    assert_eq!(calls[2].1["player_state"]["hp"], json!(12));
    assert_eq!(calls[2].1["player_name"], json!("Hero"));
}

#[tokio::test]
async fn fetches_history_and_player_state_with_encoded_names() {
    let (client, recorder) = spawn_backend().await;

    let history = client.game_history("G 1").await.expect("history");
    assert_eq!(history.history, ["Welcome.", "A goblin appears."]);

    let state = client
        .player_state("Sir Hero", "G 1")
        .await
        .expect("player state");
    let sheet = state.player_state.expect("sheet present");
    assert_eq!(sheet.name, "Sir Hero");
    assert_eq!(sheet.location.as_deref(), Some("Forest"));
    assert_eq!(state.player_location.expect("location").neighbours.len(), 2);
    assert_eq!(state.all_npcs_in_location[0].dialogue.len(), 1);

    let calls = recorder.calls();
    assert_eq!(calls[0].1, json!({"game_id": "G 1"}));
    assert_eq!(
        calls[1].1,
        json!({"name": "Sir Hero", "query": {"game_id": "G 1"}})
    );
}

#[tokio::test]
async fn missing_player_state_is_not_an_error() {
    let (client, _recorder) = spawn_backend().await;
    let state = client.player_state("Ghost", "G1").await.expect("ok response");
    assert!(state.player_state.is_none());
    assert!(state.player_location.is_none());
}

#[tokio::test]
async fn non_success_status_surfaces_body() {
    let (client, _recorder) = spawn_backend().await;

    let ok = client.game_checksum("G1").await.expect("checksum");
    assert_eq!(ok.game_checksum, Some(ChecksumToken::new(7)));

    match client.game_checksum("missing").await {
        Err(DungeonError::UnexpectedStatus { status, body }) => {
            assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
            assert!(body.contains("Game not found"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn whole_game_listings_decode() {
    let (client, _recorder) = spawn_backend().await;
    let players = client.players_state("G1").await.expect("players");
    assert_eq!(players.players_state["Hero"]["game"], json!("G1"));
    let npcs = client.npcs_state("G1").await.expect("npcs");
    assert_eq!(npcs.npcs_state["Goblin"]["hp"], json!(5));
    let locations = client.locations_state("G1").await.expect("locations");
    assert_eq!(locations.locations_state["Forest"]["visited"], json!(true));
}

#[tokio::test]
async fn connection_failure_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = DungeonClient::new(format!("http://{addr}")).expect("client");
    let err = client.game_history("G1").await.expect_err("no server");
    assert!(matches!(err, DungeonError::Http(_)));
}

#[test]
fn rejects_unusable_base_urls() {
    assert!(matches!(
        DungeonClient::new("not a url"),
        Err(DungeonError::InvalidUrl { .. })
    ));
    assert!(matches!(
        DungeonClient::new("mailto:dm@example.com"),
        Err(DungeonError::InvalidUrl { .. })
    ));
}
