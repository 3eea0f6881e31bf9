//! Asynchronous client for the dungeon game backend.
//!
//! Every backend endpoint is a plain request/response call: no retries and no
//! caching happen at this layer. Callers that want a different backend (tests,
//! sandbox play) go through the [`GameBackend`] trait instead of the concrete
//! [`DungeonClient`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub mod backend;
pub mod memory;
pub mod model;

pub use backend::GameBackend;
pub use memory::InMemoryBackend;
pub use model::{
    Ack, ChecksumResponse, ChecksumToken, HistoryResponse, Item, LocationView,
    LocationsStateResponse, NpcSummary, NpcsStateResponse, PlayerSheet, PlayerStateResponse,
    PlayersStateResponse,
};

use model::{AddPlayerRequest, PlayerActionRequest, UpdatePlayerRequest};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum DungeonError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {status} body={body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid backend url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("backend error: {0}")]
    Backend(String),
}

pub type DungeonResult<T> = Result<T, DungeonError>;

#[derive(Clone)]
pub struct DungeonClient {
    http: Client,
    base_url: Url,
}

impl std::fmt::Debug for DungeonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DungeonClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl DungeonClient {
    pub fn new(base_url: impl AsRef<str>) -> DungeonResult<Self> {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> DungeonResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_http(http, base_url)
    }

    pub fn with_http(http: Client, base_url: impl AsRef<str>) -> DungeonResult<Self> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).map_err(|err| DungeonError::InvalidUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(DungeonError::InvalidUrl {
                url: raw.to_string(),
                reason: "not a base url".into(),
            });
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub async fn add_player(&self, game_id: &str, player_name: &str) -> DungeonResult<Ack> {
        let url = self.endpoint(&["add_player", ""], None)?;
        let body = AddPlayerRequest {
            game_id,
            player_name,
        };
        self.send("add_player", self.http.post(url).json(&body)).await
    }

    pub async fn player_action(
        &self,
        game_id: &str,
        player_name: &str,
        action: &str,
    ) -> DungeonResult<Ack> {
        let url = self.endpoint(&["player_action", ""], None)?;
        let body = PlayerActionRequest {
            game_id,
            player_name,
            action,
        };
        self.send("player_action", self.http.post(url).json(&body))
            .await
    }

    pub async fn game_history(&self, game_id: &str) -> DungeonResult<HistoryResponse> {
        let url = self.endpoint(&["game_history", ""], Some(game_id))?;
        self.send("game_history", self.http.get(url)).await
    }

    pub async fn players_state(&self, game_id: &str) -> DungeonResult<PlayersStateResponse> {
        let url = self.endpoint(&["players_state", ""], Some(game_id))?;
        self.send("players_state", self.http.get(url)).await
    }

    pub async fn npcs_state(&self, game_id: &str) -> DungeonResult<NpcsStateResponse> {
        let url = self.endpoint(&["npcs_state", ""], Some(game_id))?;
        self.send("npcs_state", self.http.get(url)).await
    }

    pub async fn locations_state(&self, game_id: &str) -> DungeonResult<LocationsStateResponse> {
        let url = self.endpoint(&["locations_state", ""], Some(game_id))?;
        self.send("locations_state", self.http.get(url)).await
    }

    pub async fn player_state(
        &self,
        player_name: &str,
        game_id: &str,
    ) -> DungeonResult<PlayerStateResponse> {
        let url = self.endpoint(&["player_state", player_name], Some(game_id))?;
        self.send("player_state", self.http.get(url)).await
    }

    pub async fn game_checksum(&self, game_id: &str) -> DungeonResult<ChecksumResponse> {
        let url = self.endpoint(&["game_checksum", ""], Some(game_id))?;
        self.send("game_checksum", self.http.get(url)).await
    }

    pub async fn update_player(
        &self,
        game_id: &str,
        player_name: &str,
        player_state: &PlayerSheet,
    ) -> DungeonResult<Ack> {
        let url = self.endpoint(&["update_player", ""], None)?;
        let body = UpdatePlayerRequest {
            game_id,
            player_name,
            player_state,
        };
        self.send("update_player", self.http.post(url).json(&body))
            .await
    }

    /// Builds `{base}/{segments...}` with each segment percent-encoded. An
    /// empty trailing segment yields the trailing slash the backend routes use.
    fn endpoint(&self, segments: &[&str], game_id: Option<&str>) -> DungeonResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| DungeonError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "not a base url".into(),
            })?;
            path.pop_if_empty().extend(segments);
        }
        if let Some(game_id) = game_id {
            url.query_pairs_mut().append_pair("game_id", game_id);
        }
        Ok(url)
    }

    async fn send<T>(&self, operation: &'static str, request: RequestBuilder) -> DungeonResult<T>
    where
        T: DeserializeOwned,
    {
        let res = request.send().await.map_err(|err| {
            warn!(target = "dungeon.http", operation, error = %err, "request failed");
            DungeonError::Http(err)
        })?;

        let status = res.status();
        if status.is_success() {
            debug!(target = "dungeon.http", operation, %status, "request ok");
            Ok(res.json::<T>().await?)
        } else {
            let body = res.text().await.unwrap_or_default();
            warn!(
                target = "dungeon.http",
                operation,
                %status,
                body = %body,
                "unexpected status"
            );
            Err(DungeonError::UnexpectedStatus { status, body })
        }
    }
}
