use std::sync::{Arc, Weak};
use std::time::Duration;

use dungeon_sdk::{ChecksumToken, DungeonError, GameBackend};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::editor::{CharacterEditor, EditError};
use crate::error::{Operation, SyncError};
use crate::state::{Session, SessionState, Snapshot};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Pause between the end of one poll cycle and the start of the next.
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Checksum matched the last recorded token (or carried no information).
    Unchanged,
    /// Checksum moved and a full refresh was applied.
    Refreshed,
    /// Another refresh cycle was still running; nothing was fetched.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    NothingToSave,
}

struct Poller {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Keeps one player's view of one game in step with the backend.
///
/// Refresh cycles (history + player state fetched together) are serialized by
/// the `cycle` gate: poll ticks skip when it is held, user-triggered refreshes
/// wait for it. Join, submit and save each have their own gate so a second
/// concurrent request of the same kind is rejected instead of queued.
pub struct SyncController {
    backend: Arc<dyn GameBackend>,
    config: SyncConfig,
    state: watch::Sender<SessionState>,
    last_checksum: Mutex<Option<ChecksumToken>>,
    cycle: tokio::sync::Mutex<()>,
    joining: tokio::sync::Mutex<()>,
    submitting: tokio::sync::Mutex<()>,
    saving: tokio::sync::Mutex<()>,
    poller: Mutex<Option<Poller>>,
}

impl SyncController {
    pub fn new(backend: Arc<dyn GameBackend>, config: SyncConfig) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::default());
        Arc::new(Self {
            backend,
            config,
            state,
            last_checksum: Mutex::new(None),
            cycle: tokio::sync::Mutex::new(()),
            joining: tokio::sync::Mutex::new(()),
            submitting: tokio::sync::Mutex::new(()),
            saving: tokio::sync::Mutex::new(()),
            poller: Mutex::new(None),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Clones the current state. Prefer [`Self::with_state`] for quick reads.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn last_checksum(&self) -> Option<ChecksumToken> {
        self.last_checksum.lock().clone()
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .as_ref()
            .is_some_and(|poller| !poller.handle.is_finished())
    }

    /// Registers the player, performs the first full refresh, records the
    /// checksum and only then starts polling.
    pub async fn join(self: &Arc<Self>, game_id: &str, player_name: &str) -> Result<(), SyncError> {
        let game_id = game_id.trim();
        let player_name = player_name.trim();
        if game_id.is_empty() || player_name.is_empty() {
            return Err(SyncError::Validation(
                "please enter both game ID and player name".into(),
            ));
        }
        let Ok(_joining) = self.joining.try_lock() else {
            return Err(SyncError::Busy(Operation::Join));
        };
        if let Some(active) = self.session() {
            return Err(SyncError::AlreadyJoined(active.game_id));
        }

        let session = Session::new(game_id, player_name);
        self.backend
            .add_player(&session.game_id, &session.player_name)
            .await
            .map_err(|err| report("add_player", &session, err))?;

        {
            let _cycle = self.cycle.lock().await;
            let token = self.fetch_checksum(&session).await;
            let snapshot = self.fetch_snapshot(&session).await?;
            self.state.send_modify(|state| {
                state.session = Some(session.clone());
                state.apply(snapshot);
            });
            *self.last_checksum.lock() = token;
        }

        self.start_polling();
        info!(
            target = "dungeon.sync",
            game_id = %session.game_id,
            player = %session.player_name,
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "joined game"
        );
        Ok(())
    }

    /// One poll tick: compare the backend checksum with the last recorded one
    /// and refresh only when it moved.
    pub async fn poll_once(&self) -> Result<PollOutcome, SyncError> {
        let session = self.session().ok_or(SyncError::NotJoined)?;
        let Ok(_cycle) = self.cycle.try_lock() else {
            debug!(target = "dungeon.sync", "refresh in flight; skipping poll tick");
            return Ok(PollOutcome::Skipped);
        };

        let response = self
            .backend
            .game_checksum(&session.game_id)
            .await
            .map_err(|err| report("game_checksum", &session, err))?;
        let Some(token) = response.game_checksum else {
            return Ok(PollOutcome::Unchanged);
        };
        if self.last_checksum.lock().as_ref() == Some(&token) {
            return Ok(PollOutcome::Unchanged);
        }

        debug!(
            target = "dungeon.sync",
            game_id = %session.game_id,
            checksum = %token,
            "checksum changed; refreshing"
        );
        let snapshot = self.fetch_snapshot(&session).await?;
        if self.apply_snapshot(&session, snapshot) {
            *self.last_checksum.lock() = Some(token);
            Ok(PollOutcome::Refreshed)
        } else {
            Ok(PollOutcome::Skipped)
        }
    }

    /// Sends a free-text action and refreshes right away instead of waiting
    /// for the next poll tick.
    pub async fn submit_action(&self, text: &str) -> Result<(), SyncError> {
        if text.trim().is_empty() {
            return Err(SyncError::Validation("action text is empty".into()));
        }
        let session = self.session().ok_or(SyncError::NotJoined)?;
        let Ok(_submitting) = self.submitting.try_lock() else {
            return Err(SyncError::Busy(Operation::Submit));
        };

        self.backend
            .player_action(&session.game_id, &session.player_name, text)
            .await
            .map_err(|err| report("player_action", &session, err))?;
        self.refresh(&session).await
    }

    /// Pushes the whole working sheet back to the backend.
    pub async fn save_player(&self) -> Result<SaveOutcome, SyncError> {
        let session = self.session().ok_or(SyncError::NotJoined)?;
        let Ok(_saving) = self.saving.try_lock() else {
            return Err(SyncError::Busy(Operation::Save));
        };

        let pending = {
            let state = self.state.borrow();
            let Some(editor) = state.editor.as_ref() else {
                return Err(not_found(&session));
            };
            if !editor.has_unsaved_changes() {
                return Ok(SaveOutcome::NothingToSave);
            }
            editor.pending_save()
        };

        self.backend
            .update_player(&session.game_id, &session.player_name, &pending.sheet)
            .await
            .map_err(|err| report("update_player", &session, err))?;

        self.state.send_modify(|state| {
            if let Some(editor) = state.editor.as_mut() {
                editor.mark_saved(pending);
                state.revision += 1;
            }
        });
        info!(
            target = "dungeon.sync",
            game_id = %session.game_id,
            player = %session.player_name,
            "player sheet saved"
        );
        Ok(SaveOutcome::Saved)
    }

    /// Applies a local edit to the working sheet. Observers are notified only
    /// when the edit succeeds.
    pub fn edit<R>(
        &self,
        f: impl FnOnce(&mut CharacterEditor) -> Result<R, EditError>,
    ) -> Result<R, SyncError> {
        let session = self.session().ok_or(SyncError::NotJoined)?;
        let mut outcome = None;
        self.state.send_if_modified(|state| {
            let Some(editor) = state.editor.as_mut() else {
                outcome = Some(Err(not_found(&session)));
                return false;
            };
            let result = f(editor);
            let changed = result.is_ok();
            if changed {
                state.revision += 1;
            }
            outcome = Some(result.map_err(SyncError::from));
            changed
        });
        outcome.unwrap_or(Err(SyncError::NotJoined))
    }

    pub fn discard_edits(&self) -> Result<(), SyncError> {
        self.edit(|editor| {
            editor.discard();
            Ok(())
        })
    }

    /// Cancels the poll timer. A cycle already in flight still completes and
    /// its result is merged.
    pub fn stop(&self) {
        if let Some(poller) = self.poller.lock().take() {
            poller.shutdown.send_replace(true);
            debug!(target = "dungeon.sync", "polling stopped");
        }
    }

    /// Stops polling and forgets the session. Responses that arrive after
    /// leaving are dropped.
    pub fn leave(&self) {
        self.stop();
        *self.last_checksum.lock() = None;
        self.state.send_modify(|state| {
            let revision = state.revision + 1;
            *state = SessionState {
                revision,
                ..SessionState::default()
            };
        });
    }

    async fn refresh(&self, session: &Session) -> Result<(), SyncError> {
        let _cycle = self.cycle.lock().await;
        let token = self.fetch_checksum(session).await;
        let snapshot = self.fetch_snapshot(session).await?;
        if self.apply_snapshot(session, snapshot) {
            *self.last_checksum.lock() = token;
        }
        Ok(())
    }

    /// Best effort: a missing token only means the next poll refreshes again.
    async fn fetch_checksum(&self, session: &Session) -> Option<ChecksumToken> {
        match self.backend.game_checksum(&session.game_id).await {
            Ok(response) => response.game_checksum,
            Err(err) => {
                warn!(
                    target = "dungeon.sync",
                    game_id = %session.game_id,
                    error = %err,
                    "checksum fetch failed"
                );
                None
            }
        }
    }

    async fn fetch_snapshot(&self, session: &Session) -> Result<Snapshot, SyncError> {
        let history = self
            .backend
            .game_history(&session.game_id)
            .await
            .map_err(|err| report("game_history", session, err))?;
        let player = self
            .backend
            .player_state(&session.player_name, &session.game_id)
            .await
            .map_err(|err| report("player_state", session, err))?;
        Ok(Snapshot::new(history, player))
    }

    fn apply_snapshot(&self, session: &Session, snapshot: Snapshot) -> bool {
        self.state.send_if_modified(|state| {
            if state.session.as_ref() != Some(session) {
                debug!(target = "dungeon.sync", "session changed; dropping snapshot");
                return false;
            }
            state.apply(snapshot);
            true
        })
    }

    fn start_polling(self: &Arc<Self>) {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(
            Arc::downgrade(self),
            self.config.poll_interval,
            shutdown_rx,
        ));
        if let Some(previous) = self.poller.lock().replace(Poller { shutdown, handle }) {
            previous.shutdown.send_replace(true);
        }
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    controller: Weak<SyncController>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }
        let Some(controller) = controller.upgrade() else {
            break;
        };
        match controller.poll_once().await {
            Ok(outcome) => debug!(target = "dungeon.sync", ?outcome, "poll tick"),
            Err(err) => debug!(
                target = "dungeon.sync",
                error = %err,
                "poll tick failed; retrying next tick"
            ),
        }
    }
}

fn report(operation: &'static str, session: &Session, err: DungeonError) -> SyncError {
    warn!(
        target = "dungeon.sync",
        operation,
        game_id = %session.game_id,
        player = %session.player_name,
        error = %err,
        "backend call failed"
    );
    SyncError::Transport(err)
}

fn not_found(session: &Session) -> SyncError {
    SyncError::NotFound {
        game: session.game_id.clone(),
        player: session.player_name.clone(),
    }
}
