use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use dungeon_sync::{
    Operation, PlayerStatus, PollOutcome, SaveOutcome, SessionState, SyncController, SyncError,
    PLAYER_NOT_FOUND_HINT,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::command::{self, Intent, HELP};
use crate::render;

pub const SAVED: &str = "Player data updated successfully!";
const NOT_EDITING: &str = "Use /edit to start editing your character.";
const WAITING: &str = "Wait while the DM prepares the game!";

#[derive(Debug, PartialEq)]
pub enum Flow {
    Say(String),
    Silent,
    Quit,
}

/// Joins the game, then feeds stdin lines to the table until EOF or /quit.
pub async fn run(
    controller: Arc<SyncController>,
    game_id: &str,
    player_name: &str,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    if !join_until_ready(&controller, &mut lines, game_id, player_name).await? {
        return Ok(());
    }

    let state = controller.snapshot();
    println!("{}", render::sheet(&state));
    println!();
    println!("{}", state.narrative());
    println!("(type /help for commands)");

    let narrator = spawn_narrator(controller.subscribe());
    let table = Table::new(controller.clone());
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let flow = match command::parse(&line) {
            Ok(intent) => table.handle(intent).await,
            Err(err) => Flow::Say(err.to_string()),
        };
        match flow {
            Flow::Say(text) => println!("{text}"),
            Flow::Silent => {}
            Flow::Quit => break,
        }
    }

    narrator.abort();
    controller.leave();
    Ok(())
}

/// Joins, asking for corrected identifiers after every failure. Returns
/// false when the user gives up with /quit or EOF.
pub async fn join_until_ready<R>(
    controller: &Arc<SyncController>,
    lines: &mut Lines<R>,
    game_id: &str,
    player_name: &str,
) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    let mut game_id = game_id.to_string();
    let mut player_name = player_name.to_string();
    loop {
        println!("{WAITING}");
        match controller.join(&game_id, &player_name).await {
            Ok(()) => return Ok(true),
            Err(err) => println!("{}", user_message(Operation::Join, &err)),
        }
        let Some(game) = ask(lines, "Game ID", &game_id).await? else {
            return Ok(false);
        };
        let Some(player) = ask(lines, "Player name", &player_name).await? else {
            return Ok(false);
        };
        game_id = game;
        player_name = player;
    }
}

/// Prompts with the current value. Blank input keeps it.
async fn ask<R>(lines: &mut Lines<R>, label: &str, current: &str) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    print!("{label} [{current}]: ");
    std::io::stdout().flush().context("flushing stdout")?;
    let Some(line) = lines.next_line().await.context("reading stdin")? else {
        return Ok(None);
    };
    let line = line.trim();
    Ok(match line {
        "/quit" => None,
        "" => Some(current.to_string()),
        value => Some(value.to_string()),
    })
}

/// Dispatches parsed intents to the controller and words the outcome.
pub struct Table {
    controller: Arc<SyncController>,
}

impl Table {
    pub fn new(controller: Arc<SyncController>) -> Self {
        Self { controller }
    }

    pub async fn handle(&self, intent: Intent) -> Flow {
        match intent {
            Intent::Nothing => Flow::Silent,
            Intent::Quit => Flow::Quit,
            Intent::Help => Flow::Say(HELP.to_string()),
            Intent::Action(text) => match self.controller.submit_action(&text).await {
                Ok(()) => Flow::Silent,
                Err(err) => Flow::Say(user_message(Operation::Submit, &err)),
            },
            Intent::Look => Flow::Say(self.controller.with_state(render::location)),
            Intent::Sheet => Flow::Say(self.controller.with_state(render::sheet)),
            Intent::Npc(target) => Flow::Say(self.controller.with_state(|state| {
                state
                    .location
                    .as_ref()
                    .and_then(|location| render::find_npc(location, &target))
                    .map(render::npc_detail)
                    .unwrap_or_else(|| "No such NPC here.".to_string())
            })),
            Intent::ToggleEdit => self.say(self.controller.edit(|editor| Ok(editor.toggle())).map(
                |open| {
                    if open {
                        "Edit mode on. Changes stay local until /save.".to_string()
                    } else {
                        "Edit mode off. Staged edits are kept.".to_string()
                    }
                },
            )),
            Intent::SetField(field, value) => self.staged(|| {
                self.controller
                    .edit(|editor| editor.set_field(field, &value))
                    .map(|()| format!("{} staged.", field.as_str()))
            }),
            Intent::AddItem => self.staged(|| {
                self.controller
                    .edit(|editor| Ok(editor.add_item()))
                    .map(|index| format!("Added blank item [{index}]."))
            }),
            Intent::RemoveItem(index) => self.staged(|| {
                self.controller
                    .edit(|editor| editor.remove_item(index))
                    .map(|item| format!("Removed [{index}] {}.", item.name))
            }),
            Intent::SetItemField(index, field, value) => self.staged(|| {
                self.controller
                    .edit(|editor| editor.set_item_field(index, field, &value))
                    .map(|()| format!("Item [{index}] {} staged.", field.as_str()))
            }),
            Intent::Save => match self.controller.save_player().await {
                Ok(SaveOutcome::Saved) => Flow::Say(SAVED.to_string()),
                Ok(SaveOutcome::NothingToSave) => Flow::Say("No unsaved changes.".to_string()),
                Err(err) => Flow::Say(user_message(Operation::Save, &err)),
            },
            Intent::Discard => self.say(
                self.controller
                    .discard_edits()
                    .map(|()| "Edits discarded.".to_string()),
            ),
            Intent::Poll => match self.controller.poll_once().await {
                Ok(PollOutcome::Refreshed) => Flow::Silent,
                Ok(PollOutcome::Unchanged) => Flow::Say("Nothing new.".to_string()),
                Ok(PollOutcome::Skipped) => Flow::Say("An update is already running.".to_string()),
                Err(err) => Flow::Say(format!("Could not reach the game: {err}")),
            },
        }
    }

    fn staged(&self, edit: impl FnOnce() -> Result<String, SyncError>) -> Flow {
        let editing = self.controller.with_state(|state| {
            state.editor.as_ref().is_some_and(|editor| editor.is_open())
        });
        if !editing && self.controller.with_state(|state| state.player == PlayerStatus::Loaded) {
            return Flow::Say(NOT_EDITING.to_string());
        }
        self.say(edit())
    }

    fn say(&self, result: Result<String, SyncError>) -> Flow {
        match result {
            Ok(text) => Flow::Say(text),
            Err(err) => Flow::Say(local_message(&err)),
        }
    }
}

/// Prints history lines as they arrive, plus player-status changes.
fn spawn_narrator(mut rx: watch::Receiver<SessionState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (mut printed, mut status) = {
            let state = rx.borrow_and_update();
            (state.history.len(), state.player)
        };
        while rx.changed().await.is_ok() {
            let (lines, player) = {
                let state = rx.borrow_and_update();
                let lines = fresh_lines(&state.history, printed).to_vec();
                printed = state.history.len();
                (lines, state.player)
            };
            for line in lines {
                println!("{line}");
            }
            if player != status {
                if player == PlayerStatus::NotFound {
                    println!("{PLAYER_NOT_FOUND_HINT}");
                }
                status = player;
            }
        }
        debug!(target = "dungeon.client", "narrator stopped");
    })
}

/// Lines not yet shown. A history shorter than what was printed means the
/// backend started over, so everything is shown again.
pub fn fresh_lines(history: &[String], printed: usize) -> &[String] {
    if history.len() < printed {
        history
    } else {
        &history[printed..]
    }
}

pub fn user_message(operation: Operation, err: &SyncError) -> String {
    match err {
        SyncError::Transport(_) => match operation {
            Operation::Join => "Error joining the game. Please try again.".to_string(),
            Operation::Submit => "Error sending action.".to_string(),
            Operation::Save => "Error updating player data. Please try again.".to_string(),
        },
        other => local_message(other),
    }
}

fn local_message(err: &SyncError) -> String {
    match err {
        SyncError::Validation(message) => capitalize(message),
        SyncError::NotFound { .. } => PLAYER_NOT_FOUND_HINT.to_string(),
        SyncError::Busy(operation) => format!("Still waiting on the previous {operation}."),
        SyncError::NotJoined => "Join a game first.".to_string(),
        other => capitalize(&other.to_string()),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
