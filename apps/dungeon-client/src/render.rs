use std::fmt::Write as _;

use dungeon_sdk::{Item, LocationView, NpcSummary, PlayerSheet};
use dungeon_sync::{PlayerStatus, SessionState, PLAYER_NOT_FOUND_HINT};

use crate::command::NpcRef;

pub fn sheet(state: &SessionState) -> String {
    let editor = match (state.player, state.editor.as_ref()) {
        (PlayerStatus::Loaded, Some(editor)) => editor,
        (PlayerStatus::NotFound, _) => return not_found(state),
        _ => return "Loading player data...".to_string(),
    };
    let sheet = editor.sheet();
    let mut out = sheet_card(sheet);
    if editor.is_open() {
        out.push_str("\n[editing]");
    }
    if editor.has_unsaved_changes() {
        out.push_str("\n* unsaved changes, /save to keep them or /discard to drop them");
    }
    out
}

pub fn sheet_card(sheet: &PlayerSheet) -> String {
    let mut out = sheet.headline();
    if !sheet.description.is_empty() {
        let _ = write!(out, "\n{}", sheet.description);
    }
    let _ = write!(
        out,
        "\nHP: {}  ATK: {}  DEF: {}  Money: {}  Max carry: {}",
        sheet.hp, sheet.attack, sheet.defense, sheet.money, sheet.max_weight_to_carry
    );
    if let Some(location) = sheet.location.as_deref() {
        let _ = write!(out, "\nLocation: {location}");
    }
    out.push_str("\nInventory:");
    push_items(&mut out, &sheet.inventory, true);
    out
}

pub fn location(state: &SessionState) -> String {
    if state.player == PlayerStatus::NotFound {
        return not_found(state);
    }
    match state.location.as_ref() {
        Some(location) => location_card(location),
        None => "You are nowhere in particular.".to_string(),
    }
}

pub fn location_card(location: &LocationView) -> String {
    let mut out = format!("== {} ==", location.name);
    if !location.description.is_empty() {
        let _ = write!(out, "\n{}", location.description);
    }
    out.push_str("\nItems:");
    push_items(&mut out, &location.items, false);
    out.push_str("\nNPCs:");
    if location.npcs.is_empty() {
        out.push_str("\n  (none)");
    }
    for (index, npc) in location.npcs.iter().enumerate() {
        let _ = write!(out, "\n  [{index}] {npc}");
    }
    if !location.neighbours.is_empty() {
        let _ = write!(out, "\nExits: {}", location.neighbours.join(", "));
    }
    out
}

pub fn npc_detail(npc: &NpcSummary) -> String {
    let mut out = npc.to_string();
    let _ = write!(
        out,
        "\nLevel {}  Mood: {}  Money: {}",
        npc.level, npc.mood, npc.money
    );
    out.push_str("\nDialogue:");
    if npc.dialogue.is_empty() {
        out.push_str("\n  (silent)");
    }
    for line in &npc.dialogue {
        let _ = write!(out, "\n  {line}");
    }
    out.push_str("\nInventory:");
    push_items(&mut out, &npc.inventory, false);
    out
}

pub fn find_npc<'a>(location: &'a LocationView, target: &NpcRef) -> Option<&'a NpcSummary> {
    match target {
        NpcRef::Index(index) => location.npcs.get(*index),
        NpcRef::Name(name) => location
            .npcs
            .iter()
            .find(|npc| npc.name.eq_ignore_ascii_case(name)),
    }
}

fn not_found(state: &SessionState) -> String {
    let name = state
        .session
        .as_ref()
        .map(|session| session.player_name.as_str())
        .unwrap_or("you");
    format!("Player '{name}' not found. {PLAYER_NOT_FOUND_HINT}")
}

fn push_items(out: &mut String, items: &[Item], numbered: bool) {
    if items.is_empty() {
        out.push_str("\n  (empty)");
    }
    for (index, item) in items.iter().enumerate() {
        if numbered {
            let _ = write!(out, "\n  [{index}] {item}");
        } else {
            let _ = write!(out, "\n  {item}");
        }
    }
}
