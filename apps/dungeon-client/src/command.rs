use dungeon_sync::{EditError, ItemField, SheetField};
use thiserror::Error;

/// What the player asked for with one line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Action(String),
    Look,
    Npc(NpcRef),
    Sheet,
    ToggleEdit,
    SetField(SheetField, String),
    AddItem,
    RemoveItem(usize),
    SetItemField(usize, ItemField, String),
    Save,
    Discard,
    Poll,
    Help,
    Quit,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NpcRef {
    Index(usize),
    Name(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command '/{0}', try /help")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not an item index")]
    BadIndex(String),
    #[error(transparent)]
    Field(#[from] EditError),
}

const SET_USAGE: &str = "/set <field> <value>";
const ITEM_USAGE: &str = "/item add | /item rm <index> | /item set <index> <field> <value>";
const NPC_USAGE: &str = "/npc <index|name>";

pub fn parse(line: &str) -> Result<Intent, ParseError> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Ok(if line.is_empty() {
            Intent::Nothing
        } else {
            Intent::Action(line.to_string())
        });
    };

    let (name, rest) = split_word(command);
    match name.to_ascii_lowercase().as_str() {
        "look" | "l" => Ok(Intent::Look),
        "npc" => parse_npc(rest),
        "sheet" | "me" => Ok(Intent::Sheet),
        "edit" => Ok(Intent::ToggleEdit),
        "set" => {
            let (field, value) = split_word(rest);
            if field.is_empty() {
                return Err(ParseError::Usage(SET_USAGE));
            }
            Ok(Intent::SetField(field.parse()?, value.to_string()))
        }
        "item" => parse_item(rest),
        "save" => Ok(Intent::Save),
        "discard" => Ok(Intent::Discard),
        "poll" => Ok(Intent::Poll),
        "help" | "?" => Ok(Intent::Help),
        "quit" | "exit" | "q" => Ok(Intent::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn parse_npc(rest: &str) -> Result<Intent, ParseError> {
    let target = rest.trim();
    if target.is_empty() {
        return Err(ParseError::Usage(NPC_USAGE));
    }
    Ok(Intent::Npc(match target.parse() {
        Ok(index) => NpcRef::Index(index),
        Err(_) => NpcRef::Name(target.to_string()),
    }))
}

fn parse_item(rest: &str) -> Result<Intent, ParseError> {
    let (verb, rest) = split_word(rest);
    match verb.to_ascii_lowercase().as_str() {
        "add" => Ok(Intent::AddItem),
        "rm" | "remove" => {
            let (index, _) = split_word(rest);
            Ok(Intent::RemoveItem(parse_index(index)?))
        }
        "set" => {
            let (index, rest) = split_word(rest);
            let (field, value) = split_word(rest);
            if index.is_empty() || field.is_empty() {
                return Err(ParseError::Usage(ITEM_USAGE));
            }
            Ok(Intent::SetItemField(
                parse_index(index)?,
                field.parse()?,
                value.to_string(),
            ))
        }
        _ => Err(ParseError::Usage(ITEM_USAGE)),
    }
}

fn parse_index(raw: &str) -> Result<usize, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::Usage(ITEM_USAGE));
    }
    raw.parse().map_err(|_| ParseError::BadIndex(raw.to_string()))
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

pub const HELP: &str = "\
Type anything without a leading '/' to tell the DM what you do.

  /look                         describe your current location
  /npc <index|name>             details, dialogue and inventory of an NPC here
  /sheet                        show your character sheet
  /edit                         toggle edit mode (staged edits are kept)
  /set <field> <value>          stage a sheet edit (name, description, level, race,
                                class, hp, attack, defense, money, max_carry, location)
  /item add                     append a blank inventory item
  /item rm <index>              remove an item; later items shift down
  /item set <index> <field> <value>
                                edit an item (name, description, weight, value, health)
  /save                         send the whole sheet to the backend
  /discard                      drop staged edits
  /poll                         check for updates now
  /help                         this text
  /quit                         leave the game";
