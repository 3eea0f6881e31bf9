use std::str::FromStr;

use dungeon_sdk::{Item, PlayerSheet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("{field} expects a number, got '{input}'")]
    NotANumber { field: &'static str, input: String },
    #[error("no inventory item at index {index} (inventory has {len})")]
    NoSuchItem { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetField {
    Name,
    Description,
    Level,
    Race,
    ClassType,
    Hp,
    Attack,
    Defense,
    Money,
    MaxWeightToCarry,
    Location,
}

impl SheetField {
    pub fn as_str(self) -> &'static str {
        match self {
            SheetField::Name => "name",
            SheetField::Description => "description",
            SheetField::Level => "level",
            SheetField::Race => "race",
            SheetField::ClassType => "class_type",
            SheetField::Hp => "hp",
            SheetField::Attack => "attack",
            SheetField::Defense => "defense",
            SheetField::Money => "money",
            SheetField::MaxWeightToCarry => "max_weight_to_carry",
            SheetField::Location => "location",
        }
    }
}

impl FromStr for SheetField {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "name" => SheetField::Name,
            "description" | "desc" => SheetField::Description,
            "level" => SheetField::Level,
            "race" => SheetField::Race,
            "class_type" | "class" => SheetField::ClassType,
            "hp" => SheetField::Hp,
            "attack" | "atk" => SheetField::Attack,
            "defense" | "def" => SheetField::Defense,
            "money" | "gold" => SheetField::Money,
            "max_weight_to_carry" | "max_carry" => SheetField::MaxWeightToCarry,
            "location" => SheetField::Location,
            other => return Err(EditError::UnknownField(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Name,
    Description,
    Weight,
    Value,
    Health,
}

impl ItemField {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemField::Name => "name",
            ItemField::Description => "description",
            ItemField::Weight => "weight",
            ItemField::Value => "value",
            ItemField::Health => "health",
        }
    }
}

impl FromStr for ItemField {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "name" => ItemField::Name,
            "description" | "desc" => ItemField::Description,
            "weight" => ItemField::Weight,
            "value" => ItemField::Value,
            "health" => ItemField::Health,
            other => return Err(EditError::UnknownField(other.to_string())),
        })
    }
}

/// Numeric inputs follow form semantics: blank input means zero.
fn parse_number<T: FromStr + Default>(field: &'static str, raw: &str) -> Result<T, EditError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(T::default());
    }
    trimmed.parse().map_err(|_| EditError::NotANumber {
        field,
        input: raw.to_string(),
    })
}

/// Outcome of handing a freshly fetched sheet to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMerge {
    Replaced,
    KeptLocalEdits,
}

/// Sheet state captured when a save starts.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub sheet: PlayerSheet,
    generation: u64,
}

/// Working copy of the player's sheet plus the last copy the backend handed us.
///
/// Every local edit bumps `generation`; the working copy is clean when that
/// generation has been saved or discarded. Inventory entries are addressed by
/// position, so removing an item shifts every later index down by one.
#[derive(Debug, Clone)]
pub struct CharacterEditor {
    remote: PlayerSheet,
    working: PlayerSheet,
    open: bool,
    generation: u64,
    clean_generation: u64,
}

impl CharacterEditor {
    pub fn new(sheet: PlayerSheet) -> Self {
        Self {
            remote: sheet.clone(),
            working: sheet,
            open: false,
            generation: 0,
            clean_generation: 0,
        }
    }

    pub fn sheet(&self) -> &PlayerSheet {
        &self.working
    }

    pub fn remote(&self) -> &PlayerSheet {
        &self.remote
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.generation != self.clean_generation
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flips edit mode. Closing the editor keeps staged edits.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    pub fn set_field(&mut self, field: SheetField, raw: &str) -> Result<(), EditError> {
        let sheet = &mut self.working;
        match field {
            SheetField::Name => sheet.name = raw.to_string(),
            SheetField::Description => sheet.description = raw.to_string(),
            SheetField::Race => sheet.race = raw.to_string(),
            SheetField::ClassType => sheet.class_type = raw.to_string(),
            SheetField::Location => {
                let trimmed = raw.trim();
                sheet.location = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            SheetField::Level => sheet.level = parse_number(field.as_str(), raw)?,
            SheetField::Hp => sheet.hp = parse_number(field.as_str(), raw)?,
            SheetField::Attack => sheet.attack = parse_number(field.as_str(), raw)?,
            SheetField::Defense => sheet.defense = parse_number(field.as_str(), raw)?,
            SheetField::Money => sheet.money = parse_number(field.as_str(), raw)?,
            SheetField::MaxWeightToCarry => {
                sheet.max_weight_to_carry = parse_number(field.as_str(), raw)?
            }
        }
        self.touch();
        Ok(())
    }

    /// Appends a blank item and returns its index.
    pub fn add_item(&mut self) -> usize {
        self.working.inventory.push(Item::default());
        self.touch();
        self.working.inventory.len() - 1
    }

    pub fn remove_item(&mut self, index: usize) -> Result<Item, EditError> {
        self.check_index(index)?;
        let removed = self.working.inventory.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn set_item_field(
        &mut self,
        index: usize,
        field: ItemField,
        raw: &str,
    ) -> Result<(), EditError> {
        self.check_index(index)?;
        let item = &mut self.working.inventory[index];
        match field {
            ItemField::Name => item.name = raw.to_string(),
            ItemField::Description => item.description = raw.to_string(),
            ItemField::Weight => item.weight = parse_number(field.as_str(), raw)?,
            ItemField::Value => item.value = parse_number(field.as_str(), raw)?,
            ItemField::Health => item.health = parse_number(field.as_str(), raw)?,
        }
        self.touch();
        Ok(())
    }

    /// Records a sheet fetched from the backend. A dirty working copy is kept
    /// as is; only the authoritative copy moves forward.
    pub fn accept_remote(&mut self, sheet: PlayerSheet) -> RemoteMerge {
        if self.has_unsaved_changes() {
            self.remote = sheet;
            RemoteMerge::KeptLocalEdits
        } else {
            self.working = sheet.clone();
            self.remote = sheet;
            RemoteMerge::Replaced
        }
    }

    /// Drops staged edits in favour of the latest backend copy.
    pub fn discard(&mut self) {
        self.working = self.remote.clone();
        self.clean_generation = self.generation;
    }

    pub fn pending_save(&self) -> PendingSave {
        PendingSave {
            sheet: self.working.clone(),
            generation: self.generation,
        }
    }

    /// Marks a save as acknowledged. Edits made while the save was in flight
    /// stay unsaved.
    pub fn mark_saved(&mut self, pending: PendingSave) {
        if pending.generation == self.generation {
            self.clean_generation = pending.generation;
        }
        self.remote = pending.sheet;
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    fn check_index(&self, index: usize) -> Result<(), EditError> {
        let len = self.working.inventory.len();
        if index < len {
            Ok(())
        } else {
            Err(EditError::NoSuchItem { index, len })
        }
    }
}
