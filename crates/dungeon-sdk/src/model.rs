use std::fmt;

use serde::{Deserialize, Serialize};

/// A carried or dropped object. Items have no identity beyond their position
/// in whatever sequence holds them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient::float")]
    pub weight: f64,
    #[serde(deserialize_with = "lenient::float")]
    pub value: f64,
    #[serde(deserialize_with = "lenient::int")]
    pub health: i64,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} (Weight: {}, Value: {}, Health: {})",
            self.name, self.description, self.weight, self.value, self.health
        )
    }
}

/// Character sheet for the joined player.
///
/// Fields the client does not know about are kept in `extra` so that a
/// whole-object save hands the backend back everything it sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSheet {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient::int")]
    pub level: i64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub race: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub class_type: String,
    #[serde(deserialize_with = "lenient::int")]
    pub hp: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub attack: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub defense: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub money: i64,
    #[serde(deserialize_with = "lenient::float")]
    pub max_weight_to_carry: f64,
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub inventory: Vec<Item>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PlayerSheet {
    /// A fresh level-0 character with the game server's starting stats.
    pub fn new_character(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "Player".into(),
            level: 0,
            race: "Human".into(),
            class_type: "Peasant".into(),
            hp: 10,
            attack: 1,
            defense: 1,
            money: 10,
            max_weight_to_carry: 10.0,
            ..Self::default()
        }
    }

    /// One-line heading, e.g. `Lucius (Level 1 Human Warrior)`.
    pub fn headline(&self) -> String {
        let name = non_empty_or(&self.name, "Unnamed Character");
        let level = if self.level == 0 { 1 } else { self.level };
        format!(
            "{name} (Level {level} {} {})",
            non_empty_or(&self.race, "Unknown"),
            non_empty_or(&self.class_type, "Unknown"),
        )
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcSummary {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient::int")]
    pub hp: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub attack: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub defense: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub level: i64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub mood: String,
    #[serde(deserialize_with = "lenient::int")]
    pub money: i64,
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient::float")]
    pub max_weight_to_carry: f64,
    #[serde(deserialize_with = "lenient::or_default")]
    pub dialogue: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub inventory: Vec<Item>,
}

impl Default for NpcSummary {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            hp: 0,
            attack: 0,
            defense: 0,
            level: 0,
            mood: "neutral".into(),
            money: 0,
            location: None,
            max_weight_to_carry: 0.0,
            dialogue: Vec::new(),
            inventory: Vec::new(),
        }
    }
}

impl fmt::Display for NpcSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} (HP: {}, ATK: {}, DEF: {})",
            self.name, self.description, self.hp, self.attack, self.defense
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationView {
    #[serde(deserialize_with = "lenient::or_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub items: Vec<Item>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub npcs: Vec<NpcSummary>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub neighbours: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub visited: bool,
}

/// Opaque game-state version marker. Only equality is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumToken(serde_json::Value);

impl ChecksumToken {
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self(value.into())
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl fmt::Display for ChecksumToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddPlayerRequest<'a> {
    pub game_id: &'a str,
    pub player_name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerActionRequest<'a> {
    pub game_id: &'a str,
    pub player_name: &'a str,
    pub action: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePlayerRequest<'a> {
    pub game_id: &'a str,
    pub player_name: &'a str,
    pub player_state: &'a PlayerSheet,
}

/// Acknowledgement body of the mutating endpoints. The backend is free to
/// return anything here; only the human-readable bits are picked up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub message: Option<String>,
    pub dm_response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryResponse {
    #[serde(deserialize_with = "lenient::or_default")]
    pub history: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStateResponse {
    pub player_state: Option<PlayerSheet>,
    pub player_location: Option<LocationView>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub all_npcs_in_location: Vec<NpcSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksumResponse {
    pub game_checksum: Option<ChecksumToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayersStateResponse {
    pub players_state: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcsStateResponse {
    pub npcs_state: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationsStateResponse {
    pub locations_state: serde_json::Value,
}

/// Field decoders for state written by a loosely typed backend: numbers may
/// arrive as integers, floats or numeric strings, and any field may be null.
/// Null and unreadable values fall back to the field's default so one odd
/// field never sinks a whole response.
mod lenient {
    use std::fmt;

    use serde::de::{self, Deserialize, Deserializer, Visitor};

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(IntVisitor)
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct IntVisitor;

    impl<'de> Visitor<'de> for IntVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer, a float, a numeric string or null")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        // `as` saturates; a non-finite float becomes 0.
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            Ok(if v.is_finite() { v.round() as i64 } else { 0 })
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
            let v = v.trim();
            match v.parse::<i64>() {
                Ok(n) => Ok(n),
                Err(_) => self.visit_f64(v.parse().unwrap_or(0.0)),
            }
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<i64, E> {
            Ok(i64::from(v))
        }

        fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_none<E: de::Error>(self) -> Result<i64, E> {
            Ok(0)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<i64, D::Error> {
            d.deserialize_any(self)
        }
    }

    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number, a numeric string or null")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            Ok(v.trim().parse().unwrap_or(0.0))
        }

        fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_none<E: de::Error>(self) -> Result<f64, E> {
            Ok(0.0)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<f64, D::Error> {
            d.deserialize_any(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_player_sheet_and_keeps_unknown_fields() {
        let sheet: PlayerSheet = serde_json::from_value(json!({
            "name": "Lucius",
            "description": "A brave warrior from the North Rift.",
            "hp": 10,
            "attack": 5,
            "defense": 2,
            "level": 1,
            "money": 10,
            "inventory": [{
                "name": "Sword",
                "description": "A sharp blade.",
                "weight": 5.0,
                "value": 100.0,
                "health": 10
            }],
            "max_weight_to_carry": 10,
            "location": null,
            "race": "Human",
            "class_type": "Warrior",
            "titles": ["Drinker"]
        }))
        .expect("decode sheet");

        assert_eq!(sheet.class_type, "Warrior");
        assert_eq!(sheet.location, None);
        assert_eq!(sheet.inventory[0].weight, 5.0);
        assert_eq!(sheet.extra["titles"], json!(["Drinker"]));

        let encoded = serde_json::to_value(&sheet).expect("encode sheet");
        assert_eq!(encoded["titles"], json!(["Drinker"]));
        assert_eq!(encoded["max_weight_to_carry"], json!(10.0));
    }

    #[test]
    fn headline_falls_back_for_missing_fields() {
        let sheet = PlayerSheet::default();
        assert_eq!(
            sheet.headline(),
            "Unnamed Character (Level 1 Unknown Unknown)"
        );

        let sheet = PlayerSheet {
            name: "Lucius".into(),
            level: 3,
            race: "Human".into(),
            class_type: "Warrior".into(),
            ..PlayerSheet::default()
        };
        assert_eq!(sheet.headline(), "Lucius (Level 3 Human Warrior)");
    }

    #[test]
    fn npc_defaults_to_neutral_mood() {
        let npc: NpcSummary =
            serde_json::from_value(json!({"name": "Goblin", "hp": 5})).expect("decode npc");
        assert_eq!(npc.mood, "neutral");
        assert!(npc.dialogue.is_empty());
        assert_eq!(npc.to_string(), "Goblin -  (HP: 5, ATK: 0, DEF: 0)");
    }

    #[test]
    fn missing_player_state_decodes_as_none() {
        let resp: PlayerStateResponse = serde_json::from_value(json!({
            "player_state": null,
            "player_location": null,
            "all_npcs_in_location": []
        }))
        .expect("decode");
        assert!(resp.player_state.is_none());

        let resp: PlayerStateResponse = serde_json::from_value(json!({})).expect("decode");
        assert!(resp.player_state.is_none());
    }

    #[test]
    fn checksum_tokens_compare_by_value() {
        let a: ChecksumResponse = serde_json::from_value(json!({"game_checksum": 3})).unwrap();
        let b: ChecksumResponse = serde_json::from_value(json!({"game_checksum": 3})).unwrap();
        let c: ChecksumResponse = serde_json::from_value(json!({"game_checksum": "3"})).unwrap();
        assert_eq!(a.game_checksum, b.game_checksum);
        assert_ne!(a.game_checksum, c.game_checksum);

        let missing: ChecksumResponse =
            serde_json::from_value(json!({"game_checksum": null})).unwrap();
        assert!(missing.game_checksum.is_none());
    }

    #[test]
    fn item_line_matches_inventory_listing() {
        let item = Item {
            name: "Sword".into(),
            description: "A sharp blade.".into(),
            weight: 5.0,
            value: 100.0,
            health: 10,
        };
        assert_eq!(
            item.to_string(),
            "Sword - A sharp blade. (Weight: 5, Value: 100, Health: 10)"
        );
    }

    #[test]
    fn tolerates_float_numbers_and_nulls() {
        let resp: PlayerStateResponse = serde_json::from_value(json!({
            "player_state": {
                "name": "Lucius",
                "description": null,
                "hp": 10.0,
                "attack": 4.6,
                "defense": "2",
                "level": null,
                "money": 10,
                "inventory": [{"name": "Sword", "description": null, "weight": 5,
                               "value": null, "health": 10.0}],
                "max_weight_to_carry": "12.5",
                "race": null,
                "class_type": "Warrior"
            },
            "player_location": {
                "name": "Forest",
                "description": null,
                "items": null,
                "npcs": [],
                "neighbours": null,
                "visited": null
            },
            "all_npcs_in_location": [
                {"name": "Goblin", "hp": 5.0, "attack": 2.0, "defense": null,
                 "dialogue": null, "inventory": null, "mood": "angry"}
            ]
        }))
        .expect("decode loosely typed state");

        let sheet = resp.player_state.expect("sheet");
        assert_eq!(sheet.description, "");
        assert_eq!(sheet.hp, 10);
        assert_eq!(sheet.attack, 5);
        assert_eq!(sheet.defense, 2);
        assert_eq!(sheet.level, 0);
        assert_eq!(sheet.max_weight_to_carry, 12.5);
        assert_eq!(sheet.race, "");
        assert_eq!(sheet.inventory[0].health, 10);
        assert_eq!(sheet.inventory[0].weight, 5.0);
        assert_eq!(sheet.inventory[0].value, 0.0);
        assert_eq!(sheet.headline(), "Lucius (Level 1 Unknown Warrior)");

        let location = resp.player_location.expect("location");
        assert!(location.items.is_empty());
        assert!(location.neighbours.is_empty());
        assert!(!location.visited);

        let goblin = &resp.all_npcs_in_location[0];
        assert_eq!((goblin.hp, goblin.attack, goblin.defense), (5, 2, 0));
        assert!(goblin.dialogue.is_empty());
    }

    #[test]
    fn null_npc_list_and_history_decode_empty() {
        let resp: PlayerStateResponse = serde_json::from_value(json!({
            "player_state": null,
            "all_npcs_in_location": null
        }))
        .expect("decode");
        assert!(resp.all_npcs_in_location.is_empty());

        let history: HistoryResponse =
            serde_json::from_value(json!({"history": null})).expect("decode history");
        assert!(history.history.is_empty());
    }

    #[test]
    fn new_character_uses_starting_stats() {
        let sheet = PlayerSheet::new_character("Hero");
        assert_eq!(sheet.headline(), "Hero (Level 1 Human Peasant)");
        assert_eq!((sheet.hp, sheet.attack, sheet.defense, sheet.money), (10, 1, 1, 10));
    }
}
