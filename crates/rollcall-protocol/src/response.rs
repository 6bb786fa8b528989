//! Inbound realtime frames and their classification.
//!
//! The service never tells us what kind of message it is sending; we have
//! to recognise each one by its shape. [`parse_response`] does that as an
//! ordered list of side-effect-free checks, first match wins:
//!
//! 1. **Startup**: the handshake carrying our connection id.
//! 2. **Response**: acknowledgement of one of our numbered requests.
//! 3. **State delta**: a put (`a: "d"`) or merge (`a: "m"`) at a path,
//!    split into settings changes and roll changes by path.
//! 4. **Unknown**: everything else. Unknown is a normal outcome, not an
//!    error: the function is total and never fails.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{Codec, ProtocolError};

/// A classified inbound message. Every variant keeps the raw payload for
/// logging.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketResponse {
    /// Connection handshake.
    Startup { connection_id: String, raw: Value },
    /// Acknowledgement of request `request_id` (status `"ok"` on success).
    Response {
        request_id: u64,
        status: String,
        raw: Value,
    },
    /// Some of the slot's settings fields changed.
    Settings(SettingsChange),
    /// The slot's roll list changed.
    Roll(RollChange),
    /// Anything we don't recognise.
    Unknown { raw: Value },
}

impl SocketResponse {
    /// The payload this message was classified from.
    pub fn raw(&self) -> &Value {
        match self {
            Self::Startup { raw, .. }
            | Self::Response { raw, .. }
            | Self::Unknown { raw } => raw,
            Self::Settings(change) => &change.raw,
            Self::Roll(change) => &change.raw,
        }
    }

    /// Short name of the variant, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Startup { .. } => "startup",
            Self::Response { .. } => "response",
            Self::Settings(_) => "settings",
            Self::Roll(_) => "roll",
            Self::Unknown { .. } => "unknown",
        }
    }

    fn attach_raw(&mut self, value: Value) {
        match self {
            Self::Startup { raw, .. }
            | Self::Response { raw, .. }
            | Self::Unknown { raw } => *raw = value,
            Self::Settings(change) => change.raw = value,
            Self::Roll(change) => change.raw = value,
        }
    }
}

/// A partial update of the slot settings. `None` means "not part of this
/// update", never "cleared".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsChange {
    pub roll_state: Option<String>,
    pub roll: Option<String>,
    pub reveal: Option<String>,
    pub save_roll_type: Option<String>,
    pub show_slot_id_in_obs: Option<bool>,
    pub raw: Value,
}

impl SettingsChange {
    /// Returns `true` if the update carries no recognised field.
    pub fn is_empty(&self) -> bool {
        self.roll_state.is_none()
            && self.roll.is_none()
            && self.reveal.is_none()
            && self.save_roll_type.is_none()
            && self.show_slot_id_in_obs.is_none()
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let mut change = Self::default();
        for (name, value) in fields {
            change.set_field(name, value);
        }
        change
    }

    fn set_field(&mut self, name: &str, value: &Value) {
        match name {
            "rollState" => self.roll_state = non_empty_string(value),
            "roll" => self.roll = non_empty_string(value),
            "reveal" => self.reveal = non_empty_string(value),
            "saveRollType" => self.save_roll_type = non_empty_string(value),
            "showSlotIdInOBS" => self.show_slot_id_in_obs = value.as_bool(),
            _ => {}
        }
    }
}

/// A change to the slot's roll list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollChange {
    /// The whole roll list was deleted (a new cycle is starting).
    pub clear: bool,
    /// One entry per player roll group, in delivery order.
    pub rolls: Vec<RollChangeData>,
    pub raw: Value,
}

/// One player's bundle of dice for a single roll event.
#[derive(Debug, Clone, PartialEq)]
pub struct RollChangeData {
    pub class_id: String,
    pub event_type: String,
    pub slot_id: String,
    /// The group's dice, in the order the service delivered their keys.
    /// Positional meaning matters: index 1 of an attack is the off hand.
    pub rolls: Vec<RollChangeDataRoll>,
}

/// One die inside a roll group, exactly as the service reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollChangeDataRoll {
    pub die_result: i32,
    pub modified_result: i32,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub is_success: Option<bool>,
    #[serde(default)]
    pub damage: Option<i32>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Decodes one text frame from the socket and classifies its `d` payload.
///
/// # Errors
/// Returns `ProtocolError::Decode` if the frame is not valid JSON. A valid
/// frame with no `d` field classifies as [`SocketResponse::Unknown`].
pub fn decode_frame<C: Codec>(codec: &C, text: &str) -> Result<SocketResponse, ProtocolError> {
    let mut envelope: Value = codec.decode(text)?;
    match envelope.as_object_mut().and_then(|frame| frame.remove("d")) {
        Some(payload) => Ok(parse_response(payload)),
        None => Ok(SocketResponse::Unknown { raw: envelope }),
    }
}

/// Classifies an unwrapped inbound payload. Total: never fails.
pub fn parse_response(data: Value) -> SocketResponse {
    let mut response = startup(&data)
        .or_else(|| message_response(&data))
        .or_else(|| state_change(&data))
        .unwrap_or(SocketResponse::Unknown { raw: Value::Null });
    response.attach_raw(data);
    response
}

fn startup(data: &Value) -> Option<SocketResponse> {
    if data.get("t").and_then(Value::as_str) != Some("h") {
        return None;
    }
    let d = data.get("d")?;
    let well_formed = d.get("h").is_some_and(Value::is_string)
        && d.get("ts").is_some_and(Value::is_number)
        && d.get("v").is_some_and(Value::is_string);
    let connection_id = d.get("s")?.as_str()?;
    well_formed.then(|| SocketResponse::Startup {
        connection_id: connection_id.to_string(),
        raw: Value::Null,
    })
}

fn message_response(data: &Value) -> Option<SocketResponse> {
    let request_id = data.get("r")?.as_u64()?;
    let status = data.get("b")?.get("s")?.as_str()?;
    Some(SocketResponse::Response {
        request_id,
        status: status.to_string(),
        raw: Value::Null,
    })
}

fn state_change(data: &Value) -> Option<SocketResponse> {
    let action = data.get("a")?.as_str()?;
    if action != "d" && action != "m" {
        return None;
    }
    let body = data.get("b")?;
    let path = body.get("p")?.as_str()?;
    let payload = body.get("d").unwrap_or(&Value::Null);

    if path.contains("/settings") {
        return Some(SocketResponse::Settings(settings_change(path, payload)));
    }

    if path.ends_with("/rolls") {
        let change = match payload {
            Value::Null => RollChange {
                clear: true,
                ..RollChange::default()
            },
            Value::Object(groups) => RollChange {
                rolls: groups.values().filter_map(roll_change_data).collect(),
                ..RollChange::default()
            },
            Value::Array(groups) => RollChange {
                rolls: groups.iter().filter_map(roll_change_data).collect(),
                ..RollChange::default()
            },
            _ => return None,
        };
        return Some(SocketResponse::Roll(change));
    }

    if path.contains("/rolls") {
        return Some(SocketResponse::Roll(RollChange {
            rolls: roll_change_data(payload).into_iter().collect(),
            ..RollChange::default()
        }));
    }

    None
}

fn settings_change(path: &str, payload: &Value) -> SettingsChange {
    match payload {
        Value::Object(fields) => SettingsChange::from_fields(fields),
        // A put on a single leaf, e.g. `slots/ABCDEF/settings/rollState`.
        scalar => {
            let mut change = SettingsChange::default();
            if let Some(field) = path.rsplit('/').next() {
                change.set_field(field, scalar);
            }
            change
        }
    }
}

fn roll_change_data(value: &Value) -> Option<RollChangeData> {
    let group = value.as_object()?;
    let text = |key: &str| group.get(key).and_then(Value::as_str).map(str::to_string);

    let (Some(class_id), Some(event_type), Some(slot_id)) =
        (text("classId"), text("eventType"), text("slotId"))
    else {
        tracing::debug!(group = %value, "dropping malformed roll group");
        return None;
    };

    let dice: Vec<&Value> = match group.get("rolls") {
        Some(Value::Object(dice)) => dice.values().collect(),
        Some(Value::Array(dice)) => dice.iter().filter(|die| !die.is_null()).collect(),
        _ => Vec::new(),
    };

    let rolls = dice
        .into_iter()
        .filter_map(|die| match RollChangeDataRoll::deserialize(die) {
            Ok(roll) => Some(roll),
            Err(e) => {
                tracing::debug!(error = %e, die = %die, "dropping malformed die");
                None
            }
        })
        .collect();

    Some(RollChangeData {
        class_id,
        event_type,
        slot_id,
        rolls,
    })
}

fn non_empty_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonCodec;
    use serde_json::json;

    fn group(slot: &str, event: &str, dice: Value) -> Value {
        json!({ "classId": "fighter", "eventType": event, "slotId": slot, "rolls": dice })
    }

    // =====================================================================
    // startup / response
    // =====================================================================

    #[test]
    fn test_parse_response_startup_extracts_connection_id() {
        let data = json!({ "t": "h", "d": { "ts": 1700, "v": "5", "h": "host", "s": "conn-42" } });

        let parsed = parse_response(data.clone());

        assert_eq!(
            parsed,
            SocketResponse::Startup {
                connection_id: "conn-42".into(),
                raw: data
            }
        );
    }

    #[test]
    fn test_parse_response_startup_missing_timestamp_is_unknown() {
        let parsed = parse_response(json!({ "t": "h", "d": { "v": "5", "h": "host", "s": "x" } }));
        assert_eq!(parsed.kind(), "unknown");
    }

    #[test]
    fn test_parse_response_ack_extracts_request_id_and_status() {
        let parsed = parse_response(json!({ "r": 7, "b": { "s": "ok", "d": {} } }));

        assert!(matches!(
            parsed,
            SocketResponse::Response { request_id: 7, ref status, .. } if status == "ok"
        ));
    }

    #[test]
    fn test_parse_response_ack_with_string_id_is_unknown() {
        let parsed = parse_response(json!({ "r": "7", "b": { "s": "ok" } }));
        assert_eq!(parsed.kind(), "unknown");
    }

    // =====================================================================
    // settings
    // =====================================================================

    #[test]
    fn test_parse_response_settings_merge_collects_fields() {
        let parsed = parse_response(json!({
            "a": "m",
            "b": { "p": "slots/ABCDEF/settings", "d": {
                "rollState": "accept", "roll": "save_roll", "showSlotIdInOBS": true, "other": 1
            } }
        }));

        let SocketResponse::Settings(change) = parsed else {
            panic!("expected settings, got {parsed:?}");
        };
        assert_eq!(change.roll_state.as_deref(), Some("accept"));
        assert_eq!(change.roll.as_deref(), Some("save_roll"));
        assert_eq!(change.reveal, None);
        assert_eq!(change.save_roll_type, None);
        assert_eq!(change.show_slot_id_in_obs, Some(true));
    }

    #[test]
    fn test_parse_response_settings_leaf_put_sets_single_field() {
        let parsed = parse_response(json!({
            "a": "d",
            "b": { "p": "slots/ABCDEF/settings/saveRollType", "d": "reflex" }
        }));

        let SocketResponse::Settings(change) = parsed else {
            panic!("expected settings");
        };
        assert_eq!(change.save_roll_type.as_deref(), Some("reflex"));
        assert_eq!(change.roll_state, None);
    }

    #[test]
    fn test_parse_response_settings_ignores_wrongly_typed_fields() {
        let parsed = parse_response(json!({
            "a": "m",
            "b": { "p": "slots/ABCDEF/settings", "d": { "rollState": 3, "showSlotIdInOBS": "yes", "roll": "" } }
        }));

        let SocketResponse::Settings(change) = parsed else {
            panic!("expected settings");
        };
        assert!(change.is_empty());
    }

    #[test]
    fn test_parse_response_unrecognised_action_is_unknown() {
        let parsed = parse_response(json!({ "a": "c", "b": { "p": "slots/ABCDEF/settings", "d": {} } }));
        assert_eq!(parsed.kind(), "unknown");
    }

    // =====================================================================
    // rolls
    // =====================================================================

    #[test]
    fn test_parse_response_rolls_null_payload_is_clear() {
        let parsed = parse_response(json!({ "a": "d", "b": { "p": "slots/ABCDEF/rolls", "d": null } }));

        let SocketResponse::Roll(change) = parsed else {
            panic!("expected roll");
        };
        assert!(change.clear);
        assert!(change.rolls.is_empty());
    }

    #[test]
    fn test_parse_response_rolls_object_payload_has_one_entry_per_key() {
        let parsed = parse_response(json!({ "a": "d", "b": { "p": "slots/ABCDEF/rolls", "d": {
            "p1": group("ABCDEF", "initiative_roll", json!({ "0": { "dieResult": 12, "modifiedResult": 15 } })),
            "p2": group("ABCDEF", "initiative_roll", json!({ "0": { "dieResult": 3, "modifiedResult": 4 } })),
        } } }));

        let SocketResponse::Roll(change) = parsed else {
            panic!("expected roll");
        };
        assert!(!change.clear);
        assert_eq!(change.rolls.len(), 2);
        assert_eq!(change.rolls[0].rolls[0].die_result, 12);
        assert_eq!(change.rolls[1].rolls[0].die_result, 3);
    }

    #[test]
    fn test_parse_response_rolls_sub_path_is_single_entry() {
        let parsed = parse_response(json!({ "a": "m", "b": { "p": "slots/ABCDEF/rolls/p1", "d":
            group("ABCDEF", "attack_roll", json!({ "a": { "dieResult": 20, "modifiedResult": 25, "type": "melee_main" } }))
        } }));

        let SocketResponse::Roll(change) = parsed else {
            panic!("expected roll");
        };
        assert!(!change.clear);
        assert_eq!(change.rolls.len(), 1);
        assert_eq!(change.rolls[0].event_type, "attack_roll");
        assert_eq!(change.rolls[0].rolls[0].kind.as_deref(), Some("melee_main"));
    }

    #[test]
    fn test_parse_response_dice_keep_delivery_order() {
        // Keys deliberately out of lexical order: order must be as delivered.
        let text = r#"{"a":"d","b":{"p":"slots/ABCDEF/rolls/p1","d":{"classId":"rogue","eventType":"attack_roll","slotId":"ABCDEF","rolls":{"z":{"dieResult":1,"modifiedResult":1},"a":{"dieResult":2,"modifiedResult":2}}}}}"#;
        let data: Value = serde_json::from_str(text).unwrap();

        let SocketResponse::Roll(change) = parse_response(data) else {
            panic!("expected roll");
        };
        let results: Vec<i32> = change.rolls[0].rolls.iter().map(|r| r.die_result).collect();
        assert_eq!(results, vec![1, 2]);
    }

    #[test]
    fn test_parse_response_malformed_die_dropped_siblings_kept() {
        let parsed = parse_response(json!({ "a": "d", "b": { "p": "slots/ABCDEF/rolls/p1", "d":
            group("ABCDEF", "save_roll", json!([
                { "dieResult": "x" },
                null,
                { "dieResult": 9, "modifiedResult": 11, "type": "will", "isSuccess": true }
            ]))
        } }));

        let SocketResponse::Roll(change) = parsed else {
            panic!("expected roll");
        };
        assert_eq!(change.rolls[0].rolls.len(), 1);
        assert_eq!(change.rolls[0].rolls[0].is_success, Some(true));
    }

    #[test]
    fn test_parse_response_group_without_class_dropped() {
        let parsed = parse_response(json!({ "a": "d", "b": { "p": "slots/ABCDEF/rolls", "d": {
            "p1": { "eventType": "initiative_roll", "slotId": "ABCDEF", "rolls": {} }
        } } }));

        let SocketResponse::Roll(change) = parsed else {
            panic!("expected roll");
        };
        assert!(change.rolls.is_empty());
        assert!(!change.clear);
    }

    #[test]
    fn test_parse_response_unrelated_path_is_unknown() {
        let parsed = parse_response(json!({ "a": "d", "b": { "p": "slots/ABCDEF/players", "d": {} } }));
        assert_eq!(parsed.kind(), "unknown");
    }

    #[test]
    fn test_parse_response_non_object_is_unknown() {
        for data in [json!(null), json!(3), json!("text"), json!([1, 2])] {
            assert_eq!(parse_response(data.clone()).kind(), "unknown", "{data}");
        }
    }

    // =====================================================================
    // decode_frame
    // =====================================================================

    #[test]
    fn test_decode_frame_unwraps_data_envelope() {
        let parsed = decode_frame(&JsonCodec, r#"{"t":"d","d":{"r":2,"b":{"s":"ok","d":""}}}"#).unwrap();
        assert_eq!(parsed.kind(), "response");
    }

    #[test]
    fn test_decode_frame_without_payload_is_unknown() {
        let parsed = decode_frame(&JsonCodec, r#"{"t":"x"}"#).unwrap();
        assert_eq!(parsed.raw(), &json!({ "t": "x" }));
    }

    #[test]
    fn test_decode_frame_malformed_json_is_error() {
        assert!(matches!(
            decode_frame(&JsonCodec, "{\"t\":"),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_response_is_deterministic() {
        let data = json!({ "a": "m", "b": { "p": "slots/ABCDEF/settings", "d": { "reveal": "next" } } });
        assert_eq!(parse_response(data.clone()), parse_response(data));
    }
}
