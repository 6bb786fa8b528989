//! Whole roll cycles fed through the parser, the state machine and the log,
//! the way the client drives them.

use rollcall_protocol::{SettingsChange, SocketResponse, parse_response};
use rollcall_rolls::{
    AttackType, Class, RollDetail, RollLog, RollState, RollStateMachine, RollType, SaveType,
};
use serde_json::{Value, json};

// =========================================================================
// Helpers
// =========================================================================

fn settings(fields: Value) -> SettingsChange {
    match parse_response(json!({ "a": "m", "b": { "p": "slots/ABCDEF/settings", "d": fields } })) {
        SocketResponse::Settings(change) => change,
        other => panic!("expected settings, got {other:?}"),
    }
}

fn rolls(path: &str, payload: Value) -> rollcall_protocol::RollChange {
    match parse_response(json!({ "a": "d", "b": { "p": path, "d": payload } })) {
        SocketResponse::Roll(change) => change,
        other => panic!("expected roll change, got {other:?}"),
    }
}

/// Applies a roll change the way the client does: clear first, then append.
fn apply(log: &mut RollLog, change: &rollcall_protocol::RollChange) {
    if change.clear {
        log.clear();
    }
    for group in &change.rolls {
        log.ingest(group, "ABCDEF");
    }
}

// =========================================================================
// State machine
// =========================================================================

#[test]
fn test_save_roll_resolves_only_once_kind_arrives() {
    let mut machine = RollStateMachine::new();

    let first = machine.apply(&settings(json!({ "rollState": "accept", "roll": "save_roll" })));
    assert!(first.is_err());
    assert_eq!(machine.state(), RollState::Disabled);

    let second = machine
        .apply(&settings(json!({ "saveRollType": "reflex" })))
        .unwrap();
    assert_eq!(second.current, RollState::Accept(RollType::Save(SaveType::Reflex)));
    assert!(second.changed());
}

#[test]
fn test_reveal_next_then_instantly_completes() {
    let mut machine = RollStateMachine::new();
    machine
        .apply(&settings(json!({ "rollState": "reveal", "roll": "attack_roll", "reveal": "next" })))
        .unwrap();
    assert_eq!(
        machine.state(),
        RollState::Reveal {
            roll_type: RollType::Attack,
            complete: false
        }
    );

    let t = machine.apply(&settings(json!({ "reveal": "instantly" }))).unwrap();

    assert_eq!(
        t.current,
        RollState::Reveal {
            roll_type: RollType::Attack,
            complete: true
        }
    );
    assert!(t.changed());
}

#[test]
fn test_repeated_identical_update_is_idempotent() {
    let update = settings(json!({ "rollState": "accept", "roll": "initiative_roll" }));
    let mut once = RollStateMachine::new();
    let mut twice = RollStateMachine::new();

    once.apply(&update).unwrap();
    twice.apply(&update).unwrap();
    let second = twice.apply(&update).unwrap();

    assert_eq!(once.state(), twice.state());
    assert!(!second.changed());
}

#[test]
fn test_obs_flag_overrides_disabled_until_cleared() {
    let mut machine = RollStateMachine::new();
    machine.apply(&settings(json!({ "showSlotIdInOBS": true }))).unwrap();
    assert_eq!(machine.state(), RollState::ShowSlotId);

    machine
        .apply(&settings(json!({ "rollState": "accept", "roll": "attack_roll" })))
        .unwrap();
    assert_eq!(machine.state(), RollState::Accept(RollType::Attack));

    machine.apply(&settings(json!({ "rollState": "disabled" }))).unwrap();
    assert_eq!(machine.state(), RollState::ShowSlotId);

    machine.apply(&settings(json!({ "showSlotIdInOBS": false }))).unwrap();
    assert_eq!(machine.state(), RollState::Disabled);
}

// =========================================================================
// Roll log
// =========================================================================

#[test]
fn test_attack_pair_reads_main_then_off_hand() {
    let mut log = RollLog::new();
    let change = rolls(
        "slots/ABCDEF/rolls/p1",
        json!({
            "classId": "fighter", "eventType": "attack_roll", "slotId": "ABCDEF",
            "rolls": {
                "0": { "dieResult": 15, "modifiedResult": 19, "type": "melee_main", "isSuccess": true, "damage": 8 },
                "1": { "dieResult": 4, "modifiedResult": 6, "type": "melee_main", "isSuccess": false }
            }
        }),
    );

    apply(&mut log, &change);

    let types: Vec<AttackType> = log
        .rolls()
        .iter()
        .map(|roll| match roll.detail {
            RollDetail::Attack { attack_type, .. } => attack_type,
            other => panic!("expected attack, got {other:?}"),
        })
        .collect();
    assert_eq!(types, vec![AttackType::MeleeMain, AttackType::MeleeOff]);
}

#[test]
fn test_clear_in_same_batch_empties_before_append() {
    let mut log = RollLog::new();
    apply(
        &mut log,
        &rolls(
            "slots/ABCDEF/rolls/p1",
            json!({ "classId": "elf", "eventType": "initiative_roll", "slotId": "ABCDEF",
                    "rolls": [{ "dieResult": 2, "modifiedResult": 5 }] }),
        ),
    );
    assert_eq!(log.len(), 1);

    let mut change = rolls("slots/ABCDEF/rolls", Value::Null);
    change.rolls = rolls(
        "slots/ABCDEF/rolls/p2",
        json!({ "classId": "monk", "eventType": "initiative_roll", "slotId": "ABCDEF",
                "rolls": [{ "dieResult": 18, "modifiedResult": 22 }] }),
    )
    .rolls;
    apply(&mut log, &change);

    assert_eq!(log.len(), 1);
    assert_eq!(log.rolls()[0].class, Class::Monk);
}

#[test]
fn test_rolls_for_other_slot_ignored() {
    let mut log = RollLog::new();
    let change = rolls(
        "slots/ZZZZZZ/rolls",
        json!({ "p1": { "classId": "cleric", "eventType": "initiative_roll", "slotId": "ZZZZZZ",
                        "rolls": [{ "dieResult": 9, "modifiedResult": 9 }] } }),
    );

    apply(&mut log, &change);

    assert!(log.is_empty());
}

#[test]
fn test_bad_die_skipped_siblings_kept() {
    let mut log = RollLog::new();
    let change = rolls(
        "slots/ABCDEF/rolls/p1",
        json!({ "classId": "wizard", "eventType": "save_roll", "slotId": "abcdef",
                "rolls": [
                    { "dieResult": 3, "modifiedResult": 3, "type": "luck" },
                    { "dieResult": 17, "modifiedResult": 20, "type": "will", "isSuccess": true }
                ] }),
    );

    apply(&mut log, &change);

    assert_eq!(log.len(), 1);
    assert_eq!(
        log.rolls()[0].detail,
        RollDetail::Save {
            save_type: SaveType::Will,
            success: true
        }
    );
}
