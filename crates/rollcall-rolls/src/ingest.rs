//! Turning reported dice into typed rolls.

use rollcall_protocol::{RollChangeData, RollChangeDataRoll};

use crate::{AttackType, Class, RollError, SaveType};

/// The service's label for any ranged attack's first die.
const RANGED_LABEL: &str = "range_main";
/// Effect text the service reports when there is no effect.
const NO_EFFECT: &str = "(null)";

/// One die a player rolled, with its meaning resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roll {
    pub class: Class,
    pub die_result: i32,
    pub modified_result: i32,
    pub effect: Option<String>,
    pub detail: RollDetail,
}

/// The kind-specific part of a [`Roll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollDetail {
    Initiative,
    Attack {
        attack_type: AttackType,
        success: bool,
        damage: i32,
    },
    Save {
        save_type: SaveType,
        success: bool,
    },
}

/// Builds the [`Roll`] for die number `index` of a roll group.
///
/// Attack dice need context to read correctly: a ranged first die whose
/// effect is the empty placeholder was a spell, and the second die of a
/// group (index 1) is the off-hand attack.
///
/// ```
/// use rollcall_protocol::{RollChangeData, RollChangeDataRoll};
/// use rollcall_rolls::{AttackType, RollDetail, roll_from_update};
///
/// let die = RollChangeDataRoll {
///     die_result: 14,
///     modified_result: 17,
///     kind: Some("melee_main".into()),
///     effect: None,
///     is_success: Some(true),
///     damage: Some(6),
/// };
/// let group = RollChangeData {
///     class_id: "fighter".into(),
///     event_type: "attack_roll".into(),
///     slot_id: "ABCDEF".into(),
///     rolls: vec![die.clone(), die.clone()],
/// };
///
/// let off_hand = roll_from_update(&group, &group.rolls[1], 1).unwrap();
/// assert!(matches!(
///     off_hand.detail,
///     RollDetail::Attack { attack_type: AttackType::MeleeOff, damage: 6, .. }
/// ));
/// ```
pub fn roll_from_update(
    group: &RollChangeData,
    die: &RollChangeDataRoll,
    index: usize,
) -> Result<Roll, RollError> {
    let class =
        Class::from_id(&group.class_id).ok_or_else(|| RollError::UnknownClass(group.class_id.clone()))?;

    let detail = match group.event_type.as_str() {
        "initiative_roll" => RollDetail::Initiative,
        "attack_roll" => RollDetail::Attack {
            attack_type: attack_type(die, index)?,
            success: die.is_success.unwrap_or(false),
            damage: die.damage.unwrap_or(0),
        },
        "save_roll" => RollDetail::Save {
            save_type: die
                .kind
                .as_deref()
                .and_then(SaveType::from_id)
                .ok_or_else(|| RollError::UnknownSaveType(die.kind.clone()))?,
            success: die.is_success.unwrap_or(false),
        },
        other => return Err(RollError::UnknownEvent(other.to_string())),
    };

    Ok(Roll {
        class,
        die_result: die.die_result,
        modified_result: die.modified_result,
        effect: die.effect.clone(),
        detail,
    })
}

fn attack_type(die: &RollChangeDataRoll, index: usize) -> Result<AttackType, RollError> {
    let attack = match die.kind.as_deref() {
        Some(RANGED_LABEL) if die.effect.as_deref() == Some(NO_EFFECT) => Some(AttackType::Spell),
        Some(RANGED_LABEL) => Some(AttackType::RangedMain),
        Some(id) => AttackType::from_id(id),
        None => None,
    }
    .ok_or_else(|| RollError::UnknownAttackType(die.kind.clone()))?;

    Ok(if index == 1 { attack.off_hand() } else { attack })
}
