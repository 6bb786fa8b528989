use std::fmt;

// ---------------------------------------------------------------------------
// Class
// ---------------------------------------------------------------------------

/// A character class as reported by the dice service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {
    Barbarian,
    Bard,
    Cleric,
    Druid,
    Dwarf,
    Elf,
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Wizard,
}

impl Class {
    pub const ALL: [Class; 12] = [
        Self::Barbarian,
        Self::Bard,
        Self::Cleric,
        Self::Druid,
        Self::Dwarf,
        Self::Elf,
        Self::Fighter,
        Self::Monk,
        Self::Paladin,
        Self::Ranger,
        Self::Rogue,
        Self::Wizard,
    ];

    /// Parses the service's class id (`"barbarian"`, `"elf"`, ...).
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Barbarian => "barbarian",
            Self::Bard => "bard",
            Self::Cleric => "cleric",
            Self::Druid => "druid",
            Self::Dwarf => "dwarf",
            Self::Elf => "elf",
            Self::Fighter => "fighter",
            Self::Monk => "monk",
            Self::Paladin => "paladin",
            Self::Ranger => "ranger",
            Self::Rogue => "rogue",
            Self::Wizard => "wizard",
        }
    }

    /// Human-readable name. The race classes carry their implied role.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Barbarian => "Barbarian",
            Self::Bard => "Bard",
            Self::Cleric => "Cleric",
            Self::Druid => "Druid",
            Self::Dwarf => "Dwarf Fighter",
            Self::Elf => "Elf Wizard",
            Self::Fighter => "Fighter",
            Self::Monk => "Monk",
            Self::Paladin => "Paladin",
            Self::Ranger => "Ranger",
            Self::Rogue => "Rogue",
            Self::Wizard => "Wizard",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// SaveType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveType {
    Fortitude,
    Reflex,
    Will,
}

impl SaveType {
    pub const ALL: [SaveType; 3] = [Self::Fortitude, Self::Reflex, Self::Will];

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|save| save.id() == id)
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Fortitude => "fortitude",
            Self::Reflex => "reflex",
            Self::Will => "will",
        }
    }

    /// Abbreviation used on character sheets.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Fortitude => "Fort",
            Self::Reflex => "Ref",
            Self::Will => "Will",
        }
    }
}

impl fmt::Display for SaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ---------------------------------------------------------------------------
// AttackType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackType {
    MeleeMain,
    MeleeOff,
    RangedMain,
    RangedOff,
    Spell,
}

impl AttackType {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "melee_main" => Some(Self::MeleeMain),
            "melee_off" => Some(Self::MeleeOff),
            "ranged_main" => Some(Self::RangedMain),
            "ranged_off" => Some(Self::RangedOff),
            "spell" => Some(Self::Spell),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::MeleeMain => "melee_main",
            Self::MeleeOff => "melee_off",
            Self::RangedMain => "ranged_main",
            Self::RangedOff => "ranged_off",
            Self::Spell => "spell",
        }
    }

    /// The same attack made with the off hand. Spells have no off hand.
    pub fn off_hand(self) -> Self {
        match self {
            Self::MeleeMain => Self::MeleeOff,
            Self::RangedMain => Self::RangedOff,
            other => other,
        }
    }
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ---------------------------------------------------------------------------
// RollType / RollState
// ---------------------------------------------------------------------------

/// What kind of roll the table is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollType {
    Initiative,
    Attack,
    Save(SaveType),
}

impl RollType {
    /// The `roll` value used on the wire: `initiative_roll`, `attack_roll`
    /// or `save_roll`.
    pub fn wire_roll(self) -> &'static str {
        match self {
            Self::Initiative => "initiative_roll",
            Self::Attack => "attack_roll",
            Self::Save(_) => "save_roll",
        }
    }

    /// The `saveRollType` value, for saves only.
    pub fn save_roll_type(self) -> Option<&'static str> {
        match self {
            Self::Save(save) => Some(save.id()),
            _ => None,
        }
    }

    /// Resolves the wire pair back into a roll type. A save needs a known
    /// save kind.
    pub fn from_wire(roll: Option<&str>, save_roll_type: Option<&str>) -> Option<Self> {
        match roll? {
            "initiative_roll" => Some(Self::Initiative),
            "attack_roll" => Some(Self::Attack),
            "save_roll" => save_roll_type.and_then(SaveType::from_id).map(Self::Save),
            _ => None,
        }
    }
}

impl fmt::Display for RollType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiative => f.write_str("initiative"),
            Self::Attack => f.write_str("attack"),
            Self::Save(save) => write!(f, "{save} save"),
        }
    }
}

/// Where the table is in its roll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RollState {
    /// Idle.
    #[default]
    Disabled,
    /// Idle, with the slot id shown on the stream overlay.
    ShowSlotId,
    /// Collecting rolls.
    Accept(RollType),
    /// Showing collected rolls; `complete == false` reveals them one by one.
    Reveal { roll_type: RollType, complete: bool },
}

impl fmt::Display for RollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::ShowSlotId => f.write_str("showing slot id"),
            Self::Accept(roll_type) => write!(f, "accepting {roll_type} rolls"),
            Self::Reveal {
                roll_type,
                complete: true,
            } => write!(f, "revealing {roll_type} rolls"),
            Self::Reveal {
                roll_type,
                complete: false,
            } => write!(f, "revealing {roll_type} rolls one at a time"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_ids_round_trip() {
        for class in Class::ALL {
            assert_eq!(Class::from_id(class.id()), Some(class));
        }
        assert_eq!(Class::from_id("necromancer"), None);
        assert_eq!(Class::from_id("Fighter"), None);
    }

    #[test]
    fn test_class_display_names() {
        assert_eq!(Class::Dwarf.to_string(), "Dwarf Fighter");
        assert_eq!(Class::Elf.to_string(), "Elf Wizard");
        assert_eq!(Class::Paladin.to_string(), "Paladin");
    }

    #[test]
    fn test_save_short_names() {
        let names: Vec<_> = SaveType::ALL.iter().map(|s| s.short_name()).collect();
        assert_eq!(names, ["Fort", "Ref", "Will"]);
    }

    #[test]
    fn test_roll_type_wire_pairs() {
        let save = RollType::Save(SaveType::Reflex);
        assert_eq!(save.wire_roll(), "save_roll");
        assert_eq!(save.save_roll_type(), Some("reflex"));
        assert_eq!(RollType::Attack.save_roll_type(), None);
        assert_eq!(RollType::from_wire(Some("save_roll"), Some("reflex")), Some(save));
        assert_eq!(RollType::from_wire(Some("save_roll"), None), None);
        assert_eq!(RollType::from_wire(None, Some("reflex")), None);
    }

    #[test]
    fn test_off_hand_leaves_spell_alone() {
        assert_eq!(AttackType::MeleeMain.off_hand(), AttackType::MeleeOff);
        assert_eq!(AttackType::RangedMain.off_hand(), AttackType::RangedOff);
        assert_eq!(AttackType::Spell.off_hand(), AttackType::Spell);
    }
}
