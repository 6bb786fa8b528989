/// Why a settings update or a reported die could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RollError {
    /// The accumulated settings don't describe any known state.
    #[error(
        "unresolvable roll state (rollState={roll_state:?}, roll={roll:?}, reveal={reveal:?}, saveRollType={save_roll_type:?})"
    )]
    UnresolvedState {
        roll_state: String,
        roll: Option<String>,
        reveal: Option<String>,
        save_roll_type: Option<String>,
    },

    #[error("unknown class {0:?}")]
    UnknownClass(String),

    #[error("unknown roll event {0:?}")]
    UnknownEvent(String),

    #[error("unknown attack type {0:?}")]
    UnknownAttackType(Option<String>),

    #[error("unknown save type {0:?}")]
    UnknownSaveType(Option<String>),
}
