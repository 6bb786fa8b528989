use rollcall_protocol::RollChangeData;
use tracing::{debug, trace};

use crate::{Roll, roll_from_update};

/// The rolls of the current roll cycle, oldest first.
#[derive(Debug, Clone, Default)]
pub struct RollLog {
    rolls: Vec<Roll>,
}

impl RollLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rolls(&self) -> &[Roll] {
        &self.rolls
    }

    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }

    /// Drops every roll. Returns whether anything was dropped.
    pub fn clear(&mut self) -> bool {
        let had_rolls = !self.rolls.is_empty();
        self.rolls.clear();
        had_rolls
    }

    /// Appends the usable dice of `group` and returns the new rolls.
    ///
    /// Groups for a slot other than `slot_id` are ignored; so are dice that
    /// don't resolve to a roll, without affecting their siblings.
    pub fn ingest(&mut self, group: &RollChangeData, slot_id: &str) -> Vec<Roll> {
        if !group.slot_id.eq_ignore_ascii_case(slot_id) {
            debug!(group_slot = %group.slot_id, %slot_id, "ignoring rolls for another slot");
            return Vec::new();
        }

        let added: Vec<Roll> = group
            .rolls
            .iter()
            .enumerate()
            .filter_map(|(index, die)| match roll_from_update(group, die, index) {
                Ok(roll) => Some(roll),
                Err(e) => {
                    trace!(index, error = %e, "skipping die");
                    None
                }
            })
            .collect();

        self.rolls.extend(added.iter().cloned());
        debug!(
            class = %group.class_id,
            event = %group.event_type,
            added = added.len(),
            total = self.rolls.len(),
            "rolls ingested"
        );
        added
    }
}
