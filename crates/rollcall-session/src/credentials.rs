use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{AuthToken, KeyValueStore, SessionError, SlotId};

/// Session-store key holding the auth token.
pub const AUTH_TOKEN_KEY: &str = "diceRollerAuthToken";
/// Durable-store key holding the client archive (`{"slotId": ...}`).
pub const ARCHIVE_KEY: &str = "diceRoller";

/// The slot ids before and after a change, so the caller can unsubscribe
/// from one and subscribe to the other in a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    pub previous: Option<SlotId>,
    pub current: Option<SlotId>,
}

/// The client's auth token and slot id, mirrored into their stores.
///
/// The token goes to the session store under [`AUTH_TOKEN_KEY`]; the slot id
/// goes to the durable store as part of the archive under [`ARCHIVE_KEY`].
/// In-memory values always change, even if persisting them fails.
pub struct Credentials {
    session: Arc<dyn KeyValueStore>,
    durable: Arc<dyn KeyValueStore>,
    token: Option<AuthToken>,
    slot_id: Option<SlotId>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token)
            .field("slot_id", &self.slot_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Empty credentials that persist into the given stores.
    pub fn new(session: Arc<dyn KeyValueStore>, durable: Arc<dyn KeyValueStore>) -> Self {
        Self {
            session,
            durable,
            token: None,
            slot_id: None,
        }
    }

    /// Credentials restored from the stores. Unreadable or malformed
    /// entries are logged and treated as absent.
    pub fn load(session: Arc<dyn KeyValueStore>, durable: Arc<dyn KeyValueStore>) -> Self {
        let mut credentials = Self::new(session, durable);

        match credentials.session.get(AUTH_TOKEN_KEY) {
            Ok(Some(Value::String(token))) => credentials.token = AuthToken::new(token),
            Ok(Some(other)) => warn!(value = %other, "ignoring non-string stored token"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read stored token"),
        }

        match credentials.durable.get(ARCHIVE_KEY) {
            Ok(Some(archive)) => {
                credentials.restore_from_archive(&archive);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read archive"),
        }

        debug!(
            logged_in = credentials.token.is_some(),
            slot_id = ?credentials.slot_id,
            "credentials loaded"
        );
        credentials
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Replaces the token and mirrors it into the session store
    /// (`None` removes it).
    pub fn set_token(&mut self, token: Option<AuthToken>) -> Result<(), SessionError> {
        self.token = token;
        match &self.token {
            Some(token) => self
                .session
                .set(AUTH_TOKEN_KEY, Value::String(token.expose().to_string())),
            None => self.session.remove(AUTH_TOKEN_KEY),
        }
    }

    pub fn slot_id(&self) -> Option<&SlotId> {
        self.slot_id.as_ref()
    }

    /// Swaps the slot id and returns what it was. Call
    /// [`save_archive`](Self::save_archive) to persist the change.
    pub fn replace_slot_id(&mut self, slot_id: Option<SlotId>) -> SlotChange {
        let previous = std::mem::replace(&mut self.slot_id, slot_id);
        SlotChange {
            previous,
            current: self.slot_id.clone(),
        }
    }

    /// The durable part of the credentials: `{"slotId": "ABCDEF"}`, or
    /// `{}` with no slot.
    pub fn archive(&self) -> Value {
        match &self.slot_id {
            Some(slot) => json!({ "slotId": slot.as_str() }),
            None => json!({}),
        }
    }

    /// Writes [`archive`](Self::archive) to the durable store.
    pub fn save_archive(&self) -> Result<(), SessionError> {
        self.durable.set(ARCHIVE_KEY, self.archive())
    }

    /// Applies a previously saved archive.
    ///
    /// Anything but an object is ignored, as is a missing or non-string
    /// `slotId`. An empty `slotId` clears the slot; an invalid one is
    /// logged and ignored. Returns the change when one was made.
    pub fn restore_from_archive(&mut self, archive: &Value) -> Option<SlotChange> {
        let slot = archive.as_object()?.get("slotId")?.as_str()?;
        if slot.is_empty() {
            return Some(self.replace_slot_id(None));
        }
        match SlotId::parse(slot) {
            Ok(slot) => Some(self.replace_slot_id(Some(slot))),
            Err(e) => {
                warn!(error = %e, "ignoring archived slot id");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn stores() -> (MemoryStore, MemoryStore) {
        (MemoryStore::new(), MemoryStore::new())
    }

    fn credentials(session: &MemoryStore, durable: &MemoryStore) -> Credentials {
        Credentials::load(Arc::new(session.clone()), Arc::new(durable.clone()))
    }

    #[test]
    fn test_set_token_persists_and_reloads() {
        let (session, durable) = stores();
        let mut creds = credentials(&session, &durable);

        creds.set_token(AuthToken::new("tok")).unwrap();

        assert_eq!(session.get(AUTH_TOKEN_KEY).unwrap(), Some(json!("tok")));
        let reloaded = credentials(&session, &durable);
        assert_eq!(reloaded.token().map(AuthToken::expose), Some("tok"));
    }

    #[test]
    fn test_clear_token_removes_stored_value() {
        let (session, durable) = stores();
        let mut creds = credentials(&session, &durable);
        creds.set_token(AuthToken::new("tok")).unwrap();

        creds.set_token(None).unwrap();

        assert!(!creds.is_logged_in());
        assert_eq!(session.get(AUTH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_replace_slot_id_reports_previous_and_current() {
        let (session, durable) = stores();
        let mut creds = credentials(&session, &durable);
        let first = SlotId::parse("ABCDEF").unwrap();
        let second = SlotId::parse("GHIJKL").unwrap();
        creds.replace_slot_id(Some(first.clone()));

        let change = creds.replace_slot_id(Some(second.clone()));

        assert_eq!(change.previous, Some(first));
        assert_eq!(change.current, Some(second));
    }

    #[test]
    fn test_archive_round_trips_through_durable_store() {
        let (session, durable) = stores();
        let mut creds = credentials(&session, &durable);
        creds.replace_slot_id(Some(SlotId::parse("abcdef").unwrap()));
        creds.save_archive().unwrap();

        assert_eq!(durable.get(ARCHIVE_KEY).unwrap(), Some(json!({ "slotId": "ABCDEF" })));
        let reloaded = credentials(&MemoryStore::new(), &durable);
        assert_eq!(reloaded.slot_id().map(SlotId::as_str), Some("ABCDEF"));
    }

    #[test]
    fn test_archive_without_slot_is_empty_object() {
        let (session, durable) = stores();
        assert_eq!(credentials(&session, &durable).archive(), json!({}));
    }

    #[test]
    fn test_restore_from_archive_ignores_non_objects_and_bad_values() {
        let (session, durable) = stores();
        let mut creds = credentials(&session, &durable);
        creds.replace_slot_id(Some(SlotId::parse("ABCDEF").unwrap()));

        for archive in [json!(null), json!("ABCDEF"), json!({}), json!({ "slotId": 7 }), json!({ "slotId": "AB1" })] {
            assert_eq!(creds.restore_from_archive(&archive), None, "{archive}");
        }
        assert_eq!(creds.slot_id().map(SlotId::as_str), Some("ABCDEF"));
    }

    #[test]
    fn test_restore_from_archive_empty_slot_clears() {
        let (session, durable) = stores();
        let mut creds = credentials(&session, &durable);
        creds.replace_slot_id(Some(SlotId::parse("ABCDEF").unwrap()));

        let change = creds.restore_from_archive(&json!({ "slotId": "" })).unwrap();

        assert!(change.previous.is_some());
        assert_eq!(creds.slot_id(), None);
    }

    #[test]
    fn test_load_ignores_non_string_token() {
        let (session, durable) = stores();
        session.set(AUTH_TOKEN_KEY, json!(42)).unwrap();
        assert!(!credentials(&session, &durable).is_logged_in());
    }
}
