use std::fmt;
use std::str::FromStr;

use crate::SessionError;

/// The six-letter code identifying a remote dice session.
///
/// Exactly six ASCII letters, nothing around them. Input is upper-cased, so
/// `"abcdef"` and `"ABCDEF"` name the same slot.
///
/// ```
/// use rollcall_session::SlotId;
///
/// let slot: SlotId = "abcDEF".parse().unwrap();
/// assert_eq!(slot.as_str(), "ABCDEF");
/// assert!("AB1".parse::<SlotId>().is_err());
/// assert!(" ABCDEF".parse::<SlotId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(String);

impl SlotId {
    pub const LEN: usize = 6;

    pub fn parse(input: &str) -> Result<Self, SessionError> {
        if input.len() == Self::LEN && input.bytes().all(|b| b.is_ascii_alphabetic()) {
            Ok(Self(input.to_ascii_uppercase()))
        } else {
            Err(SessionError::InvalidSlotId(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a slot id as reported by the service names this slot.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl FromStr for SlotId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SlotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque token proving a successful login. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a token, or `None` for an empty one.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        (!token.is_empty()).then_some(Self(token))
    }

    /// The raw token, for request bodies and storage only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_letters_uppercases() {
        assert_eq!(SlotId::parse("abcdef").unwrap().as_str(), "ABCDEF");
    }

    #[test]
    fn test_parse_rejects_digits_and_wrong_length() {
        for input in ["AB1", "ABCDE1", "ABCDEFG", "", "ABC,EF", "ÄBCDEF"] {
            assert!(SlotId::parse(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_surrounding_whitespace_rejected() {
        for input in [" ABCDEF", "ABCDEF ", " abcdef ", "\tABCDEF"] {
            assert!(SlotId::parse(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_matches_ignores_case() {
        let slot = SlotId::parse("ABCDEF").unwrap();
        assert!(slot.matches("abcdef"));
        assert!(!slot.matches("ABCDEG"));
    }

    #[test]
    fn test_auth_token_debug_is_redacted() {
        let token = AuthToken::new("secret-token").unwrap();
        assert_eq!(format!("{token:?}"), "AuthToken(<redacted>)");
        assert_eq!(token.expose(), "secret-token");
    }

    #[test]
    fn test_auth_token_empty_is_none() {
        assert!(AuthToken::new("").is_none());
    }
}
