//! Join and identity flow
//!
//! A non-host user joins a session by submitting a display name against
//! a session code. The flow validates the name, generates a local
//! random identity, and produces the field patch that registers the
//! participant under `players.<id>` in the session document, scoped to
//! that single entry so concurrent joins never clobber each other.
//!
//! Nothing here guarantees idempotency: joining twice yields two
//! distinct identities. The per-tab cache lives in
//! [`crate::client::SessionClient`], which holds the first granted
//! identity for the lifetime of the tab.

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;

use crate::{
    participant::Id,
    session::{FieldPatch, PlayerEntry, Session},
};

/// Errors that can occur during join validation and registration
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name exceeds the maximum allowed length
    #[error("name is too long")]
    TooLong,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Sinful,
    /// The session already holds the maximum number of players
    #[error("session is full")]
    SessionFull,
}

/// Validates and cleans a requested display name
///
/// The name is trimmed of whitespace; the cleaned form is what gets
/// stored in the session document. Constraints are enforced client-side
/// only, since the store accepts whatever is written.
///
/// # Errors
///
/// * `Error::TooLong` - name exceeds the configured length limit
/// * `Error::Empty` - name is empty after trimming whitespace
/// * `Error::Sinful` - name contains inappropriate content
pub fn clean_name(name: &str) -> Result<String, Error> {
    if name.len() > crate::constants::join::MAX_NAME_LENGTH {
        return Err(Error::TooLong);
    }
    let name = rustrict::trim_whitespace(name);
    if name.is_empty() {
        return Err(Error::Empty);
    }
    if name.is_inappropriate() {
        return Err(Error::Sinful);
    }
    Ok(name.to_owned())
}

/// A granted identity together with its registration patch
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// The new participant's identity
    pub participant: Id,
    /// The cleaned display name that will be stored
    pub name: String,
    /// The field patch that registers the participant
    pub patch: FieldPatch,
}

/// Produces a registration for a new participant of a session
///
/// Validates the display name against the given session snapshot,
/// generates a fresh identity, and returns the `players.<id>` field
/// patch for the caller to send. The host never goes through this path:
/// host role is held by construction, not by document membership.
///
/// # Errors
///
/// Returns a name validation error or `Error::SessionFull` when the
/// session is at capacity.
pub fn register(session: &Session, name: &str) -> Result<Registration, Error> {
    if session.players.len() >= crate::constants::session::MAX_PLAYER_COUNT {
        return Err(Error::SessionFull);
    }
    let name = clean_name(name)?;
    let participant = Id::new();
    let entry = PlayerEntry::new(name.clone());

    Ok(Registration {
        participant,
        name,
        patch: FieldPatch {
            path: format!("players.{participant}"),
            value: serde_json::to_value(entry).expect("default serializer cannot fail"),
        },
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        games::{GameData, quiz::{Question, QuizContent}},
        session_code::SessionCode,
    };

    fn session() -> Session {
        Session::new(
            SessionCode::new(),
            GameData::Quiz(QuizContent {
                questions: vec![Question {
                    question: "2 + 2?".to_owned(),
                    options: vec!["4".to_owned()],
                    correct_answer: "4".to_owned(),
                }],
            }),
            Id::new(),
        )
    }

    #[test]
    fn test_clean_name_trims_whitespace() {
        assert_eq!(clean_name("  Ana  ").unwrap(), "Ana");
    }

    #[test]
    fn test_clean_name_rejects_empty() {
        assert_eq!(clean_name(""), Err(Error::Empty));
        assert_eq!(clean_name("   "), Err(Error::Empty));
    }

    #[test]
    fn test_clean_name_rejects_too_long() {
        let long = "x".repeat(crate::constants::join::MAX_NAME_LENGTH + 1);
        assert_eq!(clean_name(&long), Err(Error::TooLong));
    }

    #[test]
    fn test_clean_name_rejects_inappropriate() {
        assert_eq!(clean_name("shit"), Err(Error::Sinful));
    }

    #[test]
    fn test_register_produces_scoped_field_patch() {
        let registration = register(&session(), "Ana").unwrap();
        assert_eq!(
            registration.patch.path,
            format!("players.{}", registration.participant)
        );
        assert_eq!(registration.patch.value["name"], "Ana");
        assert_eq!(registration.patch.value["score"], 0);
    }

    #[test]
    fn test_register_twice_yields_distinct_identities() {
        let session = session();
        let first = register(&session, "Ana").unwrap();
        let second = register(&session, "Ana").unwrap();
        // No idempotency at this layer; the client caches the first.
        assert_ne!(first.participant, second.participant);
    }

    #[test]
    fn test_register_rejects_full_session() {
        let mut session = session();
        for i in 0..crate::constants::session::MAX_PLAYER_COUNT {
            session
                .players
                .insert(Id::new(), PlayerEntry::new(format!("p{i}")));
        }
        assert_eq!(register(&session, "Ana"), Err(Error::SessionFull));
    }
}
