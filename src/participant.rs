//! Participant identity and roles
//!
//! This module defines the identity assigned to each connected client
//! and the role that determines which session actions it may perform.
//! Host authority is a local trust assumption: the store never verifies
//! who issued a patch, so role gating lives entirely in client code.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

/// A unique identifier for a session participant
///
/// Each participant gets a locally-generated random identifier that
/// persists for the lifetime of their browser tab. The identifier is
/// serialized as its UUID string so it can key entries in the session
/// document's `players` map.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random participant identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    /// Creates a new random participant identifier (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    /// Formats the identifier as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an identifier from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The role a client holds within a session
///
/// The host is the creating client and drives session progression;
/// players join by code and display name. The host never appears in the
/// document's `players` map: host role is held by construction, not by
/// membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The creating client, allowed to drive status transitions
    Host,
    /// A joined participant, allowed to submit answers and board progress
    Player,
}

impl Role {
    /// Returns `true` if this role holds host authority
    pub fn is_host(self) -> bool {
        matches!(self, Role::Host)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        let id = Id::new();
        let s = id.to_string();
        assert_eq!(Id::from_str(&s).unwrap(), id);
    }

    #[test]
    fn test_id_serializes_as_string() {
        let id = Id::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }

    #[test]
    fn test_ids_are_distinct() {
        // Two joins from the same tab produce two distinct identities
        // unless the caller caches the first one.
        assert_ne!(Id::new(), Id::new());
    }

    #[test]
    fn test_role_is_host() {
        assert!(Role::Host.is_host());
        assert!(!Role::Player.is_host());
    }
}
