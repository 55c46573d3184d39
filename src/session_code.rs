//! Session code generation and management
//!
//! This module provides the short human-shareable codes that identify
//! live sessions. Codes are displayed in octal format so a teacher can
//! read them out loud or write them on a board without digit confusion.

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

/// Minimum value for generated session codes (in octal: 10000)
const MIN_VALUE: u16 = 0o10_000;
/// Maximum value for generated session codes (in octal: 100000)
const MAX_VALUE: u16 = 0o100_000;

/// A short shareable identifier for a live session
///
/// Codes are generated randomly within a fixed range so they always
/// display as a 5-digit octal number. The octal alphabet avoids the
/// digits 8 and 9, which reduces confusion when codes are communicated
/// verbally in a classroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionCode(u16);

impl SessionCode {
    /// Creates a new random session code
    ///
    /// The code is generated within the valid range to ensure it
    /// displays as a 5-digit octal number.
    pub fn new() -> Self {
        Self(fastrand::u16(MIN_VALUE..MAX_VALUE))
    }
}

impl Default for SessionCode {
    /// Creates a new random session code (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionCode {
    /// Formats the code as a 5-digit octal number
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:05o}", self.0)
    }
}

impl Serialize for SessionCode {
    /// Serializes the code as its octal string form
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SessionCode {
    /// Deserializes a code from its octal string form
    fn deserialize<D>(deserializer: D) -> Result<SessionCode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SessionCode::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

impl FromStr for SessionCode {
    type Err = ParseIntError;

    /// Parses a session code from an octal string representation
    ///
    /// # Errors
    ///
    /// Returns a `ParseIntError` if the string cannot be parsed as a
    /// valid octal number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(u16::from_str_radix(s, 8)?))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_session_code_new_in_range() {
        for _ in 0..100 {
            let code = SessionCode::new();
            assert!(code.0 >= MIN_VALUE);
            assert!(code.0 < MAX_VALUE);
        }
    }

    #[test]
    fn test_session_code_display_format() {
        let code = SessionCode(MIN_VALUE);
        assert_eq!(code.to_string(), "10000");

        let code = SessionCode(MAX_VALUE - 1);
        assert_eq!(code.to_string(), "77777");
    }

    #[test]
    fn test_session_code_from_str() {
        let code = SessionCode::from_str("12345").unwrap();
        assert_eq!(code.0, 0o12345);
    }

    #[test]
    fn test_session_code_from_str_invalid() {
        assert!(SessionCode::from_str("invalid").is_err());
        assert!(SessionCode::from_str("888").is_err()); // Invalid octal digit
        assert!(SessionCode::from_str("").is_err());
    }

    #[test]
    fn test_session_code_serialization_round_trip() {
        let code = SessionCode(0o12345);
        let serialized = serde_json::to_string(&code).unwrap();
        assert_eq!(serialized, "\"12345\"");

        let deserialized: SessionCode = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, code);
    }

    #[test]
    fn test_session_code_deserialization_error() {
        // Number instead of string
        let result: Result<SessionCode, _> = serde_json::from_str("123");
        assert!(result.is_err());

        // Invalid octal digit
        let result: Result<SessionCode, _> = serde_json::from_str("\"999\"");
        assert!(result.is_err());
    }
}
