//! Client identifiers
//!
//! Client IDs are positive integers assigned by the store when a client is
//! created. They never change and are never reused within one database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid client ID: expected a positive integer, got '{0}'")]
    InvalidId(String),
}

/// Client ID, a positive integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ClientId(u64);

impl ClientId {
    /// Creates a client ID, rejecting zero
    pub fn new(value: u64) -> Result<Self, IdError> {
        if value == 0 {
            return Err(IdError::InvalidId(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Returns the raw integer value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // u64 parsing accepts a leading '+', which is not a well-formed ID
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdError::InvalidId(s.to_string()));
        }

        let value: u64 = trimmed
            .parse()
            .map_err(|_| IdError::InvalidId(s.to_string()))?;

        Self::new(value).map_err(|_| IdError::InvalidId(s.to_string()))
    }
}

impl TryFrom<u64> for ClientId {
    type Error = IdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientId> for u64 {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_id() {
        let id: ClientId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn parse_trims_whitespace() {
        let id: ClientId = " 7 ".parse().unwrap();
        assert_eq!(id.get(), 7);
    }

    #[test]
    fn parse_rejects_zero() {
        assert_eq!(
            "0".parse::<ClientId>(),
            Err(IdError::InvalidId("0".to_string()))
        );
    }

    #[test]
    fn parse_rejects_non_numeric() {
        assert!("abc".parse::<ClientId>().is_err());
        assert!("".parse::<ClientId>().is_err());
        assert!("-3".parse::<ClientId>().is_err());
        assert!("+3".parse::<ClientId>().is_err());
        assert!("1.5".parse::<ClientId>().is_err());
    }

    #[test]
    fn serde_as_integer() {
        let id = ClientId::new(12).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "12");

        let parsed: ClientId = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, id);

        assert!(serde_json::from_str::<ClientId>("0").is_err());
    }
}
