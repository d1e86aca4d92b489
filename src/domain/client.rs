//! Client domain model
//!
//! Clients are the tracked records. Each one sits in exactly one swimlane
//! (its status) and holds a 1-based rank within that lane.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::ClientId;
use super::reorder::Assignment;

#[derive(Debug, Error, PartialEq)]
pub enum StatusError {
    #[error("Invalid status '{0}': expected one of backlog, in-progress, complete")]
    InvalidStatus(String),
}

/// Status of a client, which doubles as its swimlane
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ClientStatus {
    #[default]
    Backlog,
    InProgress,
    Complete,
}

impl ClientStatus {
    /// All statuses in board display order
    pub const ALL: [ClientStatus; 3] = [
        ClientStatus::Backlog,
        ClientStatus::InProgress,
        ClientStatus::Complete,
    ];

    /// Returns the wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Backlog => "backlog",
            ClientStatus::InProgress => "in-progress",
            ClientStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "backlog" => Ok(ClientStatus::Backlog),
            "in-progress" => Ok(ClientStatus::InProgress),
            "complete" => Ok(ClientStatus::Complete),
            _ => Err(StatusError::InvalidStatus(s.to_string())),
        }
    }
}

/// A tracked client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier
    pub id: ClientId,

    /// Display name
    pub name: String,

    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current swimlane
    pub status: ClientStatus,

    /// Rank within the swimlane, 1 is highest
    pub priority: u32,

    /// When the client was created
    pub created_at: DateTime<Utc>,

    /// When the client was last updated
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Creates a new client
    pub fn new(id: ClientId, name: impl Into<String>, status: ClientStatus, priority: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: None,
            status,
            priority,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the assignment would change this client's position
    pub fn differs_from(&self, assignment: &Assignment) -> bool {
        self.status != assignment.status || self.priority != assignment.priority
    }

    /// Applies a position assignment, touching `updated_at` only on change
    pub fn apply(&mut self, assignment: &Assignment) -> bool {
        if !self.differs_from(assignment) {
            return false;
        }
        self.status = assignment.status;
        self.priority = assignment.priority;
        self.updated_at = Utc::now();
        true
    }

    /// Sets the name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Sets the description
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_client(id: u64) -> Client {
        Client::new(
            ClientId::new(id).unwrap(),
            format!("Client {}", id),
            ClientStatus::Backlog,
            1,
        )
    }

    #[test]
    fn status_parse_and_display() {
        for status in ClientStatus::ALL {
            let parsed: ClientStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn status_rejects_unknown_values() {
        assert!("done".parse::<ClientStatus>().is_err());
        assert!("in_progress".parse::<ClientStatus>().is_err());
        assert!("Backlog".parse::<ClientStatus>().is_err());
        assert!("".parse::<ClientStatus>().is_err());
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&ClientStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn apply_changes_position() {
        let mut client = make_client(1);
        let before = client.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));

        let changed = client.apply(&Assignment {
            id: client.id,
            status: ClientStatus::Complete,
            priority: 3,
        });

        assert!(changed);
        assert_eq!(client.status, ClientStatus::Complete);
        assert_eq!(client.priority, 3);
        assert!(client.updated_at > before);
    }

    #[test]
    fn apply_same_position_is_noop() {
        let mut client = make_client(1);
        let before = client.updated_at;

        let changed = client.apply(&Assignment {
            id: client.id,
            status: ClientStatus::Backlog,
            priority: 1,
        });

        assert!(!changed);
        assert_eq!(client.updated_at, before);
    }

    #[test]
    fn serde_roundtrip() {
        let mut client = make_client(4);
        client.set_description("Enterprise account");

        let json = serde_json::to_string(&client).unwrap();
        let parsed: Client = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, client);
    }
}
