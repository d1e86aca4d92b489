//! Move request parsing
//!
//! Callers hand over status and priority exactly as they arrived, as JSON
//! values (command-line strings are wrapped as JSON strings). This
//! module turns them into a typed [`MoveRequest`] or a [`ValidationError`]
//! that explains the defect.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::client::ClientStatus;

/// Input errors reported back to the caller
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid id provided: '{0}'")]
    InvalidId(String),

    #[error("Invalid status provided: {0}")]
    InvalidStatus(String),

    #[error("Invalid priority provided: {0}")]
    InvalidPriority(String),
}

/// Serializable form of a validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub long_message: String,
}

impl ValidationError {
    /// Short, user-facing summary
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::InvalidId(_) => "Invalid id provided.",
            ValidationError::InvalidStatus(_) => "Invalid status provided.",
            ValidationError::InvalidPriority(_) => "Invalid priority provided.",
        }
    }

    /// Explanation of what was wrong with the input
    pub fn long_message(&self) -> String {
        match self {
            ValidationError::InvalidId(raw) => {
                format!("Cannot find a client with id '{}'. Ids are positive integers.", raw)
            }
            ValidationError::InvalidStatus(raw) => format!(
                "Status must be one of backlog, in-progress or complete, got {}.",
                raw
            ),
            ValidationError::InvalidPriority(raw) => {
                format!("Priority must be a whole number, got {}.", raw)
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.message().to_string(),
            long_message: self.long_message(),
        }
    }
}

/// A validated request to move one client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveRequest {
    /// New swimlane, if any
    pub status: Option<ClientStatus>,

    /// Requested rank before clamping; zero and negatives are allowed
    pub priority: Option<i64>,
}

impl MoveRequest {
    /// Parses raw JSON values. `None` and `null` both mean "not given".
    pub fn parse(
        raw_status: Option<&Value>,
        raw_priority: Option<&Value>,
    ) -> Result<Self, ValidationError> {
        let status = match raw_status {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_status(value)?),
        };

        let priority = match raw_priority {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_priority(value)?),
        };

        Ok(Self { status, priority })
    }

    /// Returns true if the request asks for nothing
    pub fn is_noop(&self) -> bool {
        self.status.is_none() && self.priority.is_none()
    }
}

fn parse_status(value: &Value) -> Result<ClientStatus, ValidationError> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|_| ValidationError::InvalidStatus(value.to_string())),
        _ => Err(ValidationError::InvalidStatus(value.to_string())),
    }
}

fn parse_priority(value: &Value) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidPriority(value.to_string());

    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.is_u64() {
                // Larger than any lane; the engine clamps it to the end
                Ok(i64::MAX)
            } else {
                n.as_f64().and_then(whole_number).ok_or_else(invalid)
            }
        }
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Ok(i),
                Err(_) => s
                    .parse::<f64>()
                    .ok()
                    .and_then(whole_number)
                    .ok_or_else(invalid),
            }
        }
        _ => Err(invalid()),
    }
}

/// Accepts finite floats with no fractional part, saturating to `i64`
fn whole_number(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}
