//! Priority reassignment engine
//!
//! Given a snapshot of every client and a move request for one of them,
//! computes the full set of `(id, status, priority)` assignments that put
//! the client in its requested place while keeping every touched lane dense.
//!
//! The engine is a pure function: it never reads or writes storage, and the
//! caller is responsible for persisting the returned assignments atomically.
//!
//! ## Algorithm
//!
//! 1. A request with neither status nor priority echoes the snapshot.
//! 2. The destination lane is the requested status, or the current one.
//! 3. The requested priority is clamped into `1..=dest_len + 1`, where
//!    `dest_len` excludes the target. Lane changes without a priority go to
//!    the end of the destination lane.
//! 4. When the client leaves a lane, that lane is re-ranked `1..=n`.
//! 5. Destination members are re-ranked around a single open slot at the
//!    effective priority, which the target then takes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::client::{Client, ClientStatus};
use super::id::ClientId;
use super::lanes;
use super::request::{MoveRequest, ValidationError};

#[derive(Debug, Error, PartialEq)]
pub enum ReorderError {
    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A position a client should occupy after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: ClientId,
    pub status: ClientStatus,
    pub priority: u32,
}

impl Assignment {
    fn of(client: &Client) -> Self {
        Self {
            id: client.id,
            status: client.status,
            priority: client.priority,
        }
    }
}

/// Computes the assignments for moving `target` per `request`.
///
/// The snapshot must already satisfy the dense-unique invariant; the engine
/// does not repair existing corruption.
pub fn reorder(
    clients: &[Client],
    target: ClientId,
    request: &MoveRequest,
) -> Result<Vec<Assignment>, ReorderError> {
    let current = clients
        .iter()
        .find(|c| c.id == target)
        .ok_or(ReorderError::ClientNotFound(target))?;

    if request.is_noop() {
        return Ok(clients.iter().map(Assignment::of).collect());
    }

    let status = request.status.unwrap_or(current.status);
    let status_changed = status != current.status;

    let destination = lanes::lane_without(clients, status, target);
    let priority = effective_priority(current, request.priority, status_changed, destination.len());

    let mut assignments = Vec::with_capacity(destination.len() + 1);

    if status_changed {
        let source = lanes::lane_without(clients, current.status, target);
        assignments.extend(lanes::compact(&source));
    }

    assignments.extend(destination.iter().zip(1u32..).map(|(client, rank)| Assignment {
        id: client.id,
        status,
        priority: if rank >= priority { rank + 1 } else { rank },
    }));

    assignments.push(Assignment {
        id: target,
        status,
        priority,
    });

    Ok(assignments)
}

/// Parses raw request values and computes the move in one step.
///
/// Validation failures abort before any assignment is computed.
pub fn plan_move(
    clients: &[Client],
    target: ClientId,
    raw_status: Option<&serde_json::Value>,
    raw_priority: Option<&serde_json::Value>,
) -> Result<Vec<Assignment>, ReorderError> {
    let request = MoveRequest::parse(raw_status, raw_priority)?;
    reorder(clients, target, &request)
}

fn effective_priority(
    current: &Client,
    requested: Option<i64>,
    status_changed: bool,
    destination_len: usize,
) -> u32 {
    let last = u32::try_from(destination_len)
        .unwrap_or(u32::MAX)
        .saturating_add(1);

    match requested {
        Some(requested) => requested.clamp(1, i64::from(last)) as u32,
        None if status_changed => last,
        None => current.priority,
    }
}

/// Returns only the assignments that change a client's current position
pub fn changes(clients: &[Client], assignments: &[Assignment]) -> Vec<Assignment> {
    let by_id: HashMap<ClientId, &Client> = clients.iter().map(|c| (c.id, c)).collect();

    assignments
        .iter()
        .filter(|a| by_id.get(&a.id).map_or(true, |c| c.differs_from(a)))
        .copied()
        .collect()
}

/// Applies assignments to a copy of the snapshot
pub fn apply(clients: &[Client], assignments: &[Assignment]) -> Vec<Client> {
    let by_id: HashMap<ClientId, &Assignment> = assignments.iter().map(|a| (a.id, a)).collect();

    clients
        .iter()
        .cloned()
        .map(|mut client| {
            if let Some(assignment) = by_id.get(&client.id) {
                client.apply(assignment);
            }
            client
        })
        .collect()
}
