//! Swimlane helpers
//!
//! A swimlane is the set of clients sharing one status. It is never stored;
//! these helpers derive lanes from a snapshot and check the dense-unique
//! invariant: a lane of `n` members holds exactly the priorities `1..=n`.

use thiserror::Error;

use super::client::{Client, ClientStatus};
use super::id::ClientId;
use super::reorder::Assignment;

#[derive(Debug, Error, PartialEq)]
pub enum LaneError {
    #[error("Lane '{status}' has duplicate priority {priority}")]
    Duplicate { status: ClientStatus, priority: u32 },

    #[error("Lane '{status}' has a gap: expected priority {expected}, found {found}")]
    Gap {
        status: ClientStatus,
        expected: u32,
        found: u32,
    },
}

/// Sorts lane members by ascending priority, keeping snapshot order on ties
pub fn sort_by_rank(members: &mut [&Client]) {
    members.sort_by_key(|c| c.priority);
}

/// Returns the members of one lane in rank order
pub fn lane(clients: &[Client], status: ClientStatus) -> Vec<&Client> {
    let mut members: Vec<&Client> = clients.iter().filter(|c| c.status == status).collect();
    sort_by_rank(&mut members);
    members
}

/// Returns the members of one lane in rank order, leaving out one client
pub fn lane_without(clients: &[Client], status: ClientStatus, excluded: ClientId) -> Vec<&Client> {
    let mut members: Vec<&Client> = clients
        .iter()
        .filter(|c| c.status == status && c.id != excluded)
        .collect();
    sort_by_rank(&mut members);
    members
}

/// Reassigns dense ranks `1..=n` to already-sorted lane members
pub fn compact(members: &[&Client]) -> Vec<Assignment> {
    members
        .iter()
        .zip(1u32..)
        .map(|(client, rank)| Assignment {
            id: client.id,
            status: client.status,
            priority: rank,
        })
        .collect()
}

/// Number of members in each lane, in board order
pub fn lane_sizes(clients: &[Client]) -> [(ClientStatus, usize); 3] {
    ClientStatus::ALL.map(|status| (status, clients.iter().filter(|c| c.status == status).count()))
}

/// Verifies the dense-unique invariant for every lane
pub fn check_invariant(clients: &[Client]) -> Result<(), LaneError> {
    for status in ClientStatus::ALL {
        let members = lane(clients, status);
        let mut previous: Option<u32> = None;

        for (expected, client) in (1u32..).zip(&members) {
            if previous == Some(client.priority) {
                return Err(LaneError::Duplicate {
                    status,
                    priority: client.priority,
                });
            }
            if client.priority != expected {
                return Err(LaneError::Gap {
                    status,
                    expected,
                    found: client.priority,
                });
            }
            previous = Some(client.priority);
        }
    }

    Ok(())
}
