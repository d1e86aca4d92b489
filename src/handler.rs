//! Request handling
//!
//! Glue between raw caller input and the reorder engine. Each operation
//! validates its input, runs inside one store transaction, and returns the
//! updated client list.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    changes, reorder, Assignment, Client, ClientId, ClientStatus, MoveRequest, ReorderError,
    ValidationError,
};
use crate::storage::{ClientStore, StoreTx};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Result of a move
#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    /// Every client after the move, in board order
    pub clients: Vec<Client>,

    /// Assignments that actually changed a client's position
    pub changed: Vec<Assignment>,
}

/// Parses a raw path id
pub fn parse_id(raw_id: &str) -> Result<ClientId, ValidationError> {
    raw_id
        .parse()
        .map_err(|_| ValidationError::InvalidId(raw_id.to_string()))
}

/// Moves a client to a new lane and/or rank.
///
/// `raw_status` and `raw_priority` are taken exactly as received; invalid
/// values abort before anything is written.
pub fn move_client(
    store: &mut ClientStore,
    raw_id: &str,
    raw_status: Option<&Value>,
    raw_priority: Option<&Value>,
) -> Result<MoveOutcome, HandlerError> {
    let id = parse_id(raw_id)?;
    let request = MoveRequest::parse(raw_status, raw_priority)?;

    let tx = store.transaction()?;
    let changed = apply_move(&tx, id, raw_id, &request)?;
    tx.commit()?;

    Ok(MoveOutcome {
        clients: board_order(store.read_all()?),
        changed,
    })
}

/// Creates a client, optionally placing it at a requested rank
pub fn add_client(
    store: &mut ClientStore,
    name: &str,
    description: Option<&str>,
    status: ClientStatus,
    raw_priority: Option<&Value>,
) -> Result<Client, HandlerError> {
    let request = MoveRequest::parse(None, raw_priority)?;

    let tx = store.transaction()?;
    let created = tx.create(name, description, status)?;
    let raw_id = created.id.to_string();
    apply_move(&tx, created.id, &raw_id, &request)?;
    let client = tx.get(created.id)?.unwrap_or(created);
    tx.commit()?;

    Ok(client)
}

/// Deletes a client, re-ranking the rest of its lane
pub fn remove_client(store: &mut ClientStore, raw_id: &str) -> Result<Client, HandlerError> {
    let id = parse_id(raw_id)?;

    let tx = store.transaction()?;
    if tx.get(id)?.is_none() {
        return Err(ValidationError::InvalidId(raw_id.to_string()).into());
    }
    let removed = tx.delete(id)?;
    tx.commit()?;

    Ok(removed)
}

/// Reads one client by raw id
pub fn show_client(store: &ClientStore, raw_id: &str) -> Result<Client, HandlerError> {
    let id = parse_id(raw_id)?;
    store
        .get(id)?
        .ok_or_else(|| ValidationError::InvalidId(raw_id.to_string()).into())
}

/// Sorts clients by lane, then rank
pub fn board_order(mut clients: Vec<Client>) -> Vec<Client> {
    clients.sort_by_key(|c| (c.status, c.priority, c.id));
    clients
}

fn apply_move(
    tx: &StoreTx<'_>,
    id: ClientId,
    raw_id: &str,
    request: &MoveRequest,
) -> Result<Vec<Assignment>, HandlerError> {
    let snapshot = tx.read_all()?;

    let assignments = reorder(&snapshot, id, request).map_err(|e| match e {
        ReorderError::ClientNotFound(_) => ValidationError::InvalidId(raw_id.to_string()),
        ReorderError::Invalid(v) => v,
    })?;

    let changed = changes(&snapshot, &assignments);
    tx.write_assignments(&changed)?;

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lanes::check_invariant;
    use serde_json::json;

    /// `backlog=[A:1,B:2,C:3]`, `in-progress=[D:1]` with ids 1..=4
    fn store() -> ClientStore {
        let mut store = ClientStore::open_in_memory().unwrap();
        for name in ["A", "B", "C"] {
            store.create(name, None, ClientStatus::Backlog).unwrap();
        }
        store.create("D", None, ClientStatus::InProgress).unwrap();
        store
    }

    fn lane(clients: &[Client], status: ClientStatus) -> Vec<(String, u32)> {
        clients
            .iter()
            .filter(|c| c.status == status)
            .map(|c| (c.name.clone(), c.priority))
            .collect()
    }

    fn ranks(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
        pairs.iter().map(|(n, p)| (n.to_string(), *p)).collect()
    }

    #[test]
    fn move_within_lane() {
        let mut store = store();
        let outcome = move_client(&mut store, "2", None, Some(&json!(1))).unwrap();

        assert_eq!(
            lane(&outcome.clients, ClientStatus::Backlog),
            ranks(&[("B", 1), ("A", 2), ("C", 3)])
        );
        assert_eq!(outcome.changed.len(), 2);
    }

    #[test]
    fn move_across_lanes_persists() {
        let mut store = store();
        move_client(&mut store, "1", Some(&json!("in-progress")), None).unwrap();

        let clients = board_order(store.read_all().unwrap());
        check_invariant(&clients).unwrap();
        assert_eq!(
            lane(&clients, ClientStatus::Backlog),
            ranks(&[("B", 1), ("C", 2)])
        );
        assert_eq!(
            lane(&clients, ClientStatus::InProgress),
            ranks(&[("D", 1), ("A", 2)])
        );
    }

    #[test]
    fn empty_move_changes_nothing() {
        let mut store = store();
        let before = store.read_all().unwrap();

        let outcome = move_client(&mut store, "3", None, None).unwrap();

        assert!(outcome.changed.is_empty());
        assert_eq!(board_order(before), outcome.clients);
    }

    #[test]
    fn invalid_input_writes_nothing() {
        let mut store = store();
        let before = store.read_all().unwrap();

        let err = move_client(&mut store, "1", Some(&json!("in-progress")), Some(&json!("top")))
            .unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Validation(ValidationError::InvalidPriority(_))
        ));

        assert_eq!(store.read_all().unwrap(), before);
    }

    #[test]
    fn bad_ids_are_validation_errors() {
        let mut store = store();

        for raw in ["abc", "0", "99"] {
            let err = move_client(&mut store, raw, None, Some(&json!(1))).unwrap_err();
            assert!(matches!(
                err,
                HandlerError::Validation(ValidationError::InvalidId(_))
            ));
        }
    }

    #[test]
    fn add_client_at_requested_rank() {
        let mut store = store();
        let client =
            add_client(&mut store, "E", None, ClientStatus::Backlog, Some(&json!(2))).unwrap();

        assert_eq!(client.priority, 2);
        let clients = board_order(store.read_all().unwrap());
        assert_eq!(
            lane(&clients, ClientStatus::Backlog),
            ranks(&[("A", 1), ("E", 2), ("B", 3), ("C", 4)])
        );
    }

    #[test]
    fn add_client_defaults_to_end() {
        let mut store = store();
        let client = add_client(&mut store, "E", Some("new"), ClientStatus::InProgress, None)
            .unwrap();

        assert_eq!(client.priority, 2);
        assert_eq!(client.description.as_deref(), Some("new"));
    }

    #[test]
    fn add_client_with_bad_priority_creates_nothing() {
        let mut store = store();
        let result = add_client(&mut store, "E", None, ClientStatus::Backlog, Some(&json!(1.5)));

        assert!(result.is_err());
        assert_eq!(store.read_all().unwrap().len(), 4);
    }

    #[test]
    fn remove_client_compacts() {
        let mut store = store();
        let removed = remove_client(&mut store, "1").unwrap();
        assert_eq!(removed.name, "A");

        let clients = store.read_all().unwrap();
        check_invariant(&clients).unwrap();
        assert!(remove_client(&mut store, "1").is_err());
    }

    #[test]
    fn show_client_by_raw_id() {
        let store = store();
        assert_eq!(show_client(&store, "4").unwrap().name, "D");
        assert!(show_client(&store, "x").is_err());
    }
}
