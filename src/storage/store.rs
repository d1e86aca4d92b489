//! SQLite client store
//!
//! The store sits in `.lanes/lanes.db` and is the source of truth for all
//! clients. Every read-modify-write sequence runs inside a [`StoreTx`], which
//! opens an immediate transaction so that a snapshot read, the reorder
//! computation and the batch write are serialized across processes.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use thiserror::Error;

use crate::domain::{lanes, Assignment, Client, ClientId, ClientStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Client not found: {0}")]
    NotFound(ClientId),
}

const CLIENT_COLUMNS: &str =
    "id, name, description, status, priority, created_at, updated_at";

/// Persistent client store backed by SQLite
pub struct ClientStore {
    /// Database connection
    conn: Connection,
}

impl ClientStore {
    /// Schema version - bump when schema changes to force migration
    const SCHEMA_VERSION: i32 = 1;

    /// Opens or creates the store at the given path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open client store: {}", db_path.display()))?;

        // WAL lets readers proceed while a move is being written
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let mut store = Self { conn };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Opens a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;

        let mut store = Self { conn };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Ensures the schema is up to date
    fn ensure_schema(&mut self) -> Result<()> {
        let current_version = self.schema_version()?;

        if current_version != Self::SCHEMA_VERSION {
            self.create_schema()?;
        }

        Ok(())
    }

    /// Gets the current schema version
    fn schema_version(&self) -> Result<i32> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        Ok(version)
    }

    /// Creates the schema on a fresh database
    fn create_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL,
                priority INTEGER NOT NULL CHECK (priority >= 1),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_clients_lane ON clients(status, priority);
            ",
        )?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    /// Starts a serialized unit of work
    pub fn transaction(&mut self) -> Result<StoreTx<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin store transaction")?;

        Ok(StoreTx { tx })
    }

    /// Reads every client, in id order
    pub fn read_all(&self) -> Result<Vec<Client>> {
        read_all(&self.conn)
    }

    /// Reads one client
    pub fn get(&self, id: ClientId) -> Result<Option<Client>> {
        get(&self.conn, id)
    }

    /// Reads one lane in rank order
    pub fn lane(&self, status: ClientStatus) -> Result<Vec<Client>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM clients WHERE status = ?1 ORDER BY priority, id",
            CLIENT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![status.as_str()], client_from_row)?;
        let mut clients = Vec::new();
        for row in rows {
            clients.push(row?);
        }

        Ok(clients)
    }

    /// Number of clients per lane
    pub fn counts(&self) -> Result<HashMap<ClientStatus, usize>> {
        let mut counts: HashMap<ClientStatus, usize> =
            ClientStatus::ALL.iter().map(|s| (*s, 0)).collect();

        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM clients GROUP BY status")?;

        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((status, count))
        })?;

        for row in rows {
            let (status, count) = row?;
            let status: ClientStatus = status.parse()?;
            counts.insert(status, usize::try_from(count).unwrap_or(0));
        }

        Ok(counts)
    }

    /// Persists one assignment outside of any explicit transaction
    pub fn write_assignment(&self, assignment: &Assignment) -> Result<()> {
        write_assignment(&self.conn, assignment)
    }

    /// Persists a batch of assignments atomically
    pub fn write_assignments(&mut self, assignments: &[Assignment]) -> Result<()> {
        let tx = self.transaction()?;
        tx.write_assignments(assignments)?;
        tx.commit()
    }

    /// Creates a client at the end of the given lane
    pub fn create(
        &mut self,
        name: &str,
        description: Option<&str>,
        status: ClientStatus,
    ) -> Result<Client> {
        let tx = self.transaction()?;
        let client = tx.create(name, description, status)?;
        tx.commit()?;
        Ok(client)
    }

    /// Updates descriptive fields, leaving lane and rank alone
    pub fn update_details(
        &self,
        id: ClientId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Client> {
        let mut client = get(&self.conn, id)?.ok_or(StoreError::NotFound(id))?;

        if let Some(name) = name {
            client.set_name(name);
        }
        if let Some(description) = description {
            client.set_description(description);
        }

        self.conn.execute(
            "UPDATE clients SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                client.name,
                client.description,
                client.updated_at.to_rfc3339(),
                id.get() as i64,
            ],
        )?;

        Ok(client)
    }

    /// Deletes a client and closes the gap it leaves in its lane
    pub fn delete(&mut self, id: ClientId) -> Result<Client> {
        let tx = self.transaction()?;
        let removed = tx.delete(id)?;
        tx.commit()?;
        Ok(removed)
    }
}

/// A serialized unit of work against the store.
///
/// Dropping without [`StoreTx::commit`] rolls every write back.
pub struct StoreTx<'a> {
    tx: Transaction<'a>,
}

impl StoreTx<'_> {
    /// Reads the full client snapshot
    pub fn read_all(&self) -> Result<Vec<Client>> {
        read_all(&self.tx)
    }

    /// Reads one client
    pub fn get(&self, id: ClientId) -> Result<Option<Client>> {
        get(&self.tx, id)
    }

    /// Persists one assignment
    pub fn write_assignment(&self, assignment: &Assignment) -> Result<()> {
        write_assignment(&self.tx, assignment)
    }

    /// Persists a batch of assignments
    pub fn write_assignments(&self, assignments: &[Assignment]) -> Result<()> {
        for assignment in assignments {
            self.write_assignment(assignment)?;
        }
        Ok(())
    }

    /// Creates a client at the end of the given lane
    pub fn create(
        &self,
        name: &str,
        description: Option<&str>,
        status: ClientStatus,
    ) -> Result<Client> {
        let lane_size: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM clients WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        let priority = u32::try_from(lane_size + 1).context("Lane is too large")?;
        let now = Utc::now();

        self.tx.execute(
            "INSERT INTO clients (name, description, status, priority, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                description,
                status.as_str(),
                priority,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;

        let id = ClientId::new(self.tx.last_insert_rowid() as u64)?;
        get(&self.tx, id)?.ok_or_else(|| StoreError::NotFound(id).into())
    }

    /// Deletes a client and re-ranks the rest of its lane
    pub fn delete(&self, id: ClientId) -> Result<Client> {
        let snapshot = read_all(&self.tx)?;
        let removed = snapshot
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;

        self.tx
            .execute("DELETE FROM clients WHERE id = ?1", params![id.get() as i64])?;

        let remaining = lanes::lane_without(&snapshot, removed.status, id);
        let compacted = lanes::compact(&remaining);
        self.write_assignments(&crate::domain::changes(&snapshot, &compacted))?;

        Ok(removed)
    }

    /// Commits the unit of work
    pub fn commit(self) -> Result<()> {
        self.tx.commit().context("Failed to commit store transaction")
    }
}

fn read_all(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM clients ORDER BY id", CLIENT_COLUMNS))?;

    let rows = stmt.query_map([], client_from_row)?;
    let mut clients = Vec::new();
    for row in rows {
        clients.push(row?);
    }

    Ok(clients)
}

fn get(conn: &Connection, id: ClientId) -> Result<Option<Client>> {
    let client = conn
        .query_row(
            &format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS),
            params![id.get() as i64],
            client_from_row,
        )
        .optional()?;

    Ok(client)
}

fn write_assignment(conn: &Connection, assignment: &Assignment) -> Result<()> {
    let updated = conn.execute(
        "UPDATE clients SET status = ?1, priority = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            assignment.status.as_str(),
            assignment.priority,
            Utc::now().to_rfc3339(),
            assignment.id.get() as i64,
        ],
    )?;

    if updated == 0 {
        return Err(StoreError::NotFound(assignment.id).into());
    }

    Ok(())
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    let id: i64 = row.get(0)?;
    let status: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(Client {
        id: ClientId::new(id as u64).map_err(|e| conversion_error(0, Type::Integer, e))?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: status
            .parse()
            .map_err(|e| conversion_error(3, Type::Text, e))?,
        priority: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
        updated_at: parse_timestamp(6, &updated_at)?,
    })
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, Type::Text, e))
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lanes::check_invariant;
    use tempfile::TempDir;

    fn seeded() -> ClientStore {
        let mut store = ClientStore::open_in_memory().unwrap();
        store.create("Acme", None, ClientStatus::Backlog).unwrap();
        store.create("Globex", Some("Big one"), ClientStatus::Backlog).unwrap();
        store.create("Initech", None, ClientStatus::InProgress).unwrap();
        store
    }

    #[test]
    fn test_store_creation_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lanes.db");
        let store = ClientStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.schema_version().unwrap(), ClientStore::SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lanes.db");

        {
            let mut store = ClientStore::open(&path).unwrap();
            store.create("Acme", None, ClientStatus::Backlog).unwrap();
        }

        let store = ClientStore::open(&path).unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_create_appends_to_lane() {
        let store = seeded();

        let backlog = store.lane(ClientStatus::Backlog).unwrap();
        let ranks: Vec<(&str, u32)> = backlog.iter().map(|c| (c.name.as_str(), c.priority)).collect();
        assert_eq!(ranks, vec![("Acme", 1), ("Globex", 2)]);

        let in_progress = store.lane(ClientStatus::InProgress).unwrap();
        assert_eq!(in_progress[0].priority, 1);
        assert_eq!(in_progress[0].id.get(), 3);
    }

    #[test]
    fn test_roundtrip_fields() {
        let store = seeded();
        let globex = store.get(ClientId::new(2).unwrap()).unwrap().unwrap();

        assert_eq!(globex.name, "Globex");
        assert_eq!(globex.description.as_deref(), Some("Big one"));
        assert_eq!(globex.status, ClientStatus::Backlog);
    }

    #[test]
    fn test_write_assignments_batch() {
        let mut store = seeded();
        let acme = ClientId::new(1).unwrap();
        let globex = ClientId::new(2).unwrap();

        store
            .write_assignments(&[
                Assignment { id: globex, status: ClientStatus::Backlog, priority: 1 },
                Assignment { id: acme, status: ClientStatus::Backlog, priority: 2 },
            ])
            .unwrap();

        let backlog = store.lane(ClientStatus::Backlog).unwrap();
        assert_eq!(backlog[0].id, globex);
        assert_eq!(backlog[1].id, acme);
    }

    #[test]
    fn test_write_single_assignment() {
        let store = seeded();
        let initech = ClientId::new(3).unwrap();

        store
            .write_assignment(&Assignment { id: initech, status: ClientStatus::Complete, priority: 1 })
            .unwrap();
        assert_eq!(store.lane(ClientStatus::Complete).unwrap()[0].id, initech);

        let missing = ClientId::new(77).unwrap();
        assert!(store
            .write_assignment(&Assignment { id: missing, status: ClientStatus::Complete, priority: 2 })
            .is_err());
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut store = seeded();
        let acme = ClientId::new(1).unwrap();
        let missing = ClientId::new(42).unwrap();

        let result = store.write_assignments(&[
            Assignment { id: acme, status: ClientStatus::Complete, priority: 1 },
            Assignment { id: missing, status: ClientStatus::Complete, priority: 2 },
        ]);

        assert!(result.is_err());
        let acme = store.get(acme).unwrap().unwrap();
        assert_eq!(acme.status, ClientStatus::Backlog);
    }

    #[test]
    fn test_delete_compacts_lane() {
        let mut store = seeded();
        store.create("Umbrella", None, ClientStatus::Backlog).unwrap();

        let removed = store.delete(ClientId::new(2).unwrap()).unwrap();
        assert_eq!(removed.name, "Globex");

        let clients = store.read_all().unwrap();
        check_invariant(&clients).unwrap();

        let backlog = store.lane(ClientStatus::Backlog).unwrap();
        let names: Vec<&str> = backlog.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Umbrella"]);
    }

    #[test]
    fn test_delete_missing_client() {
        let mut store = seeded();
        assert!(store.delete(ClientId::new(99).unwrap()).is_err());
        assert_eq!(store.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut store = seeded();
        store.delete(ClientId::new(3).unwrap()).unwrap();

        let client = store.create("Hooli", None, ClientStatus::Complete).unwrap();
        assert_eq!(client.id.get(), 4);
    }

    #[test]
    fn test_update_details() {
        let store = seeded();
        let id = ClientId::new(1).unwrap();

        let updated = store.update_details(id, Some("Acme Corp"), Some("Renewal due")).unwrap();
        assert_eq!(updated.name, "Acme Corp");
        assert_eq!(updated.priority, 1);

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.description.as_deref(), Some("Renewal due"));
    }

    #[test]
    fn test_counts() {
        let store = seeded();
        let counts = store.counts().unwrap();

        assert_eq!(counts[&ClientStatus::Backlog], 2);
        assert_eq!(counts[&ClientStatus::InProgress], 1);
        assert_eq!(counts[&ClientStatus::Complete], 0);
    }
}
