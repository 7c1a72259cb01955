//! SQLite storage implementation.
//!
//! This module provides the record store for formsync using SQLite.
//! It follows the MutationContext pattern for transaction discipline and audit logging.

use crate::error::{Error, Result};
use crate::model::{Form, FormUpdate, NewForm};
use crate::storage::events::{insert_event, Event, EventType};
use crate::storage::schema::apply_schema;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Transaction};
use std::path::Path;
use std::time::Duration;

/// Columns selected for every form query, in `map_form` order.
const FORM_COLUMNS: &str =
    "id, name, email, phone_number, message, company, service, created_at, updated_at";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, collecting audit events.
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation (API, CLI user, etc.).
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
        }
    }

    /// Record an event for this operation.
    pub fn record_event(&mut self, entity_type: &str, entity_id: &str, event_type: EventType) {
        self.events
            .push(Event::new(entity_type, entity_id, event_type, &self.actor));
    }

    /// Record an event with old/new values for field tracking.
    pub fn record_change(
        &mut self,
        entity_type: &str,
        entity_id: &str,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.events.push(
            Event::new(entity_type, entity_id, event_type, &self.actor)
                .with_values(old_value, new_value),
        );
    }
}

impl SqliteStorage {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Concurrent API requests and sync reads each hold their own connection
        conn.busy_timeout(BUSY_TIMEOUT)?;

        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an existing database without write access.
    ///
    /// Neither creates the file nor touches the schema, so a reader never
    /// takes the write lock.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if the file doesn't exist, or an error if the
    /// connection cannot be established.
    pub fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotInitialized);
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying connection (for read operations).
    #[must_use]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        tracing::debug!(op = %ctx.op_name, actor = %ctx.actor, events = ctx.events.len(), "Mutation committed");

        Ok(result)
    }

    // ===============
    // Form Operations
    // ===============

    /// Store a new form. The store assigns `id` and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_form(&mut self, form: &NewForm, actor: &str) -> Result<Form> {
        let now = Utc::now().timestamp_millis();

        self.mutate("create_form", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO forms (name, email, phone_number, message, company, service, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    form.name,
                    form.email,
                    form.phone_number,
                    form.message,
                    form.company,
                    form.service,
                    now
                ],
            )?;
            let id = tx.last_insert_rowid();

            ctx.record_event("form", &id.to_string(), EventType::FormCreated);

            get_form_in(tx, id)?.ok_or(Error::FormNotFound { id })
        })
    }

    /// Get a form by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_form(&self, id: i64) -> Result<Option<Form>> {
        get_form_in(&self.conn, id)
    }

    /// List a page of forms in scan (id) order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_forms(&self, offset: u32, limit: u32) -> Result<Vec<Form>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FORM_COLUMNS} FROM forms ORDER BY id ASC LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(rusqlite::params![limit, offset], map_form)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// List every form in scan (id) order.
    ///
    /// This is the full-table snapshot the sheet mirror is built from.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all_forms(&self) -> Result<Vec<Form>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {FORM_COLUMNS} FROM forms ORDER BY id ASC"))?;

        let rows = stmt.query_map([], map_form)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    /// Count stored forms.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_forms(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM forms", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Apply a partial update. Returns `None` if the form doesn't exist.
    ///
    /// `updated_at` is refreshed even when the update carries no fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_form(
        &mut self,
        id: i64,
        update: &FormUpdate,
        actor: &str,
    ) -> Result<Option<Form>> {
        let now = Utc::now().timestamp_millis();

        self.mutate("update_form", actor, |tx, ctx| {
            let Some(mut form) = get_form_in(tx, id)? else {
                return Ok(None);
            };

            update.apply_to(&mut form);
            form.updated_at = DateTime::from_timestamp_millis(now);

            tx.execute(
                "UPDATE forms
                 SET name = ?1, email = ?2, phone_number = ?3, message = ?4,
                     company = ?5, service = ?6, updated_at = ?7
                 WHERE id = ?8",
                rusqlite::params![
                    form.name,
                    form.email,
                    form.phone_number,
                    form.message,
                    form.company,
                    form.service,
                    now,
                    id
                ],
            )?;

            ctx.record_change(
                "form",
                &id.to_string(),
                EventType::FormUpdated,
                None,
                serde_json::to_string(update).ok(),
            );

            Ok(Some(form))
        })
    }

    /// Delete a form. Returns `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_form(&mut self, id: i64, actor: &str) -> Result<bool> {
        self.mutate("delete_form", actor, |tx, ctx| {
            let Some(form) = get_form_in(tx, id)? else {
                return Ok(false);
            };

            tx.execute("DELETE FROM forms WHERE id = ?1", [id])?;

            ctx.record_change(
                "form",
                &id.to_string(),
                EventType::FormDeleted,
                serde_json::to_string(&form).ok(),
                None,
            );

            Ok(true)
        })
    }
}

/// Fetch one form through any connection (plain or transaction).
fn get_form_in(conn: &Connection, id: i64) -> Result<Option<Form>> {
    let form = conn
        .query_row(
            &format!("SELECT {FORM_COLUMNS} FROM forms WHERE id = ?1"),
            [id],
            map_form,
        )
        .optional()?;

    Ok(form)
}

fn map_form(row: &Row<'_>) -> rusqlite::Result<Form> {
    let updated_at: Option<i64> = row.get(8)?;

    Ok(Form {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone_number: row.get(3)?,
        message: row.get(4)?,
        company: row.get(5)?,
        service: row.get(6)?,
        created_at: millis_to_datetime(7, row.get(7)?)?,
        updated_at: updated_at.map(|ms| millis_to_datetime(8, ms)).transpose()?,
    })
}

fn millis_to_datetime(column: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::events::get_events;

    fn new_form(name: &str) -> NewForm {
        NewForm {
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase()),
            phone_number: "123456789".to_string(),
            message: None,
            company: "C".to_string(),
            service: "S".to_string(),
        }
    }

    #[test]
    fn test_create_and_get_form() {
        let mut storage = SqliteStorage::open_memory().unwrap();

        let created = storage.create_form(&new_form("A"), "test").unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.name, "A");
        assert_eq!(created.message, None);
        assert_eq!(created.updated_at, None);

        let fetched = storage.get_form(created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(storage.get_form(99).unwrap().is_none());
    }

    #[test]
    fn test_list_forms_pages_in_id_order() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        for name in ["A", "B", "C", "D"] {
            storage.create_form(&new_form(name), "test").unwrap();
        }

        let page: Vec<String> = storage
            .list_forms(1, 2)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(page, vec!["B", "C"]);

        assert_eq!(storage.list_all_forms().unwrap().len(), 4);
        assert_eq!(storage.count_forms().unwrap(), 4);
    }

    #[test]
    fn test_update_form_is_partial() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let created = storage.create_form(&new_form("A"), "test").unwrap();

        let update = FormUpdate {
            company: Some("New Co".to_string()),
            ..FormUpdate::default()
        };
        let updated = storage.update_form(created.id, &update, "test").unwrap().unwrap();

        assert_eq!(updated.company, "New Co");
        assert_eq!(updated.name, "A");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());

        let stored = storage.get_form(created.id).unwrap().unwrap();
        assert_eq!(stored.company, "New Co");
        assert_eq!(stored, updated);
    }

    #[test]
    fn test_update_missing_form_returns_none() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let result = storage
            .update_form(42, &FormUpdate::default(), "test")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_delete_form() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let created = storage.create_form(&new_form("A"), "test").unwrap();

        assert!(storage.delete_form(created.id, "test").unwrap());
        assert!(!storage.delete_form(created.id, "test").unwrap());
        assert!(storage.get_form(created.id).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let first = storage.create_form(&new_form("A"), "test").unwrap();
        storage.delete_form(first.id, "test").unwrap();

        let second = storage.create_form(&new_form("B"), "test").unwrap();
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_mutations_write_audit_events() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let created = storage.create_form(&new_form("A"), "api").unwrap();
        storage
            .update_form(
                created.id,
                &FormUpdate {
                    name: Some("B".to_string()),
                    ..FormUpdate::default()
                },
                "api",
            )
            .unwrap();
        storage.delete_form(created.id, "api").unwrap();

        let events = get_events(storage.conn(), "form", "1", None).unwrap();
        let kinds: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.contains(&EventType::FormCreated));
        assert!(kinds.contains(&EventType::FormUpdated));
        assert!(kinds.contains(&EventType::FormDeleted));
    }

    #[test]
    fn test_open_readonly_requires_existing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("forms.db");

        assert!(matches!(
            SqliteStorage::open_readonly(&path),
            Err(Error::NotInitialized)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_readonly_reads_but_never_writes() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("forms.db");
        SqliteStorage::open(&path)
            .unwrap()
            .create_form(&new_form("A"), "test")
            .unwrap();

        let mut reader = SqliteStorage::open_readonly(&path).unwrap();
        let forms = reader.list_all_forms().unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].name, "A");

        assert!(matches!(
            reader.create_form(&new_form("B"), "test"),
            Err(Error::Database(_))
        ));
        assert_eq!(SqliteStorage::open(&path).unwrap().count_forms().unwrap(), 1);
    }
}
