//! Durable storage for [`UpdateState`]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[cfg(test)]
use mockall::automock;

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::update::error::StateError;
use crate::update::state::{STATE_SCHEMA_VERSION, UpdateState};

/// Database migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: persisted_state table
    &[r#"
    CREATE TABLE IF NOT EXISTS persisted_state (
        store_key TEXT PRIMARY KEY,
        schema_version INTEGER NOT NULL,
        payload TEXT NOT NULL,
        updated_at INTEGER NOT NULL
    )
    "#],
];

/// Trait for loading and saving the update state record
#[cfg_attr(test, automock)]
pub trait StateStore: Send + Sync {
    /// Load the record, or None on first run
    fn load(&self) -> Result<Option<UpdateState>, StateError>;

    /// Persist the record at the current schema version
    fn save(&self, state: &UpdateState) -> Result<(), StateError>;
}

/// SQLite-backed state store
pub struct SqliteStateStore {
    conn: Mutex<Connection>,
    store_key: String,
}

impl SqliteStateStore {
    pub fn new(db_path: &Path, store_key: &str) -> Result<Self, StateError> {
        info!("Initializing state database at {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::apply_migrations(&conn)?;
        debug!("State database ready");

        Ok(Self {
            conn: Mutex::new(conn),
            store_key: store_key.to_string(),
        })
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StateError> {
        self.conn.lock().map_err(|_| StateError::LockPoisoned)
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), StateError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated database schema version to v{}", target_version);
        }

        Ok(())
    }
}

impl StateStore for SqliteStateStore {
    fn load(&self) -> Result<Option<UpdateState>, StateError> {
        let conn = self.lock_conn()?;
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT schema_version, payload FROM persisted_state WHERE store_key = ?1",
                [&self.store_key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((schema_version, payload)) => {
                debug!(
                    "Loaded state {} at schema v{}",
                    self.store_key, schema_version
                );
                UpdateState::from_payload(schema_version, &payload).map(Some)
            }
            None => Ok(None),
        }
    }

    fn save(&self, state: &UpdateState) -> Result<(), StateError> {
        let payload = state.to_payload()?;
        let now = chrono::Utc::now().timestamp_millis();

        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO persisted_state (store_key, schema_version, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(store_key) DO UPDATE SET
                schema_version = excluded.schema_version,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
            (&self.store_key, STATE_SCHEMA_VERSION, payload, now),
        )?;

        Ok(())
    }
}

/// Process-local state store used when no database is available
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<UpdateState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: UpdateState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<UpdateState>, StateError> {
        let state = self.state.lock().map_err(|_| StateError::LockPoisoned)?;
        Ok(state.clone())
    }

    fn save(&self, state: &UpdateState) -> Result<(), StateError> {
        let mut slot = self.state.lock().map_err(|_| StateError::LockPoisoned)?;
        *slot = Some(state.clone());
        Ok(())
    }
}
