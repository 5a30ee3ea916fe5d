//! SQLite adapter: Implementation of PredictionStore.
//!
//! Provides local persistence for the prediction history in a single file.
//!
//! # Schema versioning
//!
//! The schema version lives in `PRAGMA user_version`. Opening a store whose
//! version is older than [`SCHEMA_VERSION`] drops the `predictions` table and
//! recreates it: **every stored record is discarded on a version bump.** A store
//! written by a newer build is refused instead of wiped.
//!
//! Version history:
//! - 1: eight columns (id, inputs, risk_result)
//! - 2: adds nullable `score`
//!
//! # Locking
//!
//! The connection sits behind a `Mutex`, so inserts and schema upgrades are
//! serialized and ids stay monotonic when the store is shared between threads.
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{ClinicalInputs, DeliveryMode, NewPrediction, PredictionRecord, RiskLabel};
use crate::ports::PredictionStore;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 2;

/// Default database file name.
pub const DEFAULT_DB_FILE: &str = "pph_predictions.db";

const TABLE_NAME: &str = "predictions";

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        age INTEGER,
        parity INTEGER,
        mode INTEGER,
        haemoglobin REAL,
        previous_pph INTEGER,
        prolonged_labor INTEGER,
        risk_result TEXT,
        score REAL
    );
";

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Stored schema version {stored} is newer than supported version {supported}")]
    SchemaDowngrade { stored: u32, supported: u32 },

    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// SQLite storage adapter.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    version: u32,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        Self::open_with_version(path, SCHEMA_VERSION)
    }

    /// Open the store, treating `version` as the current schema version.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn open_with_version<P: AsRef<Path>>(path: P, version: u32) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, version)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?, SCHEMA_VERSION)
    }

    fn with_connection(conn: Connection, version: u32) -> Result<Self, PersistenceError> {
        let store = Self {
            conn: Mutex::new(conn),
            version,
        };
        store.create_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn.lock().map_err(|_| PersistenceError::LockPoisoned)
    }

    fn stored_version(conn: &Connection) -> Result<u32, PersistenceError> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(u32::try_from(version).unwrap_or(0))
    }

    fn table_exists(conn: &Connection) -> Result<bool, PersistenceError> {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![TABLE_NAME],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            id: row.get(0)?,
            age: row.get(1)?,
            parity: row.get(2)?,
            mode: row.get(3)?,
            haemoglobin: row.get(4)?,
            previous_pph: row.get(5)?,
            prolonged_labor: row.get(6)?,
            risk_result: row.get(7)?,
            score: row.get(8)?,
        })
    }
}

/// Row exactly as stored, before closed-set decoding.
struct RawRow {
    id: i64,
    age: i64,
    parity: i64,
    mode: i64,
    haemoglobin: f64,
    previous_pph: i64,
    prolonged_labor: i64,
    risk_result: String,
    score: Option<f64>,
}

impl RawRow {
    fn decode(self) -> Result<PredictionRecord, PersistenceError> {
        let id = self.id;
        let corrupt = |reason: String| PersistenceError::CorruptRecord { id, reason };

        let delivery_mode = DeliveryMode::from_code(self.mode).map_err(|e| corrupt(e.to_string()))?;
        let label = RiskLabel::parse(&self.risk_result)
            .ok_or_else(|| corrupt(format!("unknown risk result {:?}", self.risk_result)))?;
        let age = u32::try_from(self.age).map_err(|_| corrupt(format!("age {}", self.age)))?;
        let parity = u32::try_from(self.parity).map_err(|_| corrupt(format!("parity {}", self.parity)))?;

        Ok(PredictionRecord {
            id,
            inputs: ClinicalInputs {
                age,
                parity,
                delivery_mode,
                haemoglobin: self.haemoglobin,
                previous_pph: self.previous_pph != 0,
                prolonged_labor: self.prolonged_labor != 0,
            },
            label,
            score: self.score,
        })
    }
}

impl PredictionStore for SqliteStore {
    type Error = PersistenceError;

    fn create_schema(&self) -> Result<(), Self::Error> {
        let mut conn = self.lock()?;
        let stored = Self::stored_version(&conn)?;
        let exists = Self::table_exists(&conn)?;

        if stored > self.version {
            return Err(PersistenceError::SchemaDowngrade {
                stored,
                supported: self.version,
            });
        }

        if stored == self.version && exists {
            tracing::debug!("Schema at version {}, nothing to do", stored);
            return Ok(());
        }

        let tx = conn.transaction()?;
        if exists {
            let discarded: i64 = tx.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
            tracing::warn!(
                "Upgrading schema from version {} to {}: dropping {} stored predictions",
                stored,
                self.version,
                discarded
            );
            tx.execute_batch("DROP TABLE IF EXISTS predictions;")?;
        }
        tx.execute_batch(CREATE_TABLE)?;
        tx.pragma_update(None, "user_version", self.version)?;
        tx.commit()?;

        tracing::info!("Created table {} (schema version {})", TABLE_NAME, self.version);
        Ok(())
    }

    fn insert(&self, prediction: &NewPrediction) -> Result<i64, Self::Error> {
        let conn = self.lock()?;
        let i = &prediction.inputs;

        conn.execute(
            r"
            INSERT INTO predictions (
                age, parity, mode, haemoglobin, previous_pph,
                prolonged_labor, risk_result, score
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                i.age,
                i.parity,
                i.delivery_mode.code(),
                i.haemoglobin,
                i.previous_pph,
                i.prolonged_labor,
                prediction.assessment.label.as_str(),
                prediction.assessment.score,
            ],
        )?;
        let id = conn.last_insert_rowid();

        tracing::debug!("Prediction inserted with id {}", id);
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<PredictionRecord>, Self::Error> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r"
            SELECT id, age, parity, mode, haemoglobin, previous_pph,
                   prolonged_labor, risk_result, score
            FROM predictions
            ORDER BY id DESC
            ",
        )?;

        let rows = stmt
            .query_map([], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawRow::decode).collect()
    }

    fn count(&self) -> Result<usize, Self::Error> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}
