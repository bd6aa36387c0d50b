//! SQLite-backed [`LicenseStore`].

use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use keygate_license::{
    LicenseId, LicenseKey, LicenseRecord, LicenseStore, LicenseUpdate, PlanType, StoreError,
    StoreResult,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS licenses (
        id TEXT PRIMARY KEY,
        license_key TEXT UNIQUE NOT NULL,
        user_email TEXT,
        plan_type TEXT NOT NULL CHECK (plan_type IN ('trial1', 'trial3', '30d', '180d', '365d', 'lifetime')),
        start_date TEXT NOT NULL,
        end_date TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_user_email ON licenses(user_email);
    CREATE INDEX IF NOT EXISTS idx_plan_type ON licenses(plan_type);
    CREATE INDEX IF NOT EXISTS idx_is_active ON licenses(is_active);
    CREATE INDEX IF NOT EXISTS idx_end_date ON licenses(end_date);
    CREATE INDEX IF NOT EXISTS idx_created_at ON licenses(created_at);
";

const SELECT_COLUMNS: &str = "id, license_key, user_email, plan_type, start_date, end_date, \
                              is_active, created_at, updated_at";

/// Persistent license store backed by a single SQLite file.
///
/// Key uniqueness is enforced by the `UNIQUE` constraint on `license_key`.
#[derive(Clone)]
pub struct SqliteLicenseStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLicenseStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened license database");
        Self::with_connection(conn)
    }

    /// Opens an in-memory store.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    // ── Queries ──────────────────────────────────────────────────

    fn insert(conn: &Connection, record: &LicenseRecord) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO licenses (id, license_key, user_email, plan_type, start_date, end_date, \
             is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id.to_string(),
                record.key.as_str(),
                record.owner_email,
                record.plan_type.as_str(),
                record.start_date,
                record.end_date,
                record.active,
                record.created_at,
                record.updated_at,
            ],
        )
    }

    fn select_by_key(conn: &Connection, key: &str) -> DbResult<Option<LicenseRecord>> {
        let raw = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM licenses WHERE license_key = ?1"),
                params![key],
                RawLicense::from_row,
            )
            .optional()?;
        raw.map(RawLicense::into_record).transpose()
    }

    fn select_all(conn: &Connection) -> DbResult<Vec<LicenseRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM licenses ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], RawLicense::from_row)?;

        let mut records = Vec::new();
        for raw in rows {
            records.push(raw?.into_record()?);
        }
        Ok(records)
    }
}

impl LicenseStore for SqliteLicenseStore {
    fn insert_if_absent(&self, record: &LicenseRecord) -> StoreResult<()> {
        let conn = self.lock()?;
        match Self::insert(&conn, record) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                debug!("license key already present");
                Err(StoreError::DuplicateKey(record.key.to_string()))
            }
            Err(e) => Err(DbError::from(e).into()),
        }
    }

    fn find_by_key(&self, key: &str) -> StoreResult<Option<LicenseRecord>> {
        let conn = self.lock()?;
        Ok(Self::select_by_key(&conn, key)?)
    }

    fn update_fields(
        &self,
        key: &str,
        update: &LicenseUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<LicenseRecord> {
        let conn = self.lock()?;

        if !update.is_empty() {
            conn.execute(
                "UPDATE licenses SET user_email = COALESCE(?1, user_email), \
                 is_active = COALESCE(?2, is_active), updated_at = ?3 WHERE license_key = ?4",
                params![update.owner_email, update.active, now, key],
            )
            .map_err(DbError::from)?;
        }

        Self::select_by_key(&conn, key)?.ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn list_all(&self) -> StoreResult<Vec<LicenseRecord>> {
        let conn = self.lock()?;
        Ok(Self::select_all(&conn)?)
    }

    fn ping(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(DbError::from)?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteLicenseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLicenseStore").finish_non_exhaustive()
    }
}

/// A row as read from SQLite, before domain validation.
struct RawLicense {
    id: String,
    key: String,
    owner_email: Option<String>,
    plan_type: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RawLicense {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            owner_email: row.get(2)?,
            plan_type: row.get(3)?,
            start_date: row.get(4)?,
            end_date: row.get(5)?,
            active: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_record(self) -> DbResult<LicenseRecord> {
        let id = LicenseId::parse(&self.id)
            .map_err(|e| DbError::InvalidData(format!("bad license id {}: {e}", self.id)))?;
        let key = LicenseKey::parse(&self.key)
            .map_err(|e| DbError::InvalidData(format!("bad license key for {id}: {e}")))?;
        let plan_type: PlanType = self
            .plan_type
            .parse()
            .map_err(|e| DbError::InvalidData(format!("bad plan for {id}: {e}")))?;

        Ok(LicenseRecord {
            id,
            key,
            plan_type,
            owner_email: self.owner_email,
            start_date: self.start_date,
            end_date: self.end_date,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
