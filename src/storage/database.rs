// SQLite connection, schema and the statement helpers shared by every table family

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rusqlite::{Connection, Params, Row, Transaction, params};

use crate::errors::KartTimerError;

pub(crate) const DATABASE_FILE_NAME: &str = "karttimer.db";
pub const DEFAULT_SESSION_LIST_LIMIT: usize = 100;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sessionName TEXT NOT NULL,
    driverName TEXT NOT NULL,
    kartNumber TEXT NOT NULL,
    isWet INTEGER DEFAULT 0,
    createdAt DATETIME DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS laps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sessionId INTEGER NOT NULL,
    lapTime REAL NOT NULL,
    lapNumber INTEGER NOT NULL,
    FOREIGN KEY(sessionId) REFERENCES sessions(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS multipleSessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sessionName TEXT NOT NULL,
    createdAt DATETIME DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS multipleDrivers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    multipleSessionId INTEGER NOT NULL,
    driverName TEXT NOT NULL,
    kartNumber TEXT NOT NULL,
    FOREIGN KEY(multipleSessionId) REFERENCES multipleSessions(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS multipleLaps (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    multipleDriverId INTEGER NOT NULL,
    lapTime REAL NOT NULL,
    lapNumber INTEGER NOT NULL,
    FOREIGN KEY(multipleDriverId) REFERENCES multipleDrivers(id) ON DELETE CASCADE
);
";

/// Owned handle on the session database. Construct one at startup and hand it to whoever
/// needs it; tests use [`Database::open_in_memory`].
pub struct Database {
    pub(crate) conn: Connection,
    path: Option<PathBuf>,
    pub(crate) session_list_limit: usize,
}

impl Database {
    /// Open (or create) the database file at `path` and bring the schema up to date
    pub fn open(path: &Path) -> Result<Self, KartTimerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| KartTimerError::StorageDirError {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening session database at {:?}", path);
        let conn = Connection::open(path).map_err(|e| KartTimerError::StorageUnavailable {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::initialize(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self, KartTimerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| KartTimerError::StorageUnavailable {
                path: PathBuf::from(":memory:"),
                source: e,
            })?;
        Self::initialize(conn, None)
    }

    /// Open the database in the default application data directory
    pub fn new_default() -> Result<Self, KartTimerError> {
        Self::open(&Self::default_database_path()?)
    }

    pub fn default_database_path() -> Result<PathBuf, KartTimerError> {
        let app_data_dir = dirs::data_dir().ok_or(KartTimerError::NoDataDir)?;
        Ok(app_data_dir.join("karttimer").join(DATABASE_FILE_NAME))
    }

    /// Cap applied to single-session listings
    pub fn with_session_list_limit(mut self, limit: usize) -> Self {
        self.session_list_limit = limit;
        self
    }

    /// File backing this database, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn initialize(conn: Connection, path: Option<PathBuf>) -> Result<Self, KartTimerError> {
        let unavailable = |source| KartTimerError::StorageUnavailable {
            path: path.clone().unwrap_or_else(|| PathBuf::from(":memory:")),
            source,
        };

        // cascades only fire with foreign keys on, and the pragma is per connection
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(unavailable)?;
        conn.execute_batch(SCHEMA).map_err(unavailable)?;

        let db = Self {
            conn,
            path: path.clone(),
            session_list_limit: DEFAULT_SESSION_LIST_LIMIT,
        };
        db.migrate().map_err(|e| match e {
            KartTimerError::ReadFailed { source, .. } | KartTimerError::WriteFailed { source, .. } => {
                unavailable(source)
            }
            other => other,
        })?;
        Ok(db)
    }

    /// Databases created before weather was recorded lack the `isWet` column
    fn migrate(&self) -> Result<(), KartTimerError> {
        let columns = query_rows(
            &self.conn,
            "read sessions table layout",
            "PRAGMA table_info(sessions)",
            [],
            |row| row.get::<_, String>(1),
        )?;

        if !columns.iter().any(|c| c == "isWet") {
            info!("Adding isWet column to sessions table");
            self.conn
                .execute("ALTER TABLE sessions ADD COLUMN isWet INTEGER DEFAULT 0", [])
                .map_err(write_error("add isWet column"))?;
        }
        Ok(())
    }
}

pub(crate) fn read_error(operation: &str) -> impl Fn(rusqlite::Error) -> KartTimerError + '_ {
    move |source| KartTimerError::ReadFailed {
        operation: operation.to_string(),
        source,
    }
}

pub(crate) fn write_error(operation: &str) -> impl Fn(rusqlite::Error) -> KartTimerError + '_ {
    move |source| KartTimerError::WriteFailed {
        operation: operation.to_string(),
        source,
    }
}

/// Prepare, bind, step and map every row of a query
pub(crate) fn query_rows<T, P, F>(
    conn: &Connection,
    operation: &str,
    sql: &str,
    params: P,
    map: F,
) -> Result<Vec<T>, KartTimerError>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut statement = conn.prepare_cached(sql).map_err(read_error(operation))?;
    let rows = statement
        .query_map(params, map)
        .map_err(read_error(operation))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(read_error(operation))
}

/// Insert one parent row and return its generated id
pub(crate) fn insert_row<P: Params>(
    tx: &Transaction<'_>,
    operation: &str,
    sql: &str,
    params: P,
) -> Result<i64, KartTimerError> {
    tx.prepare_cached(sql)
        .and_then(|mut statement| statement.insert(params))
        .map_err(write_error(operation))
}

/// Insert lap rows for `parent_id`, numbering them from 1 in slice order.
/// `sql` takes (parent id, lap time, lap number).
pub(crate) fn insert_laps(
    tx: &Transaction<'_>,
    sql: &str,
    parent_id: i64,
    laps: &[f64],
) -> Result<(), KartTimerError> {
    let mut statement = tx.prepare_cached(sql).map_err(write_error("insert laps"))?;
    for (index, lap_time) in laps.iter().enumerate() {
        statement
            .execute(params![parent_id, lap_time, index as i64 + 1])
            .map_err(write_error("insert laps"))?;
    }
    debug!("Inserted {} laps for parent {}", laps.len(), parent_id);
    Ok(())
}

/// Delete by id and report whether anything was removed
pub(crate) fn delete_by_id(
    conn: &Connection,
    operation: &str,
    sql: &str,
    id: i64,
) -> Result<bool, KartTimerError> {
    let removed = conn
        .execute(sql, params![id])
        .map_err(write_error(operation))?;
    Ok(removed > 0)
}

#[cfg(test)]
pub(crate) fn count_rows(conn: &Connection, sql: &str, id: i64) -> i64 {
    conn.query_row(sql, params![id], |row| row.get(0)).unwrap()
}
