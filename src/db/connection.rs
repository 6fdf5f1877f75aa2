use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("table does not exist yet: {0}")]
    SchemaMissing(String),

    #[error("failed to read schema file {path}: {source}")]
    SchemaFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        // SQLite reports an absent table only through the message text.
        let msg = match &err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => Some(msg.as_str()),
            rusqlite::Error::SqlInputError { msg, .. } => Some(msg.as_str()),
            _ => None,
        };
        if let Some(table) = msg.and_then(|m| m.strip_prefix("no such table: ")) {
            return DbError::SchemaMissing(table.trim().to_string());
        }
        DbError::Sqlite(err)
    }
}

/// Handle to one SQLite database file.
///
/// Cloning is cheap (path only). Each `with_conn` call opens its own
/// connection and closes it when the closure returns, so two handles
/// pointing at different files never share state.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a connection scoped to `f`.
    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        let mut conn = Connection::open(&self.path).map_err(DbError::from)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(DbError::from)?;
        debug!(db = %self.path.display(), "opened connection");
        f(&mut conn)
        // conn dropped (closed) here
    }
}

/// Initialize database from a SQL schema file
pub fn init_db(db: &Database, schema_path: impl AsRef<Path>) -> Result<(), DbError> {
    let schema_path = schema_path.as_ref();
    let schema_sql = fs::read_to_string(schema_path).map_err(|source| DbError::SchemaFile {
        path: schema_path.to_path_buf(),
        source,
    })?;

    db.with_conn(|conn| conn.execute_batch(&schema_sql).map_err(DbError::from))?;

    info!(
        db = %db.path().display(),
        schema = %schema_path.display(),
        "database initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_is_reported_as_schema_missing() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("empty.sqlite3"));

        let res: Result<i64, DbError> = db.with_conn(|conn| {
            conn.query_row("select count(*) from mail_list", [], |r| r.get(0))
                .map_err(DbError::from)
        });

        match res {
            Err(DbError::SchemaMissing(table)) => assert_eq!(table, "mail_list"),
            other => panic!("expected SchemaMissing, got {other:?}"),
        }
    }

    #[test]
    fn init_db_reports_unreadable_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("x.sqlite3"));

        let err = init_db(&db, dir.path().join("nope.sql")).unwrap_err();
        assert!(matches!(err, DbError::SchemaFile { .. }));
    }
}
