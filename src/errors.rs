use crate::db::connection::DbError;
use astra::Response;
// errors.rs
use std::fmt;

/// Errors originating from either the server logic
/// (routing, missing resources, etc.) or downstream layers (DB).
#[derive(Debug)]
pub enum ServerError {
    NotFound,
    BadRequest(String),
    DbError(String),
    SchemaMissing(String),
    InternalError,
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::NotFound => write!(f, "Not Found"),
            ServerError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            ServerError::DbError(msg) => write!(f, "Database Error: {msg}"),
            ServerError::SchemaMissing(table) => write!(f, "Table not created yet: {table}"),
            ServerError::InternalError => write!(f, "Internal Server Error"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<DbError> for ServerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::SchemaMissing(table) => ServerError::SchemaMissing(table),
            other => ServerError::DbError(other.to_string()),
        }
    }
}

/// Coarse classes every domain error falls into.
///
/// Validation problems are reported back to whoever asked, transient ones
/// are worth another attempt, data-shape problems abort the batch that hit
/// them, and a missing table means the schema was never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transient,
    DataShape,
    SchemaMissing,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Transient => "transient",
            ErrorKind::DataShape => "data-shape",
            ErrorKind::SchemaMissing => "schema-missing",
        };
        f.write_str(s)
    }
}

pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for DbError {
    fn kind(&self) -> ErrorKind {
        match self {
            DbError::SchemaMissing(_) => ErrorKind::SchemaMissing,
            DbError::SchemaFile { .. } => ErrorKind::SchemaMissing,
            DbError::Sqlite(_) => ErrorKind::Transient,
        }
    }
}
