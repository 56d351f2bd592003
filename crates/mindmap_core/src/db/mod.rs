//! SQLite storage for the saved-document library.
//!
//! # Responsibility
//! - Open configured connections for file or in-memory databases.
//! - Bring the schema to the latest version before any library access.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Library storage failures, tagged with the bootstrap stage that failed.
#[derive(Debug)]
pub enum DbError {
    /// The connection could not be established (`mode` is `file` or `memory`).
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// A migration script failed; its transaction was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    NewerSchema { found: u32, supported: u32 },
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => write!(f, "cannot open {mode} library: {source}"),
            Self::Migration { version, source } => {
                write!(f, "library migration {version} failed: {source}")
            }
            Self::NewerSchema { found, supported } => write!(
                f,
                "library schema version {found} is newer than supported {supported}"
            ),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::NewerSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
