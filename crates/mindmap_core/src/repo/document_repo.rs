//! Saved-document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist structured document bodies with a title and timestamps.
//! - Keep SQL and ordering rules inside the repository boundary.
//!
//! # Invariants
//! - Listing is deterministic: `updated_at DESC, doc_uuid ASC`.
//! - Every write stamps `updated_at` strictly later than any existing row, so
//!   the most recent write always lists first.
//! - Bodies are stored verbatim; decoding is the caller's concern.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable saved-document identifier.
pub type DocumentId = Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

const NEXT_STAMP_SQL: &str =
    "MAX(?1, (SELECT COALESCE(MAX(updated_at), 0) + 1 FROM documents))";

/// Errors from document persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(DocumentId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "document repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "document repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Full stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub doc_uuid: DocumentId,
    pub title: String,
    /// Structured JSON body.
    pub body: String,
    pub node_count: u32,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Listing row without the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub doc_uuid: DocumentId,
    pub title: String,
    pub node_count: u32,
    pub updated_at: i64,
}

/// Content written by create/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentDraft<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub node_count: u32,
}

/// Repository interface for the document library.
pub trait DocumentRepository {
    fn create_document(&self, draft: DocumentDraft<'_>) -> RepoResult<DocumentId>;
    fn update_document(&self, id: DocumentId, draft: DocumentDraft<'_>) -> RepoResult<()>;
    fn get_document(&self, id: DocumentId) -> RepoResult<Option<DocumentRecord>>;
    fn list_documents(&self, limit: Option<u32>) -> RepoResult<Vec<DocumentSummary>>;
    fn delete_document(&self, id: DocumentId) -> RepoResult<()>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Wraps a connection after checking it was opened through `db::open_db*`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn create_document(&self, draft: DocumentDraft<'_>) -> RepoResult<DocumentId> {
        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        self.conn.execute(
            &format!(
                "INSERT INTO documents (doc_uuid, title, body, node_count, created_at, updated_at)
                 VALUES (?2, ?3, ?4, ?5, ?1, {NEXT_STAMP_SQL});"
            ),
            params![
                now,
                id.to_string(),
                draft.title,
                draft.body,
                i64::from(draft.node_count)
            ],
        )?;
        Ok(id)
    }

    fn update_document(&self, id: DocumentId, draft: DocumentDraft<'_>) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE documents
                 SET title = ?2, body = ?3, node_count = ?4, updated_at = {NEXT_STAMP_SQL}
                 WHERE doc_uuid = ?5;"
            ),
            params![
                now_epoch_ms(),
                draft.title,
                draft.body,
                i64::from(draft.node_count),
                id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_document(&self, id: DocumentId) -> RepoResult<Option<DocumentRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT doc_uuid, title, body, node_count, created_at, updated_at
                 FROM documents
                 WHERE doc_uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("doc_uuid")?,
                        row.get::<_, String>("title")?,
                        row.get::<_, String>("body")?,
                        row.get::<_, i64>("node_count")?,
                        row.get::<_, i64>("created_at")?,
                        row.get::<_, i64>("updated_at")?,
                    ))
                },
            )
            .optional()?;

        let Some((uuid_text, title, body, node_count, created_at, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(DocumentRecord {
            doc_uuid: parse_uuid(&uuid_text)?,
            title,
            body,
            node_count: parse_count(node_count)?,
            created_at,
            updated_at,
        }))
    }

    fn list_documents(&self, limit: Option<u32>) -> RepoResult<Vec<DocumentSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_uuid, title, node_count, updated_at
             FROM documents
             ORDER BY updated_at DESC, doc_uuid ASC
             LIMIT ?1;",
        )?;
        let limit = limit.map_or(-1, i64::from);
        let mut rows = stmt.query([limit])?;

        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(parse_summary_row(row)?);
        }
        Ok(summaries)
    }

    fn delete_document(&self, id: DocumentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM documents WHERE doc_uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_summary_row(row: &Row<'_>) -> RepoResult<DocumentSummary> {
    let uuid_text: String = row.get("doc_uuid")?;
    Ok(DocumentSummary {
        doc_uuid: parse_uuid(&uuid_text)?,
        title: row.get("title")?,
        node_count: parse_count(row.get("node_count")?)?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str) -> RepoResult<DocumentId> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid `{value}` in documents.doc_uuid"))
    })
}

fn parse_count(value: i64) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid node_count `{value}` in documents"))
    })
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'documents'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable("documents"));
    }
    Ok(())
}
