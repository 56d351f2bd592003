//! Document library use-case service.
//!
//! # Responsibility
//! - Save the live editor as a structured document under a title.
//! - Load saved documents back into an editor.
//!
//! # Invariants
//! - The title is the root label at save time.
//! - Loading is all-or-nothing: a corrupt body leaves the editor untouched.

use crate::repo::document_repo::{
    DocumentDraft, DocumentId, DocumentRecord, DocumentRepository, DocumentSummary, RepoError,
};
use crate::service::editor::{EditorError, MindMapEditor};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Library operation errors.
#[derive(Debug)]
pub enum LibraryError {
    Repo(RepoError),
    Editor(EditorError),
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Editor(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LibraryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Editor(err) => Some(err),
        }
    }
}

impl From<RepoError> for LibraryError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<EditorError> for LibraryError {
    fn from(value: EditorError) -> Self {
        Self::Editor(value)
    }
}

/// Saved-document library over a repository implementation.
pub struct LibraryService<R: DocumentRepository> {
    repo: R,
}

impl<R: DocumentRepository> LibraryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves the editor's document.
    ///
    /// With `existing = Some(id)` the stored row is overwritten (`NotFound`
    /// when it was deleted); otherwise a new document is created.
    pub fn save(
        &self,
        editor: &MindMapEditor,
        existing: Option<DocumentId>,
    ) -> LibraryResult<DocumentId> {
        let body = editor.export_document()?;
        let store = editor.store();
        let title = store.root().map_or("", |root| root.text.as_str());
        let draft = DocumentDraft {
            title,
            body: &body,
            node_count: u32::try_from(store.len()).unwrap_or(u32::MAX),
        };

        let id = match existing {
            Some(id) => {
                self.repo.update_document(id, draft)?;
                id
            }
            None => self.repo.create_document(draft)?,
        };
        info!(
            "event=library_save module=library status=ok doc_uuid={id} nodes={}",
            draft.node_count
        );
        Ok(id)
    }

    /// Most recently written documents first.
    pub fn list(&self, limit: Option<u32>) -> LibraryResult<Vec<DocumentSummary>> {
        Ok(self.repo.list_documents(limit)?)
    }

    pub fn get(&self, id: DocumentId) -> LibraryResult<DocumentRecord> {
        self.repo
            .get_document(id)?
            .ok_or(LibraryError::Repo(RepoError::NotFound(id)))
    }

    /// Replaces the editor's document with a saved one (one undoable step).
    pub fn load(&self, id: DocumentId, editor: &mut MindMapEditor) -> LibraryResult<()> {
        let record = self.get(id)?;
        if let Err(err) = editor.import_document(&record.body) {
            warn!("event=library_load module=library status=error doc_uuid={id} error={err}");
            return Err(err.into());
        }
        info!("event=library_load module=library status=ok doc_uuid={id}");
        Ok(())
    }

    pub fn delete(&self, id: DocumentId) -> LibraryResult<()> {
        self.repo.delete_document(id)?;
        info!("event=library_delete module=library status=ok doc_uuid={id}");
        Ok(())
    }
}
