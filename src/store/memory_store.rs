use super::fs::{create_private_new, ensure_private_dir, restrict_file};
use crate::domain::{DocumentKind, MemoryDocument};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

/// The directory of JSON documents shared by every memory tool.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub root: PathBuf,
    pub created: Vec<DocumentKind>,
    pub kept: Vec<DocumentKind>,
}

impl MemoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, kind: DocumentKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    /// Load one document.
    ///
    /// A missing file reads as an empty object, and so does a file that is
    /// not valid JSON (with a warning): one broken document must not stop a
    /// build. Other I/O failures are errors.
    pub fn load(&self, kind: DocumentKind) -> Result<MemoryDocument> {
        let path = self.document_path(kind);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(MemoryDocument::empty(kind));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {:?}", path));
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(body) => Ok(MemoryDocument::new(kind, body)),
            Err(err) => {
                warn!(document = %kind, error = %err, "could not parse document, treating it as empty");
                Ok(MemoryDocument::empty(kind))
            }
        }
    }

    pub fn load_all(&self, kinds: &[DocumentKind]) -> Result<Vec<MemoryDocument>> {
        kinds.iter().map(|kind| self.load(*kind)).collect()
    }

    /// Create the directory and any missing seed documents.
    ///
    /// Existing documents are never rewritten; only their permissions are
    /// tightened. Running this twice creates nothing the second time.
    pub fn init(&self) -> Result<InitReport> {
        ensure_private_dir(&self.root)?;
        let now = Utc::now();
        let mut created = Vec::new();
        let mut kept = Vec::new();

        for kind in DocumentKind::all() {
            let path = self.document_path(*kind);
            let body = serde_json::to_vec_pretty(&kind.seed(now))?;
            if create_private_new(&path, &body)? {
                info!(document = %kind, "created memory document");
                created.push(*kind);
            } else {
                restrict_file(&path)?;
                kept.push(*kind);
            }
        }

        Ok(InitReport {
            root: self.root.clone(),
            created,
            kept,
        })
    }

    /// Last modification time of a document, `None` if it does not exist.
    pub fn modified(&self, kind: DocumentKind) -> Result<Option<SystemTime>> {
        modified_at(&self.document_path(kind))
    }
}

pub(crate) fn modified_at(path: &Path) -> Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(
            meta.modified()
                .with_context(|| format!("no modification time for {:?}", path))?,
        )),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to stat {:?}", path)),
    }
}
