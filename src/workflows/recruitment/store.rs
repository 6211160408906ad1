use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use super::domain::{DocumentDigest, LedgerSnapshot, SourceChannel, StoredDocument};

/// Ingestion metadata recorded alongside a newly stored document.
#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    pub original_filename: String,
    pub channel: SourceChannel,
    pub sender: Option<String>,
}

/// Content-addressable store for raw CV documents.
///
/// The store owns the upload directory; the digest records themselves live in
/// the [`LedgerSnapshot`] aggregate so they persist with the rest of the
/// ledger. A digest is only marked known after its bytes are safely on disk.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Pure lookup: the existing storage location for a digest, if any.
    pub fn is_known<'a>(
        &self,
        snapshot: &'a LedgerSnapshot,
        digest: &DocumentDigest,
    ) -> Option<&'a str> {
        snapshot.locations.get(digest).map(String::as_str)
    }

    /// Persists `bytes` under a fresh unique location and records the document.
    ///
    /// On any write failure the digest is not marked known: the snapshot maps
    /// are only touched once the file is on disk.
    pub fn register(
        &self,
        snapshot: &mut LedgerSnapshot,
        bytes: &[u8],
        metadata: DocumentMetadata,
    ) -> Result<String, StoreError> {
        let digest = DocumentDigest::of_bytes(bytes);

        fs::create_dir_all(&self.root).map_err(|source| StoreError::Write {
            location: self.root.display().to_string(),
            source,
        })?;

        let safe_name = sanitize_filename(&metadata.original_filename);
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let unique_name = format!("{stamp}_{}_{safe_name}", digest.short());
        let path = self.root.join(&unique_name);
        let location = path.display().to_string();

        fs::write(&path, bytes).map_err(|source| StoreError::Write {
            location: location.clone(),
            source,
        })?;

        snapshot.locations.insert(digest.clone(), location.clone());
        snapshot.documents.insert(
            digest.clone(),
            StoredDocument {
                digest,
                location: location.clone(),
                original_filename: metadata.original_filename,
                ingested_at: Utc::now(),
                channel: metadata.channel,
                sender: metadata.sender,
            },
        );

        Ok(location)
    }

    /// Enumerates every stored document, sorted so the order is stable within
    /// a call. Used for warehouse re-scans.
    pub fn list_all(&self) -> Result<Vec<PathBuf>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(StoreError::Scan)?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(StoreError::Scan)?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Deletes every stored document and resets the snapshot to its zero
    /// value. Irreversible.
    pub fn purge_all(&self, snapshot: &mut LedgerSnapshot) -> Result<usize, StoreError> {
        let files = self.list_all()?;
        for path in &files {
            fs::remove_file(path).map_err(|source| StoreError::Delete {
                location: path.display().to_string(),
                source,
            })?;
        }

        *snapshot = LedgerSnapshot::default();
        info!(documents_deleted = files.len(), "document store purged");
        Ok(files.len())
    }
}

/// Failure writing to or scanning the underlying document storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to write document '{location}': {source}")]
    Write {
        location: String,
        source: std::io::Error,
    },
    #[error("unable to scan document store: {0}")]
    Scan(std::io::Error),
    #[error("unable to delete stored document '{location}': {source}")]
    Delete {
        location: String,
        source: std::io::Error,
    },
}

/// Keeps uploaded filenames shell- and path-safe without losing readability.
fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "document.pdf".to_string()
    } else {
        trimmed.to_string()
    }
}
