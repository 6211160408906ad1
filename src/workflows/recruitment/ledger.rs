use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use super::domain::{CandidateEvaluation, CandidateStatus, IngestionCounters, LedgerSnapshot};
use super::store::StoreError;

/// Durable persistence seam for the ledger snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Returns the durable snapshot, `None` when no copy exists yet.
    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistError>;
    /// Writes the snapshot durably; a reader must never observe a
    /// half-written copy.
    fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistError>;
}

/// Failure reading or writing the durable ledger snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("unable to read ledger snapshot from '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("ledger snapshot at '{path}' is corrupt: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
    #[error("unable to encode ledger snapshot: {0}")]
    Encode(serde_json::Error),
    #[error("unable to write ledger snapshot to '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// JSON-file snapshot store.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// concurrent reader only ever sees the previous or the new complete copy.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| PersistError::Read {
            path: self.path.display().to_string(),
            source,
        })?;
        let snapshot = serde_json::from_str(&raw).map_err(|source| PersistError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(Some(snapshot))
    }

    fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| PersistError::Write {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot).map_err(PersistError::Encode)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json).map_err(|source| PersistError::Write {
            path: staging.display().to_string(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| PersistError::Write {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// Combined failure of a ledger write: either the caller's storage mutation
/// or the durable persist afterwards.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// The single durable collection of candidate evaluations and ingestion
/// counters for this deployment.
///
/// All mutations serialize behind one mutex and persist before the in-memory
/// copy is swapped, so a failed persist leaves memory at the pre-mutation
/// state and read-modify-write sequences are critical sections.
pub struct CandidateLedger {
    store: Box<dyn SnapshotStore>,
    state: Mutex<LedgerSnapshot>,
}

impl CandidateLedger {
    /// Loads the durable snapshot. Never fails: a missing or corrupt copy
    /// yields a fresh empty snapshot (availability over loss detection).
    pub fn open(store: Box<dyn SnapshotStore>) -> Self {
        let snapshot = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => LedgerSnapshot::default(),
            Err(err) => {
                warn!(error = %err, "ledger snapshot unreadable, starting from an empty ledger");
                LedgerSnapshot::default()
            }
        };

        Self {
            store,
            state: Mutex::new(snapshot),
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.lock().expect("ledger mutex poisoned").clone()
    }

    pub fn candidates(&self) -> Vec<CandidateEvaluation> {
        self.state
            .lock()
            .expect("ledger mutex poisoned")
            .candidates
            .clone()
    }

    pub fn counters(&self) -> IngestionCounters {
        self.state.lock().expect("ledger mutex poisoned").counters
    }

    /// First record whose candidate name matches exactly (case-sensitive).
    pub fn find_by_name(&self, name: &str) -> Option<CandidateEvaluation> {
        self.state
            .lock()
            .expect("ledger mutex poisoned")
            .candidates
            .iter()
            .find(|candidate| candidate.candidate_name == name)
            .cloned()
    }

    /// Discards the previous run's candidate list and persists `candidates`.
    /// Counters and document maps are preserved.
    pub fn replace_candidates(
        &self,
        candidates: Vec<CandidateEvaluation>,
    ) -> Result<(), LedgerError> {
        self.mutate(move |snapshot| {
            snapshot.candidates = candidates;
            Ok(())
        })
    }

    /// Appends one evaluation to the in-progress candidate list and persists.
    pub fn append_candidate(&self, candidate: CandidateEvaluation) -> Result<(), LedgerError> {
        self.mutate(move |snapshot| {
            snapshot.candidates.push(candidate);
            Ok(())
        })
    }

    /// Updates whichever of status/notes is provided on the first exact name
    /// match; returns `false` without persisting when no record matches.
    pub fn update_by_name(
        &self,
        name: &str,
        status: Option<CandidateStatus>,
        notes: Option<String>,
    ) -> Result<bool, LedgerError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");

        let mut working = guard.clone();
        let Some(candidate) = working
            .candidates
            .iter_mut()
            .find(|candidate| candidate.candidate_name == name)
        else {
            return Ok(false);
        };

        if let Some(status) = status {
            candidate.status = status;
        }
        if let Some(notes) = notes {
            candidate.notes = notes;
        }

        self.store.persist(&working)?;
        *guard = working;
        Ok(true)
    }

    /// Runs `f` as a read-modify-write critical section and persists the
    /// result. Nothing persists and memory is untouched when `f` fails.
    pub fn mutate<T>(
        &self,
        f: impl FnOnce(&mut LedgerSnapshot) -> Result<T, StoreError>,
    ) -> Result<T, LedgerError> {
        let mut guard = self.state.lock().expect("ledger mutex poisoned");

        let mut working = guard.clone();
        let value = f(&mut working)?;

        self.store.persist(&working)?;
        *guard = working;
        Ok(value)
    }
}
