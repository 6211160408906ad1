//! Shared in-memory fakes and fixture builders for the pipeline tests.
//!
//! The fakes are deterministic: the oracle reads `NAME:`/`SCORE:` markers out
//! of the document text, the dispatcher records every e-mail and bounces
//! addresses containing "bounce", and the snapshot store keeps everything in
//! memory with an optional scripted persist failure.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tempfile::TempDir;

use crate::config::SenderIdentity;
use crate::workflows::recruitment::{
    CandidateEvaluation, CandidateLedger, CandidateStatus, ContentStore, DecisionEngine,
    DispatchError, EmailDispatcher, ExtractionError, GenerationError, IncomingDocument,
    IntakeCoordinator, LedgerSnapshot, MessageGenerator, OracleError, OracleEvaluation,
    OutboundEmail, PersistError, PipelineState, ScoringOracle, SnapshotStore, SourceChannel,
    TextExtractor,
};

#[derive(Default)]
struct MemoryStoreInner {
    snapshot: Mutex<Option<LedgerSnapshot>>,
    persist_calls: AtomicUsize,
    fail_persist: AtomicBool,
}

/// In-memory snapshot store. Clones share state so a test can keep a handle
/// while the ledger owns the boxed copy.
#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemorySnapshotStore {
    pub fn persist_calls(&self) -> usize {
        self.inner.persist_calls.load(Ordering::SeqCst)
    }

    pub fn fail_persist(&self, fail: bool) {
        self.inner.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Option<LedgerSnapshot> {
        self.inner
            .snapshot
            .lock()
            .expect("snapshot mutex poisoned")
            .clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, PersistError> {
        Ok(self.stored())
    }

    fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistError> {
        self.inner.persist_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_persist.load(Ordering::SeqCst) {
            return Err(PersistError::Write {
                path: "memory".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "scripted persist failure"),
            });
        }
        *self
            .inner
            .snapshot
            .lock()
            .expect("snapshot mutex poisoned") = Some(snapshot.clone());
        Ok(())
    }
}

/// Scores documents from markers embedded in their text, so test CVs control
/// their own evaluation outcome.
pub struct TokenOracle;

impl ScoringOracle for TokenOracle {
    fn evaluate(
        &self,
        _job_description: &str,
        candidate_text: &str,
    ) -> Result<OracleEvaluation, OracleError> {
        if candidate_text.contains("ORACLE-FAIL") {
            return Err(OracleError::Unavailable("scripted outage".to_string()));
        }

        let field = |key: &str| {
            candidate_text
                .lines()
                .find_map(|line| line.strip_prefix(key))
                .map(|value| value.trim().to_string())
        };

        let candidate_name = field("NAME:").unwrap_or_else(|| "Unnamed".to_string());
        let score: u8 = field("SCORE:")
            .and_then(|value| value.parse().ok())
            .unwrap_or(50);

        Ok(OracleEvaluation {
            candidate_name: candidate_name.clone(),
            score,
            stat_score: score,
            tech_score: score,
            team_score: score,
            summary: format!("Scripted evaluation for {candidate_name}"),
            rationale: vec!["Relevant delivery experience".to_string()],
            email: field("EMAIL:").unwrap_or_default(),
            email_body: format!("Dear {candidate_name}, draft invitation."),
            dismissed: candidate_text.contains("DISMISS"),
            industry: field("INDUSTRY:"),
        })
    }
}

/// Reads stored files back as text; documents containing `UNREADABLE` fail
/// extraction.
pub struct DiskExtractor;

impl TextExtractor for DiskExtractor {
    fn extract(&self, location: &Path) -> Result<String, ExtractionError> {
        let text = std::fs::read_to_string(location)
            .map_err(|err| ExtractionError::Unreadable(err.to_string()))?;
        if text.contains("UNREADABLE") {
            return Err(ExtractionError::Unreadable("scripted scan failure".to_string()));
        }
        Ok(text)
    }
}

pub struct StubGenerator {
    pub fail: bool,
}

impl MessageGenerator for StubGenerator {
    fn shortlist_message(
        &self,
        candidate_name: &str,
        rationale: &[String],
    ) -> Result<String, GenerationError> {
        if self.fail {
            return Err(GenerationError::Failed("scripted outage".to_string()));
        }
        Ok(format!(
            "Generated invitation for {candidate_name} ({} points)",
            rationale.len()
        ))
    }
}

/// Records every dispatched e-mail; addresses containing "bounce" fail.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("dispatch mutex poisoned").clone()
    }
}

impl EmailDispatcher for RecordingDispatcher {
    fn send(&self, email: OutboundEmail) -> Result<String, DispatchError> {
        if email.to_address.contains("bounce") {
            return Err(DispatchError::Transport("mailbox unavailable".to_string()));
        }
        let mut sent = self.sent.lock().expect("dispatch mutex poisoned");
        sent.push(email);
        Ok(format!("msg-{:03}", sent.len()))
    }
}

pub fn sender() -> SenderIdentity {
    SenderIdentity {
        name: "TalentScope UK".to_string(),
        email: "recruitment@talentscope-pilot.pro".to_string(),
    }
}

/// Marker-bearing CV text long enough to clear the extraction minimum.
pub fn cv_text(name: &str, score: u8) -> String {
    let slug = name.to_ascii_lowercase().replace(' ', ".");
    format!(
        "NAME: {name}\nSCORE: {score}\nEMAIL: {slug}@example.com\n\
         Experienced professional with a decade of relevant delivery work \
         across several UK engagements."
    )
}

pub fn incoming(name: &str, score: u8, channel: SourceChannel) -> IncomingDocument {
    IncomingDocument {
        bytes: cv_text(name, score).into_bytes(),
        filename: format!("{}.txt", name.to_ascii_lowercase().replace(' ', "_")),
        channel,
        sender: None,
    }
}

pub fn sample_evaluation(name: &str, score: u8) -> CandidateEvaluation {
    let slug = name.to_ascii_lowercase().replace(' ', ".");
    CandidateEvaluation {
        candidate_name: name.to_string(),
        score,
        stat_score: score,
        tech_score: score,
        team_score: score,
        summary: format!("Summary for {name}"),
        rationale: vec!["Relevant delivery experience".to_string()],
        email: format!("{slug}@example.com"),
        email_body: format!("Dear {name}, draft invitation."),
        industry: None,
        cv_filename: format!("{slug}.txt"),
        evaluated_at: Utc::now(),
        status: CandidateStatus::default(),
        notes: String::new(),
    }
}

/// Fully wired pipeline over a temp directory, with handles onto the fakes.
pub struct Harness {
    pub intake: Arc<IntakeCoordinator>,
    pub decisions: Arc<DecisionEngine>,
    pub ledger: Arc<CandidateLedger>,
    pub content: ContentStore,
    pub snapshots: MemorySnapshotStore,
    pub dispatcher: RecordingDispatcher,
}

pub fn harness(dir: &TempDir) -> Harness {
    let snapshots = MemorySnapshotStore::default();
    let dispatcher = RecordingDispatcher::default();
    let content = ContentStore::new(dir.path().join("cvs"));
    let ledger = Arc::new(CandidateLedger::open(Box::new(snapshots.clone())));

    let intake = Arc::new(IntakeCoordinator::new(
        content.clone(),
        ledger.clone(),
        Box::new(TokenOracle),
        Box::new(DiskExtractor),
    ));
    let decisions = Arc::new(DecisionEngine::new(
        ledger.clone(),
        Box::new(StubGenerator { fail: false }),
        Box::new(dispatcher.clone()),
        sender(),
    ));

    Harness {
        intake,
        decisions,
        ledger,
        content,
        snapshots,
        dispatcher,
    }
}

pub fn pipeline_state(harness: &Harness) -> PipelineState {
    PipelineState {
        intake: harness.intake.clone(),
        decisions: harness.decisions.clone(),
        ledger: harness.ledger.clone(),
        content: harness.content.clone(),
    }
}
