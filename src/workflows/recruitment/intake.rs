use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::collaborators::{OracleEvaluation, ScoringOracle, TextExtractor};
use super::domain::{
    CandidateEvaluation, CandidateStatus, DocumentDigest, LedgerSnapshot, SourceChannel,
};
use super::ledger::{CandidateLedger, LedgerError, PersistError};
use super::store::{ContentStore, DocumentMetadata, StoreError};

/// Extracted text shorter than this is treated as an unusable scan.
const MIN_USABLE_TEXT_LEN: usize = 50;

/// One raw document handed to an analysis run.
#[derive(Debug, Clone)]
pub struct IncomingDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub channel: SourceChannel,
    pub sender: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("job description must not be empty")]
    MissingJobDescription,
    #[error("no documents supplied")]
    NoDocuments,
    #[error("no documents in the warehouse")]
    EmptyWarehouse,
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl From<LedgerError> for IntakeError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Storage(err) => Self::Storage(err),
            LedgerError::Persist(err) => Self::Persist(err),
        }
    }
}

/// Orchestrates one analysis run: dedup against the content store, score
/// novel documents through the oracle, and replace the ledger's candidate
/// list with the accepted evaluations.
pub struct IntakeCoordinator {
    content: ContentStore,
    ledger: Arc<CandidateLedger>,
    oracle: Box<dyn ScoringOracle>,
    extractor: Box<dyn TextExtractor>,
}

impl IntakeCoordinator {
    pub fn new(
        content: ContentStore,
        ledger: Arc<CandidateLedger>,
        oracle: Box<dyn ScoringOracle>,
        extractor: Box<dyn TextExtractor>,
    ) -> Self {
        Self {
            content,
            ledger,
            oracle,
            extractor,
        }
    }

    /// Ingests freshly supplied documents (manual upload or inbox sync).
    ///
    /// Registration, counter updates, and the candidate-list replacement all
    /// happen in one ledger critical section: a storage failure aborts the
    /// request with nothing persisted, while per-document extraction and
    /// oracle failures are logged and skipped.
    pub fn ingest(
        &self,
        documents: Vec<IncomingDocument>,
        job_description: &str,
    ) -> Result<Vec<CandidateEvaluation>, IntakeError> {
        let job_description = non_empty(job_description)?;
        if documents.is_empty() {
            return Err(IntakeError::NoDocuments);
        }

        let accepted = self.ledger.mutate(|snapshot| {
            let locations = self.resolve_documents(snapshot, &documents)?;
            let accepted = self.evaluate_documents(&locations, job_description);
            snapshot.candidates = accepted.clone();
            Ok(accepted)
        })?;

        info!(
            accepted = accepted.len(),
            submitted = documents.len(),
            "analysis run complete"
        );
        Ok(accepted)
    }

    /// Re-scores every document already in the warehouse against a new job
    /// description. No registration or counter changes occur.
    pub fn rescan_warehouse(
        &self,
        job_description: &str,
    ) -> Result<Vec<CandidateEvaluation>, IntakeError> {
        let job_description = non_empty(job_description)?;

        let stored = self.content.list_all()?;
        if stored.is_empty() {
            return Err(IntakeError::EmptyWarehouse);
        }
        let locations: Vec<String> = stored
            .iter()
            .map(|path| path.display().to_string())
            .collect();

        let accepted = self.ledger.mutate(|snapshot| {
            let accepted = self.evaluate_documents(&locations, job_description);
            snapshot.candidates = accepted.clone();
            Ok(accepted)
        })?;

        info!(
            accepted = accepted.len(),
            scanned = locations.len(),
            "warehouse re-scan complete"
        );
        Ok(accepted)
    }

    /// Deduplicates the batch against the content store, registering novel
    /// documents and bumping the matching ingestion counter. Each unique
    /// digest resolves to exactly one location, so a document repeated within
    /// the batch is evaluated at most once.
    fn resolve_documents(
        &self,
        snapshot: &mut LedgerSnapshot,
        documents: &[IncomingDocument],
    ) -> Result<Vec<String>, StoreError> {
        let mut seen = BTreeSet::new();
        let mut locations = Vec::new();

        for document in documents {
            let digest = DocumentDigest::of_bytes(&document.bytes);
            if !seen.insert(digest.clone()) {
                debug!(file = %document.filename, %digest, "duplicate within batch, skipping");
                continue;
            }

            match self.content.is_known(snapshot, &digest) {
                Some(existing) => {
                    debug!(
                        file = %document.filename,
                        %digest,
                        "duplicate document, reusing stored copy"
                    );
                    locations.push(existing.to_string());
                }
                None => {
                    let location = self.content.register(
                        snapshot,
                        &document.bytes,
                        DocumentMetadata {
                            original_filename: document.filename.clone(),
                            channel: document.channel,
                            sender: document.sender.clone(),
                        },
                    )?;
                    snapshot.counters.record(document.channel);
                    info!(
                        file = %document.filename,
                        channel = document.channel.label(),
                        "novel document registered"
                    );
                    locations.push(location);
                }
            }
        }

        Ok(locations)
    }

    /// Extracts and scores each resolved document, skipping per-document
    /// failures so a single bad file never aborts the batch.
    fn evaluate_documents(
        &self,
        locations: &[String],
        job_description: &str,
    ) -> Vec<CandidateEvaluation> {
        let mut accepted = Vec::new();

        for location in locations {
            let path = Path::new(location);
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| location.clone());

            let text = match self.extractor.extract(path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(file = %filename, error = %err, "skipping unreadable document");
                    continue;
                }
            };
            if text.trim().len() < MIN_USABLE_TEXT_LEN {
                debug!(file = %filename, "skipping document with too little extractable text");
                continue;
            }

            let evaluation = match self.oracle.evaluate(job_description, &text) {
                Ok(evaluation) => evaluation,
                Err(err) => {
                    warn!(file = %filename, error = %err, "oracle failed, skipping document");
                    continue;
                }
            };
            if let Err(reason) = validate_scores(&evaluation) {
                warn!(file = %filename, reason, "oracle scores out of range, skipping document");
                continue;
            }
            if evaluation.dismissed {
                info!(
                    candidate = %evaluation.candidate_name,
                    file = %filename,
                    "oracle dismissed document as out of scope"
                );
                continue;
            }

            info!(
                candidate = %evaluation.candidate_name,
                score = evaluation.score,
                file = %filename,
                "candidate evaluated"
            );
            accepted.push(into_record(evaluation, filename));
        }

        // Stable sort: ties keep the oracle's original relative order.
        accepted.sort_by(|a, b| b.score.cmp(&a.score));
        accepted
    }
}

fn non_empty(job_description: &str) -> Result<&str, IntakeError> {
    let trimmed = job_description.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::MissingJobDescription);
    }
    Ok(trimmed)
}

/// The overall and sub-scores must all sit within 0-100; anything else is
/// malformed oracle output.
fn validate_scores(evaluation: &OracleEvaluation) -> Result<(), &'static str> {
    if evaluation.score > 100 {
        return Err("overall score above 100");
    }
    if evaluation.stat_score > 100 || evaluation.tech_score > 100 || evaluation.team_score > 100 {
        return Err("sub-score above 100");
    }
    Ok(())
}

fn into_record(evaluation: OracleEvaluation, cv_filename: String) -> CandidateEvaluation {
    CandidateEvaluation {
        candidate_name: evaluation.candidate_name,
        score: evaluation.score,
        stat_score: evaluation.stat_score,
        tech_score: evaluation.tech_score,
        team_score: evaluation.team_score,
        summary: evaluation.summary,
        rationale: evaluation.rationale,
        email: evaluation.email,
        email_body: evaluation.email_body,
        industry: evaluation.industry,
        cv_filename,
        evaluated_at: Utc::now(),
        status: CandidateStatus::default(),
        notes: String::new(),
    }
}
