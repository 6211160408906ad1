use std::path::Path;

use serde::{Deserialize, Serialize};

/// Raw evaluation returned by the scoring oracle before ledger acceptance.
///
/// Mirrors the oracle's wire contract: the evaluation fields of a candidate
/// record plus the `dismissed` verdict for out-of-scope documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleEvaluation {
    pub candidate_name: String,
    pub score: u8,
    pub stat_score: u8,
    pub tech_score: u8,
    pub team_score: u8,
    pub summary: String,
    pub rationale: Vec<String>,
    pub email: String,
    pub email_body: String,
    #[serde(default)]
    pub dismissed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

/// External scorer turning (job description, CV text) into an evaluation.
pub trait ScoringOracle: Send + Sync {
    fn evaluate(
        &self,
        job_description: &str,
        candidate_text: &str,
    ) -> Result<OracleEvaluation, OracleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle returned malformed output: {0}")]
    Malformed(String),
}

/// Plain-text extraction from a stored document (e.g. a PDF on disk).
pub trait TextExtractor: Send + Sync {
    fn extract(&self, location: &Path) -> Result<String, ExtractionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("unable to read document: {0}")]
    Unreadable(String),
}

/// Generates a personalised shortlist message from a candidate's rationale.
pub trait MessageGenerator: Send + Sync {
    fn shortlist_message(
        &self,
        candidate_name: &str,
        rationale: &[String],
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("message generation failed: {0}")]
    Failed(String),
}

/// One transactional e-mail handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to_address: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
}

/// Outbound e-mail transport; returns the transport's message id.
pub trait EmailDispatcher: Send + Sync {
    fn send(&self, email: OutboundEmail) -> Result<String, DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("email transport unavailable: {0}")]
    Transport(String),
}
