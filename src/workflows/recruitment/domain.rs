use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 fingerprint of raw document bytes.
///
/// The digest is the deduplication identity key: equal bytes always produce
/// the same digest regardless of which channel the document arrived through.
/// Hashing happens over raw bytes, never decoded text, so encoding quirks
/// cannot split identical CVs into distinct identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentDigest(String);

impl DocumentDigest {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix used to keep on-disk filenames unique without the full hash.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for DocumentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel a document arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceChannel {
    Manual,
    Email,
}

impl SourceChannel {
    pub const fn label(self) -> &'static str {
        match self {
            SourceChannel::Manual => "manual",
            SourceChannel::Email => "email",
        }
    }
}

/// Immutable record of one stored document, created once per unique digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub digest: DocumentDigest,
    pub location: String,
    pub original_filename: String,
    pub ingested_at: DateTime<Utc>,
    pub channel: SourceChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

/// Candidate lifecycle status.
///
/// The set is open: `Applied`, `Shortlisted`, and `Regretted` are the
/// canonical values, but reviewers may record arbitrary stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateStatus(String);

impl CandidateStatus {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn applied() -> Self {
        Self("Applied".to_string())
    }

    pub fn shortlisted() -> Self {
        Self("Shortlisted".to_string())
    }

    pub fn regretted() -> Self {
        Self("Regretted".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CandidateStatus {
    fn default() -> Self {
        Self::applied()
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scored candidate within the current analysis run.
///
/// Scores are supplied by the oracle and never recomputed here; `status` and
/// `notes` hydrate to their defaults when absent from an older durable copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub candidate_name: String,
    pub score: u8,
    pub stat_score: u8,
    pub tech_score: u8,
    pub team_score: u8,
    pub summary: String,
    pub rationale: Vec<String>,
    pub email: String,
    pub email_body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    pub cv_filename: String,
    pub evaluated_at: DateTime<Utc>,
    #[serde(default)]
    pub status: CandidateStatus,
    #[serde(default)]
    pub notes: String,
}

/// Lifetime ingestion counters, bumped once per novel document acceptance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionCounters {
    #[serde(default)]
    pub manual: u64,
    #[serde(default)]
    pub email: u64,
}

impl IngestionCounters {
    pub fn record(&mut self, channel: SourceChannel) {
        match channel {
            SourceChannel::Manual => self.manual += 1,
            SourceChannel::Email => self.email += 1,
        }
    }
}

/// The durable aggregate: current-run candidates, digest records, counters.
///
/// Every field self-heals to its zero value so callers never branch on
/// absence when loading an older or partial durable copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub candidates: Vec<CandidateEvaluation>,
    #[serde(default)]
    pub locations: BTreeMap<DocumentDigest, String>,
    #[serde(default)]
    pub documents: BTreeMap<DocumentDigest, StoredDocument>,
    #[serde(default)]
    pub counters: IngestionCounters,
}
