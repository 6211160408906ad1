//! Candidate intake, deduplication, and bulk-decisioning pipeline.
//!
//! Raw documents flow through the content store (dedup), the scoring oracle,
//! and into the candidate ledger; the decision engine later partitions the
//! ledger against a threshold and dispatches outcomes. Analytics read the
//! ledger without mutating it.

pub mod analytics;
pub mod collaborators;
pub mod decision;
pub mod domain;
pub mod intake;
pub mod ledger;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use analytics::{analytics_report, pipeline_stats, AnalyticsReport, PipelineStats};
pub use collaborators::{
    DispatchError, EmailDispatcher, ExtractionError, GenerationError, MessageGenerator,
    OracleError, OracleEvaluation, OutboundEmail, ScoringOracle, TextExtractor,
};
pub use decision::{
    DecisionEngine, DecisionError, DecisionFailure, DecisionOutcome, DecisionRecord, MessageKind,
    PreviewMessage,
};
pub use domain::{
    CandidateEvaluation, CandidateStatus, DocumentDigest, IngestionCounters, LedgerSnapshot,
    SourceChannel, StoredDocument,
};
pub use intake::{IncomingDocument, IntakeCoordinator, IntakeError};
pub use ledger::{CandidateLedger, JsonSnapshotStore, LedgerError, PersistError, SnapshotStore};
pub use router::{recruitment_router, PipelineState};
pub use store::{ContentStore, DocumentMetadata, StoreError};
