//! Candidate CV intake, deduplication, and decisioning pipeline.
//!
//! The crate is organised around a content-addressable document store, a
//! durable candidate ledger, and the coordinators that move evaluations
//! through them. External collaborators (scoring oracle, message generator,
//! e-mail transport, text extraction) are trait seams so the pipeline can be
//! exercised without network access.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
