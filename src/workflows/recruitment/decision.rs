use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SenderIdentity;

use super::collaborators::{EmailDispatcher, MessageGenerator, OutboundEmail};
use super::domain::CandidateEvaluation;
use super::ledger::CandidateLedger;

/// Preview mode synthesizes messages for at most this many candidates.
pub const PREVIEW_SAMPLE_SIZE: usize = 3;

/// One candidate successfully routed to the shortlist or regret pile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionRecord {
    pub name: String,
    pub message: String,
}

/// One candidate the batch could not act on; never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Shortlist,
    Regret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewMessage {
    pub kind: MessageKind,
    pub message: String,
}

/// Batch outcome: per-item results plus preview messages keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub shortlisted: Vec<DecisionRecord>,
    pub regretted: Vec<DecisionRecord>,
    pub errors: Vec<DecisionFailure>,
    pub preview_messages: BTreeMap<String, PreviewMessage>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("no candidates in the current analysis run")]
    NoCandidates,
    #[error("threshold {0} is outside 0-100")]
    ThresholdOutOfRange(u8),
}

/// Partitions the current candidate list against a score threshold and, in
/// commit mode, dispatches the matching message to every reachable candidate.
///
/// Partitioning is a pure function of the stored score (`score >= threshold`
/// shortlists); no re-scoring happens here and no candidate status changes
/// automatically. Status transitions stay with the ledger's update operation.
pub struct DecisionEngine {
    ledger: Arc<CandidateLedger>,
    generator: Box<dyn MessageGenerator>,
    dispatcher: Box<dyn EmailDispatcher>,
    sender: SenderIdentity,
}

impl DecisionEngine {
    pub fn new(
        ledger: Arc<CandidateLedger>,
        generator: Box<dyn MessageGenerator>,
        dispatcher: Box<dyn EmailDispatcher>,
        sender: SenderIdentity,
    ) -> Self {
        Self {
            ledger,
            generator,
            dispatcher,
            sender,
        }
    }

    pub fn decide(&self, threshold: u8, preview_only: bool) -> Result<DecisionOutcome, DecisionError> {
        if threshold > 100 {
            return Err(DecisionError::ThresholdOutOfRange(threshold));
        }

        let candidates = self.ledger.candidates();
        if candidates.is_empty() {
            return Err(DecisionError::NoCandidates);
        }

        let outcome = if preview_only {
            self.preview(&candidates, threshold)
        } else {
            self.commit(&candidates, threshold)
        };
        Ok(outcome)
    }

    /// Synthesizes sample messages for the first few candidates in ledger
    /// order (not re-sorted). No dispatch, no state mutation.
    fn preview(&self, candidates: &[CandidateEvaluation], threshold: u8) -> DecisionOutcome {
        let mut outcome = DecisionOutcome::default();

        for candidate in candidates.iter().take(PREVIEW_SAMPLE_SIZE) {
            let (kind, message) = if candidate.score >= threshold {
                (MessageKind::Shortlist, self.shortlist_message(candidate))
            } else {
                (MessageKind::Regret, self.regret_message(candidate))
            };
            outcome
                .preview_messages
                .insert(candidate.candidate_name.clone(), PreviewMessage { kind, message });
        }

        outcome
    }

    /// Dispatches every candidate in ledger order; per-candidate failures are
    /// recorded and the batch always runs to completion.
    fn commit(&self, candidates: &[CandidateEvaluation], threshold: u8) -> DecisionOutcome {
        let mut outcome = DecisionOutcome::default();

        for candidate in candidates {
            let name = candidate.candidate_name.clone();
            let address = candidate.email.trim();
            if address.is_empty() {
                outcome.errors.push(DecisionFailure {
                    name,
                    reason: "no contact email".to_string(),
                });
                continue;
            }

            let (kind, subject, message) = if candidate.score >= threshold {
                (
                    MessageKind::Shortlist,
                    format!("Interview Invitation - {}", self.sender.name),
                    self.shortlist_message(candidate),
                )
            } else {
                (
                    MessageKind::Regret,
                    format!("Application Update - {}", self.sender.name),
                    self.regret_message(candidate),
                )
            };

            let email = OutboundEmail {
                to_address: address.to_string(),
                to_name: name.clone(),
                subject,
                html_body: render_html(&message),
            };

            match self.dispatcher.send(email) {
                Ok(message_id) => {
                    debug!(candidate = %name, %message_id, "decision email dispatched");
                    let record = DecisionRecord { name, message };
                    match kind {
                        MessageKind::Shortlist => outcome.shortlisted.push(record),
                        MessageKind::Regret => outcome.regretted.push(record),
                    }
                }
                Err(err) => {
                    warn!(candidate = %name, error = %err, "decision email failed");
                    outcome.errors.push(DecisionFailure {
                        name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            shortlisted = outcome.shortlisted.len(),
            regretted = outcome.regretted.len(),
            errors = outcome.errors.len(),
            threshold,
            "bulk decision complete"
        );
        outcome
    }

    /// Personalised shortlist message, falling back to the oracle's draft and
    /// finally a canned template when generation fails.
    fn shortlist_message(&self, candidate: &CandidateEvaluation) -> String {
        match self
            .generator
            .shortlist_message(&candidate.candidate_name, &candidate.rationale)
        {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    candidate = %candidate.candidate_name,
                    error = %err,
                    "message generation failed, using stored draft"
                );
                if candidate.email_body.trim().is_empty() {
                    format!(
                        "Dear {},\n\nCongratulations - you have been shortlisted. \
                         We will be in touch within 5 working days to arrange an interview.\n\n\
                         Best regards,\n{}",
                        candidate.candidate_name, self.sender.name
                    )
                } else {
                    candidate.email_body.clone()
                }
            }
        }
    }

    /// Regret messages are always the canned template.
    fn regret_message(&self, candidate: &CandidateEvaluation) -> String {
        format!(
            "Dear {},\n\nThank you for your application. After careful consideration, \
             we have decided to progress with other candidates whose experience more \
             closely aligns with our requirements.\n\nWe wish you success in your \
             career search.\n\nBest regards,\n{}",
            candidate.candidate_name, self.sender.name
        )
    }
}

fn render_html(message: &str) -> String {
    format!(
        "<html><body><p>{}</p></body></html>",
        escape_html(message).replace('\n', "<br>")
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
