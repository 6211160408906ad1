//! Default collaborator implementations for the binary.
//!
//! These stand in for the external scoring oracle, PDF extraction, message
//! generation, and e-mail transport so the service can run end to end in
//! development and demos. Production deployments substitute real adapters at
//! the same traits.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use talentscope::workflows::recruitment::{
    DispatchError, EmailDispatcher, ExtractionError, GenerationError, MessageGenerator,
    OracleError, OracleEvaluation, OutboundEmail, ScoringOracle, TextExtractor,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Deterministic keyword-overlap scorer.
///
/// Scores a CV by the share of job-description keywords it mentions. The
/// output is repeatable, which keeps demos and smoke tests stable.
#[derive(Default)]
pub(crate) struct KeywordOverlapOracle;

impl ScoringOracle for KeywordOverlapOracle {
    fn evaluate(
        &self,
        job_description: &str,
        candidate_text: &str,
    ) -> Result<OracleEvaluation, OracleError> {
        let jd_terms = keywords(job_description);
        if jd_terms.is_empty() {
            return Err(OracleError::Malformed(
                "job description has no usable keywords".to_string(),
            ));
        }
        let cv_terms = keywords(candidate_text);

        let shared: Vec<&String> = jd_terms.intersection(&cv_terms).collect();
        let overlap = shared.len() as f64 / jd_terms.len() as f64;
        let score = (35.0 + overlap * 60.0).round() as u8;

        let candidate_name = candidate_text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("Unnamed Candidate")
            .chars()
            .take(60)
            .collect::<String>();
        let email = candidate_text
            .split_whitespace()
            .find(|token| token.contains('@'))
            .unwrap_or("")
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && !matches!(c, '@' | '.' | '-'))
            .to_string();

        let rationale: Vec<String> = shared
            .iter()
            .take(4)
            .map(|term| format!("Mentions '{term}' from the role requirements"))
            .collect();

        Ok(OracleEvaluation {
            summary: format!(
                "Matches {} of {} role keywords. Scored deterministically by keyword overlap.",
                shared.len(),
                jd_terms.len()
            ),
            email_body: format!(
                "Dear {candidate_name},\n\nYour experience matches several of our \
                 requirements and we would like to discuss the role with you."
            ),
            dismissed: shared.is_empty(),
            industry: None,
            candidate_name,
            score,
            stat_score: score.saturating_sub(5).max(1),
            tech_score: score,
            team_score: score.saturating_sub(10).max(1),
            rationale,
            email,
        })
    }
}

fn keywords(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| word.len() >= 4)
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Reads stored documents as UTF-8 text. Real deployments plug a PDF
/// extractor into the same trait.
#[derive(Default)]
pub(crate) struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, location: &Path) -> Result<String, ExtractionError> {
        let bytes = fs::read(location)
            .map_err(|err| ExtractionError::Unreadable(format!("{}: {err}", location.display())))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Fills a fixed shortlist template from the candidate's rationale points.
#[derive(Default)]
pub(crate) struct TemplateMessageGenerator;

impl MessageGenerator for TemplateMessageGenerator {
    fn shortlist_message(
        &self,
        candidate_name: &str,
        rationale: &[String],
    ) -> Result<String, GenerationError> {
        let strengths = if rationale.is_empty() {
            "your overall fit for the role".to_string()
        } else {
            rationale
                .iter()
                .take(2)
                .map(|point| point.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join("; ")
        };

        Ok(format!(
            "Dear {candidate_name},\n\nCongratulations - you have been shortlisted. \
             We were particularly impressed by {strengths}.\n\nWe would like to invite \
             you to interview and will contact you within 5 working days with next \
             steps.\n\nBest regards"
        ))
    }
}

/// Logs outbound e-mails instead of sending them; returns a synthetic
/// message id so the decision engine's accounting still works.
#[derive(Default)]
pub(crate) struct LogOnlyDispatcher {
    sequence: AtomicU64,
}

impl EmailDispatcher for LogOnlyDispatcher {
    fn send(&self, email: OutboundEmail) -> Result<String, DispatchError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        info!(
            to = %email.to_address,
            subject = %email.subject,
            "outbound email (log-only transport)"
        );
        Ok(format!("local-{id:06}"))
    }
}
