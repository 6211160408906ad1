use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{CandidateEvaluation, IngestionCounters};

/// Read-only distributions derived from the current candidate list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub industry_distribution: BTreeMap<String, usize>,
    pub score_distribution: ScoreDistribution,
    pub total_candidates: usize,
}

/// Fixed four-bucket score histogram; boundaries include the upper end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreDistribution {
    #[serde(rename = "0-40")]
    pub to_40: usize,
    #[serde(rename = "41-60")]
    pub to_60: usize,
    #[serde(rename = "61-80")]
    pub to_80: usize,
    #[serde(rename = "81-100")]
    pub to_100: usize,
}

impl ScoreDistribution {
    fn record(&mut self, score: u8) {
        match score {
            0..=40 => self.to_40 += 1,
            41..=60 => self.to_60 += 1,
            61..=80 => self.to_80 += 1,
            _ => self.to_100 += 1,
        }
    }
}

/// Computes distributions over the candidate list. Candidates without an
/// industry tag land in the `"Unknown"` bucket.
pub fn analytics_report(candidates: &[CandidateEvaluation]) -> AnalyticsReport {
    let mut report = AnalyticsReport {
        total_candidates: candidates.len(),
        ..AnalyticsReport::default()
    };

    for candidate in candidates {
        let industry = candidate
            .industry
            .as_deref()
            .filter(|tag| !tag.trim().is_empty())
            .unwrap_or("Unknown")
            .to_string();
        *report.industry_distribution.entry(industry).or_insert(0) += 1;
        report.score_distribution.record(candidate.score);
    }

    report
}

/// Headline counters for the operations dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub total_candidates: usize,
    pub total_documents_stored: usize,
    pub manual_ingestion: u64,
    pub email_ingestion: u64,
}

pub fn pipeline_stats(
    candidates: &[CandidateEvaluation],
    counters: IngestionCounters,
    stored_documents: usize,
) -> PipelineStats {
    PipelineStats {
        total_candidates: candidates.len(),
        total_documents_stored: stored_documents,
        manual_ingestion: counters.manual,
        email_ingestion: counters.email,
    }
}
