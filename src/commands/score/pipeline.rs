use tracing::debug;

use crate::model::{
    EngineStatus, Metrics, Quality, RawRecord, RunCounts, Scores, ScoredRecord, Segments,
};

use super::cannibalization;
use super::cascade::{RuleContext, decide};
use super::config::EngineConfig;
use super::metrics::derive_metrics;
use super::percentile::percentile_ranks;
use super::problem::classify_problem;
use super::quality::assess;
use super::segment::Segmenter;

/// Per-record results that need no knowledge of other rows.
struct Assessed {
    raw: RawRecord,
    quality: Quality,
    segments: Segments,
    metrics: Metrics,
}

/// Runs every stage over the whole table, in order: quality gate and
/// derived metrics, table-wide percentile scores, problem type and rule
/// cascade, then the cannibalization overlay.
pub fn score_records(
    records: Vec<RawRecord>,
    config: &EngineConfig,
    segmenter: &Segmenter,
) -> Vec<ScoredRecord> {
    let assessed = records
        .into_iter()
        .map(|raw| {
            let quality = assess(&raw);
            let segments = segmenter.segment(raw.keyword.as_deref(), raw.url.as_deref());
            let metrics = derive_metrics(&raw, config);
            Assessed {
                raw,
                quality,
                segments,
                metrics,
            }
        })
        .collect::<Vec<Assessed>>();
    debug!(
        rows = assessed.len(),
        data_ok = assessed.iter().filter(|row| row.quality.data_ok).count(),
        "quality gate and metrics complete"
    );

    let rescue_scores = percentile_ranks(
        &assessed
            .iter()
            .map(|row| Some(row.metrics.rescue_raw))
            .collect::<Vec<Option<f64>>>(),
    );
    let scale_scores = percentile_ranks(
        &assessed
            .iter()
            .map(|row| Some(row.metrics.scale_raw))
            .collect::<Vec<Option<f64>>>(),
    );

    let mut scored = assessed
        .into_iter()
        .zip(rescue_scores.into_iter().zip(scale_scores))
        .map(|(row, (rescue_score, scale_score))| {
            let scores = Scores {
                rescue_score,
                scale_score,
            };
            let problem_type = classify_problem(&row.raw, &row.quality, &row.metrics);
            let decision = decide(&RuleContext {
                quality: &row.quality,
                segments: &row.segments,
                metrics: &row.metrics,
                scores: &scores,
                problem_type,
                config,
            });
            ScoredRecord {
                raw: row.raw,
                quality: row.quality,
                segments: row.segments,
                metrics: row.metrics,
                scores,
                problem_type,
                engine_status: EngineStatus::from_problem(problem_type),
                decision,
                cannibalization: Default::default(),
            }
        })
        .collect::<Vec<ScoredRecord>>();

    let flagged = cannibalization::apply_overlay(&mut scored);
    debug!(rows = flagged, "cannibalization overlay complete");

    scored
}

pub fn summarize(records: &[ScoredRecord]) -> RunCounts {
    let mut counts = RunCounts {
        rows_total: records.len(),
        ..RunCounts::default()
    };
    let mut groups = Vec::<&str>::new();

    for record in records {
        if record.quality.data_ok {
            counts.rows_data_ok += 1;
        }
        if record.decision.analyze_candidate {
            counts.analyze_candidates += 1;
        }
        if record.cannibalization.risk {
            counts.cannibalization_rows += 1;
        }
        if let Some(group) = record.cannibalization.group.as_deref()
            && !groups.contains(&group)
        {
            groups.push(group);
        }

        *counts
            .by_candidate_type
            .entry(record.decision.candidate_type.as_str().to_string())
            .or_default() += 1;
        *counts
            .by_candidate_reason
            .entry(record.decision.candidate_reason.as_str().to_string())
            .or_default() += 1;
        *counts
            .by_problem_type
            .entry(record.problem_type.as_str().to_string())
            .or_default() += 1;
    }

    counts.cannibalization_groups = groups.len();
    counts
}
