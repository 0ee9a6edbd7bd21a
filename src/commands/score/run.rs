use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::ScoreArgs;
use crate::model::{EngineRunManifest, InputSummary, OutputSummary, RunCounts};
use crate::util::{
    now_utc_string, replace_file, sha256_file, sha256_hex, utc_compact_string, write_json_pretty,
};

use super::table::{DERIVED_COLUMNS, InputFormat};
use super::{EngineConfig, Segmenter, read_table, render_table, score_records, summarize};

const MANIFEST_VERSION: u32 = 1;

pub fn run(args: ScoreArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("score-{}", utc_compact_string(started_ts));

    let config = EngineConfig::resolve(&args)?;
    let delimiter = delimiter_byte(args.delimiter)?;
    let segmenter = Segmenter::new(&config.brand_terms)?;

    info!(
        input = %args.input.display(),
        run_id = %run_id,
        action_percentile = config.action_percentile,
        period_months = config.period_months,
        gap_model = config.gap_model.as_str(),
        "starting scoring run"
    );

    let table = read_table(&args.input, delimiter)?;
    let mut warnings = Vec::new();

    info!(
        rows = table.rows.len(),
        columns = table.headers.len(),
        format = table.format.as_str(),
        "loaded input table"
    );
    if table.format == InputFormat::AnalyticsExport {
        let message =
            "no clicks_prev/impressions_prev columns; previous period inferred from percent changes";
        warn!("{message}");
        warnings.push(message.to_string());
    }
    let recomputed = table
        .headers
        .iter()
        .filter(|header| DERIVED_COLUMNS.contains(&header.as_str()))
        .count();
    if recomputed > 0 {
        let message = format!("{recomputed} derived input columns replaced by recomputed values");
        warn!("{message}");
        warnings.push(message);
    }

    let scored = score_records(table.records(), &config, &segmenter);
    let counts = summarize(&scored);
    log_counts(&counts);

    let rendered = render_table(&table, &scored, delimiter)?;

    if args.dry_run {
        info!(
            output_bytes = rendered.len(),
            output_sha256 = %sha256_hex(&rendered),
            "scoring dry-run complete"
        );
        return Ok(());
    }

    let output_path = args
        .output_path
        .clone()
        .unwrap_or_else(|| args.output_dir.join("engine_output.csv"));
    replace_file(&output_path, &rendered)?;
    info!(path = %output_path.display(), "wrote scored table");

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| args.output_dir.join("engine_run.json"));
    let manifest = EngineRunManifest {
        manifest_version: MANIFEST_VERSION,
        run_id,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        started_at,
        completed_at: now_utc_string(),
        config: serde_json::to_value(&config).context("failed to serialize engine config")?,
        input: InputSummary {
            path: args.input.display().to_string(),
            sha256: sha256_file(&args.input)?,
            format: table.format.as_str().to_string(),
            columns: table.headers.clone(),
            unmapped_columns: table.unmapped_headers(),
        },
        output: OutputSummary {
            path: output_path.display().to_string(),
            sha256: sha256_hex(&rendered),
            columns: count_columns(&rendered, delimiter),
        },
        counts,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote run manifest");

    Ok(())
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got {delimiter:?}");
    }
    Ok(delimiter as u8)
}

fn count_columns(rendered: &[u8], delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(rendered)
        .headers()
        .map(|headers| headers.len())
        .unwrap_or(0)
}

fn log_counts(counts: &RunCounts) {
    info!(
        rows = counts.rows_total,
        data_ok = counts.rows_data_ok,
        analyze_candidates = counts.analyze_candidates,
        cannibalization_rows = counts.cannibalization_rows,
        cannibalization_groups = counts.cannibalization_groups,
        "scoring complete"
    );
    for (candidate_type, count) in &counts.by_candidate_type {
        info!(candidate_type = %candidate_type, rows = count, "candidate type");
    }
    for (problem_type, count) in &counts.by_problem_type {
        info!(problem_type = %problem_type, rows = count, "problem type");
    }
}
