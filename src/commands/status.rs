use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::EngineRunManifest;
use crate::util::sha256_file;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| args.output_dir.join("engine_run.json"));

    info!(output_dir = %args.output_dir.display(), "status requested");

    if !manifest_path.exists() {
        warn!(path = %manifest_path.display(), "run manifest missing");
        return Ok(());
    }

    let manifest = load_manifest(&manifest_path)?;
    let counts = &manifest.counts;

    info!(
        run_id = %manifest.run_id,
        engine_version = %manifest.engine_version,
        started_at = %manifest.started_at,
        completed_at = %manifest.completed_at,
        input = %manifest.input.path,
        input_format = %manifest.input.format,
        output = %manifest.output.path,
        "loaded run manifest"
    );
    info!(
        rows = counts.rows_total,
        data_ok = counts.rows_data_ok,
        analyze_candidates = counts.analyze_candidates,
        cannibalization_rows = counts.cannibalization_rows,
        cannibalization_groups = counts.cannibalization_groups,
        "run counts"
    );
    for (candidate_type, count) in &counts.by_candidate_type {
        info!(candidate_type = %candidate_type, rows = count, "candidate type");
    }
    for (reason, count) in &counts.by_candidate_reason {
        info!(reason = %reason, rows = count, "candidate reason");
    }
    for warning in &manifest.warnings {
        warn!(warning = %warning, "recorded run warning");
    }

    check_artifact("input", Path::new(&manifest.input.path), &manifest.input.sha256)?;
    check_artifact(
        "output",
        Path::new(&manifest.output.path),
        &manifest.output.sha256,
    )?;

    Ok(())
}

pub fn load_manifest(path: &Path) -> Result<EngineRunManifest> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Compares a file on disk with the hash recorded at scoring time.
fn check_artifact(label: &str, path: &Path, expected_sha256: &str) -> Result<bool> {
    if !path.exists() {
        warn!(artifact = label, path = %path.display(), "artifact missing");
        return Ok(false);
    }

    let actual = sha256_file(path)?;
    if actual == expected_sha256 {
        info!(artifact = label, path = %path.display(), "artifact matches manifest");
        Ok(true)
    } else {
        warn!(
            artifact = label,
            path = %path.display(),
            expected = %expected_sha256,
            actual = %actual,
            "artifact changed since the run"
        );
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{check_artifact, load_manifest, run};
    use crate::cli::StatusArgs;
    use crate::model::EngineRunManifest;
    use crate::model::{InputSummary, OutputSummary, RunCounts};
    use crate::util::{sha256_file, write_json_pretty};

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "seo-priority-status-{name}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("scratch dir should be creatable");
        dir
    }

    #[test]
    fn manifest_round_trips_and_detects_changed_output() {
        let dir = scratch_dir("manifest");
        let output_path = dir.join("engine_output.csv");
        fs::write(&output_path, "keyword\nform builder\n").expect("output should be writable");
        let output_sha = sha256_file(&output_path).expect("output should hash");

        let manifest = EngineRunManifest {
            manifest_version: 1,
            run_id: "score-20260101T000000Z".to_string(),
            engine_version: "0.1.0".to_string(),
            started_at: "2026-01-01T00:00:00Z".to_string(),
            completed_at: "2026-01-01T00:00:01Z".to_string(),
            config: serde_json::json!({ "action_percentile": 70.0 }),
            input: InputSummary {
                path: dir.join("missing.csv").display().to_string(),
                sha256: String::new(),
                format: "preprocessed".to_string(),
                columns: vec!["keyword".to_string()],
                unmapped_columns: Vec::new(),
            },
            output: OutputSummary {
                path: output_path.display().to_string(),
                sha256: output_sha.clone(),
                columns: 1,
            },
            counts: RunCounts::default(),
            warnings: Vec::new(),
        };
        let manifest_path = dir.join("engine_run.json");
        write_json_pretty(&manifest_path, &manifest).expect("manifest should be writable");

        let loaded = load_manifest(&manifest_path).expect("manifest should load");
        assert_eq!(loaded.run_id, manifest.run_id);
        assert_eq!(loaded.output.sha256, output_sha);

        assert!(check_artifact("output", &output_path, &output_sha).expect("hash check"));
        fs::write(&output_path, "keyword\nchanged\n").expect("output should be writable");
        assert!(!check_artifact("output", &output_path, &output_sha).expect("hash check"));
        assert!(
            !check_artifact("input", Path::new(&loaded.input.path), "").expect("missing input")
        );

        run(StatusArgs {
            output_dir: dir.clone(),
            manifest_path: None,
        })
        .expect("status should succeed with a valid manifest");

        fs::remove_dir_all(&dir).ok();
    }
}
