use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "seo-priority",
    version,
    about = "Opportunity scoring and classification for search-traffic exports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Score(ScoreArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long, env = "INPUT_FILE")]
    pub input: PathBuf,

    #[arg(long, env = "OUTPUT_DIR", default_value = "data/output")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub output_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// JSON file with engine thresholds; flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "ACTION_PERCENTILE")]
    pub action_percentile: Option<f64>,

    #[arg(long, env = "PERIOD_MONTHS")]
    pub period_months: Option<f64>,

    #[arg(long, value_enum)]
    pub gap_model: Option<GapModel>,

    #[arg(long = "brand-term")]
    pub brand_terms: Vec<String>,

    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

/// Which click expectation feeds `expected_clicks` and `traffic_gap`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapModel {
    Base,
    #[default]
    Adjusted,
}

impl GapModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Adjusted => "adjusted",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, env = "OUTPUT_DIR", default_value = "data/output")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}
