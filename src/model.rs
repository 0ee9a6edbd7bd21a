use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One keyword x landing-page row as read from the input table, after
/// column reconciliation and numeric parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub keyword: Option<String>,
    pub url: Option<String>,
    pub clicks_last: Option<f64>,
    pub clicks_prev: Option<f64>,
    pub impressions_last: Option<f64>,
    pub impressions_prev: Option<f64>,
    pub avg_position: Option<f64>,
    pub ctr_last: Option<f64>,
    pub clicks_pct: Option<f64>,
    pub impressions_pct: Option<f64>,
    pub ctr_pct: Option<f64>,
    pub position_pct: Option<f64>,
    pub serp_features: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DataIssue {
    MissingKeyword,
    MissingUrl,
    MissingImpressions,
    MissingPosition,
    MissingPriorPeriod,
}

impl DataIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingKeyword => "missing_keyword",
            Self::MissingUrl => "missing_url",
            Self::MissingImpressions => "missing_impressions",
            Self::MissingPosition => "missing_position",
            Self::MissingPriorPeriod => "missing_prior_period",
        }
    }

    /// Issues that fail the quality gate. A missing prior period only routes
    /// the record to `insufficient_signals`.
    pub fn is_blocking(self) -> bool {
        !matches!(self, Self::MissingPriorPeriod)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quality {
    pub data_ok: bool,
    pub issues: Vec<DataIssue>,
}

impl Quality {
    pub fn has(&self, issue: DataIssue) -> bool {
        self.issues.contains(&issue)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PageType {
    System,
    Blog,
    Template,
    Feature,
    Other,
}

impl PageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Blog => "blog",
            Self::Template => "template",
            Self::Feature => "feature",
            Self::Other => "other",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum QueryType {
    Brand,
    NonBrand,
}

impl QueryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::NonBrand => "non-brand",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Segments {
    pub page_type: PageType,
    pub query_type: QueryType,
}

/// Per-record derived metrics. `None` means the metric is undefined for the
/// record, never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub demand_estimate: Option<f64>,
    pub utilization: Option<f64>,
    pub expected_clicks_base: Option<f64>,
    pub expected_clicks_adjusted: Option<f64>,
    pub expected_clicks: Option<f64>,
    pub traffic_gap: Option<f64>,
    pub clicks_drop: Option<f64>,
    pub clicks_gain: Option<f64>,
    pub rescue_raw: f64,
    pub scale_raw: f64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Scores {
    pub rescue_score: f64,
    pub scale_score: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProblemType {
    NoData,
    InsufficientSignals,
    CtrOrRankDrop,
    DemandDrop,
    Growing,
    Stable,
}

impl ProblemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::InsufficientSignals => "insufficient_signals",
            Self::CtrOrRankDrop => "ctr_or_rank_drop",
            Self::DemandDrop => "demand_drop",
            Self::Growing => "growing",
            Self::Stable => "stable",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EngineStatus {
    Ok,
    NoData,
    InsufficientSignals,
}

impl EngineStatus {
    pub fn from_problem(problem: ProblemType) -> Self {
        match problem {
            ProblemType::NoData => Self::NoData,
            ProblemType::InsufficientSignals => Self::InsufficientSignals,
            _ => Self::Ok,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoData => "no_data",
            Self::InsufficientSignals => "insufficient_signals",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CandidateType {
    Ignore,
    Monitor,
    Rescue,
    Scale,
    Expand,
}

impl CandidateType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Monitor => "monitor",
            Self::Rescue => "rescue",
            Self::Scale => "scale",
            Self::Expand => "expand",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CandidateReason {
    DefaultMonitor,
    HardExclude,
    HighDropHighPotentialGap,
    MomentumWithHeadroom,
    GrowingFarFromPotential,
    NoPrevButHighGapHighMsv,
    CannibalizationDetected,
}

impl CandidateReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DefaultMonitor => "default_monitor",
            Self::HardExclude => "brand/system_or_bad_data",
            Self::HighDropHighPotentialGap => "high_drop_high_potential_gap",
            Self::MomentumWithHeadroom => "momentum_with_headroom",
            Self::GrowingFarFromPotential => "growing_far_from_potential",
            Self::NoPrevButHighGapHighMsv => "no_prev_but_high_gap_high_msv",
            Self::CannibalizationDetected => "cannibalization_detected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub candidate_type: CandidateType,
    pub candidate_reason: CandidateReason,
    pub analyze_candidate: bool,
    /// Set once a final rule matched; later rules and overlays leave the
    /// decision alone.
    pub locked: bool,
    /// Names of every cascade rule that matched, in evaluation order.
    pub matched_rules: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cannibalization {
    pub risk: bool,
    pub group: Option<String>,
    pub peers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub raw: RawRecord,
    pub quality: Quality,
    pub segments: Segments,
    pub metrics: Metrics,
    pub scores: Scores,
    pub problem_type: ProblemType,
    pub engine_status: EngineStatus,
    pub decision: Decision,
    pub cannibalization: Cannibalization,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub rows_total: usize,
    pub rows_data_ok: usize,
    pub analyze_candidates: usize,
    pub cannibalization_rows: usize,
    pub cannibalization_groups: usize,
    pub by_candidate_type: BTreeMap<String, usize>,
    pub by_candidate_reason: BTreeMap<String, usize>,
    pub by_problem_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSummary {
    pub path: String,
    pub sha256: String,
    pub format: String,
    pub columns: Vec<String>,
    pub unmapped_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSummary {
    pub path: String,
    pub sha256: String,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub engine_version: String,
    pub started_at: String,
    pub completed_at: String,
    pub config: serde_json::Value,
    pub input: InputSummary,
    pub output: OutputSummary,
    pub counts: RunCounts,
    pub warnings: Vec<String>,
}
