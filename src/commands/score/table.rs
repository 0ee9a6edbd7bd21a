use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use tracing::{debug, warn};

use crate::model::{RawRecord, ScoredRecord};

use super::parse::{infer_previous, parse_number, parse_ratio};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Column {
    Keyword,
    Url,
    ClicksLast,
    ClicksPrev,
    ClicksPct,
    ImpressionsLast,
    ImpressionsPrev,
    ImpressionsPct,
    CtrLast,
    CtrPct,
    AvgPosition,
    PositionPct,
    SerpFeatures,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::Keyword,
        Column::Url,
        Column::ClicksLast,
        Column::ClicksPrev,
        Column::ClicksPct,
        Column::ImpressionsLast,
        Column::ImpressionsPrev,
        Column::ImpressionsPct,
        Column::CtrLast,
        Column::CtrPct,
        Column::AvgPosition,
        Column::PositionPct,
        Column::SerpFeatures,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Url => "url",
            Self::ClicksLast => "clicks_last",
            Self::ClicksPrev => "clicks_prev",
            Self::ClicksPct => "clicks_pct",
            Self::ImpressionsLast => "impressions_last",
            Self::ImpressionsPrev => "impressions_prev",
            Self::ImpressionsPct => "impressions_pct",
            Self::CtrLast => "ctr_last",
            Self::CtrPct => "ctr_pct",
            Self::AvgPosition => "avg_position",
            Self::PositionPct => "position_pct",
            Self::SerpFeatures => "serp_features",
        }
    }

    /// Accepted headers after trimming and lower-casing: analytics export
    /// names first, then pre-processed names.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Keyword => &["query", "keyword"],
            Self::Url => &["landing page", "url", "page"],
            Self::ClicksLast => &["url clicks", "clicks", "clicks_last"],
            Self::ClicksPrev => &["clicks_prev"],
            Self::ClicksPct => &["clicks percent change", "clicks_pct"],
            Self::ImpressionsLast => &["impressions", "impr_last", "impressions_last"],
            Self::ImpressionsPrev => &["impr_prev", "impressions_prev"],
            Self::ImpressionsPct => &[
                "impression percent change",
                "impr_pct",
                "impressions_pct",
            ],
            Self::CtrLast => &["url ctr", "ctr", "ctr_last"],
            Self::CtrPct => &["ctr percent change", "ctr_pct"],
            Self::AvgPosition => &["avg. position", "position", "pos", "avg_position"],
            Self::PositionPct => &[
                "avg. position percent change",
                "pos_pct",
                "position_pct",
            ],
            Self::SerpFeatures => &["serp_features"],
        }
    }

    /// Period-over-period change columns. Their cells are written back as
    /// read, since the parsed ratio would not survive a second parse.
    fn is_change_ratio(self) -> bool {
        matches!(
            self,
            Self::ClicksPct | Self::ImpressionsPct | Self::CtrPct | Self::PositionPct
        )
    }

    pub fn from_header(header: &str) -> Option<Column> {
        Self::ALL
            .into_iter()
            .find(|column| column.aliases().contains(&header))
    }
}

/// Which previous-period source the table offers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InputFormat {
    /// Explicit `clicks_prev` and `impressions_prev` columns.
    Preprocessed,
    /// Only current values plus percent-change columns.
    AnalyticsExport,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preprocessed => "preprocessed",
            Self::AnalyticsExport => "analytics_export",
        }
    }
}

/// Derived columns appended to every output row, in order.
pub const DERIVED_COLUMNS: [&str; 25] = [
    "page_type",
    "query_type",
    "data_ok",
    "data_issues",
    "engine_status",
    "demand_estimate",
    "utilization",
    "expected_clicks_base",
    "expected_clicks_adjusted",
    "expected_clicks",
    "traffic_gap",
    "clicks_drop",
    "clicks_gain",
    "rescue_raw",
    "scale_raw",
    "rescue_score",
    "scale_score",
    "problem_type",
    "candidate_type",
    "candidate_reason",
    "candidate_rules",
    "analyze_candidate",
    "cannibalization_risk",
    "cannibalization_group",
    "cannibalization_peers",
];

#[derive(Debug, Clone)]
pub struct InputTable {
    /// Normalized headers; mapped columns carry their canonical name.
    pub headers: Vec<String>,
    pub mapping: Vec<Option<Column>>,
    pub rows: Vec<Vec<String>>,
    pub format: InputFormat,
}

impl InputTable {
    pub fn from_rows(raw_headers: &[String], rows: Vec<Vec<String>>) -> Result<Self> {
        let normalized = raw_headers
            .iter()
            .map(|header| normalize_header(header))
            .collect::<Vec<String>>();
        if normalized.iter().all(|header| header.is_empty()) {
            bail!("input table has no columns");
        }

        // A header spelled exactly like a canonical name claims that column
        // before any alias does.
        let mut mapping = Vec::<Option<Column>>::with_capacity(normalized.len());
        for header in &normalized {
            let exact = Column::ALL
                .into_iter()
                .find(|column| column.name() == header.as_str())
                .filter(|column| !mapping.contains(&Some(*column)));
            mapping.push(exact);
        }
        for (index, header) in normalized.iter().enumerate() {
            if mapping[index].is_some() {
                continue;
            }
            match Column::from_header(header) {
                Some(column) if !mapping.contains(&Some(column)) => {
                    mapping[index] = Some(column);
                }
                Some(column) => {
                    debug!(
                        header = %header,
                        column = column.name(),
                        "column already mapped, keeping as passthrough"
                    );
                }
                None => {}
            }
        }

        let mut headers = Vec::<String>::with_capacity(normalized.len());
        for (header, mapped) in normalized.into_iter().zip(&mapping) {
            let name = match mapped {
                Some(column) => column.name().to_string(),
                None => unique_header(&headers, header),
            };
            headers.push(name);
        }

        let width = headers.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, mut row)| {
                if row.len() > width {
                    warn!(
                        row = index + 1,
                        cells = row.len(),
                        columns = width,
                        "row has more cells than the header, dropping the extra cells"
                    );
                }
                row.resize(width, String::new());
                row
            })
            .collect();

        let has_prev = mapping.contains(&Some(Column::ClicksPrev))
            && mapping.contains(&Some(Column::ImpressionsPrev));
        let format = if has_prev {
            InputFormat::Preprocessed
        } else {
            InputFormat::AnalyticsExport
        };

        Ok(Self {
            headers,
            mapping,
            rows,
            format,
        })
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.mapping.iter().position(|mapped| *mapped == Some(column))
    }

    pub fn unmapped_headers(&self) -> Vec<String> {
        self.headers
            .iter()
            .zip(&self.mapping)
            .filter(|(_, mapped)| mapped.is_none())
            .map(|(header, _)| header.clone())
            .collect()
    }

    /// Parses every row into a record. Missing columns read as null.
    pub fn records(&self) -> Vec<RawRecord> {
        let positions = Column::ALL.map(|column| self.position(column));
        let cell = |row: &[String], column: Column| -> Option<String> {
            let index = Column::ALL.iter().position(|c| *c == column)?;
            positions[index].map(|position| row[position].clone())
        };

        self.rows
            .iter()
            .map(|row| {
                let row = row.as_slice();
                let text = |column| cell(row, column).and_then(non_blank);
                let number = |column| cell(row, column).and_then(|value| parse_number(&value));
                let ratio = |column| cell(row, column).and_then(|value| parse_ratio(&value));

                let mut record = RawRecord {
                    keyword: text(Column::Keyword),
                    url: text(Column::Url),
                    clicks_last: number(Column::ClicksLast),
                    clicks_prev: number(Column::ClicksPrev),
                    impressions_last: number(Column::ImpressionsLast),
                    impressions_prev: number(Column::ImpressionsPrev),
                    avg_position: number(Column::AvgPosition),
                    ctr_last: number(Column::CtrLast),
                    clicks_pct: ratio(Column::ClicksPct),
                    impressions_pct: ratio(Column::ImpressionsPct),
                    ctr_pct: ratio(Column::CtrPct),
                    position_pct: ratio(Column::PositionPct),
                    serp_features: text(Column::SerpFeatures),
                };

                if self.format == InputFormat::AnalyticsExport {
                    record.clicks_prev = infer_previous(record.clicks_last, record.clicks_pct);
                    record.impressions_prev =
                        infer_previous(record.impressions_last, record.impressions_pct);
                }

                record
            })
            .collect()
    }
}

pub fn read_table(path: &Path, delimiter: u8) -> Result<InputTable> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header row of {}", path.display()))?
        .iter()
        .map(ToOwned::to_owned)
        .collect::<Vec<String>>();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("failed to read row {} of {}", index + 1, path.display()))?;
        rows.push(record.iter().map(ToOwned::to_owned).collect::<Vec<String>>());
    }

    InputTable::from_rows(&headers, rows)
        .with_context(|| format!("unreadable input table {}", path.display()))
}

/// Renders the scored table: input columns (canonical ones rewritten with
/// parsed values), synthesized canonical columns, then derived columns.
/// Input columns named like a derived column are dropped and recomputed.
pub fn render_table(
    table: &InputTable,
    records: &[ScoredRecord],
    delimiter: u8,
) -> Result<Vec<u8>> {
    let kept = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !DERIVED_COLUMNS.contains(&header.as_str()))
        .map(|(index, _)| index)
        .collect::<Vec<usize>>();
    let synthesized = Column::ALL
        .into_iter()
        .filter(|column| table.position(*column).is_none())
        .collect::<Vec<Column>>();

    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let header_row = kept
        .iter()
        .map(|index| table.headers[*index].as_str())
        .chain(synthesized.iter().map(|column| column.name()))
        .chain(DERIVED_COLUMNS)
        .collect::<Vec<&str>>();
    writer
        .write_record(&header_row)
        .context("failed to write output header")?;

    for (row, record) in table.rows.iter().zip(records) {
        let mut cells = Vec::with_capacity(header_row.len());
        for index in &kept {
            match table.mapping[*index] {
                Some(column) if column.is_change_ratio() => {
                    cells.push(row[*index].trim().to_string());
                }
                Some(column) => cells.push(canonical_cell(record, column)),
                None => cells.push(row[*index].clone()),
            }
        }
        for column in &synthesized {
            cells.push(canonical_cell(record, *column));
        }
        cells.extend(derived_cells(record));

        writer
            .write_record(&cells)
            .context("failed to write output row")?;
    }

    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to finish output table: {}", err.error()))
}

fn canonical_cell(record: &ScoredRecord, column: Column) -> String {
    let raw = &record.raw;
    match column {
        Column::Keyword => raw.keyword.clone().unwrap_or_default(),
        Column::Url => raw.url.clone().unwrap_or_default(),
        Column::ClicksLast => format_number(raw.clicks_last),
        Column::ClicksPrev => format_number(raw.clicks_prev),
        Column::ClicksPct => format_number(raw.clicks_pct),
        Column::ImpressionsLast => format_number(raw.impressions_last),
        Column::ImpressionsPrev => format_number(raw.impressions_prev),
        Column::ImpressionsPct => format_number(raw.impressions_pct),
        Column::CtrLast => format_number(raw.ctr_last),
        Column::CtrPct => format_number(raw.ctr_pct),
        Column::AvgPosition => format_number(raw.avg_position),
        Column::PositionPct => format_number(raw.position_pct),
        Column::SerpFeatures => raw.serp_features.clone().unwrap_or_default(),
    }
}

fn derived_cells(record: &ScoredRecord) -> Vec<String> {
    let metrics = &record.metrics;
    let decision = &record.decision;
    let cannibalization = &record.cannibalization;

    vec![
        record.segments.page_type.as_str().to_string(),
        record.segments.query_type.as_str().to_string(),
        record.quality.data_ok.to_string(),
        record
            .quality
            .issues
            .iter()
            .map(|issue| issue.as_str())
            .collect::<Vec<&str>>()
            .join("|"),
        record.engine_status.as_str().to_string(),
        format_number(metrics.demand_estimate),
        format_number(metrics.utilization),
        format_number(metrics.expected_clicks_base),
        format_number(metrics.expected_clicks_adjusted),
        format_number(metrics.expected_clicks),
        format_number(metrics.traffic_gap),
        format_number(metrics.clicks_drop),
        format_number(metrics.clicks_gain),
        format_number(Some(metrics.rescue_raw)),
        format_number(Some(metrics.scale_raw)),
        format_number(Some(record.scores.rescue_score)),
        format_number(Some(record.scores.scale_score)),
        record.problem_type.as_str().to_string(),
        decision.candidate_type.as_str().to_string(),
        decision.candidate_reason.as_str().to_string(),
        decision.matched_rules.join(">"),
        decision.analyze_candidate.to_string(),
        cannibalization.risk.to_string(),
        cannibalization.group.clone().unwrap_or_default(),
        cannibalization.peers.join(" | "),
    ]
}

/// Shortest round-trip form; nulls are empty and negative zero prints as 0.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(value) if value == 0.0 => "0".to_string(),
        Some(value) => value.to_string(),
    }
}

/// Suffixes a passthrough header until it no longer collides with an
/// earlier column.
fn unique_header(taken: &[String], header: String) -> String {
    if !taken.contains(&header) && Column::ALL.iter().all(|column| column.name() != header) {
        return header;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{header}_{suffix}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
