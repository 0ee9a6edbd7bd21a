use crate::model::{DataIssue, Quality, RawRecord};

pub fn assess(record: &RawRecord) -> Quality {
    let mut issues = Vec::new();

    if is_blank(record.keyword.as_deref()) {
        issues.push(DataIssue::MissingKeyword);
    }
    if is_blank(record.url.as_deref()) {
        issues.push(DataIssue::MissingUrl);
    }
    if !record.impressions_last.is_some_and(|value| value > 0.0) {
        issues.push(DataIssue::MissingImpressions);
    }
    if record.avg_position.is_none() {
        issues.push(DataIssue::MissingPosition);
    }
    if !has_prior_period(record) {
        issues.push(DataIssue::MissingPriorPeriod);
    }

    let data_ok = !issues.iter().any(|issue| issue.is_blocking());
    Quality { data_ok, issues }
}

/// Previous-period clicks and impressions are both needed to compare periods.
fn has_prior_period(record: &RawRecord) -> bool {
    record.clicks_prev.is_some() && record.impressions_prev.is_some()
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}
