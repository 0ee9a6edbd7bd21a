/// Parses a numeric cell written in either dot-decimal (`1234.56`) or
/// comma-decimal (`1.234,56`) form. A trailing or embedded `%` is ignored.
/// Anything that does not parse to a finite number yields `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let stripped = raw.replace('%', "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = if trimmed.contains(',') && trimmed.contains('.') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.replace(',', ".")
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Magnitude above which a parsed ratio is taken to be a percentage.
pub const PERCENT_MAGNITUDE_THRESHOLD: f64 = 5.0;

/// Parses a period-over-period change ratio.
///
/// Exports mix `0.12` (ratio) and `177.84` (percent) notations for the same
/// column. Values with magnitude above [`PERCENT_MAGNITUDE_THRESHOLD`] are
/// divided by 100; everything at or below it is accepted as a ratio. Genuine
/// ratios above 5x are therefore misread as percentages.
pub fn parse_ratio(raw: &str) -> Option<f64> {
    let value = parse_number(raw)?;
    if value.abs() > PERCENT_MAGNITUDE_THRESHOLD {
        Some(value / 100.0)
    } else {
        Some(value)
    }
}

/// Recovers the previous-period value from the current value and its
/// relative change (`last = prev * (1 + change)`).
pub fn infer_previous(last: Option<f64>, change: Option<f64>) -> Option<f64> {
    let (last, change) = (last?, change?);
    let base = 1.0 + change;
    if base == 0.0 {
        return None;
    }
    Some(last / base).filter(|value| value.is_finite())
}
