use crate::model::{DataIssue, Metrics, ProblemType, Quality, RawRecord};

/// First matching state wins. A click drop with an open gap is reported as a
/// CTR/rank problem even when demand fell too.
pub fn classify_problem(record: &RawRecord, quality: &Quality, metrics: &Metrics) -> ProblemType {
    if !quality.data_ok {
        return ProblemType::NoData;
    }
    if quality.has(DataIssue::MissingPriorPeriod) {
        return ProblemType::InsufficientSignals;
    }

    let dropped = metrics.clicks_drop.is_some_and(|drop| drop > 0.0);
    let under_expectation = metrics.traffic_gap.is_some_and(|gap| gap > 0.0);
    if dropped && under_expectation {
        return ProblemType::CtrOrRankDrop;
    }

    if let (Some(last), Some(prev)) = (record.impressions_last, record.impressions_prev)
        && last < prev
    {
        return ProblemType::DemandDrop;
    }

    if metrics.clicks_gain.is_some_and(|gain| gain > 0.0) {
        return ProblemType::Growing;
    }

    ProblemType::Stable
}
