use crate::cli::GapModel;
use crate::model::{Metrics, RawRecord};

use super::config::EngineConfig;
use super::ctr::{expected_clicks, expected_ctr, expected_ctr_adjusted};

pub fn derive_metrics(record: &RawRecord, config: &EngineConfig) -> Metrics {
    let demand_estimate = demand_estimate(
        record.impressions_last,
        record.impressions_prev,
        config.period_divisor(),
    );
    let utilization = utilization(record.clicks_last, demand_estimate);

    let expected_clicks_base =
        expected_clicks(record.impressions_last, expected_ctr(record.avg_position));
    let expected_clicks_adjusted = expected_clicks(
        record.impressions_last,
        expected_ctr_adjusted(record.avg_position, record.serp_features.as_deref()),
    );
    let expected_clicks = match config.gap_model {
        GapModel::Base => expected_clicks_base,
        GapModel::Adjusted => expected_clicks_adjusted,
    };
    let traffic_gap = difference(expected_clicks, record.clicks_last);

    let clicks_drop = difference(record.clicks_prev, record.clicks_last).map(|v| v.max(0.0));
    let clicks_gain = difference(record.clicks_last, record.clicks_prev).map(|v| v.max(0.0));

    Metrics {
        demand_estimate,
        utilization,
        expected_clicks_base,
        expected_clicks_adjusted,
        expected_clicks,
        traffic_gap,
        clicks_drop,
        clicks_gain,
        rescue_raw: momentum_weighted_gap(traffic_gap, clicks_drop),
        scale_raw: momentum_weighted_gap(traffic_gap, clicks_gain),
    }
}

/// Monthly search-volume proxy from the two periods' impressions. A missing
/// side counts as zero; with both sides missing there is no estimate.
pub fn demand_estimate(last: Option<f64>, prev: Option<f64>, months: f64) -> Option<f64> {
    if last.is_none() && prev.is_none() {
        return None;
    }
    let total = last.unwrap_or(0.0) + prev.unwrap_or(0.0);
    Some(total / 2.0 / months)
}

pub fn utilization(clicks_last: Option<f64>, demand: Option<f64>) -> Option<f64> {
    let demand = demand.filter(|value| *value != 0.0)?;
    Some(clicks_last? / demand)
}

/// `gap * sqrt(momentum)`: the gap drives priority, the square root keeps
/// very large swings from dominating it. Missing inputs count as zero.
pub fn momentum_weighted_gap(gap: Option<f64>, momentum: Option<f64>) -> f64 {
    gap.unwrap_or(0.0) * momentum.unwrap_or(0.0).sqrt()
}

fn difference(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    Some(left? - right?)
}
