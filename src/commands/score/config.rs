use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::cli::{GapModel, ScoreArgs};

/// Thresholds and knobs of a scoring run. Every field has a default so a
/// config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub action_percentile: f64,
    pub period_months: f64,
    pub min_demand_for_action: f64,
    pub min_gap_for_action: f64,
    pub min_demand_for_expand: f64,
    pub max_utilization_for_scale: f64,
    pub max_utilization_for_expand: f64,
    pub gap_model: GapModel,
    pub brand_terms: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            action_percentile: 70.0,
            period_months: 3.0,
            min_demand_for_action: 300.0,
            min_gap_for_action: 30.0,
            min_demand_for_expand: 500.0,
            max_utilization_for_scale: 0.85,
            max_utilization_for_expand: 0.50,
            gap_model: GapModel::Adjusted,
            brand_terms: vec![
                "jotform".to_string(),
                "login".to_string(),
                "sign in".to_string(),
            ],
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse engine config {}", path.display()))
    }

    /// Config file (if any), then command-line overrides, then validation.
    pub fn resolve(args: &ScoreArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(value) = args.action_percentile {
            config.action_percentile = value;
        }
        if let Some(value) = args.period_months {
            config.period_months = value;
        }
        if let Some(value) = args.gap_model {
            config.gap_model = value;
        }
        if !args.brand_terms.is_empty() {
            config.brand_terms = args.brand_terms.clone();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.action_percentile) {
            bail!(
                "action_percentile must be within 0..=100, got {}",
                self.action_percentile
            );
        }
        if !self.period_months.is_finite() || self.period_months <= 0.0 {
            bail!(
                "period_months must be a positive number, got {}",
                self.period_months
            );
        }

        let thresholds = [
            ("min_demand_for_action", self.min_demand_for_action),
            ("min_gap_for_action", self.min_gap_for_action),
            ("min_demand_for_expand", self.min_demand_for_expand),
            ("max_utilization_for_scale", self.max_utilization_for_scale),
            ("max_utilization_for_expand", self.max_utilization_for_expand),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() {
                bail!("{name} must be a finite number, got {value}");
            }
        }

        Ok(())
    }

    /// Months the impression totals are spread over. Periods shorter than a
    /// month are treated as one month.
    pub fn period_divisor(&self) -> f64 {
        self.period_months.max(1.0)
    }
}
