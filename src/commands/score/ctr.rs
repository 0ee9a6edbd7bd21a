/// Upper bound on the summed feature penalty.
pub const FEATURE_PENALTY_CAP: f64 = 0.70;

/// Share of attention each result-page feature takes from organic results.
const FEATURE_PENALTIES: [(&str, f64); 5] = [
    ("featured_snippet", 0.40),
    ("paa", 0.15),
    ("video", 0.25),
    ("images", 0.10),
    ("shopping", 0.20),
];

/// Baseline click-through rate for an average result position.
pub fn expected_ctr(position: Option<f64>) -> Option<f64> {
    let position = position?;
    let ctr = if position <= 1.0 {
        0.28
    } else if position <= 2.0 {
        0.15
    } else if position <= 3.0 {
        0.11
    } else if position <= 4.0 {
        0.08
    } else if position <= 5.0 {
        0.06
    } else if position <= 10.0 {
        0.03
    } else {
        0.01
    };
    Some(ctr)
}

/// Summed, capped penalty for a comma-separated feature list. Unknown
/// tokens and repeats add nothing.
pub fn feature_penalty(features: &str) -> f64 {
    let tokens = features
        .split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect::<Vec<String>>();

    let total = FEATURE_PENALTIES
        .iter()
        .filter(|(name, _)| tokens.iter().any(|token| token == name))
        .map(|(_, penalty)| penalty)
        .sum::<f64>();

    total.min(FEATURE_PENALTY_CAP)
}

/// Click-through rate after discounting result-page features.
pub fn expected_ctr_adjusted(position: Option<f64>, features: Option<&str>) -> Option<f64> {
    let base = expected_ctr(position)?;
    let Some(features) = features.filter(|value| !value.trim().is_empty()) else {
        return Some(base);
    };
    Some(base * (1.0 - feature_penalty(features)))
}

pub fn expected_clicks(impressions: Option<f64>, ctr: Option<f64>) -> Option<f64> {
    Some(impressions? * ctr?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-12
    }

    #[test]
    fn expected_ctr_follows_position_steps() {
        assert_eq!(expected_ctr(Some(1.0)), Some(0.28));
        assert_eq!(expected_ctr(Some(0.5)), Some(0.28));
        assert_eq!(expected_ctr(Some(1.01)), Some(0.15));
        assert_eq!(expected_ctr(Some(2.0)), Some(0.15));
        assert_eq!(expected_ctr(Some(3.0)), Some(0.11));
        assert_eq!(expected_ctr(Some(4.0)), Some(0.08));
        assert_eq!(expected_ctr(Some(5.0)), Some(0.06));
        assert_eq!(expected_ctr(Some(7.0)), Some(0.03));
        assert_eq!(expected_ctr(Some(10.0)), Some(0.03));
        assert_eq!(expected_ctr(Some(10.5)), Some(0.01));
        assert_eq!(expected_ctr(None), None);
    }

    #[test]
    fn adjusted_ctr_stacks_penalties_additively() {
        let ctr = expected_ctr_adjusted(Some(1.0), Some("featured_snippet,paa"))
            .expect("position is known");
        assert!(approx(ctr, 0.28 * (1.0 - 0.55)));
    }

    #[test]
    fn adjusted_ctr_caps_total_penalty() {
        let ctr = expected_ctr_adjusted(Some(2.0), Some("featured_snippet, video, shopping, paa"))
            .expect("position is known");
        assert!(approx(ctr, 0.15 * (1.0 - FEATURE_PENALTY_CAP)));
    }

    #[test]
    fn adjusted_ctr_falls_back_to_base_without_known_features() {
        assert_eq!(expected_ctr_adjusted(Some(3.0), None), Some(0.11));
        assert_eq!(expected_ctr_adjusted(Some(3.0), Some("  ")), Some(0.11));
        assert_eq!(expected_ctr_adjusted(Some(3.0), Some("top_stories")), Some(0.11));
        assert_eq!(expected_ctr_adjusted(None, Some("paa")), None);
    }

    #[test]
    fn feature_penalty_ignores_case_and_repeats() {
        assert!(approx(feature_penalty("Images,images, IMAGES"), 0.10));
    }

    #[test]
    fn expected_clicks_requires_both_inputs() {
        assert_eq!(expected_clicks(Some(1000.0), Some(0.15)), Some(150.0));
        assert_eq!(expected_clicks(None, Some(0.15)), None);
        assert_eq!(expected_clicks(Some(1000.0), None), None);
    }
}
