use crate::model::{
    CandidateReason, CandidateType, Decision, Metrics, PageType, ProblemType, Quality, QueryType,
    Scores, Segments,
};

use super::config::EngineConfig;

/// Everything a cascade rule may look at for one record.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub quality: &'a Quality,
    pub segments: &'a Segments,
    pub metrics: &'a Metrics,
    pub scores: &'a Scores,
    pub problem_type: ProblemType,
    pub config: &'a EngineConfig,
}

pub struct Rule {
    pub name: &'static str,
    pub candidate_type: CandidateType,
    pub reason: CandidateReason,
    pub analyze: bool,
    /// A final rule locks the decision: nothing after it may overwrite it.
    pub is_final: bool,
    pub applies: fn(&RuleContext<'_>) -> bool,
}

/// Evaluated top to bottom; the last matching rule sets the label. Rules
/// after `hard_exclude` only ever see eligible records because a hard
/// exclusion locks the decision.
pub const RULES: [Rule; 6] = [
    Rule {
        name: "default",
        candidate_type: CandidateType::Monitor,
        reason: CandidateReason::DefaultMonitor,
        analyze: false,
        is_final: false,
        applies: always,
    },
    Rule {
        name: "hard_exclude",
        candidate_type: CandidateType::Ignore,
        reason: CandidateReason::HardExclude,
        analyze: false,
        is_final: true,
        applies: is_hard_excluded,
    },
    Rule {
        name: "rescue",
        candidate_type: CandidateType::Rescue,
        reason: CandidateReason::HighDropHighPotentialGap,
        analyze: true,
        is_final: false,
        applies: is_rescue,
    },
    Rule {
        name: "scale",
        candidate_type: CandidateType::Scale,
        reason: CandidateReason::MomentumWithHeadroom,
        analyze: true,
        is_final: false,
        applies: is_scale,
    },
    Rule {
        name: "expand",
        candidate_type: CandidateType::Expand,
        reason: CandidateReason::GrowingFarFromPotential,
        analyze: true,
        is_final: false,
        applies: is_expand,
    },
    Rule {
        name: "promising_no_history",
        candidate_type: CandidateType::Monitor,
        reason: CandidateReason::NoPrevButHighGapHighMsv,
        analyze: true,
        is_final: false,
        applies: is_promising_without_history,
    },
];

pub fn decide(ctx: &RuleContext<'_>) -> Decision {
    let mut decision = Decision {
        candidate_type: CandidateType::Monitor,
        candidate_reason: CandidateReason::DefaultMonitor,
        analyze_candidate: false,
        locked: false,
        matched_rules: Vec::new(),
    };

    for rule in &RULES {
        if decision.locked {
            break;
        }
        if !(rule.applies)(ctx) {
            continue;
        }
        decision.candidate_type = rule.candidate_type;
        decision.candidate_reason = rule.reason;
        decision.analyze_candidate = rule.analyze;
        decision.locked = rule.is_final;
        decision.matched_rules.push(rule.name);
    }

    decision
}

fn always(_: &RuleContext<'_>) -> bool {
    true
}

fn is_hard_excluded(ctx: &RuleContext<'_>) -> bool {
    !ctx.quality.data_ok
        || ctx.segments.page_type == PageType::System
        || ctx.segments.query_type == QueryType::Brand
}

fn is_rescue(ctx: &RuleContext<'_>) -> bool {
    ctx.scores.rescue_score >= ctx.config.action_percentile
        && demand_at_least(ctx, ctx.config.min_demand_for_action)
        && gap_at_least(ctx, ctx.config.min_gap_for_action)
}

fn is_scale(ctx: &RuleContext<'_>) -> bool {
    ctx.scores.scale_score >= ctx.config.action_percentile
        && demand_at_least(ctx, ctx.config.min_demand_for_action)
        && utilization_below(ctx, ctx.config.max_utilization_for_scale)
        && gap_at_least(ctx, ctx.config.min_gap_for_action)
}

fn is_expand(ctx: &RuleContext<'_>) -> bool {
    ctx.problem_type == ProblemType::Growing
        && demand_at_least(ctx, ctx.config.min_demand_for_expand)
        && utilization_below(ctx, ctx.config.max_utilization_for_expand)
}

fn is_promising_without_history(ctx: &RuleContext<'_>) -> bool {
    ctx.problem_type == ProblemType::InsufficientSignals
        && demand_at_least(ctx, ctx.config.min_demand_for_expand)
        && gap_at_least(ctx, ctx.config.min_gap_for_action)
}

fn demand_at_least(ctx: &RuleContext<'_>, threshold: f64) -> bool {
    ctx.metrics
        .demand_estimate
        .is_some_and(|demand| demand >= threshold)
}

fn gap_at_least(ctx: &RuleContext<'_>, threshold: f64) -> bool {
    ctx.metrics.traffic_gap.is_some_and(|gap| gap >= threshold)
}

fn utilization_below(ctx: &RuleContext<'_>, ceiling: f64) -> bool {
    ctx.metrics
        .utilization
        .is_some_and(|utilization| utilization < ceiling)
}
