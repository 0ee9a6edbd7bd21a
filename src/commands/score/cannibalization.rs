use std::collections::BTreeMap;

use crate::model::{Cannibalization, CandidateReason, RawRecord, ScoredRecord};
use crate::util::sha256_hex;

pub const OVERLAY_RULE: &str = "cannibalization";

/// Stable identifier for a keyword's group, independent of row order and of
/// the machine the run happens on.
pub fn group_id(keyword: &str) -> String {
    let digest = sha256_hex(keyword.as_bytes());
    format!("cannibal_{}", &digest[..12])
}

/// Finds keywords answered by two or more distinct URLs and describes each
/// record's membership. Only rows with a URL shape the groups, but every row
/// carrying a grouped keyword is a member.
pub fn detect<'a, I>(records: I) -> Vec<Cannibalization>
where
    I: Iterator<Item = &'a RawRecord> + Clone,
{
    let mut urls_by_keyword = BTreeMap::<&str, Vec<&str>>::new();
    for record in records.clone() {
        let (Some(keyword), Some(url)) = (trimmed(&record.keyword), trimmed(&record.url)) else {
            continue;
        };
        let urls = urls_by_keyword.entry(keyword).or_default();
        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    records
        .map(|record| {
            let Some(keyword) = trimmed(&record.keyword) else {
                return Cannibalization::default();
            };
            match urls_by_keyword.get(keyword) {
                Some(urls) if urls.len() >= 2 => Cannibalization {
                    risk: true,
                    group: Some(group_id(keyword)),
                    peers: urls.iter().map(|url| (*url).to_string()).collect(),
                },
                _ => Cannibalization::default(),
            }
        })
        .collect()
}

/// Attaches group membership and opens risky records for analysis. The
/// candidate type is never changed, and locked (hard-excluded) decisions
/// keep their gate closed.
pub fn apply_overlay(records: &mut [ScoredRecord]) -> usize {
    let detected = detect(records.iter().map(|record| &record.raw));

    let mut flagged = 0;
    for (record, cannibalization) in records.iter_mut().zip(detected) {
        if cannibalization.risk {
            flagged += 1;
            let decision = &mut record.decision;
            if !decision.locked {
                decision.analyze_candidate = true;
                if decision.candidate_reason == CandidateReason::DefaultMonitor {
                    decision.candidate_reason = CandidateReason::CannibalizationDetected;
                }
                decision.matched_rules.push(OVERLAY_RULE);
            }
        }
        record.cannibalization = cannibalization;
    }

    flagged
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
