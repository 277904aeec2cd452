//! Label distribution over a set of enriched results.

use super::EnrichedResult;
use lessonlens_core::Label;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const UNSURE: &str = "unsure";

/// Percentage of results carrying each label, per label-set metadata kind.
///
/// The free-text `assesses` and `teaches` answers are not summarized.
///
/// A result with several labels counts once for each of them, so a kind's
/// percentages can add up to more than 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub educational_levels: BTreeMap<String, f64>,
    pub resource_types: BTreeMap<String, f64>,
    pub subjects: BTreeMap<String, f64>,
    pub educational_roles: BTreeMap<String, f64>,
    pub educational_uses: BTreeMap<String, f64>,
}

fn distribution<'a>(labels: impl Iterator<Item = &'a Label>, total: usize) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in labels {
        match label {
            Label::Unsure => *counts.entry(UNSURE.to_string()).or_default() += 1,
            label => {
                for value in label.clone().into_values() {
                    *counts.entry(value).or_default() += 1;
                }
            }
        }
    }

    counts
        .into_iter()
        .map(|(label, count)| (label, count as f64 / total as f64 * 100.0))
        .collect()
}

/// Summarize the labels of `results`.
pub fn summarize(results: &[EnrichedResult]) -> ResultSummary {
    if results.is_empty() {
        return ResultSummary::default();
    }

    let total = results.len();
    ResultSummary {
        educational_levels: distribution(results.iter().map(|r| &r.educational_level), total),
        resource_types: distribution(results.iter().map(|r| &r.resource_type), total),
        subjects: distribution(results.iter().map(|r| &r.subject), total),
        educational_roles: distribution(results.iter().map(|r| &r.educational_role), total),
        educational_uses: distribution(results.iter().map(|r| &r.educational_use), total),
    }
}
