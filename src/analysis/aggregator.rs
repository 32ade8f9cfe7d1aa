//! Occurrence aggregation.
//!
//! This module filters raw exam occurrences and collapses them into one
//! statistic per (module, subgroup, topic) triple.

use crate::models::{AggregatedTopic, FilterSelection, RawOccurrence, Selection};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Filter `records` and sum their counts per (module, subgroup, topic).
///
/// Output follows the order in which each triple was first encountered,
/// which the ranking stage relies on to break ties.
pub fn aggregate(records: &[RawOccurrence], filter: &FilterSelection) -> Vec<AggregatedTopic> {
    let mut grouped: IndexMap<(&str, &str, &str), AggregatedTopic> = IndexMap::new();
    let mut kept = 0usize;

    for record in records.iter().filter(|r| filter.matches(r)) {
        kept += 1;
        let key = (
            record.module.as_str(),
            record.subgroup.as_str(),
            record.topic.as_str(),
        );
        let topic = grouped.entry(key).or_insert_with(|| AggregatedTopic {
            module: record.module.clone(),
            subgroup: record.subgroup.clone(),
            topic: record.topic.clone(),
            question_count: 0,
            distinct_years: BTreeSet::new(),
        });
        topic.question_count = topic.question_count.saturating_add(record.count);
        topic.distinct_years.insert(record.exam_year);
    }

    debug!(
        "Aggregated {} of {} records into {} topics ({})",
        kept,
        records.len(),
        grouped.len(),
        filter
    );

    grouped.into_values().collect()
}

/// Sum of `count` over the records that pass `filter`.
pub fn filtered_total(records: &[RawOccurrence], filter: &FilterSelection) -> u64 {
    records
        .iter()
        .filter(|r| filter.matches(r))
        .fold(0u64, |total, r| total.saturating_add(r.count))
}

/// The exam years a report covers.
///
/// A restricted year filter wins. Otherwise the years advertised by the
/// upstream payload are used, falling back to the years seen in `topics`.
pub fn exam_years_in_scope(
    filter: &FilterSelection,
    available_years: &[i32],
    topics: &[AggregatedTopic],
) -> BTreeSet<i32> {
    match &filter.exam_years {
        Selection::RestrictedTo(years) => years.clone(),
        Selection::Unrestricted if !available_years.is_empty() => {
            available_years.iter().copied().collect()
        }
        Selection::Unrestricted => topics
            .iter()
            .flat_map(|t| t.distinct_years.iter().copied())
            .collect(),
    }
}

/// Format a year set as `first-last`, a single year, or an empty string.
pub fn format_year_range(years: &BTreeSet<i32>) -> String {
    match (years.first(), years.last()) {
        (Some(first), Some(last)) if first == last => first.to_string(),
        (Some(first), Some(last)) => format!("{}-{}", first, last),
        _ => String::new(),
    }
}
