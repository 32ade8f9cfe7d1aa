//! Module summaries and ranked sub-group blocks.

use crate::error::{Error, Result};
use crate::models::{AggregatedTopic, ModuleSummary, SubgroupBlock};
use indexmap::IndexMap;
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeSet;
use tracing::debug;

/// Total order over sub-group names: names in the priority list come first
/// in list order, the rest follow lexicographically.
#[derive(Debug, Clone, Default)]
pub struct SubgroupOrder {
    priority: Vec<String>,
}

impl SubgroupOrder {
    pub fn new<I, S>(priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            priority: priority.into_iter().map(Into::into).collect(),
        }
    }

    fn rank(&self, name: &str) -> usize {
        self.priority
            .iter()
            .position(|p| p == name)
            .unwrap_or(usize::MAX)
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.rank(a)
            .cmp(&self.rank(b))
            .then_with(|| a.cmp(b))
    }
}

/// Summarise every module, largest total first.
pub fn project_modules(topics: &[AggregatedTopic]) -> Vec<ModuleSummary> {
    let mut grouped: IndexMap<&str, ModuleSummary> = IndexMap::new();

    for topic in topics {
        let summary = grouped
            .entry(topic.module.as_str())
            .or_insert_with(|| ModuleSummary {
                module: topic.module.clone(),
                subgroups: BTreeSet::new(),
                total_questions: 0,
            });
        summary.subgroups.insert(topic.subgroup.clone());
        summary.total_questions = summary.total_questions.saturating_add(topic.question_count);
    }

    let mut modules: Vec<ModuleSummary> = grouped.into_values().collect();
    // Vec::sort_by_key is stable, ties keep encounter order.
    modules.sort_by_key(|m| Reverse(m.total_questions));
    modules
}

/// Group one module's topics by sub-group and rank each group.
///
/// Entries are ordered by question count, highest first, with ties kept in
/// aggregation order. Groups follow `order`.
pub fn project_blocks(
    topics: &[AggregatedTopic],
    module: &str,
    order: &SubgroupOrder,
) -> Vec<SubgroupBlock> {
    let mut grouped: IndexMap<&str, Vec<AggregatedTopic>> = IndexMap::new();

    for topic in topics.iter().filter(|t| t.module == module) {
        grouped
            .entry(topic.subgroup.as_str())
            .or_default()
            .push(topic.clone());
    }

    let mut blocks: Vec<SubgroupBlock> = grouped
        .into_iter()
        .map(|(subgroup, mut entries)| {
            entries.sort_by_key(|e| Reverse(e.question_count));
            SubgroupBlock {
                subgroup: subgroup.to_string(),
                entries,
            }
        })
        .collect();

    blocks.sort_by(|a, b| order.compare(&a.subgroup, &b.subgroup));

    debug!("Module {}: {} sub-group blocks", module, blocks.len());
    blocks
}

/// Keep only the selected sub-groups, in ranked order.
///
/// Names that match no block are ignored. An empty selection, or one that
/// matches none of the module's blocks, is refused rather than rendered.
/// A module without blocks passes through empty.
pub fn select_blocks(
    blocks: Vec<SubgroupBlock>,
    selected: &[String],
) -> Result<Vec<SubgroupBlock>> {
    if selected.is_empty() {
        return Err(Error::InvalidArguments(
            "at least one sub-group must be selected for export".to_string(),
        ));
    }

    let available = blocks.len();
    let kept: Vec<SubgroupBlock> = blocks
        .into_iter()
        .filter(|b| selected.iter().any(|s| s == &b.subgroup))
        .collect();

    if kept.is_empty() && available > 0 {
        return Err(Error::InvalidArguments(format!(
            "none of the selected sub-groups ({}) exist in this module",
            selected.join(", ")
        )));
    }
    Ok(kept)
}

/// Get the summary for `module`, if it has any topics.
pub fn find_module<'a>(modules: &'a [ModuleSummary], module: &str) -> Option<&'a ModuleSummary> {
    modules.iter().find(|m| m.module == module)
}
