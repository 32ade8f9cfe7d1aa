//! Data models for the ranking pipeline.
//!
//! This module contains the records supplied by the upstream service, the
//! filter selection, and every value derived from them. Derived values are
//! rebuilt from scratch on each pipeline run and never mutated afterwards.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One exam occurrence: `topic` was asked `count` times in exam `exam_type`
/// of year `exam_year`.
///
/// The upstream service ships shortened keys; the long names are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOccurrence {
    #[serde(rename = "m", alias = "module")]
    pub module: String,
    #[serde(rename = "sd", alias = "subgroup")]
    pub subgroup: String,
    #[serde(rename = "c", alias = "topic")]
    pub topic: String,
    #[serde(rename = "ey", alias = "examYear")]
    pub exam_year: i32,
    #[serde(rename = "et", alias = "examType")]
    pub exam_type: String,
    #[serde(rename = "cnt", alias = "count")]
    pub count: u64,
}

/// Upstream JSON payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamPayload {
    /// Raw records. Absent or `null` means no records.
    #[serde(default)]
    pub data: Option<Vec<RawOccurrence>>,
    #[serde(default)]
    pub available_exam_types: Vec<String>,
    #[serde(default)]
    pub available_exam_years: Vec<i32>,
}

impl UpstreamPayload {
    /// Decode a payload from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The raw records, empty when the payload carried none.
    pub fn records(&self) -> &[RawOccurrence] {
        self.data.as_deref().unwrap_or(&[])
    }
}

/// Filter axis that is either open or restricted to a set of values.
///
/// An empty user selection means "everything", never "nothing".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection<T: Ord> {
    #[default]
    Unrestricted,
    RestrictedTo(BTreeSet<T>),
}

impl<T: Ord> Selection<T> {
    /// Build a selection from user-chosen values; no values means unrestricted.
    pub fn from_values<I: IntoIterator<Item = T>>(values: I) -> Self {
        let set: BTreeSet<T> = values.into_iter().collect();
        if set.is_empty() {
            Selection::Unrestricted
        } else {
            Selection::RestrictedTo(set)
        }
    }

    /// Returns true if `value` passes this axis.
    pub fn allows(&self, value: &T) -> bool {
        match self {
            Selection::Unrestricted => true,
            Selection::RestrictedTo(set) => set.contains(value),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Selection::Unrestricted)
    }
}

impl<T: Ord + fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Unrestricted => write!(f, "all"),
            Selection::RestrictedTo(set) => {
                let values: Vec<String> = set.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", values.join(","))
            }
        }
    }
}

/// Exam type and exam year filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    pub exam_types: Selection<String>,
    pub exam_years: Selection<i32>,
}

impl FilterSelection {
    pub fn new<T, Y>(exam_types: T, exam_years: Y) -> Self
    where
        T: IntoIterator<Item = String>,
        Y: IntoIterator<Item = i32>,
    {
        Self {
            exam_types: Selection::from_values(exam_types),
            exam_years: Selection::from_values(exam_years),
        }
    }

    /// A filter that lets every record through.
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns true if the record passes both axes.
    pub fn matches(&self, record: &RawOccurrence) -> bool {
        self.exam_types.allows(&record.exam_type) && self.exam_years.allows(&record.exam_year)
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "types={} years={}", self.exam_types, self.exam_years)
    }
}

/// Statistics for one unique (module, subgroup, topic) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedTopic {
    pub module: String,
    pub subgroup: String,
    pub topic: String,
    /// Sum of `count` over every matching occurrence of the triple.
    pub question_count: u64,
    /// Exam years in which the triple was asked.
    pub distinct_years: BTreeSet<i32>,
}

impl AggregatedTopic {
    /// Number of distinct exam years the topic appeared in.
    pub fn year_coverage(&self) -> usize {
        self.distinct_years.len()
    }
}

/// Per-module totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub module: String,
    pub subgroups: BTreeSet<String>,
    pub total_questions: u64,
}

/// One sub-group of a module with its ranked topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgroupBlock {
    pub subgroup: String,
    pub entries: Vec<AggregatedTopic>,
}

impl SubgroupBlock {
    /// Sum of question counts across every entry in the block.
    pub fn total_questions(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |total, e| total.saturating_add(e.question_count))
    }
}
