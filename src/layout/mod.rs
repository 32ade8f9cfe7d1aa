//! Fixed-canvas layout planning.
//!
//! Blocks are stacked vertically in a single pass. Every block gets the same
//! row cap, chosen so the stack fits the space between header and footer.
//! When even the minimum cap does not fit, the minimum is kept and the
//! overflow is accepted instead of dropping rows.

use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use crate::models::{AggregatedTopic, SubgroupBlock};
use serde::Serialize;
use tracing::{debug, warn};

/// Largest y offset a plan may assign.
const MAX_OFFSET: u32 = i32::MAX as u32;

/// Move `cursor` down by `by`, refusing offsets past [`MAX_OFFSET`].
fn advance(cursor: u32, by: u32) -> Result<u32> {
    cursor
        .checked_add(by)
        .filter(|&y| y <= MAX_OFFSET)
        .ok_or_else(|| {
            Error::InvalidConfig(format!(
                "layout extends beyond {} canvas units",
                MAX_OFFSET
            ))
        })
}

/// One sub-group as it will be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedBlock {
    pub subgroup: String,
    /// Highest-ranked entries that fit, in rank order.
    pub visible_entries: Vec<AggregatedTopic>,
    /// Bar length per visible entry, as a percentage of the block's top entry.
    pub bar_widths: Vec<f64>,
    /// Top of the block title.
    pub y: u32,
    /// Top of each visible row.
    pub row_offsets: Vec<u32>,
    /// Ranked entries left out by the row cap.
    pub hidden_entries: usize,
}

impl PlannedBlock {
    /// Visible entries paired with their bar width and row offset.
    pub fn rows(&self) -> impl Iterator<Item = (&AggregatedTopic, f64, u32)> + '_ {
        self.visible_entries
            .iter()
            .zip(self.bar_widths.iter().copied())
            .zip(self.row_offsets.iter().copied())
            .map(|((entry, width), y)| (entry, width, y))
    }
}

/// Geometry of a whole document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPlan {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Space above the header text.
    pub top_margin: u32,
    /// Space above the first block (margin, header and divider).
    pub header_height: u32,
    /// Space between header and footer; may be negative on tiny canvases.
    pub available_height: i64,
    /// Rows allowed per block, identical for every block.
    pub dynamic_cap: usize,
    /// True when the cap was forced up to the minimum and may overflow.
    pub overflow_accepted: bool,
    pub blocks: Vec<PlannedBlock>,
}

impl LayoutPlan {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Height consumed by block titles, rows and gaps.
    pub fn used_height(&self, layout: &LayoutConfig) -> i64 {
        let n = self.blocks.len() as i64;
        if n == 0 {
            return 0;
        }
        let rows: i64 = self
            .blocks
            .iter()
            .map(|b| b.visible_entries.len() as i64)
            .sum();
        n * i64::from(layout.block_header_height)
            + rows * i64::from(layout.row_height)
            + (n - 1) * i64::from(layout.block_gap)
    }

    /// Number of rows drawn across all blocks.
    pub fn visible_rows(&self) -> usize {
        self.blocks.iter().map(|b| b.visible_entries.len()).sum()
    }
}

/// Uniform per-block row cap for `num_blocks` blocks.
///
/// Returns the cap and whether it had to be raised to `min_entries`.
pub fn dynamic_cap(
    available_height: i64,
    num_blocks: usize,
    layout: &LayoutConfig,
) -> (usize, bool) {
    if num_blocks == 0 {
        return (0, false);
    }

    let n = num_blocks as i64;
    let space_for_rows = available_height
        - n * i64::from(layout.block_header_height)
        - (n - 1).max(0) * i64::from(layout.block_gap);

    if space_for_rows <= 0 {
        return (layout.min_entries, true);
    }

    let raw = (space_for_rows / i64::from(layout.row_height) / n) as usize;
    if raw < layout.min_entries {
        (layout.min_entries, true)
    } else {
        (raw.min(layout.max_entries), false)
    }
}

/// Bar lengths relative to the first (largest) entry, floored at `min_pct`.
pub fn bar_widths(entries: &[AggregatedTopic], min_pct: f64) -> Vec<f64> {
    let local_max = entries.first().map(|e| e.question_count).unwrap_or(0);

    entries
        .iter()
        .map(|e| {
            if local_max == 0 {
                min_pct
            } else {
                (e.question_count as f64 / local_max as f64 * 100.0).max(min_pct)
            }
        })
        .collect()
}

/// Plan which rows of each block fit on the canvas and where they go.
pub fn plan_layout(blocks: &[SubgroupBlock], layout: &LayoutConfig) -> Result<LayoutPlan> {
    layout.validate()?;

    let header_height = layout.header_and_divider_height();
    let available_height = layout.available_height();
    let non_empty: Vec<&SubgroupBlock> = blocks.iter().filter(|b| !b.entries.is_empty()).collect();

    let mut plan = LayoutPlan {
        canvas_width: layout.canvas_width,
        canvas_height: layout.canvas_height,
        top_margin: layout.top_margin,
        header_height,
        available_height,
        dynamic_cap: 0,
        overflow_accepted: false,
        blocks: Vec::with_capacity(non_empty.len()),
    };

    if non_empty.is_empty() {
        debug!("No non-empty blocks, returning empty plan");
        return Ok(plan);
    }

    let (cap, overflow) = dynamic_cap(available_height, non_empty.len(), layout);
    plan.dynamic_cap = cap;
    plan.overflow_accepted = overflow;

    let mut cursor = header_height;
    let last = non_empty.len() - 1;

    for (i, block) in non_empty.into_iter().enumerate() {
        let visible: Vec<AggregatedTopic> = block.entries.iter().take(cap).cloned().collect();
        let widths = bar_widths(&visible, layout.min_bar_pct);

        let y = cursor;
        cursor = advance(cursor, layout.block_header_height)?;

        let mut row_offsets = Vec::with_capacity(visible.len());
        for _ in &visible {
            row_offsets.push(cursor);
            cursor = advance(cursor, layout.row_height)?;
        }

        if i != last {
            cursor = advance(cursor, layout.block_gap)?;
        }

        plan.blocks.push(PlannedBlock {
            subgroup: block.subgroup.clone(),
            hidden_entries: block.entries.len() - visible.len(),
            visible_entries: visible,
            bar_widths: widths,
            y,
            row_offsets,
        });
    }

    if overflow {
        warn!(
            "{} blocks do not fit in {} units, keeping {} rows each",
            plan.blocks.len(),
            available_height,
            cap
        );
    }
    debug!(
        "Planned {} blocks, cap {}, {} rows",
        plan.blocks.len(),
        cap,
        plan.visible_rows()
    );

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn block(subgroup: &str, counts: &[u64]) -> SubgroupBlock {
        SubgroupBlock {
            subgroup: subgroup.to_string(),
            entries: counts
                .iter()
                .enumerate()
                .map(|(i, &count)| AggregatedTopic {
                    module: "Cardio".to_string(),
                    subgroup: subgroup.to_string(),
                    topic: format!("{} topic {}", subgroup, i),
                    question_count: count,
                    distinct_years: BTreeSet::from([2021]),
                })
                .collect(),
        }
    }

    fn blocks(n: usize, rows: usize) -> Vec<SubgroupBlock> {
        let counts: Vec<u64> = (0..rows as u64).rev().map(|c| c + 1).collect();
        (0..n).map(|i| block(&format!("G{}", i), &counts)).collect()
    }

    /// Layout whose available height is exactly `available`.
    fn layout_with_available(available: u32) -> LayoutConfig {
        let layout = LayoutConfig::default();
        LayoutConfig {
            canvas_height: available + layout.header_and_divider_height() + layout.footer_reserve,
            ..layout
        }
    }

    #[test]
    fn test_scenario_three_blocks_in_400() {
        let layout = layout_with_available(400);
        assert_eq!(layout.available_height(), 400);

        // 400 - 3*32 - 2*20 = 264; 264 / 36 / 3 = 2.44
        assert_eq!(dynamic_cap(400, 3, &layout), (2, false));

        let plan = plan_layout(&blocks(3, 6), &layout).unwrap();
        assert_eq!(plan.dynamic_cap, 2);
        assert!(plan.blocks.iter().all(|b| b.visible_entries.len() == 2));
        assert!(plan.blocks.iter().all(|b| b.hidden_entries == 4));
    }

    #[test]
    fn test_cap_clamped_to_max() {
        let layout = LayoutConfig::default();
        // 768 - 32 = 736; 736 / 36 = 20 -> clamped to 5
        assert_eq!(dynamic_cap(layout.available_height(), 1, &layout), (5, false));
    }

    #[test]
    fn test_cap_degrades_to_min() {
        let layout = LayoutConfig::default();
        assert_eq!(dynamic_cap(-10, 2, &layout), (2, true));
        assert_eq!(dynamic_cap(50, 3, &layout), (2, true));
        // 8 blocks: 768 - 256 - 140 = 372; 372 / 36 / 8 = 1 -> raised to 2
        assert_eq!(dynamic_cap(768, 8, &layout), (2, true));
        assert_eq!(dynamic_cap(768, 0, &layout), (0, false));
    }

    #[test]
    fn test_empty_plan() {
        let layout = LayoutConfig::default();
        let plan = plan_layout(&[], &layout).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.dynamic_cap, 0);
        assert_eq!(plan.used_height(&layout), 0);

        let plan = plan_layout(&[block("Anatomie", &[])], &layout).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_empty_blocks_are_skipped() {
        let layout = LayoutConfig::default();
        let input = vec![
            block("Anatomie", &[3, 1]),
            block("Histologie", &[]),
            block("Physiologie", &[2]),
        ];
        let plan = plan_layout(&input, &layout).unwrap();
        let names: Vec<_> = plan.blocks.iter().map(|b| b.subgroup.as_str()).collect();
        assert_eq!(names, vec!["Anatomie", "Physiologie"]);
    }

    #[test]
    fn test_layout_bound() {
        let layout = LayoutConfig::default();
        for n in 1..=10 {
            for rows in [1, 3, 5, 9] {
                let plan = plan_layout(&blocks(n, rows), &layout).unwrap();
                let used = plan.used_height(&layout);
                // Overflow is only allowed when the cap was forced up to min_entries.
                if !plan.overflow_accepted {
                    assert!(
                        used <= plan.available_height,
                        "n={} rows={} used={}",
                        n,
                        rows,
                        used
                    );
                }
            }
        }

        let crowded = plan_layout(&blocks(8, 5), &layout).unwrap();
        assert!(crowded.overflow_accepted);
        assert!(crowded.used_height(&layout) > crowded.available_height);
        assert_eq!(crowded.visible_rows(), 16);
    }

    #[test]
    fn test_vertical_offsets() {
        let layout = LayoutConfig::default();
        let plan = plan_layout(&[block("A", &[5, 4]), block("B", &[3])], &layout).unwrap();

        let top = layout.header_and_divider_height();
        assert_eq!(plan.blocks[0].y, top);
        assert_eq!(plan.blocks[0].row_offsets, vec![top + 32, top + 32 + 36]);
        assert_eq!(plan.blocks[1].y, top + 32 + 72 + 20);
        assert_eq!(plan.blocks[1].row_offsets, vec![top + 32 + 72 + 20 + 32]);
        assert_eq!(plan.used_height(&layout), 32 + 72 + 20 + 32 + 36);
    }

    #[test]
    fn test_bar_widths_are_local() {
        let layout = LayoutConfig::default();
        let plan = plan_layout(&[block("A", &[100, 50, 1]), block("B", &[4, 2])], &layout).unwrap();

        assert_eq!(plan.blocks[0].bar_widths, vec![100.0, 50.0, 8.0]);
        assert_eq!(plan.blocks[1].bar_widths, vec![100.0, 50.0]);
    }

    #[test]
    fn test_bar_widths_all_zero() {
        let widths = bar_widths(&block("A", &[0, 0, 0]).entries, 8.0);
        assert_eq!(widths, vec![8.0, 8.0, 8.0]);
        assert!(bar_widths(&[], 8.0).is_empty());
    }

    #[test]
    fn test_rows_iterator() {
        let layout = LayoutConfig::default();
        let plan = plan_layout(&[block("A", &[10, 5])], &layout).unwrap();
        let rows: Vec<_> = plan.blocks[0].rows().map(|(e, w, _)| (e.question_count, w)).collect();
        assert_eq!(rows, vec![(10, 100.0), (5, 50.0)]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let layout = LayoutConfig {
            min_entries: 9,
            ..LayoutConfig::default()
        };
        assert!(plan_layout(&blocks(1, 1), &layout).is_err());

        let layout = LayoutConfig {
            header_height: u32::MAX,
            ..LayoutConfig::default()
        };
        assert!(plan_layout(&blocks(1, 1), &layout).is_err());
    }

    #[test]
    fn test_offsets_past_coordinate_range_are_rejected() {
        // Every dimension is in range, but forcing 40k rows of the tallest
        // height pushes the stack past the offset limit.
        let layout = LayoutConfig {
            row_height: crate::config::MAX_LAYOUT_EXTENT,
            min_entries: 40_000,
            max_entries: 40_000,
            ..LayoutConfig::default()
        };
        assert!(layout.validate().is_ok());

        let counts = vec![1u64; 40_000];
        let result = plan_layout(&[block("Anatomie", &counts)], &layout);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
