//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tendance.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".tendance.toml";

/// Largest value accepted for any single layout dimension.
pub const MAX_LAYOUT_EXTENT: u32 = 65_536;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Canvas geometry and row capping.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Document rendering settings.
    #[serde(default)]
    pub render: RenderConfig,

    /// Sub-group ordering.
    #[serde(default)]
    pub ranking: RankingConfig,
}

/// Canvas geometry, all values in canvas units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_canvas_size")]
    pub canvas_width: u32,

    #[serde(default = "default_canvas_size")]
    pub canvas_height: u32,

    /// Space above the header.
    #[serde(default = "default_top_margin")]
    pub top_margin: u32,

    /// Brand mark, module name and statistics line.
    #[serde(default = "default_header_height")]
    pub header_height: u32,

    #[serde(default = "default_divider_height")]
    pub divider_height: u32,

    /// Space kept free at the bottom for the footer.
    #[serde(default = "default_footer_reserve")]
    pub footer_reserve: u32,

    /// Height of one ranked row.
    #[serde(default = "default_row_height")]
    pub row_height: u32,

    /// Height of a sub-group block title.
    #[serde(default = "default_block_header_height")]
    pub block_header_height: u32,

    /// Gap between consecutive blocks.
    #[serde(default = "default_block_gap")]
    pub block_gap: u32,

    /// Upper bound on rows per block.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Rows per block shown even when the canvas is too small.
    #[serde(default = "default_min_entries")]
    pub min_entries: usize,

    /// Shortest bar, as a percentage of the block's longest.
    #[serde(default = "default_min_bar_pct")]
    pub min_bar_pct: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_size(),
            canvas_height: default_canvas_size(),
            top_margin: default_top_margin(),
            header_height: default_header_height(),
            divider_height: default_divider_height(),
            footer_reserve: default_footer_reserve(),
            row_height: default_row_height(),
            block_header_height: default_block_header_height(),
            block_gap: default_block_gap(),
            max_entries: default_max_entries(),
            min_entries: default_min_entries(),
            min_bar_pct: default_min_bar_pct(),
        }
    }
}

impl LayoutConfig {
    /// Everything above the first block: margin, header and divider.
    pub fn header_and_divider_height(&self) -> u32 {
        self.top_margin
            .saturating_add(self.header_height)
            .saturating_add(self.divider_height)
    }

    /// Vertical space left for sub-group blocks.
    pub fn available_height(&self) -> i64 {
        i64::from(self.canvas_height)
            - i64::from(self.header_and_divider_height())
            - i64::from(self.footer_reserve)
    }

    /// Check that a plan can be computed from these settings.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;

        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(Error::InvalidConfig("canvas size must be non-zero".to_string()));
        }
        let dimensions = [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("top_margin", self.top_margin),
            ("header_height", self.header_height),
            ("divider_height", self.divider_height),
            ("footer_reserve", self.footer_reserve),
            ("row_height", self.row_height),
            ("block_header_height", self.block_header_height),
            ("block_gap", self.block_gap),
        ];
        if let Some((name, value)) = dimensions.iter().find(|(_, v)| *v > MAX_LAYOUT_EXTENT) {
            return Err(Error::InvalidConfig(format!(
                "{} ({}) exceeds {}",
                name, value, MAX_LAYOUT_EXTENT
            )));
        }
        if self.row_height == 0 {
            return Err(Error::InvalidConfig("row_height must be at least 1".to_string()));
        }
        if self.min_entries == 0 {
            return Err(Error::InvalidConfig("min_entries must be at least 1".to_string()));
        }
        if self.min_entries > self.max_entries {
            return Err(Error::InvalidConfig(format!(
                "min_entries ({}) exceeds max_entries ({})",
                self.min_entries, self.max_entries
            )));
        }
        if !(0.0..=100.0).contains(&self.min_bar_pct) {
            return Err(Error::InvalidConfig(
                "min_bar_pct must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_canvas_size() -> u32 {
    1080
}

fn default_top_margin() -> u32 {
    48
}

fn default_header_height() -> u32 {
    150
}

fn default_divider_height() -> u32 {
    24
}

fn default_footer_reserve() -> u32 {
    90
}

fn default_row_height() -> u32 {
    36
}

fn default_block_header_height() -> u32 {
    32
}

fn default_block_gap() -> u32 {
    20
}

fn default_max_entries() -> usize {
    5
}

fn default_min_entries() -> usize {
    2
}

fn default_min_bar_pct() -> f64 {
    8.0
}

/// Document rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Brand mark printed in the header and footer.
    #[serde(default = "default_brand")]
    pub brand: String,

    /// Character budget for topic labels before an ellipsis is appended.
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,

    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Accent colours, cycled across blocks.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            brand: default_brand(),
            label_max_chars: default_label_max_chars(),
            font_family: default_font_family(),
            palette: default_palette(),
        }
    }
}

fn default_brand() -> String {
    "tendance".to_string()
}

fn default_label_max_chars() -> usize {
    50
}

fn default_font_family() -> String {
    "Helvetica, Arial, sans-serif".to_string()
}

fn default_palette() -> Vec<String> {
    vec!["#6366f1", "#0ea5e9", "#10b981", "#f59e0b", "#ef4444", "#a855f7"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Sub-group ordering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Canonical sub-discipline order; unlisted names sort after these.
    #[serde(default = "default_subgroup_priority")]
    pub subgroup_priority: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            subgroup_priority: default_subgroup_priority(),
        }
    }
}

fn default_subgroup_priority() -> Vec<String> {
    vec![
        "Anatomie",
        "Histologie",
        "Embryologie",
        "Physiologie",
        "Biochimie",
        "Biophysique",
        "Sémiologie",
        "Radiologie",
        "Anatomie pathologique",
        "Pharmacologie",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values the user passed explicitly override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(max) = args.max_entries {
            self.layout.max_entries = max;
        }
        if let Some(min) = args.min_entries {
            self.layout.min_entries = min;
        }
        if let Some(chars) = args.label_max_chars {
            self.render.label_max_chars = chars;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
