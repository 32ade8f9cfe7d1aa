//! Tendance - exam question trends by topic.
//!
//! The pipeline runs in four synchronous stages, each a pure function of the
//! previous stage's output:
//!
//! 1. [`analysis::aggregate`] filters raw occurrences and sums them per topic.
//! 2. [`analysis::project_modules`] / [`analysis::project_blocks`] rank modules
//!    and the topics of each sub-group.
//! 3. [`layout::plan_layout`] decides how many rows fit on the fixed canvas.
//! 4. [`report::SvgRenderer`] writes the plan as a standalone SVG document.
//!
//! No stage performs I/O; reading payloads and writing documents is left to
//! the caller.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod models;
pub mod report;

pub use error::{Error, Result};
