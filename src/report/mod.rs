//! Report output: the SVG export and the Markdown/JSON ranking views.

pub mod generator;
pub mod svg;

pub use generator::*;
pub use svg::{escape_xml, truncate_label, RenderMeta, SvgRenderer};
