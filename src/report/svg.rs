//! SVG document rendering.
//!
//! Turns a [`LayoutPlan`] into a self-contained SVG: background, header,
//! divider, one block per sub-group and a footer. Only primitive shapes,
//! text and gradients are emitted, so any SVG editor can open the file
//! without external assets.
//!
//! Output depends only on the plan, the metadata and the render settings.
//! Nothing time-, random- or locale-dependent is written.

use crate::config::RenderConfig;
use crate::layout::{LayoutPlan, PlannedBlock};
use std::fmt::Write;

const MARGIN: u32 = 60;
const LABEL_INDENT: u32 = 36;
const COUNT_COLUMN: u32 = 70;
const FALLBACK_ACCENT: &str = "#6366f1";

/// Header and footer values that are not part of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderMeta {
    pub module_name: String,
    pub total_questions: u64,
    /// Display range such as `2019-2024`; may be empty.
    pub exam_years_range: String,
    pub total_exam_years: usize,
}

/// Escape the five reserved XML characters.
///
/// Characters XML 1.0 does not allow at all (C0 controls other than tab,
/// newline and carriage return, U+FFFE and U+FFFF) become U+FFFD.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if !is_xml_char(c) => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    out
}

/// Whether `c` matches the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Cut `label` to `max_chars` characters and append an ellipsis.
///
/// This counts characters, not rendered width: wide glyphs may still
/// overrun and narrow ones leave slack. Good enough for a fixed font size.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let cut: String = label.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

/// Renders layout plans as SVG text.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    config: RenderConfig,
}

impl SvgRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render the whole document.
    pub fn render(&self, plan: &LayoutPlan, meta: &RenderMeta) -> String {
        let mut svg = String::with_capacity(4096 + plan.visible_rows() * 512);

        self.write_open(&mut svg, plan);
        self.write_defs(&mut svg, plan);
        self.write_header(&mut svg, plan, meta);

        if plan.is_empty() {
            self.write_empty_notice(&mut svg, plan);
        }
        for (index, block) in plan.blocks.iter().enumerate() {
            self.write_block(&mut svg, plan, index, block);
        }

        self.write_footer(&mut svg, plan, meta);
        svg.push_str("</svg>\n");
        svg
    }

    fn accent(&self, index: usize) -> &str {
        if self.config.palette.is_empty() {
            return FALLBACK_ACCENT;
        }
        &self.config.palette[index % self.config.palette.len()]
    }

    fn write_open(&self, svg: &mut String, plan: &LayoutPlan) {
        let (w, h) = (plan.canvas_width, plan.canvas_height);
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{}">"#,
            escape_xml(&self.config.font_family)
        );
    }

    fn write_defs(&self, svg: &mut String, plan: &LayoutPlan) {
        svg.push_str("  <defs>\n");
        svg.push_str(r#"    <linearGradient id="bg-gradient" x1="0" y1="0" x2="0" y2="1">"#);
        svg.push('\n');
        svg.push_str("      <stop offset=\"0%\" stop-color=\"#0f172a\"/>\n");
        svg.push_str("      <stop offset=\"100%\" stop-color=\"#1e293b\"/>\n");
        svg.push_str("    </linearGradient>\n");

        for index in 0..plan.blocks.len() {
            let accent = escape_xml(self.accent(index));
            let _ = writeln!(
                svg,
                r#"    <linearGradient id="bar-gradient-{index}" x1="0" y1="0" x2="1" y2="0">"#
            );
            let _ = writeln!(
                svg,
                r#"      <stop offset="0%" stop-color="{accent}" stop-opacity="0.55"/>"#
            );
            let _ = writeln!(
                svg,
                r#"      <stop offset="100%" stop-color="{accent}" stop-opacity="1"/>"#
            );
            svg.push_str("    </linearGradient>\n");
        }
        svg.push_str("  </defs>\n");

        let _ = writeln!(
            svg,
            r#"  <rect x="0" y="0" width="{}" height="{}" fill="url(#bg-gradient)"/>"#,
            plan.canvas_width, plan.canvas_height
        );
    }

    fn write_header(&self, svg: &mut String, plan: &LayoutPlan, meta: &RenderMeta) {
        let top = plan.top_margin;
        let mut stats = format!("{} questions", meta.total_questions);
        if !meta.exam_years_range.is_empty() {
            let _ = write!(stats, " · {}", meta.exam_years_range);
        }

        let _ = writeln!(
            svg,
            r##"  <text x="{MARGIN}" y="{}" font-size="20" font-weight="700" letter-spacing="2" fill="#94a3b8">{}</text>"##,
            top + 24,
            escape_xml(&self.config.brand.to_uppercase())
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{MARGIN}" y="{}" font-size="52" font-weight="800" fill="#f8fafc">{}</text>"##,
            top + 88,
            escape_xml(&truncate_label(&meta.module_name, self.config.label_max_chars / 2))
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{MARGIN}" y="{}" font-size="22" fill="#cbd5e1">{}</text>"##,
            top + 128,
            escape_xml(&stats)
        );

        let divider_y = plan.header_height.saturating_sub(12);
        let _ = writeln!(
            svg,
            r##"  <rect x="{MARGIN}" y="{divider_y}" width="{}" height="2" fill="#334155"/>"##,
            plan.canvas_width.saturating_sub(2 * MARGIN)
        );
    }

    fn write_empty_notice(&self, svg: &mut String, plan: &LayoutPlan) {
        let _ = writeln!(
            svg,
            r##"  <text x="{}" y="{}" font-size="22" text-anchor="middle" fill="#64748b">No questions match the current selection</text>"##,
            plan.canvas_width / 2,
            plan.header_height + 60
        );
    }

    fn write_block(&self, svg: &mut String, plan: &LayoutPlan, index: usize, block: &PlannedBlock) {
        let accent = escape_xml(self.accent(index));
        let y = block.y;
        let initial: String = block
            .subgroup
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();

        let _ = writeln!(svg, r#"  <g id="block-{index}">"#);
        let _ = writeln!(
            svg,
            r#"    <rect x="{MARGIN}" y="{}" width="24" height="24" rx="6" fill="{accent}"/>"#,
            y + 2
        );
        let _ = writeln!(
            svg,
            r##"    <text x="{}" y="{}" font-size="14" font-weight="700" text-anchor="middle" fill="#ffffff">{}</text>"##,
            MARGIN + 12,
            y + 19,
            escape_xml(&initial)
        );
        let _ = writeln!(
            svg,
            r#"    <text x="{}" y="{}" font-size="20" font-weight="700" fill="{accent}">{}</text>"#,
            MARGIN + LABEL_INDENT,
            y + 21,
            escape_xml(&block.subgroup)
        );
        if block.hidden_entries > 0 {
            let _ = writeln!(
                svg,
                r##"    <text x="{}" y="{}" font-size="14" text-anchor="end" fill="#64748b">+{} more</text>"##,
                plan.canvas_width.saturating_sub(MARGIN),
                y + 21,
                block.hidden_entries
            );
        }

        let bar_x = MARGIN + LABEL_INDENT;
        let track = plan
            .canvas_width
            .saturating_sub(bar_x + MARGIN + COUNT_COLUMN);

        for (rank, (entry, width_pct, row_y)) in block.rows().enumerate() {
            let bar_width = f64::from(track) * width_pct / 100.0;
            let label = truncate_label(&entry.topic, self.config.label_max_chars);

            let _ = writeln!(
                svg,
                r##"    <text x="{MARGIN}" y="{}" font-size="15" font-weight="700" fill="#64748b">{}</text>"##,
                row_y + 15,
                rank + 1
            );
            let _ = writeln!(
                svg,
                r##"    <text x="{bar_x}" y="{}" font-size="15" fill="#e2e8f0">{}</text>"##,
                row_y + 15,
                escape_xml(&label)
            );
            let _ = writeln!(
                svg,
                r##"    <rect x="{bar_x}" y="{}" width="{track}" height="10" rx="5" fill="#ffffff" fill-opacity="0.08"/>"##,
                row_y + 21
            );
            let _ = writeln!(
                svg,
                r#"    <rect x="{bar_x}" y="{}" width="{:.1}" height="10" rx="5" fill="url(#bar-gradient-{index})"/>"#,
                row_y + 21,
                bar_width
            );
            let _ = writeln!(
                svg,
                r##"    <text x="{}" y="{}" font-size="16" font-weight="700" text-anchor="end" fill="#f8fafc">{}</text>"##,
                plan.canvas_width.saturating_sub(MARGIN),
                row_y + 31,
                entry.question_count
            );
        }
        svg.push_str("  </g>\n");
    }

    fn write_footer(&self, svg: &mut String, plan: &LayoutPlan, meta: &RenderMeta) {
        let footer_y = plan.canvas_height.saturating_sub(40);
        let summary = format!(
            "Top {} topics · {} sub-disciplines · {} exam years",
            plan.visible_rows(),
            plan.blocks.len(),
            meta.total_exam_years
        );

        let _ = writeln!(
            svg,
            r##"  <text x="{MARGIN}" y="{footer_y}" font-size="16" fill="#94a3b8">{}</text>"##,
            escape_xml(&summary)
        );
        let _ = writeln!(
            svg,
            r##"  <text x="{}" y="{footer_y}" font-size="18" font-weight="700" text-anchor="end" fill="#f8fafc">{}</text>"##,
            plan.canvas_width.saturating_sub(MARGIN),
            escape_xml(&self.config.brand)
        );
    }
}
