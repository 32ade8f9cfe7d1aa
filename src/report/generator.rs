//! Report generation.
//!
//! This module runs the ranking, selection, layout and render stages for a
//! module export, and produces the Markdown and JSON views of the ranking.

use crate::analysis::{
    find_module, format_year_range, project_blocks, project_modules, select_blocks, SubgroupOrder,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::layout::{plan_layout, LayoutPlan};
use crate::models::{AggregatedTopic, ModuleSummary, SubgroupBlock};
use crate::report::svg::{RenderMeta, SvgRenderer};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Ranked view of one module, as exported.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReport {
    pub summary: ModuleSummary,
    pub exam_years_range: String,
    pub total_exam_years: usize,
    /// Every ranked block of the selected sub-groups.
    pub blocks: Vec<SubgroupBlock>,
    /// What fits on the canvas.
    pub plan: LayoutPlan,
}

impl ModuleReport {
    /// Metadata the SVG header and footer need.
    pub fn render_meta(&self) -> RenderMeta {
        RenderMeta {
            module_name: self.summary.module.clone(),
            total_questions: self.summary.total_questions,
            exam_years_range: self.exam_years_range.clone(),
            total_exam_years: self.total_exam_years,
        }
    }
}

/// Build the export view of `module`.
///
/// `selected` restricts the export to the named sub-groups; `None` keeps
/// every sub-group. An empty module name, an explicitly empty selection or
/// one naming none of the module's sub-groups is refused. A module with no
/// matching topics yields an empty plan.
pub fn build_module_report(
    topics: &[AggregatedTopic],
    module: &str,
    selected: Option<&[String]>,
    exam_years: &BTreeSet<i32>,
    config: &Config,
) -> Result<ModuleReport> {
    if module.trim().is_empty() {
        return Err(Error::InvalidArguments(
            "a module must be selected for export".to_string(),
        ));
    }

    let order = SubgroupOrder::new(config.ranking.subgroup_priority.iter().cloned());
    let mut blocks = project_blocks(topics, module, &order);
    if let Some(selected) = selected {
        blocks = select_blocks(blocks, selected)?;
    }

    let summary = find_module(&project_modules(topics), module)
        .cloned()
        .unwrap_or_else(|| ModuleSummary {
            module: module.to_string(),
            subgroups: BTreeSet::new(),
            total_questions: 0,
        });

    let plan = plan_layout(&blocks, &config.layout)?;
    debug!(
        "Module {}: {} of {} blocks planned",
        module,
        plan.blocks.len(),
        blocks.len()
    );

    Ok(ModuleReport {
        summary,
        exam_years_range: format_year_range(exam_years),
        total_exam_years: exam_years.len(),
        blocks,
        plan,
    })
}

/// Build the report and render it as SVG.
pub fn export_module_svg(
    topics: &[AggregatedTopic],
    module: &str,
    selected: Option<&[String]>,
    exam_years: &BTreeSet<i32>,
    config: &Config,
) -> Result<(ModuleReport, String)> {
    let report = build_module_report(topics, module, selected, exam_years, config)?;
    let svg = SvgRenderer::new(config.render.clone()).render(&report.plan, &report.render_meta());
    info!(
        "Rendered {} rows for {} ({} bytes)",
        report.plan.visible_rows(),
        module,
        svg.len()
    );
    Ok((report, svg))
}

/// File name for an exported module: `tendance-<module>.<extension>`.
///
/// The module name is lowercased with spaces turned into hyphens.
pub fn export_file_name(module: &str, extension: &str) -> String {
    format!(
        "tendance-{}.{}",
        module.to_lowercase().replace(' ', "-"),
        extension
    )
}

/// Generate a JSON module report.
pub fn generate_json_report(report: &ModuleReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Generate the JSON module ranking.
pub fn generate_json_modules(modules: &[ModuleSummary]) -> Result<String> {
    Ok(serde_json::to_string_pretty(modules)?)
}

/// Generate a Markdown table ranking every module.
pub fn generate_markdown_modules(modules: &[ModuleSummary]) -> String {
    let mut output = String::new();

    output.push_str("# Modules by question count\n\n");

    if modules.is_empty() {
        output.push_str("No questions match the current filters.\n");
        return output;
    }

    output.push_str("| # | Module | Questions | Sub-groups |\n");
    output.push_str("|:---:|:---|:---:|:---|\n");
    for (i, module) in modules.iter().enumerate() {
        let subgroups: Vec<&str> = module.subgroups.iter().map(String::as_str).collect();
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            i + 1,
            module.module,
            module.total_questions,
            subgroups.join(", ")
        ));
    }

    output
}

/// Generate a Markdown ranking for one module.
pub fn generate_markdown_report(report: &ModuleReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.summary.module));
    output.push_str(&format!(
        "- **Questions:** {}\n",
        report.summary.total_questions
    ));
    if !report.exam_years_range.is_empty() {
        output.push_str(&format!(
            "- **Exam years:** {} ({} years)\n",
            report.exam_years_range, report.total_exam_years
        ));
    }
    output.push('\n');

    if report.blocks.is_empty() {
        output.push_str("No questions match the current selection.\n");
        return output;
    }

    for block in &report.blocks {
        output.push_str(&generate_block_section(block, report.total_exam_years));
    }

    output
}

/// Generate the table for a single sub-group.
fn generate_block_section(block: &SubgroupBlock, total_exam_years: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## {} ({} questions)\n\n",
        block.subgroup,
        block.total_questions()
    ));
    section.push_str("| # | Topic | Questions | Years |\n");
    section.push_str("|:---:|:---|:---:|:---:|\n");

    for (i, entry) in block.entries.iter().enumerate() {
        let years = if total_exam_years > 0 {
            format!("{}/{}", entry.year_coverage(), total_exam_years)
        } else {
            entry.year_coverage().to_string()
        };
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            i + 1,
            entry.topic,
            entry.question_count,
            years
        ));
    }
    section.push('\n');

    section
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(module: &str, subgroup: &str, name: &str, count: u64, years: &[i32]) -> AggregatedTopic {
        AggregatedTopic {
            module: module.to_string(),
            subgroup: subgroup.to_string(),
            topic: name.to_string(),
            question_count: count,
            distinct_years: years.iter().copied().collect(),
        }
    }

    fn sample_topics() -> Vec<AggregatedTopic> {
        vec![
            topic("Cardio", "Physiologie", "Pulse", 4, &[2021]),
            topic("Cardio", "Anatomie", "Heart", 5, &[2021, 2022]),
            topic("Cardio", "Anatomie", "Aorta", 7, &[2022]),
            topic("Pneumo", "Anatomie", "Lung", 2, &[2020]),
        ]
    }

    fn years() -> BTreeSet<i32> {
        BTreeSet::from([2020, 2021, 2022])
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Cardio", "svg"), "tendance-cardio.svg");
        assert_eq!(
            export_file_name("Appareil Digestif", "svg"),
            "tendance-appareil-digestif.svg"
        );
        assert_eq!(export_file_name("Neuro", "json"), "tendance-neuro.json");
    }

    #[test]
    fn test_build_module_report() {
        let report =
            build_module_report(&sample_topics(), "Cardio", None, &years(), &Config::default())
                .unwrap();

        assert_eq!(report.summary.total_questions, 16);
        assert_eq!(report.exam_years_range, "2020-2022");
        assert_eq!(report.total_exam_years, 3);
        let names: Vec<_> = report.blocks.iter().map(|b| b.subgroup.as_str()).collect();
        assert_eq!(names, vec!["Anatomie", "Physiologie"]);
        assert_eq!(report.plan.blocks[0].visible_entries[0].topic, "Aorta");
    }

    #[test]
    fn test_selected_subgroups() {
        let selected = vec!["Physiologie".to_string()];
        let report = build_module_report(
            &sample_topics(),
            "Cardio",
            Some(selected.as_slice()),
            &years(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(report.plan.blocks.len(), 1);
        assert_eq!(report.plan.blocks[0].subgroup, "Physiologie");
        // The header total still covers the whole module.
        assert_eq!(report.summary.total_questions, 16);
    }

    #[test]
    fn test_refuses_missing_selection() {
        let config = Config::default();
        let empty: Vec<String> = Vec::new();

        let err = build_module_report(
            &sample_topics(),
            "Cardio",
            Some(empty.as_slice()),
            &years(),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));

        let err = build_module_report(&sample_topics(), "  ", None, &years(), &config).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));

        let result = export_module_svg(
            &sample_topics(),
            "Cardio",
            Some(empty.as_slice()),
            &years(),
            &config,
        );
        assert!(result.is_err());

        let unmatched = vec!["Nope".to_string()];
        let err = build_module_report(
            &sample_topics(),
            "Cardio",
            Some(unmatched.as_slice()),
            &years(),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));
    }

    #[test]
    fn test_unknown_module_gives_empty_document() {
        let (report, svg) = export_module_svg(
            &sample_topics(),
            "Derma",
            None,
            &BTreeSet::new(),
            &Config::default(),
        )
        .unwrap();
        assert!(report.plan.is_empty());
        assert_eq!(report.summary.total_questions, 0);
        assert!(roxmltree::Document::parse(&svg).is_ok());
    }

    #[test]
    fn test_export_svg_is_well_formed() {
        let (report, svg) = export_module_svg(
            &sample_topics(),
            "Cardio",
            None,
            &years(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(report.plan.visible_rows(), 3);
        let doc = roxmltree::Document::parse(&svg).unwrap();
        assert_eq!(doc.root_element().attribute("viewBox"), Some("0 0 1080 1080"));
        assert!(svg.contains("Aorta"));
        assert!(svg.contains("16 questions · 2020-2022"));
    }

    #[test]
    fn test_generate_markdown_modules() {
        let modules = project_modules(&sample_topics());
        let markdown = generate_markdown_modules(&modules);
        assert!(markdown.contains("| 1 | Cardio | 16 | Anatomie, Physiologie |"));
        assert!(markdown.contains("| 2 | Pneumo | 2 | Anatomie |"));

        assert!(generate_markdown_modules(&[]).contains("No questions match"));
    }

    #[test]
    fn test_generate_markdown_report() {
        let report =
            build_module_report(&sample_topics(), "Cardio", None, &years(), &Config::default())
                .unwrap();
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Cardio"));
        assert!(markdown.contains("## Anatomie (12 questions)"));
        assert!(markdown.contains("| 1 | Aorta | 7 | 1/3 |"));
        assert!(markdown.contains("| 2 | Heart | 5 | 2/3 |"));
    }

    #[test]
    fn test_generate_json_report() {
        let report =
            build_module_report(&sample_topics(), "Cardio", None, &years(), &Config::default())
                .unwrap();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"questionCount\""));
        assert!(json.contains("\"dynamicCap\""));
        assert!(json.contains("\"barWidths\""));
    }
}
