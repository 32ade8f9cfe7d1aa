//! Tendance - exam question trends by topic
//!
//! A CLI tool that ranks exam topics by how often they were asked and
//! exports a module's ranking as a fixed-size SVG.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable payload, invalid config, etc.)
//!   2 - Export written, but the selection produced no visible rows

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tendance::analysis::{aggregate, exam_years_in_scope, project_modules};
use tendance::cli::{Args, OutputFormat};
use tendance::config::{Config, CONFIG_FILE_NAME};
use tendance::models::{AggregatedTopic, FilterSelection, UpstreamPayload};
use tendance::report;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Tendance v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .tendance.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the canvas, row limits, palette and sub-group order.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the payload, aggregate it and dispatch. Returns the exit code.
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config
        .layout
        .validate()
        .context("Invalid layout configuration")?;

    let input = args.input.as_deref().context("--input is required")?;
    let payload = load_payload(input)?;

    let filter = FilterSelection::new(args.exam_types.clone(), args.exam_years.clone());
    let topics = aggregate(payload.records(), &filter);
    info!(
        "{} records, {} topics after filtering ({})",
        payload.records().len(),
        topics.len(),
        filter
    );

    match args.module.as_deref() {
        None => list_modules(&args, &topics),
        Some(module) => export_module(&args, &config, &payload, &filter, &topics, module),
    }
}

/// Read and decode the upstream JSON payload.
fn load_payload(path: &Path) -> Result<UpstreamPayload> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload: {}", path.display()))?;
    let payload = UpstreamPayload::from_json(&text)
        .with_context(|| format!("Failed to parse payload: {}", path.display()))?;

    if payload.records().is_empty() {
        warn!("Payload {} contains no records", path.display());
    }
    Ok(payload)
}

/// Print or write the ranking of every module.
fn list_modules(args: &Args, topics: &[AggregatedTopic]) -> Result<i32> {
    let modules = project_modules(topics);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_modules(&modules)?,
        OutputFormat::Svg | OutputFormat::Markdown => report::generate_markdown_modules(&modules),
    };

    match args.output {
        Some(ref path) => write_output(path, &output)?,
        None => println!("{}", output),
    }
    Ok(0)
}

/// Export one module in the requested format.
fn export_module(
    args: &Args,
    config: &Config,
    payload: &UpstreamPayload,
    filter: &FilterSelection,
    topics: &[AggregatedTopic],
    module: &str,
) -> Result<i32> {
    let years = exam_years_in_scope(filter, &payload.available_exam_years, topics);
    let selected = args.selected_subgroups();
    let selected = selected.as_deref();

    let (report, output) = match args.format {
        OutputFormat::Svg => report::export_module_svg(topics, module, selected, &years, config)?,
        OutputFormat::Json => {
            let report = report::build_module_report(topics, module, selected, &years, config)?;
            let json = report::generate_json_report(&report)?;
            (report, json)
        }
        OutputFormat::Markdown => {
            let report = report::build_module_report(topics, module, selected, &years, config)?;
            let markdown = report::generate_markdown_report(&report);
            (report, markdown)
        }
    };

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(report::export_file_name(module, args.format.extension())));
    write_output(&path, &output)?;

    if !args.quiet {
        println!("\n📊 {}:", report.summary.module);
        println!("   Questions: {}", report.summary.total_questions);
        println!(
            "   Sub-groups: {} | Rows per sub-group: {}",
            report.plan.blocks.len(),
            report.plan.dynamic_cap
        );
        if report.plan.overflow_accepted {
            println!("   ⚠️  Too many sub-groups for the canvas; rows may overflow the footer.");
        }
        println!("\n✅ Export complete! Saved to: {}", path.display());
    }

    if report.plan.is_empty() {
        warn!("No rows to show for {} with the current selection", module);
        return Ok(2);
    }
    Ok(0)
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output to {}", path.display()))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
