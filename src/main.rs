//! expstats - statistics for the generative-AI experiment wiki
//!
//! Scans the numbered experiment pages of the wiki, aggregates their
//! date, model, tag and rating fields, and regenerates the Stats page
//! plus three charts.
//!
//! Exit codes:
//!   0 - Success (individual pages may have been skipped)
//!   1 - Fatal error (wiki directory unreadable, report unwritable, bad config)

mod analysis;
mod charts;
mod cli;
mod config;
mod models;
mod parser;
mod report;
mod scanner;

use analysis::SkippedFile;
use anyhow::{Context, Result};
use charts::RenderedChart;
use chrono::NaiveDate;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{Report, ReportMetadata};
use parser::RecordParser;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

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

    // Initialize logging
    init_logging(&args);

    info!("expstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .expstats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize paths, field labels, and charts.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` overrides the level chosen by `--verbose` / `--quiet`.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
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

/// Options for one statistics run that do not live in the config file.
#[derive(Debug, Clone)]
struct RunOptions {
    format: OutputFormat,
    as_of: Option<NaiveDate>,
    dry_run: bool,
    show_progress: bool,
    report_path: PathBuf,
}

/// What a run produced.
#[derive(Debug)]
struct RunSummary {
    files_found: usize,
    report: Option<Report>,
    skipped: Vec<SkippedFile>,
    charts: Vec<RenderedChart>,
    report_path: PathBuf,
}

/// Run the statistics workflow and print a summary.
fn run(args: &Args) -> Result<()> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);

    let options = RunOptions {
        format: args.format,
        as_of: args.as_of,
        dry_run: args.dry_run,
        show_progress: !args.quiet,
        report_path: report_path(&config, args),
    };

    println!(
        "📂 Scanning experiment pages in {}",
        config.general.wiki_dir.display()
    );
    let summary = generate_stats(&config, &options)?;

    let Some(report) = summary.report else {
        println!("\n✅ Dry run complete. Nothing was written.");
        return Ok(());
    };

    let stats = &report.stats;
    println!("\n📊 Summary:");
    println!("   Experiments: {}", stats.total);
    println!("   Success rate (○ or better): {:.1}%", stats.success_rate());
    println!(
        "   ◎ {} | ○ {} | △ {} | ❌ {} | ? {}",
        stats.ratings.exceeded,
        stats.ratings.as_expected,
        stats.ratings.below,
        stats.ratings.failed,
        stats.ratings.unknown
    );

    let models: Vec<String> = analysis::top_models(stats, 3)
        .iter()
        .map(|m| format!("{} ({})", m.model, m.total()))
        .collect();
    if !models.is_empty() {
        println!("   Top models: {}", models.join(", "));
    }
    let tags: Vec<String> = analysis::top_tags(stats, 5)
        .iter()
        .map(|t| format!("{} ({})", t.tag, t.count))
        .collect();
    if !tags.is_empty() {
        println!("   Top tags: {}", tags.join(", "));
    }

    if !summary.skipped.is_empty() {
        println!("\n⚠️  Skipped {} of {} files:", summary.skipped.len(), summary.files_found);
        for skipped in &summary.skipped {
            println!("     {}: {}", skipped.path.display(), skipped.reason);
        }
    }

    println!("\n🖼  Charts rendered: {}", summary.charts.len());
    for chart in &summary.charts {
        println!("     {}", chart.path.display());
    }

    println!(
        "\n✅ Stats updated! Report saved to: {}",
        summary.report_path.display()
    );
    Ok(())
}

/// Read, parse, aggregate and render.
///
/// The wiki directory is read and the charts rendered in memory before
/// anything is written, and the report destination is checked before the
/// first chart hits the disk. A fatal error leaves existing outputs untouched.
fn generate_stats(config: &Config, options: &RunOptions) -> Result<RunSummary> {
    let report_path = options.report_path.clone();

    // Step 1: Discover and read record files
    let scan_config = scanner::ScanConfig::from(&config.scanner);
    let record_scanner = scanner::RecordScanner::new(config.general.wiki_dir.clone(), scan_config);

    if options.dry_run {
        let files = record_scanner.scan()?;
        if files.is_empty() {
            println!("   No experiment pages found.");
        } else {
            println!("   Found {} experiment pages:\n", files.len());
            for file in &files {
                println!("     📄 {}", file.path.display());
            }
        }
        return Ok(RunSummary {
            files_found: files.len(),
            report: None,
            skipped: Vec::new(),
            charts: Vec::new(),
            report_path,
        });
    }

    let loaded = record_scanner.load()?;
    let files_found = loaded.len();
    info!("Found {} experiment pages", files_found);

    // Step 2: Parse
    let record_parser =
        RecordParser::new(&config.fields).context("Invalid field labels in configuration")?;
    let collected = analysis::collect_records(loaded, &record_parser, options.show_progress);
    info!(
        "Parsed {} records, skipped {}",
        collected.records.len(),
        collected.skipped.len()
    );

    // Step 3: Aggregate
    let stats = analysis::compute_stats(&collected.records);

    if stats.total == 0 {
        warn!("No experiment records found");
    }

    // Step 4: Charts, in memory
    let pending = if config.charts.enabled {
        charts::render_charts(&stats, &config.charts)
    } else {
        debug!("Chart rendering disabled");
        Vec::new()
    };

    // Step 5: Write. The report destination must be usable first.
    report::prepare_report_path(&report_path)?;
    let rendered = charts::write_charts(&pending, &config.images_path());

    let report = Report {
        metadata: ReportMetadata {
            wiki_dir: config.general.wiki_dir.display().to_string(),
            as_of: options.as_of.or(stats.last_date),
            files_parsed: collected.records.len(),
            files_skipped: collected.skipped.len(),
        },
        charts: report::chart_links(&rendered, &report_path),
        stats,
        records: collected.records,
    };

    let output = match options.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };
    report::write_report(&output, &report_path)?;

    Ok(RunSummary {
        files_found,
        report: Some(report),
        skipped: collected.skipped,
        charts: rendered,
        report_path,
    })
}

/// Where the report goes. A JSON report never replaces the Markdown page
/// unless an output path was given explicitly.
fn report_path(config: &Config, args: &Args) -> PathBuf {
    let path = config.report_path();
    if args.format == OutputFormat::Json && args.output.is_none() {
        path.with_extension("json")
    } else {
        path
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try the working directory, then the wiki directory
    let wiki_dir = args
        .wiki_dir
        .clone()
        .unwrap_or_else(|| Config::default().general.wiki_dir);
    let found = match Config::load_default() {
        Ok(None) => Config::load_from_dir(&wiki_dir),
        other => other,
    };

    match found {
        Ok(Some(config)) => {
            info!("Loaded config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
