//! CLI entry point for the Pulse transaction rater.
//!
//! Provides subcommands for listing regions and periods found under the data
//! root, and for producing the aggregated transaction table for a region (or
//! all regions) in a given year and quarter.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use pulse_rater::analyzers::analyzer::{Aggregator, build_report};
use pulse_rater::analyzers::types::{ALL_REGIONS_LABEL, Period, Selection};
use pulse_rater::config::Config;
use pulse_rater::output::{OutputFormat, print_pretty, write_report};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "pulse_rater")]
#[command(about = "Aggregate regional transaction snapshots into a ranked table", long_about = None)]
struct Cli {
    /// Directory holding `<region>/<year>/<quarter>.json` snapshots
    #[arg(long, global = true, value_name = "DIR")]
    data_root: Option<PathBuf>,

    /// Treat an unknown region as empty data instead of an error
    #[arg(long, global = true, default_value_t = false)]
    lenient_regions: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every region, preceded by the all-regions label
    Regions,
    /// List available (year, quarter) periods
    Periods {
        /// Region to inspect; omit (or pass "all") for the union over all regions
        #[arg(short, long)]
        region: Option<String>,
    },
    /// Build the aggregated table for one selection and period
    Table {
        /// Region name, or "all" for every region
        #[arg(short, long, default_value = "all")]
        region: String,

        #[arg(short, long)]
        year: u16,

        /// Quarter label, i.e. the snapshot file stem
        #[arg(short, long)]
        quarter: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Maximum number of snapshots loaded in parallel (overrides PULSE_CONCURRENCY)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/pulse_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("pulse_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(tracing::Level::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::from_env("RUST_LOG_JSON").add_directive(tracing::Level::DEBUG.into()),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env(cli.data_root)?.with_strict_regions(!cli.lenient_regions);
    info!(
        data_root = %config.data_root.display(),
        strict_regions = config.strict_regions,
        "Configuration loaded"
    );

    let aggregator = Aggregator::from_config(&config);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Regions => {
            let regions = aggregator.catalog().list_regions()?;
            info!(count = regions.len(), "Regions listed");

            writeln!(stdout, "{ALL_REGIONS_LABEL}")?;
            for region in regions {
                writeln!(stdout, "{region}")?;
            }
        }
        Commands::Periods { region } => {
            let selection = region
                .as_deref()
                .map(|r| r.parse::<Selection>())
                .transpose()?
                .unwrap_or(Selection::AllRegions);

            let periods = match &selection {
                Selection::AllRegions => aggregator.catalog().list_all_periods()?,
                Selection::Region(r) => aggregator.catalog().list_periods(r)?,
            };
            info!(selection = %selection, count = periods.len(), "Periods listed");

            for period in periods {
                writeln!(stdout, "{} {}", period.year, period.quarter)?;
            }
        }
        Commands::Table {
            region,
            year,
            quarter,
            format,
            concurrency,
        } => {
            let selection: Selection = region.parse()?;
            let period = Period::new(year, quarter);
            let config = match concurrency {
                Some(n) => config.with_concurrency(n),
                None => config,
            };

            let report =
                build_report(&aggregator, selection, period, config.concurrency).await?;
            print_pretty(&report);

            for warning in &report.warnings {
                warn!(
                    region = %warning.region,
                    path = %warning.path.display(),
                    reason = %warning.reason,
                    "Region skipped"
                );
            }

            if report.is_empty() {
                error!(
                    selection = %report.selection,
                    period = %report.period,
                    "No data for the selected period"
                );
                bail!("no data for {} in {}", report.selection, report.period);
            }

            write_report(&mut stdout, &report, format)?;
            info!(rows = report.rows.len(), "Report written");
        }
    }

    Ok(())
}
