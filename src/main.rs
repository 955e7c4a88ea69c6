use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use extentdigest::config::{AppConfig, DurationUnit, RowOrder};
use extentdigest::runner::{self, FlowReport};
use extentdigest::steps::{self, SplitMode};
use extentdigest::summary::{RunOrder, SummaryOutcome};

#[derive(Parser)]
#[command(
    name = "extentdigest",
    about = "Duration summaries for HTML test-execution reports",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML configuration file (default: $EXTENTDIGEST_CONFIG, then ./extentdigest.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    /// Runs in start-time order
    Chronological,
    /// Runs longest first
    Ranked,
}

impl From<OrderArg> for RunOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Chronological => RunOrder::Chronological,
            OrderArg::Ranked => RunOrder::Ranked,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Minutes,
    Seconds,
}

impl From<UnitArg> for DurationUnit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Minutes => DurationUnit::Minutes,
            UnitArg::Seconds => DurationUnit::Seconds,
        }
    }
}

/// Summary options shared by `summarize` and `digest`.
#[derive(clap::Args)]
struct SummaryArgs {
    /// Order of the run-N columns
    #[arg(long, value_enum, default_value = "chronological")]
    order: OrderArg,

    /// Duration unit
    #[arg(long, value_enum)]
    unit: Option<UnitArg>,

    /// Timestamp format (chrono strftime syntax)
    #[arg(long)]
    format: Option<String>,

    /// Keep negative durations instead of clamping them to zero
    #[arg(long)]
    no_clamp: bool,

    /// Sort rows by total duration, largest first
    #[arg(long)]
    by_total: bool,
}

impl SummaryArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(unit) = self.unit {
            config.summary.duration_unit = unit.into();
        }
        if let Some(format) = &self.format {
            config.summary.timestamp_format = format.clone();
        }
        if self.no_clamp {
            config.summary.clamp_negative_durations = false;
        }
        if self.by_total {
            config.summary.row_order = RowOrder::TotalDescending;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract test records from every HTML report under a folder
    Extract {
        /// Folder to scan
        dir: PathBuf,

        /// Output CSV (default: <dir>/test_run_details.csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Skip reports listed in the processed-files log
        #[arg(long)]
        incremental: bool,
    },

    /// Summarize per-test durations from a run-details CSV
    Summarize {
        /// Run-details CSV
        input: PathBuf,

        /// Output CSV (default: test_duration_summary.csv next to the input)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the summary as JSON instead of writing a CSV
        #[arg(long, conflicts_with = "output")]
        json: bool,

        #[command(flatten)]
        summary: SummaryArgs,
    },

    /// Extract, summarize and tally statuses for a report folder
    Digest {
        /// Folder to scan; outputs are written here
        dir: PathBuf,

        /// Skip reports listed in the processed-files log
        #[arg(long)]
        incremental: bool,

        #[command(flatten)]
        summary: SummaryArgs,
    },

    /// Split pipe-delimited design steps into description/expected columns
    SplitSteps {
        /// Input CSV
        input: PathBuf,

        /// Output CSV (default: <input stem>_steps.csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Column holding the pipe-delimited steps
        #[arg(long)]
        column: Option<String>,

        /// Fold every row into a single consolidated row
        #[arg(long)]
        consolidate: bool,
    },

    /// Print count, total, mean, shortest and longest duration per test
    Stats {
        /// Run-details CSV
        input: PathBuf,

        /// Also write the table to this CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn default_steps_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "steps".to_string());
    input.with_file_name(format!("{stem}_steps.csv"))
}

fn print_written(report: &FlowReport) {
    for path in &report.written {
        println!("Saved: {}", path.display());
    }
}

fn print_summary(outcome: &SummaryOutcome) {
    match outcome {
        SummaryOutcome::Summarized(report) => {
            let d = &report.diagnostics;
            println!(
                "Summarized {} test(s) from {} record(s) ({} dropped, {} clamped, durations in {})",
                report.summaries.len(),
                d.accepted,
                d.dropped_total(),
                d.clamped,
                report.unit.label()
            );
        }
        SummaryOutcome::NoData(d) => {
            println!("No valid test data: {} record(s) read, none usable.", d.total);
            for (reason, count) in &d.dropped {
                println!("  {:<4} {}", count, reason);
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.log_json {
        config.logging.json = true;
    }
    init_tracing(&config.logging.level, config.logging.json);

    match cli.command {
        Commands::Extract {
            dir,
            output,
            incremental,
        } => {
            if incremental {
                config.scan.reprocess_all = false;
            }
            tracing::info!(dir = %dir.display(), incremental, "Extracting reports");
            let report = runner::extract_folder(&dir, output.as_deref(), &config)?;
            if report.written.is_empty() {
                println!("No new test records found.");
            }
            if let Some(scan) = &report.scan {
                println!(
                    "{} report(s) parsed, {} skipped, {} failed, {} record(s).",
                    scan.parsed.len(),
                    scan.skipped,
                    scan.failures.len(),
                    scan.records.len()
                );
            }
            print_written(&report);
        }
        Commands::Summarize {
            input,
            output,
            json,
            summary,
        } => {
            summary.apply(&mut config);
            let order: RunOrder = summary.order.into();
            tracing::info!(input = %input.display(), ?order, "Summarizing durations");

            if json {
                let records = extentdigest::table::read_records(&input, &config.columns)?;
                let outcome = extentdigest::summarize(&records, &config.summary, order);
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let report = runner::summarize_file(&input, output.as_deref(), order, &config)?;
                if let Some(outcome) = &report.summary {
                    print_summary(outcome);
                }
                print_written(&report);
            }
        }
        Commands::Digest {
            dir,
            incremental,
            summary,
        } => {
            if incremental {
                config.scan.reprocess_all = false;
            }
            summary.apply(&mut config);
            tracing::info!(dir = %dir.display(), "Digesting report folder");
            let report = runner::digest_folder(&dir, summary.order.into(), &config)?;
            match &report.summary {
                Some(outcome) => print_summary(outcome),
                None => println!("No new test records found."),
            }
            print_written(&report);
        }
        Commands::SplitSteps {
            input,
            output,
            column,
            consolidate,
        } => {
            if let Some(column) = column {
                config.steps.input_column = column;
            }
            let output = output.unwrap_or_else(|| default_steps_output(&input));
            let mode = if consolidate {
                SplitMode::Consolidate
            } else {
                SplitMode::PerRow
            };
            let filled = steps::split_table(&input, &output, &config.steps, mode)?;
            println!("{} row(s) with steps. Saved: {}", filled, output.display());
        }
        Commands::Stats { input, output } => {
            let stats = runner::stats_file(&input, &config)?;
            if stats.is_empty() {
                println!("No valid test data.");
                return Ok(());
            }

            let unit = config.summary.duration_unit.label();
            println!(
                "{:<30} | {:>5} | {:>10} | {:>10} | {:>10} | {:>10}",
                "Test", "Runs", "Total", "Mean", "Shortest", "Longest"
            );
            println!("{}", "-".repeat(30 + 5 + 10 * 4 + 3 * 5));
            for s in &stats {
                println!(
                    "{:<30} | {:>5} | {:>10} | {:>10} | {:>10} | {:>10}",
                    s.test_name, s.runs, s.total, s.mean, s.shortest, s.longest
                );
            }
            println!("(durations in {})", unit);

            if let Some(path) = output {
                extentdigest::table::write_stats(&path, &stats, unit)?;
                println!("Saved: {}", path.display());
            }
        }
    }

    Ok(())
}
