//! CLI entry point for the airweather correlation pipeline.
//!
//! Provides subcommands for creating the database, loading daily CSV files,
//! running weekly/monthly correlation windows, and exporting stored results.

use airweather::config::AppConfig;
use airweather::ingest::run_ingest;
use airweather::output::{append_results, print_json, print_pretty};
use airweather::pipeline::{PearsonPipeline, PlannedRun, RunSummary, plan_for};
use airweather::store::SqliteStore;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "airweather")]
#[command(
    about = "Weather vs. air-quality correlation over weekly and monthly windows",
    long_about = None
)]
struct Cli {
    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables and seed flags and attribute codes
    InitDb,
    /// Register a city and one of its locations
    AddLocation {
        #[arg(long)]
        city: String,

        #[arg(long)]
        code: String,
    },
    /// Define an active weather/pollutant metric pair
    AddMetric {
        /// Weather attribute code, e.g. suhu_avg
        #[arg(long)]
        weather: String,

        /// Pollutant attribute code, e.g. pm25
        #[arg(long)]
        pollutant: String,
    },
    /// Load a weather CSV and an ISPU CSV for the same city
    Ingest {
        /// Weather file name under INCOMING_DIR
        #[arg(long)]
        weather: String,

        /// ISPU file name under INCOMING_DIR
        #[arg(long)]
        ispu: String,
    },
    /// Trailing week ending at the reference date
    Weekly {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Whole month containing the reference date
    Monthly {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Week-labelled run over explicit bounds
    WeeklyCustom {
        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,

        /// Defaults to the end date
        #[arg(long)]
        processing_date: Option<NaiveDate>,
    },
    /// Run whatever the calendar schedules for the reference date
    Schedule {
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print the plan without touching the database
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Print stored results for a period label
    Results {
        /// e.g. MONTH_202510 or WEEK_2025-10-26_2025-11-01
        #[arg(long)]
        period: String,

        /// Optional CSV file to append the results to
        #[arg(long)]
        csv: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/airweather.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("airweather.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    print_pretty(&config);

    match cli.command {
        Commands::InitDb => {
            let store = open_store(&config)?;
            store.init_schema()?;
            info!(path = %config.database_path.display(), "Database initialised");
        }
        Commands::AddLocation { city, code } => {
            let store = open_store(&config)?;
            let (city_id, location_id) = store.register_location(&city, &code)?;
            info!(city_id, location_id, %code, "Location registered");
        }
        Commands::AddMetric { weather, pollutant } => {
            let store = open_store(&config)?;
            let metric_id = store
                .add_metric(&weather, &pollutant)
                .with_context(|| format!("unknown attribute code in {weather}/{pollutant}"))?;
            info!(metric_id, %weather, %pollutant, "Metric defined");
        }
        Commands::Ingest { weather, ispu } => {
            let mut store = open_store(&config)?;
            let report = run_ingest(
                store.connection_mut(),
                &config.incoming_dir,
                &weather,
                &ispu,
            )?;
            print_json(&report)?;
        }
        Commands::Weekly { today } => {
            let today = today.unwrap_or_else(local_today);
            run_planned(&config, PlannedRun::Weekly { today })?;
        }
        Commands::Monthly { today } => {
            let today = today.unwrap_or_else(local_today);
            run_planned(&config, PlannedRun::Monthly { today })?;
        }
        Commands::WeeklyCustom {
            start,
            end,
            processing_date,
        } => {
            anyhow::ensure!(start <= end, "start {start} is after end {end}");
            let planned = PlannedRun::LeftoverWeekly {
                start,
                end,
                processing_date: processing_date.unwrap_or(end),
            };
            run_planned(&config, planned)?;
        }
        Commands::Schedule { today, dry_run } => {
            let today = today.unwrap_or_else(local_today);
            if dry_run {
                let plan = plan_for(today);
                if plan.is_empty() {
                    warn!(%today, "Nothing scheduled today");
                }
                print_json(&plan)?;
            } else {
                let mut pipeline = open_pipeline(&config)?;
                let summaries = pipeline.run_schedule(today)?;
                let total: usize = summaries.iter().map(|s| s.written).sum();
                info!(%today, runs = summaries.len(), total, "Scheduled runs complete");
                print_json(&summaries)?;
            }
        }
        Commands::Results { period, csv } => {
            let store = open_store(&config)?;
            let results = store.results_for_period(&period)?;
            info!(%period, rows = results.len(), "Stored results loaded");
            print_json(&results)?;
            if let Some(path) = csv {
                append_results(&path, &results)?;
            }
        }
    }

    Ok(())
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))
}

/// Runs one window and prints its summary.
fn run_planned(config: &AppConfig, planned: PlannedRun) -> Result<()> {
    let mut pipeline = open_pipeline(config)?;
    let written = pipeline.run(&planned)?;
    print_json(&RunSummary {
        window: planned.window(),
        written,
    })
}

fn open_pipeline(config: &AppConfig) -> Result<PearsonPipeline<SqliteStore>> {
    Ok(PearsonPipeline::new(
        open_store(config)?,
        config.city_id,
        config.city_agg_location_id,
    ))
}
