//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use gradesync_core::cleanup::run_cleanup;
use gradesync_core::ical::{IcalConfig, run_ical};
use gradesync_core::pipeline::{ProgressReporter, SyncConfig, run_sync};
use gradesync_shared::{
    Credentials, load_config, materialize_google_token, resolve_calendar_name,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Gradesync — Gradescope assignments in your calendar.
#[derive(Parser)]
#[command(
    name = "gradesync",
    version,
    about = "Sync Gradescope assignments to Google Calendar or an .ics file.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Action to run; defaults to `sync`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape assignments and upsert them into Google Calendar (the default).
    Sync,

    /// Remove previously-synced assignment events from the personal calendar.
    Cleanup,

    /// Scrape assignments and write a subscribable .ics file.
    Ical {
        /// Output path (defaults to the configured ics_path).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "gradesync=info",
        1 => "gradesync=debug",
        _ => "gradesync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Sync) {
        Command::Sync => cmd_sync().await,
        Command::Cleanup => cmd_cleanup().await,
        Command::Ical { out } => cmd_ical(out).await,
    }
}

async fn cmd_sync() -> Result<()> {
    // All environment reads happen here, at the entry point; collaborators
    // receive explicit values.
    let app = load_config()?;
    let credentials = Credentials::from_env()?;
    let calendar_name = resolve_calendar_name(&app);
    let token_path = materialize_google_token()?;

    info!(email = %credentials.email, calendar = %calendar_name, "starting sync");

    let config = SyncConfig {
        app,
        credentials,
        calendar_name,
        token_path,
    };

    let reporter = CliProgress::new();
    let report = run_sync(&config, &reporter).await?;

    println!();
    println!("  Sync completed!");
    println!("  Courses:      {}", report.courses);
    println!("  Assignments:  {}", report.assignments);
    println!("  Created:      {}", report.created);
    println!("  Updated:      {}", report.updated);
    println!("  Skipped:      {}", report.skipped);
    if report.failed > 0 {
        println!("  Failed:       {}", report.failed);
    }
    println!("  Time:         {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_ical(out: Option<PathBuf>) -> Result<()> {
    let app = load_config()?;
    let credentials = Credentials::from_env()?;
    let out_path = out.unwrap_or_else(|| PathBuf::from(&app.output.ics_path));

    info!(email = %credentials.email, "generating calendar file");

    let config = IcalConfig {
        app,
        credentials,
        out_path,
    };

    let reporter = CliProgress::new();
    let report = run_ical(&config, &reporter).await?;

    println!();
    println!("  Calendar file written!");
    println!("  Courses:      {}", report.courses);
    println!("  Assignments:  {}", report.assignments);
    println!("  Events:       {}", report.events_written);
    println!("  Skipped:      {}", report.skipped);
    println!("  Output:       {}", report.out_path.display());
    println!("  Time:         {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_cleanup() -> Result<()> {
    let token_path = materialize_google_token()?;

    let report = run_cleanup(&token_path).await?;

    println!();
    println!("  Cleanup completed!");
    println!("  Scanned:  {}", report.scanned);
    println!("  Deleted:  {}", report.deleted);
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn course_started(&self, short_name: &str, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Processing [{current}/{total}] {short_name}"
        ));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
