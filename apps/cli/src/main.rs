//! Gradesync CLI — sync Gradescope assignments into your calendar.
//!
//! Scrapes the account's courses and assignment tables, normalizes due
//! dates, and either upserts Google Calendar events or writes an `.ics` file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
