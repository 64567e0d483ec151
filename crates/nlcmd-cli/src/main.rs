//! nlcmd: describe a task in plain language, review the shell command a
//! language model proposes for it, and run it in the workspace directory.

mod cli;
mod config;
mod console;
mod dispatch;
mod helpers;
mod repl;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::Cli;
use crate::config::Settings;
use crate::console::ConsoleInteraction;
use crate::dispatch::App;
use crate::helpers::{exit_no_key, init_tracing, spawn_interrupt_watcher};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing("warn");

    let settings = Settings::from_env();
    if settings.api_key.is_none() {
        exit_no_key();
    }

    let app = App::from_settings(&settings, cli.dry_run).context("failed to initialize nlcmd")?;
    let ui = ConsoleInteraction;
    spawn_interrupt_watcher(app.busy_flag());

    if let Some(query) = cli.query() {
        app.process_query(&query, &ui).await;
        if !cli.interactive {
            return Ok(());
        }
    }

    repl::run(&app, &ui, cli.dry_run).await;
    Ok(())
}
