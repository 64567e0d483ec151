//! Shared helper functions: tracing setup, environment access, interrupt
//! handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Read a non-empty environment variable, returning `None` if unset or empty.
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Print an error about the missing API key and exit.
pub fn exit_no_key() -> ! {
    eprintln!();
    eprintln!("  Error: OPENAI_API_KEY is not set.");
    eprintln!("  Set it in a .env file or in your environment:");
    eprintln!("    export OPENAI_API_KEY=...");
    eprintln!();
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// Interrupts
// ---------------------------------------------------------------------------

/// Exit on Ctrl+C unless `busy` is set.
///
/// `busy` is the engine's running flag.  While a command runs, the engine
/// owns the interrupt: it kills the child and removes temporary files, and
/// the session continues.  At any prompt Ctrl+C exits.
pub fn spawn_interrupt_watcher(busy: Arc<AtomicBool>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if busy.load(Ordering::SeqCst) {
                continue;
            }
            eprintln!("\n  Interrupted. Goodbye!");
            std::process::exit(0);
        }
    });
}
