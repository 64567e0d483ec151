//! Interactive loop: one query per line until `exit`, `quit` or EOF.

use tracing::info;

use crate::console::{ConsoleInteraction, read_line};
use crate::dispatch::App;

/// Whether `input` asks to leave the REPL.
fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

pub async fn run(app: &App, ui: &ConsoleInteraction, dry_run: bool) {
    println!();
    println!("  nlcmd v{}", env!("CARGO_PKG_VERSION"));
    println!("  Describe what you want to do in plain language.");
    if dry_run {
        println!("  Dry run: commands are shown but never executed.");
    }
    println!("  Type 'exit' or 'quit' to leave.");
    println!();

    loop {
        let Some(line) = read_line("nlcmd > ") else {
            println!();
            info!("EOF received, exiting");
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit(input) {
            info!("user requested exit");
            break;
        }

        app.process_query(input, ui).await;
    }

    println!("  Goodbye!");
}
