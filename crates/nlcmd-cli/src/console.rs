//! Terminal implementation of [`Interaction`] and the progress spinner.

use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

use nlcmd_exec::Interaction;
use tokio::task::JoinHandle;

/// Print `prompt` and read one line from stdin.
///
/// Returns `None` on EOF.  The trailing newline is stripped.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read from stdin");
            None
        }
    }
}

/// Interaction over stdin/stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleInteraction;

impl Interaction for ConsoleInteraction {
    fn show_command(&self, command: &str, workspace: &Path) {
        println!();
        println!("  Generated command:");
        for line in command.lines() {
            println!("    {line}");
        }
        println!("  Working directory: {}", workspace.display());
        println!();
    }

    fn confirm(&self, question: &str) -> bool {
        loop {
            let Some(answer) = read_line(&format!("  {question} [y/n]: ")) else {
                println!();
                return false;
            };
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => println!("  Please answer y or n."),
            }
        }
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        read_line(&format!("  {prompt}"))
    }

    fn notify(&self, title: &str, body: &str) {
        println!();
        println!("  [{title}]");
        for line in body.lines() {
            println!("  {line}");
        }
        println!();
    }
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Animated status line on stderr while the planner is thinking.
///
/// Draws nothing when stderr is not a terminal.
pub struct Spinner {
    handle: Option<JoinHandle<()>>,
    width: usize,
}

impl Spinner {
    pub fn start(message: &str) -> Self {
        if !io::stderr().is_terminal() {
            return Self {
                handle: None,
                width: 0,
            };
        }

        let message = message.to_owned();
        let width = message.chars().count() + 4;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(100));
            for frame in FRAMES.iter().cycle() {
                ticker.tick().await;
                eprint!("\r  {frame} {message}");
                io::stderr().flush().ok();
            }
        });

        Self {
            handle: Some(handle),
            width,
        }
    }

    pub fn stop(mut self) {
        self.clear();
    }

    fn clear(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            eprint!("\r{}\r", " ".repeat(self.width));
            io::stderr().flush().ok();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.clear();
    }
}
