//! The user-facing side of execution.

use std::path::Path;

/// Display and confirmation hooks the engine calls while running an intent.
///
/// Implementations block on user input; the terminal one lives in the CLI.
pub trait Interaction: Send + Sync {
    /// Show the command that is about to run and where.
    fn show_command(&self, command: &str, workspace: &Path);

    /// Ask a yes/no question.  Anything other than an explicit yes is a no.
    fn confirm(&self, question: &str) -> bool;

    /// Ask for a line of free text.  `None` means the user gave up (EOF).
    fn ask(&self, prompt: &str) -> Option<String>;

    /// Show an informational panel: command output, warnings, errors.
    fn notify(&self, title: &str, body: &str);
}
