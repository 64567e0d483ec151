//! CLI argument definitions for nlcmd.

use clap::Parser;

/// nlcmd -- natural language to shell commands.
#[derive(Debug, Parser)]
#[command(
    name = "nlcmd",
    version,
    about = "nlcmd -- translate natural language into shell commands",
    long_about = "Describe what you want in plain language. nlcmd asks a language model for a \
                  command, shows it, and runs it in the workspace after you confirm."
)]
pub struct Cli {
    /// The natural language request to execute.
    pub query: Vec<String>,

    /// Keep prompting for requests after the first one.
    #[arg(short, long)]
    pub interactive: bool,

    /// Show commands without executing them.
    #[arg(short, long)]
    pub dry_run: bool,
}

impl Cli {
    /// The positional words joined into one request, if any were given.
    pub fn query(&self) -> Option<String> {
        let query = self.query.join(" ");
        let query = query.trim();
        (!query.is_empty()).then(|| query.to_owned())
    }
}
