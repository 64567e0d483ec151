//! Routes each negotiated intent to the engine, the skill runtime or the
//! user.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use nlcmd_agent::{
    ChooseOption, HostContext, LlmClient, LlmClientConfig, Negotiator, ResponsePayload, Session,
};
use nlcmd_exec::{
    ExecOptions, ExecutionEngine, ExecutionOutcome, Interaction, RunningGuard, ShellKind,
};
use nlcmd_skills::{SkillArgs, SkillRuntime};
use tracing::{debug, info};

use crate::config::Settings;
use crate::console::Spinner;

/// Everything one query needs, built once at start-up.
pub struct App {
    negotiator: Negotiator,
    engine: ExecutionEngine,
    runtime: SkillRuntime,
    options: ExecOptions,
    show_reasoning: bool,
    busy: Arc<AtomicBool>,
}

impl App {
    pub fn new(
        negotiator: Negotiator,
        engine: ExecutionEngine,
        runtime: SkillRuntime,
        options: ExecOptions,
        show_reasoning: bool,
    ) -> Self {
        Self {
            busy: engine.running_flag(),
            negotiator,
            engine,
            runtime,
            options,
            show_reasoning,
        }
    }

    /// Wire up the LLM client, negotiator and engine from `settings`.
    pub fn from_settings(settings: &Settings, dry_run: bool) -> Result<Self> {
        let api_key = settings.api_key.clone().unwrap_or_default();
        let config =
            LlmClientConfig::openai_compatible(api_key, &settings.model, &settings.base_url);
        let client = LlmClient::new(config).context("failed to create LLM client")?;

        let workspace =
            std::path::absolute(&settings.workspace).unwrap_or_else(|_| settings.workspace.clone());
        let host = HostContext::detect(&settings.shell, &workspace);
        let runtime = SkillRuntime::new(&settings.skills_dir).with_python(&settings.python);
        let negotiator = Negotiator::new(Arc::new(client), host, &settings.skills_dir);
        let engine = ExecutionEngine::new(
            runtime.clone(),
            ShellKind::detect(&settings.shell),
            workspace,
        );
        let options = ExecOptions {
            dry_run,
            timeout: settings.exec_timeout,
        };

        info!(
            model = %settings.model,
            skills = %settings.skills_dir.display(),
            dry_run,
            "nlcmd initialized"
        );

        Ok(Self::new(
            negotiator,
            engine,
            runtime,
            options,
            settings.show_reasoning,
        ))
    }

    /// Set while a command or tool process runs, never while waiting on the
    /// user; see [`crate::helpers::spawn_interrupt_watcher`].
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.busy)
    }

    /// Negotiate `query` and carry out whatever the planner decides.
    ///
    /// Failures are shown to the user; nothing here ends the session.
    pub async fn process_query(&self, query: &str, ui: &dyn Interaction) {
        let spinner = Spinner::start("Generating command...");
        let started = self.negotiator.start(query).await;
        spinner.stop();

        match started {
            Ok((mut session, payload)) => self.dispatch(&mut session, payload, ui).await,
            Err(e) => ui.notify("Error", &format!("Error generating command: {e}")),
        }
    }

    async fn dispatch(&self, session: &mut Session, first: ResponsePayload, ui: &dyn Interaction) {
        let mut payload = first;
        loop {
            if self.show_reasoning {
                ui.notify("Conversation", &session.transcript());
            }
            debug!(session = %session.id(), status = payload.status(), "dispatching intent");

            match payload {
                ResponsePayload::Execute { command } => {
                    self.execute(&command, ui).await;
                    return;
                }
                ResponsePayload::Choose { options } => {
                    self.choose(&options, ui).await;
                    return;
                }
                ResponsePayload::Clarify { questions } => {
                    let Some(reply) = self.clarify(&questions, ui) else {
                        return;
                    };
                    let spinner = Spinner::start("Generating command...");
                    let next = session.reply(&reply).await;
                    spinner.stop();
                    match next {
                        Ok(next) => payload = next,
                        Err(e) => {
                            ui.notify("Error", &format!("Error generating command: {e}"));
                            return;
                        }
                    }
                }
                ResponsePayload::Tool { tool, args } => {
                    self.use_tool(&tool, &args, ui).await;
                    return;
                }
                ResponsePayload::Error { message } => {
                    ui.notify("Error", &message);
                    return;
                }
            }
        }
    }

    async fn execute(&self, command: &str, ui: &dyn Interaction) {
        match self.engine.run(command, &self.options, ui).await {
            Ok(report) => {
                let title = match &report.outcome {
                    ExecutionOutcome::DryRun => "Dry run",
                    ExecutionOutcome::Cancelled => "Cancelled",
                    ExecutionOutcome::Completed { .. } if report.succeeded() => "Output",
                    ExecutionOutcome::Completed { .. } => "Command failed",
                };
                ui.notify(title, &report.summary());
            }
            Err(e) => ui.notify("Execution error", &e.to_string()),
        }
    }

    async fn choose(&self, options: &[ChooseOption], ui: &dyn Interaction) {
        if options.is_empty() {
            ui.notify("Warning", "The planner offered no candidate commands");
            return;
        }

        let listing = options
            .iter()
            .enumerate()
            .map(|(i, option)| match &option.reason {
                Some(reason) if !reason.is_empty() => {
                    format!("{}. {}  ({reason})", i + 1, option.cmd)
                }
                _ => format!("{}. {}", i + 1, option.cmd),
            })
            .collect::<Vec<_>>()
            .join("\n");
        ui.notify("Candidate commands", &listing);

        let Some(answer) = ui.ask("Select a number (or 'c' to cancel): ") else {
            return;
        };
        let answer = answer.trim();
        if answer.eq_ignore_ascii_case("c") {
            ui.notify("Cancelled", "Selection cancelled");
            return;
        }

        let Ok(index) = answer.parse::<usize>() else {
            ui.notify("Warning", &format!("`{answer}` is not a number"));
            return;
        };
        let Some(option) = index.checked_sub(1).and_then(|i| options.get(i)) else {
            ui.notify("Warning", &format!("No option numbered {index}"));
            return;
        };
        if option.cmd.trim().is_empty() {
            ui.notify("Warning", "The selected option has no command");
            return;
        }

        self.execute(&option.cmd, ui).await;
    }

    /// Show the questions and collect the reply.  `None` ends the round; an
    /// empty question list only warns.
    fn clarify(&self, questions: &[String], ui: &dyn Interaction) -> Option<String> {
        if questions.is_empty() {
            ui.notify("Warning", "The planner needs more information but asked nothing");
            return None;
        }

        let listing = questions
            .iter()
            .map(|q| format!("- {q}"))
            .collect::<Vec<_>>()
            .join("\n");
        ui.notify("More information needed", &listing);

        ui.ask("Your reply: ")
            .map(|reply| reply.trim().to_owned())
            .filter(|reply| !reply.is_empty())
    }

    async fn use_tool(&self, tool: &str, args: &SkillArgs, ui: &dyn Interaction) {
        let rendered = serde_json::to_string(args).unwrap_or_else(|_| "{}".to_owned());
        if !ui.confirm(&format!("Use tool `{tool}` with {rendered}?")) {
            ui.notify("Cancelled", "Tool not used");
            return;
        }
        if self.options.dry_run {
            ui.notify("Dry run", "Dry run: tool not executed");
            return;
        }

        let _running = RunningGuard::new(&self.busy);
        let output = self.runtime.run(tool, args).await;
        ui.notify("Tool output", &output);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
