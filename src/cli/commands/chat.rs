//! Interactive chat command.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::pipeline::Pipeline;
use crate::state::TurnState;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
pub async fn run_chat(consignees: &[String], intent: &str, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'shipqna doctor' for detailed diagnostics.");
        return Err(e);
    }

    let orchestrator = Orchestrator::new(settings)?;
    let mut chat = ChatSession::new(orchestrator.pipeline()?, consignees.to_vec(), intent);

    println!("\n{}", style("shipqna chat").bold().cyan());
    if !consignees.is_empty() {
        println!("{}", style(format!("Scoped to: {}", consignees.join(", "))).dim());
    }
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            chat.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Searching shipments...");
        let state = chat.send_message(input).await;
        spinner.finish_and_clear();

        println!("\n{} {}\n", style("shipqna:").cyan().bold(), state.answer());
        for error in &state.errors {
            Output::warning(error);
        }
    }

    Ok(())
}

/// Multi-turn conversation over the pipeline.
struct ChatSession {
    pipeline: Pipeline,
    state: TurnState,
}

impl ChatSession {
    fn new(pipeline: Pipeline, consignees: Vec<String>, intent: &str) -> Self {
        Self {
            pipeline,
            state: TurnState::with_random_id()
                .with_consignees(consignees)
                .with_intent(intent),
        }
    }

    /// Start a new conversation with the same scope.
    fn clear_history(&mut self) {
        let fresh = TurnState::with_random_id()
            .with_consignees(self.state.consignee_codes.clone())
            .with_intent(self.state.intent.clone());
        self.state = fresh;
    }

    /// Run one turn and keep the resulting state for the next one.
    async fn send_message(&mut self, user_input: &str) -> &TurnState {
        let state = std::mem::take(&mut self.state);
        self.state = self.pipeline.ask(state, user_input).await;
        debug!(
            "Conversation {} has {} messages",
            self.state.conversation_id,
            self.state.messages.len()
        );
        &self.state
    }
}
