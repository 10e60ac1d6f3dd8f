//! Interactive REPL for Itinera
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, EpisodeOutcome};
use crate::cli::commands::{describe_outcome, format_transcript, handle_command, CommandResult};
use crate::core::{Config, Result};
use crate::notify::{create_mailer, EmailSender};

/// What a Ctrl+C should do right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    /// An episode was running and has been cancelled
    Cancelled,
    /// Nothing is running; leave the REPL
    Exit,
}

/// Tracks the running episode so one process-wide Ctrl+C handler can serve
/// the whole session
#[derive(Clone, Default)]
pub(crate) struct Interrupts {
    running: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    /// Register a new episode and return its cancellation token
    pub(crate) fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut running) = self.running.lock() {
            *running = Some(token.clone());
        }
        token
    }

    pub(crate) fn finish(&self) {
        if let Ok(mut running) = self.running.lock() {
            *running = None;
        }
    }

    /// Handle one Ctrl+C
    pub(crate) fn interrupt(&self) -> Interrupt {
        let running = self
            .running
            .lock()
            .ok()
            .and_then(|running| running.as_ref().cloned());
        match running {
            Some(token) => {
                token.cancel();
                Interrupt::Cancelled
            }
            None => Interrupt::Exit,
        }
    }

    /// Listen for Ctrl+C for the rest of the process
    fn watch(&self) {
        let interrupts = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if interrupts.interrupt() == Interrupt::Exit {
                    println!("\nGoodbye!");
                    std::process::exit(0);
                }
            }
        });
    }
}

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    pub(crate) config: Config,
    pub(crate) agent: Arc<Agent>,
    pub(crate) mailer: Option<Arc<dyn EmailSender>>,
    /// Outcome of the most recent query
    pub(crate) last_outcome: Option<EpisodeOutcome>,
    interrupts: Interrupts,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let agent = Arc::new(Agent::from_config(&config)?);
        let mailer = create_mailer(&config.email).ok();

        Ok(Self {
            config,
            agent,
            mailer,
            last_outcome: None,
            interrupts: Interrupts::default(),
        })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();
        self.interrupts.watch();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, self).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::None) => continue,
                Ok(CommandResult::Continue(query)) => self.run_query(&query).await,
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    /// Run one episode; Ctrl+C cancels it without leaving the REPL
    async fn run_query(&mut self, query: &str) {
        let cancel = self.interrupts.begin();

        println!("\n[Itinera] Searching (max {} steps)...", self.agent.max_steps());
        let result = self
            .agent
            .run_episode_with_cancel(query, None, &cancel)
            .await;
        self.interrupts.finish();

        match result {
            Ok(outcome) => {
                match (outcome.final_answer.as_deref(), outcome.abort_reason()) {
                    (Some(answer), _) => println!("\nAssistant:\n{}\n", answer),
                    (None, Some(reason)) => println!("\n[Itinera] Stopped: {}\n", reason),
                    (None, None) => {}
                }
                println!("[Itinera] {}", describe_outcome(&outcome));
                if self.config.agent.debug {
                    println!("\n{}", format_transcript(&outcome.transcript));
                }
                println!();
                self.last_outcome = Some(outcome);
            }
            Err(e) => eprintln!("\nError: {}\n", e),
        }
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!(
            r#"
╔═══════════════════════════════════════════╗
║                                           ║
║   ITINERA                                 ║
║   AI travel agent: flights and hotels     ║
║                                           ║
╚═══════════════════════════════════════════╝
"#
        );
        println!("Provider: {} ({})", self.config.llm.provider, self.config.llm.base_url);
        println!("Model:    {}", self.config.llm.model);
        println!("Tools:    {}", self.agent.tool_names().join(", "));
        println!();
        println!("Commands: help, status, transcript, email, exit");
        println!("─────────────────────────────────────────────");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_cancels_running_episode() {
        let interrupts = Interrupts::default();
        assert_eq!(interrupts.interrupt(), Interrupt::Exit);

        let token = interrupts.begin();
        assert_eq!(interrupts.interrupt(), Interrupt::Cancelled);
        assert!(token.is_cancelled());

        interrupts.finish();
        assert_eq!(interrupts.interrupt(), Interrupt::Exit);
    }

    #[test]
    fn test_each_episode_gets_a_fresh_token() {
        let interrupts = Interrupts::default();
        let first = interrupts.begin();
        interrupts.interrupt();
        interrupts.finish();

        let second = interrupts.begin();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }
}
