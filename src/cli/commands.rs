//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use std::sync::Arc;

use crate::agent::{Agent, EpisodeOutcome};
use crate::cli::repl::Repl;
use crate::core::{Config, Message, Result, Role};
use crate::llm::create_provider;
use crate::notify::EmailMessage;

/// Result of parsing a command
pub enum CommandResult {
    /// Continue processing as a travel query
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, repl: &mut Repl) -> Result<CommandResult> {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "clear" | "reset" => {
            repl.last_outcome = None;
            Ok(CommandResult::Handled("Last answer cleared.".to_string()))
        }

        "models" => {
            let provider = create_provider(&repl.config)?;
            let models = provider.list_models().await?;
            let output = format!(
                "Available models ({}):\n{}\n\nCurrent: {}",
                provider.name(),
                models
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n"),
                repl.config.llm.model
            );
            Ok(CommandResult::Handled(output))
        }

        "set" => handle_set_command(args, repl),

        "status" => Ok(CommandResult::Handled(status_text(repl))),

        "debug" => {
            repl.config.agent.debug = !repl.config.agent.debug;
            Ok(CommandResult::Handled(format!(
                "Debug mode: {}",
                if repl.config.agent.debug { "ON" } else { "OFF" }
            )))
        }

        "transcript" => Ok(CommandResult::Handled(match repl.last_outcome {
            Some(ref outcome) => format_transcript(&outcome.transcript),
            None => "No episode has run yet.".to_string(),
        })),

        "email" => handle_email_command(args, repl).await,

        "config" => {
            if args == "save" {
                let path = repl.config.save()?;
                return Ok(CommandResult::Handled(format!(
                    "Configuration saved to {}",
                    path.display()
                )));
            }
            let mut shown = repl.config.clone();
            shown.llm.api_key = shown.llm.api_key.map(|_| "***".to_string());
            shown.search.api_key = shown.search.api_key.map(|_| "***".to_string());
            shown.email.api_key = shown.email.api_key.map(|_| "***".to_string());
            shown.email.smtp_password = shown.email.smtp_password.map(|_| "***".to_string());
            let toml = toml::to_string_pretty(&shown)
                .unwrap_or_else(|e| format!("# Error rendering config: {}", e));
            Ok(CommandResult::Handled(format!(
                "# {}\n{}",
                Config::config_file().display(),
                toml
            )))
        }

        _ => {
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Handle 'set' subcommands
fn handle_set_command(args: &str, repl: &mut Repl) -> Result<CommandResult> {
    let parts: Vec<&str> = args.splitn(2, ' ').collect();
    let key = parts[0].to_lowercase();
    let value = parts.get(1).map(|s| s.trim()).unwrap_or("");

    if key.is_empty() || value.is_empty() {
        return Ok(CommandResult::Handled(
            "Usage: set <model|steps|retries> <value>\n\
             Examples:\n\
               set model gpt-4o-mini\n\
               set steps 6\n\
               set retries 2"
                .to_string(),
        ));
    }

    let mut config = repl.config.clone();
    match key.as_str() {
        "model" => config.set_model(value),
        "steps" => match value.parse() {
            Ok(steps) => config.agent.max_steps = steps,
            Err(_) => return Ok(CommandResult::Handled(format!("Not a number: {}", value))),
        },
        "retries" => match value.parse() {
            Ok(retries) => config.agent.reasoning_retries = retries,
            Err(_) => return Ok(CommandResult::Handled(format!("Not a number: {}", value))),
        },
        _ => {
            return Ok(CommandResult::Handled(format!(
                "Unknown setting: {}. Available: model, steps, retries",
                key
            )))
        }
    }

    // Rebuild first so an invalid value leaves the running agent untouched
    let agent = Agent::from_config(&config)?;
    repl.agent = Arc::new(agent);
    repl.config = config;
    Ok(CommandResult::Handled(format!("{} set to: {}", key, value)))
}

/// Handle 'email <recipient> [subject]'
async fn handle_email_command(args: &str, repl: &mut Repl) -> Result<CommandResult> {
    let mut parts = args.splitn(2, ' ');
    let recipient = parts.next().unwrap_or("").trim();
    if recipient.is_empty() {
        return Ok(CommandResult::Handled(
            "Usage: email <recipient> [subject]".to_string(),
        ));
    }
    let subject = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(repl.config.email.default_subject.as_str())
        .to_string();

    let Some(answer) = repl
        .last_outcome
        .as_ref()
        .and_then(|o| o.final_answer.clone())
    else {
        return Ok(CommandResult::Handled(
            "No completed answer to send yet.".to_string(),
        ));
    };

    let Some(ref mailer) = repl.mailer else {
        return Ok(CommandResult::Handled(
            "Email is not configured. Set ITINERA_EMAIL_SENDER and GMAIL_APP_PASSWORD \
             (or SENDGRID_API_KEY with ITINERA_EMAIL_TRANSPORT=sendgrid)."
                .to_string(),
        ));
    };

    let message = EmailMessage::new(recipient, subject, answer);
    Ok(CommandResult::Handled(match mailer.send(&message).await {
        Ok(()) => format!("Email sent to {}", recipient),
        Err(e) => format!("Email failed: {}", e),
    }))
}

fn status_text(repl: &Repl) -> String {
    let last = match repl.last_outcome {
        Some(ref outcome) => describe_outcome(outcome),
        None => "none".to_string(),
    };

    format!(
        "Itinera Status:\n\
         ─────────────────────────────\n\
         Provider:  {}\n\
         Model:     {}\n\
         Max steps: {}\n\
         Retries:   {}\n\
         Tools:     {}\n\
         Email:     {}\n\
         Debug:     {}\n\
         Last:      {}",
        repl.config.llm.provider,
        repl.config.llm.model,
        repl.config.agent.max_steps,
        repl.config.agent.reasoning_retries,
        repl.agent.tool_names().join(", "),
        if repl.mailer.is_some() { "configured" } else { "off" },
        if repl.config.agent.debug { "on" } else { "off" },
        last
    )
}

/// One-line summary of an episode
pub fn describe_outcome(outcome: &EpisodeOutcome) -> String {
    match outcome.abort_reason() {
        None => format!("completed in {} steps", outcome.steps),
        Some(reason) => format!("aborted after {} steps ({})", outcome.steps, reason.kind()),
    }
}

/// Render a transcript for the terminal
pub fn format_transcript(transcript: &[Message]) -> String {
    let mut output = String::new();
    for (i, msg) in transcript.iter().enumerate() {
        let body = if msg.tool_calls.is_empty() {
            truncate(&msg.content, 400)
        } else {
            msg.tool_calls
                .iter()
                .map(|c| format!("call {} [{}] {}", c.name, c.id, c.arguments))
                .collect::<Vec<_>>()
                .join("\n     ")
        };
        let label = match (msg.role, msg.tool_call_id.as_deref()) {
            (Role::ToolResult, Some(id)) => format!("tool_result [{}]", id),
            (role, _) => role.to_string(),
        };
        output.push_str(&format!("{:>2}. {}: {}\n", i + 1, label, body));
    }
    output
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Generate help text
fn help_text() -> String {
    r#"Itinera Commands:
─────────────────────────────────────────────
  help, ?                     Show this help message
  exit, quit, q               Exit Itinera
  clear, reset                Forget the last answer
  status                      Show current configuration
  models                      List models offered by the provider
  debug                       Toggle transcript output after each answer
  transcript                  Show the last episode's transcript
  email <to> [subject]        Email the last answer
  config [save]               Show (or save) the configuration

  set model <name>            Set the reasoning model
  set steps <n>               Set the step limit per query
  set retries <n>             Set retries for unavailable models

Anything else is sent to the agent as a travel query.

Keyboard Shortcuts:
  Ctrl+C           Cancel the running query (exit at the prompt)
  Ctrl+D           Exit Itinera
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolCall;
    use serde_json::json;

    #[test]
    fn test_format_transcript() {
        let transcript = vec![
            Message::user("flights NYC to LA"),
            Message::tool_requests(vec![ToolCall::new(
                "c1",
                "flights_finder",
                json!({"departure_airport": "JFK"}),
            )]),
            Message::tool_result("c1", r#"{"status":"ok"}"#),
            Message::assistant("Delta for $120"),
        ];
        let text = format_transcript(&transcript);

        assert!(text.contains(" 1. user: flights NYC to LA"));
        assert!(text.contains("call flights_finder [c1]"));
        assert!(text.contains("tool_result [c1]"));
        assert!(text.contains(" 4. assistant: Delta for $120"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
