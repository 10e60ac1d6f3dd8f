//! Itinera - AI Travel Agent
//!
//! Main entry point for the CLI application.

use anyhow::{bail, Context};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use itinera::core::config::ProviderType;
use itinera::notify::{create_mailer, EmailMessage, EmailSender};
use itinera::web::{self, AppState};
use itinera::{Agent, Config, Repl};

/// Itinera - AI Travel Agent
#[derive(Parser, Debug)]
#[command(name = "itinera")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Reasoning model
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Model provider (openai or ollama)
    #[arg(long)]
    provider: Option<String>,

    /// Maximum reasoning steps per query
    #[arg(long)]
    max_steps: Option<usize>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Email the answer to this address (single prompt mode)
    #[arg(long)]
    email_to: Option<String>,

    /// Start the web front end
    #[arg(long)]
    serve: bool,

    /// Port for the web front end
    #[arg(long)]
    port: Option<u16>,

    /// Open the web front end in a browser
    #[arg(long, requires = "serve")]
    open: bool,
}

fn init_tracing(debug: bool, serve: bool) {
    let default_filter = if debug {
        "itinera=debug,tower_http=debug"
    } else if serve {
        "itinera=info,tower_http=info"
    } else {
        "itinera=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn build_mailer(config: &Config) -> Option<Arc<dyn EmailSender>> {
    match create_mailer(&config.email) {
        Ok(mailer) => Some(mailer),
        Err(e) => {
            tracing::debug!(error = %e, "email delivery disabled");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref provider) = args.provider {
        config.set_provider(provider.parse::<ProviderType>()?);
    }

    if let Some(ref model) = args.model {
        config.set_model(model.clone());
    }

    if let Some(max_steps) = args.max_steps {
        config.agent.max_steps = max_steps;
    }

    if let Some(port) = args.port {
        config.server.port = port;
    }

    if args.debug {
        config.agent.debug = true;
    }

    init_tracing(config.agent.debug, args.serve);
    config.validate()?;

    // Web mode
    if args.serve {
        let agent = Arc::new(Agent::from_config(&config)?);
        let state = AppState::new(agent, build_mailer(&config), &config);

        if args.open {
            let url = format!("http://localhost:{}", config.server.port);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                if let Err(e) = webbrowser::open(&url) {
                    tracing::warn!(error = %e, %url, "could not open browser");
                }
            });
        }

        web::serve(&config, state).await?;
        return Ok(());
    }

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let agent = Agent::from_config(&config)?;

        let cancel = CancellationToken::new();
        {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });
        }

        let outcome = agent.run_episode_with_cancel(&prompt, None, &cancel).await?;

        let Some(answer) = outcome.final_answer else {
            let reason = outcome
                .abort_reason()
                .map(|r| format!("{}: {}", r.kind(), r))
                .unwrap_or_default();
            bail!("No answer ({})", reason);
        };
        println!("{}", answer);

        if let Some(recipient) = args.email_to {
            let mailer = create_mailer(&config.email)
                .context("--email-to needs email delivery configured")?;
            let message = EmailMessage::new(recipient, config.email.default_subject.clone(), answer);
            // The answer is already printed; delivery failure is reported on its own
            match mailer.send(&message).await {
                Ok(()) => eprintln!("Email sent to {}", message.recipient),
                Err(e) => eprintln!("Email failed: {}", e),
            }
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config)?;
    repl.run().await?;

    Ok(())
}
