//! Itinera - AI Travel Agent
//!
//! Turns a natural-language travel request into flight and hotel searches
//! and a priced recommendation, optionally delivered by email.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, retry and error handling
//! - **LLM**: Provider abstraction with OpenAI-compatible and Ollama clients
//! - **Search**: Flight and hotel search contracts with a SerpAPI client
//! - **Tools**: Tool registry, argument schemas and the travel tools
//! - **Agent**: Conversation state, reasoning step, dispatcher and the
//!   episode state machine
//! - **Notify**: Email delivery
//! - **CLI** / **Web**: REPL and axum front end
//!
//! # Usage
//!
//! ```rust,no_run
//! use itinera::{Agent, Config};
//!
//! #[tokio::main]
//! async fn main() -> itinera::Result<()> {
//!     let agent = Agent::from_config(&Config::load())?;
//!     let outcome = agent
//!         .run_episode("Flights from JFK to LAX on June 1, one-way", None)
//!         .await?;
//!     println!("{}", outcome.final_answer.unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod notify;
pub mod search;
pub mod tools;
pub mod web;

// Re-export commonly used items
pub use agent::{Agent, EpisodeOutcome};
pub use cli::Repl;
pub use core::{Config, ItineraError, Result};
