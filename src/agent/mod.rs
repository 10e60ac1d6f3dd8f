//! Agent module - orchestration and conversation management
//!
//! Contains the episode state machine, the reasoning step abstraction and
//! the tool dispatcher it drives.

pub mod conversation;
pub mod dispatcher;
pub mod episode;
pub mod orchestrator;
pub mod reasoning;

pub use conversation::{Conversation, ToolOutcome};
pub use dispatcher::ToolDispatcher;
pub use episode::{AbortReason, EpisodeOutcome, EpisodeState, EpisodeStatus, FALLBACK_ANSWER};
pub use orchestrator::Agent;
pub use reasoning::{travel_system_prompt, Decision, LlmReasoner, ReasoningStep};
