//! Episode state management
//!
//! Tracks one bounded run of the decide/dispatch loop: its transcript, step
//! counter and where it is in the state machine.

use std::fmt;
use uuid::Uuid;

use crate::agent::conversation::{Conversation, ToolOutcome};
use crate::core::{Message, Result};

/// Answer used when the model stops without saying anything
pub const FALLBACK_ANSWER: &str =
    "I apologize, but I couldn't put together an answer for this request.";

/// Position in the orchestration state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeState {
    AwaitingDecision,
    DispatchingTools,
    Completed,
    Aborted,
}

/// Why an episode stopped without a final answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The reasoning step ran `limit` times without a final answer
    StepLimitExceeded { limit: usize },
    /// The model stayed unavailable through every retry
    ReasoningUnavailable { attempts: u32, message: String },
    /// The caller cancelled the episode
    Cancelled,
}

impl AbortReason {
    /// Short machine-readable name
    pub fn kind(&self) -> &'static str {
        match self {
            AbortReason::StepLimitExceeded { .. } => "StepLimitExceeded",
            AbortReason::ReasoningUnavailable { .. } => "ReasoningUnavailable",
            AbortReason::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::StepLimitExceeded { limit } => {
                write!(f, "no final answer after {} reasoning steps", limit)
            }
            AbortReason::ReasoningUnavailable { attempts, message } => write!(
                f,
                "the model was unavailable after {} attempts: {}",
                attempts, message
            ),
            AbortReason::Cancelled => write!(f, "the request was cancelled"),
        }
    }
}

/// Terminal status of an episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeStatus {
    Completed,
    Aborted(AbortReason),
}

/// Everything the caller gets back from an episode
#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    pub id: Uuid,
    pub status: EpisodeStatus,
    /// Set only for completed episodes
    pub final_answer: Option<String>,
    /// Full transcript, partial when aborted
    pub transcript: Vec<Message>,
    pub results: Vec<ToolOutcome>,
    /// Number of reasoning steps taken
    pub steps: usize,
}

impl EpisodeOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == EpisodeStatus::Completed
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self.status {
            EpisodeStatus::Aborted(ref reason) => Some(reason),
            EpisodeStatus::Completed => None,
        }
    }
}

/// A running episode, owned by one orchestrator call
#[derive(Debug)]
pub struct Episode {
    pub id: Uuid,
    pub state: EpisodeState,
    /// Reasoning steps taken so far
    pub step: usize,
    pub max_steps: usize,
    conversation: Conversation,
}

impl Episode {
    /// Start an episode from the user's query
    pub fn new(query: impl Into<String>, max_steps: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: EpisodeState::AwaitingDecision,
            step: 0,
            max_steps,
            conversation: Conversation::with_user_query(query),
        }
    }

    /// Whether another reasoning step is allowed
    pub fn has_steps_left(&self) -> bool {
        self.step < self.max_steps
    }

    /// Count a visit to AwaitingDecision
    pub fn next_step(&mut self) {
        self.step += 1;
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    /// Record the final answer and finish
    pub fn complete(mut self, answer: String) -> Result<EpisodeOutcome> {
        let answer = if answer.trim().is_empty() {
            FALLBACK_ANSWER.to_string()
        } else {
            answer
        };
        self.conversation.append(Message::assistant(answer.clone()))?;
        self.state = EpisodeState::Completed;
        Ok(self.finish(EpisodeStatus::Completed, Some(answer)))
    }

    /// Stop without an answer, keeping the partial transcript
    pub fn abort(mut self, reason: AbortReason) -> EpisodeOutcome {
        self.state = EpisodeState::Aborted;
        self.finish(EpisodeStatus::Aborted(reason), None)
    }

    fn finish(self, status: EpisodeStatus, final_answer: Option<String>) -> EpisodeOutcome {
        let (transcript, results) = self.conversation.into_parts();
        EpisodeOutcome {
            id: self.id,
            status,
            final_answer,
            transcript,
            results,
            steps: self.step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_new() {
        let episode = Episode::new("Hello", 10);
        assert_eq!(episode.step, 0);
        assert_eq!(episode.max_steps, 10);
        assert_eq!(episode.state, EpisodeState::AwaitingDecision);
        assert_eq!(episode.conversation().len(), 1);
    }

    #[test]
    fn test_step_budget() {
        let mut episode = Episode::new("Hello", 2);
        assert!(episode.has_steps_left());

        episode.next_step();
        assert!(episode.has_steps_left());

        episode.next_step();
        assert!(!episode.has_steps_left());
    }

    #[test]
    fn test_empty_answer_gets_fallback() {
        let outcome = Episode::new("Hello", 2).complete("  ".to_string()).unwrap();
        assert!(outcome.is_completed());
        assert_eq!(outcome.final_answer.as_deref(), Some(FALLBACK_ANSWER));
        assert_eq!(outcome.transcript.len(), 2);
    }

    #[test]
    fn test_abort_keeps_transcript() {
        let mut episode = Episode::new("Hello", 3);
        episode.next_step();
        let outcome = episode.abort(AbortReason::StepLimitExceeded { limit: 3 });

        assert!(outcome.final_answer.is_none());
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.transcript.len(), 1);
        assert_eq!(outcome.abort_reason().unwrap().kind(), "StepLimitExceeded");
    }
}
