//! Agent orchestrator
//!
//! Runs the decide/dispatch state machine for one user query at a time.
//! The reasoner and tool registry are injected, so a single `Agent` can be
//! shared across concurrent episodes.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::dispatcher::ToolDispatcher;
use crate::agent::episode::{AbortReason, Episode, EpisodeOutcome, EpisodeState};
use crate::agent::reasoning::{Decision, LlmReasoner, ReasoningStep};
use crate::core::retry::{retry_with_backoff, RetryConfig};
use crate::core::{Config, ItineraError, Message, Result, ToolDefinition, TripParams};
use crate::llm::create_provider;
use crate::search::SerpApiClient;
use crate::tools::ToolRegistry;

/// Main agent that orchestrates the model and the tools
pub struct Agent {
    reasoner: Arc<dyn ReasoningStep>,
    dispatcher: ToolDispatcher,
    /// Tool schemas shown to the model, in registration order
    tools: Vec<ToolDefinition>,
    max_steps: usize,
    retry: RetryConfig,
}

impl Agent {
    /// Create an agent from explicit parts
    pub fn new(
        config: &Config,
        reasoner: Arc<dyn ReasoningStep>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        let tools = registry.definitions();
        Self {
            reasoner,
            dispatcher: ToolDispatcher::new(registry, config.tool_timeout()),
            tools,
            max_steps: config.agent.max_steps,
            retry: RetryConfig::from_retries(
                config.agent.reasoning_retries,
                Duration::from_millis(config.agent.retry_initial_delay_ms),
            ),
        }
    }

    /// Build the model client, search client and tool registry from config
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let provider = create_provider(config)?;
        let reasoner = Arc::new(LlmReasoner::from_config(provider, config));

        let search = Arc::new(SerpApiClient::from_config(&config.search)?);
        let registry = ToolRegistry::travel_defaults(search.clone(), search)?;

        Ok(Self::new(config, reasoner, Arc::new(registry)))
    }

    /// Override the retry policy for reasoning steps
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.dispatcher.registry().names()
    }

    /// Run one episode to completion
    pub async fn run_episode(&self, query: &str, trip: Option<&TripParams>) -> Result<EpisodeOutcome> {
        self.run_episode_with_cancel(query, trip, &CancellationToken::new())
            .await
    }

    /// Run one episode, stopping early if `cancel` fires
    ///
    /// Tool failures and model outages end up in the returned outcome.
    /// `Err` is reserved for broken invariants and non-transient provider
    /// errors.
    pub async fn run_episode_with_cancel(
        &self,
        query: &str,
        trip: Option<&TripParams>,
        cancel: &CancellationToken,
    ) -> Result<EpisodeOutcome> {
        let query = match trip {
            Some(trip) => trip.apply_to(query),
            None => query.to_string(),
        };

        let mut episode = Episode::new(query, self.max_steps);
        info!(episode = %episode.id, max_steps = self.max_steps, "episode started");

        let outcome = loop {
            match episode.state {
                EpisodeState::AwaitingDecision => {
                    if cancel.is_cancelled() {
                        break episode.abort(AbortReason::Cancelled);
                    }
                    if !episode.has_steps_left() {
                        warn!(episode = %episode.id, limit = self.max_steps, "step limit reached");
                        let limit = episode.max_steps;
                        break episode.abort(AbortReason::StepLimitExceeded { limit });
                    }
                    episode.next_step();
                    debug!(episode = %episode.id, step = episode.step, "awaiting decision");

                    let step = tokio::select! {
                        _ = cancel.cancelled() => None,
                        step = self.decide(episode.conversation().transcript()) => Some(step),
                    };
                    let Some(step) = step else {
                        break episode.abort(AbortReason::Cancelled);
                    };

                    match step? {
                        StepResult::Decided(Decision::FinalAnswer(answer)) => {
                            break episode.complete(answer)?
                        }
                        StepResult::Decided(Decision::ToolRequests { calls, content })
                            if calls.is_empty() =>
                        {
                            break episode.complete(content)?
                        }
                        StepResult::Decided(Decision::ToolRequests { calls, content }) => {
                            let calls = episode.conversation().with_unique_ids(calls);
                            info!(
                                episode = %episode.id,
                                step = episode.step,
                                tools = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                                "model requested tools"
                            );
                            let message = Message {
                                content,
                                ..Message::tool_requests(calls)
                            };
                            episode.conversation_mut().append(message)?;
                            episode.state = EpisodeState::DispatchingTools;
                        }
                        StepResult::Unavailable { attempts, message } => {
                            break episode
                                .abort(AbortReason::ReasoningUnavailable { attempts, message })
                        }
                    }
                }
                EpisodeState::DispatchingTools => {
                    let pending = episode.conversation().pending_tool_calls();

                    let results = tokio::select! {
                        _ = cancel.cancelled() => None,
                        results = self.dispatcher.dispatch_all(&pending) => Some(results),
                    };
                    let Some(results) = results else {
                        debug!(episode = %episode.id, abandoned = pending.len(), "dispatch cancelled");
                        break episode.abort(AbortReason::Cancelled);
                    };

                    for (call, result) in pending.iter().zip(results) {
                        episode.conversation_mut().append_tool_result(call, result)?;
                    }
                    episode.state = EpisodeState::AwaitingDecision;
                }
                EpisodeState::Completed | EpisodeState::Aborted => {
                    return Err(ItineraError::Other(
                        "episode already finished".to_string(),
                    ))
                }
            }
        };

        match outcome.abort_reason() {
            None => info!(episode = %outcome.id, steps = outcome.steps, "episode completed"),
            Some(reason) => warn!(
                episode = %outcome.id,
                steps = outcome.steps,
                reason = reason.kind(),
                "episode aborted: {}",
                reason
            ),
        }

        Ok(outcome)
    }

    /// Call the reasoning step, retrying while the model is unavailable
    async fn decide(&self, transcript: &[Message]) -> Result<StepResult> {
        let result = retry_with_backoff(
            &self.retry,
            || self.reasoner.decide(transcript, &self.tools),
            |e| matches!(e, ItineraError::ReasoningUnavailable(_)),
        )
        .await;

        match result {
            Ok(decision) => Ok(StepResult::Decided(decision)),
            Err(e) => match e.last_error {
                ItineraError::ReasoningUnavailable(message) => Ok(StepResult::Unavailable {
                    attempts: e.attempts,
                    message,
                }),
                other => Err(other),
            },
        }
    }
}

/// Result of one reasoning step after retries
enum StepResult {
    Decided(Decision),
    Unavailable { attempts: u32, message: String },
}
