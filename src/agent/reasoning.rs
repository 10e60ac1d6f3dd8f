//! Reasoning step - one model call per decision
//!
//! The orchestrator only sees the `ReasoningStep` trait, so tests can drive
//! the loop with scripted decisions instead of a live model.

use async_trait::async_trait;
use chrono::{Datelike, Local};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::core::{Config, ItineraError, Message, Result, ToolCall, ToolDefinition};
use crate::llm::{GenerateOptions, LLMProvider};

/// What the model wants to do next
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Stop and answer the user
    FinalAnswer(String),
    /// Run these tools, then ask again
    ///
    /// Requests in one decision are independent of each other. `content` is
    /// any text the model sent alongside the calls.
    ToolRequests {
        calls: Vec<ToolCall>,
        content: String,
    },
}

/// One call to the model with the transcript and tool schemas
#[async_trait]
pub trait ReasoningStep: Send + Sync {
    /// Decide the next move.
    ///
    /// Transient model failures are reported as
    /// `ItineraError::ReasoningUnavailable`. Tool names are not checked here.
    async fn decide(&self, transcript: &[Message], tools: &[ToolDefinition]) -> Result<Decision>;
}

/// Instructions given to the model ahead of every transcript
pub fn travel_system_prompt(current_year: i32) -> String {
    format!(
        r#"You are a smart travel agency. Use the tools to look up information.
You are allowed to make multiple tool calls in one turn, but each call must be answerable on its own.
Only look up information when you are sure of what you want.
The current year is {current_year}. If you don't get flights, adjust the search and try again.
If you need to look up some information before asking a follow up question, you are allowed to do that.
In your output, include links to hotel websites and flight websites (if available),
the logo of the hotel and the logo of the airline company (if available),
and always include both the price of the flight and the price of the hotel (with currency).
For example, for hotels:
    Rate: $581 per night
    Total: $3,488"#
    )
}

/// `ReasoningStep` backed by an LLM provider
pub struct LlmReasoner {
    provider: Arc<dyn LLMProvider>,
    model: String,
    system_prompt: String,
    temperature: f32,
    timeout: Duration,
}

impl LlmReasoner {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: travel_system_prompt(Local::now().year()),
            temperature: 0.1,
            timeout: Duration::from_secs(90),
        }
    }

    /// Build from the `llm` and `agent` config sections
    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &Config) -> Self {
        let mut reasoner = Self::new(provider, config.llm.model.clone())
            .with_timeout(config.reasoning_timeout());
        reasoner.temperature = config.agent.temperature;
        if let Some(ref prompt) = config.agent.system_prompt {
            reasoner.system_prompt = prompt.clone();
        }
        reasoner
    }

    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Prepend the system prompt to the episode transcript
    fn build_messages(&self, transcript: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(transcript.iter().cloned());
        messages
    }
}

#[async_trait]
impl ReasoningStep for LlmReasoner {
    async fn decide(&self, transcript: &[Message], tools: &[ToolDefinition]) -> Result<Decision> {
        let messages = self.build_messages(transcript);
        let options = GenerateOptions {
            temperature: Some(self.temperature),
            ..Default::default()
        };

        let call = self
            .provider
            .chat_with_tools(&self.model, &messages, tools, Some(options));

        let response = match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                return Err(ItineraError::reasoning_unavailable(format!(
                    "model call timed out after {:?}",
                    self.timeout
                )))
            }
            Ok(Err(e)) if e.is_transient() && !matches!(e, ItineraError::ReasoningUnavailable(_)) => {
                return Err(ItineraError::reasoning_unavailable(e.to_string()))
            }
            Ok(result) => result?,
        };

        debug!(
            model = %response.model,
            tool_calls = response.tool_calls.len(),
            content_len = response.content.len(),
            "model decided"
        );

        if response.tool_calls.is_empty() {
            Ok(Decision::FinalAnswer(response.content))
        } else {
            Ok(Decision::ToolRequests {
                calls: response.tool_calls,
                content: response.content,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::llm::LLMResponse;
    use serde_json::json;
    use std::sync::Mutex;

    /// Provider returning canned responses and recording what it was sent
    struct Canned {
        responses: Mutex<Vec<Result<LLMResponse>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl Canned {
        fn new(responses: Vec<Result<LLMResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    fn response(content: &str, tool_calls: Vec<ToolCall>) -> LLMResponse {
        LLMResponse {
            content: content.to_string(),
            tool_calls,
            usage: None,
            model: "test".to_string(),
        }
    }

    #[async_trait]
    impl LLMProvider for Canned {
        async fn chat_with_tools(
            &self,
            _model: &str,
            messages: &[Message],
            _tools: &[ToolDefinition],
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.responses.lock().unwrap().remove(0)
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec!["test".to_string()])
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_system_prompt_mentions_year() {
        let prompt = travel_system_prompt(2026);
        assert!(prompt.contains("The current year is 2026"));
        assert!(prompt.contains("with currency"));
    }

    #[tokio::test]
    async fn test_final_answer_and_system_prompt() {
        let provider = Canned::new(vec![Ok(response("Cheapest is $120", vec![]))]);
        let reasoner = LlmReasoner::new(provider.clone(), "test").with_system_prompt("be brief");

        let decision = reasoner
            .decide(&[Message::user("flights")], &[])
            .await
            .unwrap();
        assert_eq!(decision, Decision::FinalAnswer("Cheapest is $120".to_string()));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][0].content, "be brief");
        assert_eq!(seen[0].len(), 2);
    }

    #[tokio::test]
    async fn test_tool_requests_passed_through() {
        let call = ToolCall::new("c1", "car_rental", json!({}));
        let provider = Canned::new(vec![Ok(response("Checking cars", vec![call.clone()]))]);
        let reasoner = LlmReasoner::new(provider, "test");

        let decision = reasoner.decide(&[Message::user("car")], &[]).await.unwrap();
        assert_eq!(
            decision,
            Decision::ToolRequests {
                calls: vec![call],
                content: "Checking cars".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_errors_keep_their_class() {
        let provider = Canned::new(vec![
            Err(ItineraError::reasoning_unavailable("429")),
            Err(ItineraError::provider("bad request")),
        ]);
        let reasoner = LlmReasoner::new(provider, "test");

        let err = reasoner.decide(&[], &[]).await.unwrap_err();
        assert!(matches!(err, ItineraError::ReasoningUnavailable(_)));

        let err = reasoner.decide(&[], &[]).await.unwrap_err();
        assert!(matches!(err, ItineraError::Provider(_)));
    }

    struct Stalled;

    #[async_trait]
    impl LLMProvider for Stalled {
        async fn chat_with_tools(
            &self,
            _model: &str,
            _messages: &[Message],
            _tools: &[ToolDefinition],
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(response("late", vec![]))
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_timeout_is_reasoning_unavailable() {
        let reasoner =
            LlmReasoner::new(Arc::new(Stalled), "test").with_timeout(Duration::from_millis(20));
        let err = reasoner.decide(&[], &[]).await.unwrap_err();
        assert!(matches!(err, ItineraError::ReasoningUnavailable(_)));
    }
}
