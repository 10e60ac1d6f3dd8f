//! OpenAI-compatible chat completions client
//!
//! Works against api.openai.com and any server exposing the same
//! `/chat/completions` tool-calling contract.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::core::{Config, ItineraError, Message, Result, Role, ToolCall, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

fn function_type() -> String {
    "function".to_string()
}

/// Arguments travel as a JSON-encoded string
#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    id: String,
}

impl OpenAiProvider {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            api_key: config.llm.api_key.clone(),
        })
    }

    fn to_wire_message(msg: &Message) -> WireMessage {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool",
        };

        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| WireToolCall {
                        id: tc.id.clone(),
                        call_type: function_type(),
                        function: WireFunction {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect(),
            )
        };

        // Assistant tool-call messages carry null content on the wire
        let content = if msg.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(msg.content.clone())
        };

        WireMessage {
            role: role.to_string(),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    fn to_tool_call(call: WireToolCall) -> ToolCall {
        // Malformed argument JSON is passed through as a string; the
        // dispatcher reports it back to the model as invalid arguments.
        let arguments = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments));

        if call.id.is_empty() {
            ToolCall::generate_id(call.function.name, arguments)
        } else {
            ToolCall::new(call.id, call.function.name, arguments)
        }
    }

    fn to_llm_response(response: ChatResponse) -> Result<LLMResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ItineraError::provider("Response contained no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(Self::to_tool_call)
            .collect();

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model: response.model,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

/// Map a failed HTTP status to the error taxonomy
fn status_error(status: StatusCode, body: &str, model: &str) -> ItineraError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ItineraError::reasoning_unavailable(format!("OpenAI API error ({}): {}", status, body))
    } else if status == StatusCode::NOT_FOUND && body.contains("model") {
        ItineraError::ModelNotFound(model.to_string())
    } else {
        ItineraError::provider(format!("OpenAI API error ({}): {}", status, body))
    }
}

fn send_error(e: reqwest::Error, base_url: &str) -> ItineraError {
    if e.is_timeout() {
        ItineraError::reasoning_unavailable("Model request timed out")
    } else if e.is_connect() {
        ItineraError::reasoning_unavailable(format!("Cannot connect to {}", base_url))
    } else {
        ItineraError::from(e)
    }
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let request = ChatRequest {
            model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            tools: if tools.is_empty() { None } else { Some(tools) },
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!(model, messages = messages.len(), tools = tools.len(), "chat completion request");

        let response = self
            .request(self.client.post(format!("{}/chat/completions", self.base_url)))
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error(e, &self.base_url))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| send_error(e, &self.base_url))?;

        if !status.is_success() {
            return Err(status_error(status, &body, model));
        }

        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ItineraError::provider(format!("Failed to parse response: {}", e)))?;

        Self::to_llm_response(chat_response)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .request(self.client.get(format!("{}/models", self.base_url)))
            .send()
            .await
            .map_err(|e| send_error(e, &self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body, ""));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_request_message_conversion() {
        let msg = Message::tool_requests(vec![ToolCall::new(
            "call_1",
            "flights_finder",
            json!({"departure_airport": "JFK"}),
        )]);
        let wire = OpenAiProvider::to_wire_message(&msg);

        assert_eq!(wire.role, "assistant");
        assert!(wire.content.is_none());
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.arguments, r#"{"departure_airport":"JFK"}"#);
    }

    #[test]
    fn test_tool_result_message_conversion() {
        let wire = OpenAiProvider::to_wire_message(&Message::tool_result("call_1", "{}"));
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_response_parsing() {
        let response: ChatResponse = serde_json::from_value(json!({
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_a", "type": "function", "function": {"name": "hotels_finder", "arguments": "{\"q\":\"Paris\"}"}},
                        {"id": "", "type": "function", "function": {"name": "flights_finder", "arguments": "not json"}}
                    ]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        let llm = OpenAiProvider::to_llm_response(response).unwrap();
        assert!(llm.content.is_empty());
        assert_eq!(llm.tool_calls[0].get_string("q").as_deref(), Some("Paris"));
        assert!(llm.tool_calls[1].id.starts_with("call_"));
        assert_eq!(llm.tool_calls[1].arguments, json!("not json"));
        assert_eq!(llm.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_status_classification() {
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, "", "m").is_transient());
        assert!(status_error(StatusCode::BAD_GATEWAY, "", "m").is_transient());
        assert!(!status_error(StatusCode::UNAUTHORIZED, "", "m").is_transient());
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "model not found", "gpt-x"),
            ItineraError::ModelNotFound(_)
        ));
    }
}
