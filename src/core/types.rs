//! Shared types used across Itinera modules
//!
//! Contains message structures, tool definitions, normalized offers and
//! tool invocation results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Provider-facing instructions; never stored in an episode transcript
    System,
    User,
    Assistant,
    ToolResult,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::ToolResult => write!(f, "tool_result"),
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message (empty when the message only carries tool calls)
    pub content: String,
    /// Links a tool result back to the call that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create an assistant message carrying tool requests
    pub fn tool_requests(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::new(Role::Assistant, "")
        }
    }

    /// Create a tool result message answering `tool_call_id`
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::ToolResult, content)
        }
    }

    /// Whether this is an assistant message requesting tools
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier linking this call to its result
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool call with a freshly generated id
    pub fn generate_id(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::new(
            format!("call_{}", uuid::Uuid::new_v4().simple()),
            name,
            arguments,
        )
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// A normalized flight or hotel offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Airline(s) or hotel name
    pub provider: String,
    /// Total price (flight) or lowest nightly rate (hotel)
    pub price: f64,
    /// ISO currency code
    pub currency: String,
    /// Short human-readable summary (route, duration, rating ...)
    pub description: String,
    /// Booking or property page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Airline or hotel logo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// Sort offers by ascending price
pub fn sort_by_price(offers: &mut [Offer]) {
    offers.sort_by(|a, b| a.price.total_cmp(&b.price));
}

/// Successful tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "offers", rename_all = "snake_case")]
pub enum ToolPayload {
    Flights(Vec<Offer>),
    Hotels(Vec<Offer>),
}

impl ToolPayload {
    /// Offers in this payload
    pub fn offers(&self) -> &[Offer] {
        match self {
            ToolPayload::Flights(offers) | ToolPayload::Hotels(offers) => offers,
        }
    }

    /// Order the offers cheapest first
    pub fn sort_by_price(&mut self) {
        match self {
            ToolPayload::Flights(offers) | ToolPayload::Hotels(offers) => sort_by_price(offers),
        }
    }

    /// Cheapest offer, if any
    pub fn cheapest(&self) -> Option<&Offer> {
        self.offers()
            .iter()
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    fn kind(&self) -> &'static str {
        match self {
            ToolPayload::Flights(_) => "flights",
            ToolPayload::Hotels(_) => "hotels",
        }
    }
}

/// Category of a tool failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    UnknownTool,
    InvalidArguments,
    ExecutionFailed,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::UnknownTool => write!(f, "UnknownTool"),
            FailureKind::InvalidArguments => write!(f, "InvalidArguments"),
            FailureKind::ExecutionFailed => write!(f, "ExecutionFailed"),
        }
    }
}

/// Failure descriptor for a tool invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of executing one tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocationResult {
    Success(ToolPayload),
    Failure(ToolFailure),
}

impl ToolInvocationResult {
    /// Create a failed result
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(ToolFailure {
            kind,
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Failure kind, if this is a failure
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failure(f) => Some(f.kind),
            Self::Success(_) => None,
        }
    }

    /// Serialized form placed in the transcript for the model to read
    pub fn to_content(&self) -> String {
        let value = match self {
            Self::Success(payload) => json!({
                "status": "ok",
                "kind": payload.kind(),
                "count": payload.offers().len(),
                "offers": payload.offers(),
            }),
            Self::Failure(failure) => json!({
                "status": "error",
                "kind": failure.kind.to_string(),
                "message": failure.message,
            }),
        };
        value.to_string()
    }
}

/// Optional structured trip parameters supplied alongside a free-text query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripParams {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub departure_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub hotel_class: Option<u8>,
}

impl TripParams {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Render the parameters as extra lines for the user message
    pub fn to_prompt_context(&self) -> String {
        let mut lines = Vec::new();
        if let Some(ref origin) = self.origin {
            lines.push(format!("- Origin: {}", origin));
        }
        if let Some(ref destination) = self.destination {
            lines.push(format!("- Destination: {}", destination));
        }
        if let Some(date) = self.departure_date {
            lines.push(format!("- Departure date: {}", date.format("%Y-%m-%d")));
        }
        if let Some(date) = self.return_date {
            lines.push(format!("- Return date: {}", date.format("%Y-%m-%d")));
        }
        if let Some(adults) = self.adults {
            lines.push(format!("- Adults: {}", adults));
        }
        if let Some(class) = self.hotel_class {
            lines.push(format!("- Hotel class: {} stars", class));
        }

        if lines.is_empty() {
            String::new()
        } else {
            format!("Trip details:\n{}", lines.join("\n"))
        }
    }

    /// Combine a free-text query with these parameters into one user message
    pub fn apply_to(&self, query: &str) -> String {
        let context = self.to_prompt_context();
        if context.is_empty() {
            query.to_string()
        } else {
            format!("{}\n\n{}", query.trim(), context)
        }
    }
}
