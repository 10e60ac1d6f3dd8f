//! Conversation state for a single episode
//!
//! Holds the ordered transcript and enforces that every tool result answers
//! exactly one earlier, still-open tool call.

use std::collections::HashSet;
use tracing::debug;

use crate::core::{ItineraError, Message, Result, Role, ToolCall, ToolInvocationResult};

/// A tool call together with the structured result it produced
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub call: ToolCall,
    pub result: ToolInvocationResult,
}

/// Transcript of one episode
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Message history, oldest first
    messages: Vec<Message>,
    /// Every tool call requested so far, in request order
    requested: Vec<ToolCall>,
    requested_ids: HashSet<String>,
    answered_ids: HashSet<String>,
    /// Structured results accumulated from the dispatcher
    results: Vec<ToolOutcome>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation with the user's query
    pub fn with_user_query(query: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.messages.push(Message::user(query));
        conversation
    }

    /// Append a message
    ///
    /// Tool results must reference a requested, unanswered call and assistant
    /// messages may not reuse a call id seen earlier in the episode.
    pub fn append(&mut self, message: Message) -> Result<()> {
        match message.role {
            Role::System => {
                return Err(ItineraError::Other(
                    "system messages are not part of the transcript".to_string(),
                ));
            }
            Role::ToolResult => {
                let id = message
                    .tool_call_id
                    .as_deref()
                    .ok_or_else(|| ItineraError::DanglingToolResult("<missing>".to_string()))?;

                if !self.requested_ids.contains(id) || self.answered_ids.contains(id) {
                    return Err(ItineraError::DanglingToolResult(id.to_string()));
                }
                self.answered_ids.insert(id.to_string());
            }
            Role::Assistant | Role::User => {
                let mut seen = HashSet::new();
                for call in &message.tool_calls {
                    if self.requested_ids.contains(&call.id) || !seen.insert(call.id.as_str()) {
                        return Err(ItineraError::DuplicateToolCallId(call.id.clone()));
                    }
                }
                for call in &message.tool_calls {
                    self.requested_ids.insert(call.id.clone());
                    self.requested.push(call.clone());
                }
            }
        }

        self.messages.push(message);
        Ok(())
    }

    /// Append the tool_result message for `call` and keep its structured result
    pub fn append_tool_result(&mut self, call: &ToolCall, result: ToolInvocationResult) -> Result<()> {
        self.append(Message::tool_result(&call.id, result.to_content()))?;
        self.results.push(ToolOutcome {
            call: call.clone(),
            result,
        });
        Ok(())
    }

    /// Replace call ids that were already used in this episode, or repeated
    /// within `calls`, with fresh ones
    pub fn with_unique_ids(&self, calls: Vec<ToolCall>) -> Vec<ToolCall> {
        let mut seen = HashSet::new();
        calls
            .into_iter()
            .map(|call| {
                if self.requested_ids.contains(&call.id) || !seen.insert(call.id.clone()) {
                    let fresh = ToolCall::generate_id(call.name, call.arguments);
                    debug!(reused = %call.id, fresh = %fresh.id, "reassigned tool call id");
                    seen.insert(fresh.id.clone());
                    fresh
                } else {
                    call
                }
            })
            .collect()
    }

    /// Ordered snapshot of the transcript
    pub fn transcript(&self) -> &[Message] {
        &self.messages
    }

    /// Requested calls that have no tool result yet, in request order
    pub fn pending_tool_calls(&self) -> Vec<ToolCall> {
        self.requested
            .iter()
            .filter(|call| !self.answered_ids.contains(&call.id))
            .cloned()
            .collect()
    }

    /// Ids of the pending calls
    pub fn pending_ids(&self) -> HashSet<String> {
        self.requested_ids
            .difference(&self.answered_ids)
            .cloned()
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.requested_ids.len() > self.answered_ids.len()
    }

    /// Structured results in the order they were appended
    pub fn results(&self) -> &[ToolOutcome] {
        &self.results
    }

    /// Get the last assistant message
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Consume the conversation, returning the transcript and results
    pub fn into_parts(self) -> (Vec<Message>, Vec<ToolOutcome>) {
        (self.messages, self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FailureKind, ToolPayload};
    use serde_json::json;

    fn call(id: &str) -> ToolCall {
        ToolCall::new(id, "flights_finder", json!({}))
    }

    #[test]
    fn test_conversation_basic() {
        let mut conv = Conversation::with_user_query("Hello");
        conv.append(Message::assistant("Hi there!")).unwrap();

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.last_assistant_message().unwrap().content, "Hi there!");
        assert!(!conv.has_pending());
    }

    #[test]
    fn test_pending_tracking() {
        let mut conv = Conversation::with_user_query("flights and hotels");
        conv.append(Message::tool_requests(vec![call("a"), call("b")]))
            .unwrap();

        assert_eq!(conv.pending_ids().len(), 2);
        conv.append_tool_result(&call("b"), ToolInvocationResult::Success(ToolPayload::Flights(vec![])))
            .unwrap();

        let pending = conv.pending_tool_calls();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "a");
        assert_eq!(conv.results().len(), 1);

        conv.append_tool_result(
            &call("a"),
            ToolInvocationResult::failure(FailureKind::ExecutionFailed, "timeout"),
        )
        .unwrap();
        assert!(!conv.has_pending());
        assert!(conv.pending_ids().is_empty());
    }

    #[test]
    fn test_dangling_tool_result_rejected() {
        let mut conv = Conversation::with_user_query("hi");
        let err = conv.append(Message::tool_result("nope", "{}")).unwrap_err();
        assert!(matches!(err, ItineraError::DanglingToolResult(ref id) if id == "nope"));
        assert_eq!(conv.len(), 1);
    }

    #[test]
    fn test_double_answer_rejected() {
        let mut conv = Conversation::with_user_query("hi");
        conv.append(Message::tool_requests(vec![call("a")])).unwrap();
        conv.append(Message::tool_result("a", "{}")).unwrap();

        let err = conv.append(Message::tool_result("a", "{}")).unwrap_err();
        assert!(matches!(err, ItineraError::DanglingToolResult(_)));
    }

    #[test]
    fn test_reused_call_id_rejected() {
        let mut conv = Conversation::with_user_query("hi");
        conv.append(Message::tool_requests(vec![call("a")])).unwrap();
        conv.append(Message::tool_result("a", "{}")).unwrap();

        let err = conv
            .append(Message::tool_requests(vec![call("a")]))
            .unwrap_err();
        assert!(matches!(err, ItineraError::DuplicateToolCallId(_)));

        let err = conv
            .append(Message::tool_requests(vec![call("b"), call("b")]))
            .unwrap_err();
        assert!(matches!(err, ItineraError::DuplicateToolCallId(_)));
        assert!(!conv.has_pending());
    }

    #[test]
    fn test_with_unique_ids_reassigns_reused_ids() {
        let mut conv = Conversation::with_user_query("hi");
        conv.append(Message::tool_requests(vec![call("call_0")])).unwrap();
        conv.append(Message::tool_result("call_0", "{}")).unwrap();

        let calls = conv.with_unique_ids(vec![call("call_0"), call("x"), call("x")]);
        assert_ne!(calls[0].id, "call_0");
        assert_eq!(calls[0].name, "flights_finder");
        assert_eq!(calls[1].id, "x");
        assert_ne!(calls[2].id, "x");

        conv.append(Message::tool_requests(calls)).unwrap();
        assert_eq!(conv.pending_tool_calls().len(), 3);
    }

    #[test]
    fn test_system_message_rejected() {
        let mut conv = Conversation::new();
        assert!(conv.append(Message::system("be nice")).is_err());
        assert!(conv.is_empty());
    }
}
