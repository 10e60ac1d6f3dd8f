//! HTTP handlers

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::agent::{AbortReason, EpisodeOutcome};
use crate::core::TripParams;
use crate::notify::EmailMessage;
use crate::web::page::INDEX_HTML;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub trip: Option<TripParams>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub steps: usize,
    pub episode_id: Uuid,
}

/// Missing fields deserialize as empty and are rejected by validation
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: Option<String>,
}

fn error_response(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    let body = json!({ "error": { "kind": kind, "message": message.into() } });
    (status, Json(body)).into_response()
}

/// GET / - the query and email forms
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(INDEX_HTML.replace("{{DEFAULT_SUBJECT}}", &state.default_subject))
}

/// POST /api/query - run one episode for the query
pub async fn query_api(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Response {
    if req.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "InvalidRequest", "query must not be empty");
    }

    tracing::info!(target: "web::query", query = %req.query, "received travel query");

    match state.agent.run_episode(&req.query, req.trip.as_ref()).await {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => {
            tracing::error!(target: "web::query", error = %e, "episode failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.kind(), e.to_string())
        }
    }
}

fn outcome_response(outcome: EpisodeOutcome) -> Response {
    let reason = match outcome.abort_reason() {
        None => {
            let response = QueryResponse {
                answer: outcome.final_answer.unwrap_or_default(),
                steps: outcome.steps,
                episode_id: outcome.id,
            };
            return Json(response).into_response();
        }
        Some(reason) => reason,
    };

    let status = match reason {
        AbortReason::StepLimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AbortReason::ReasoningUnavailable { .. } | AbortReason::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    error_response(status, reason.kind(), reason.to_string())
}

/// POST /api/email - send text (usually the last answer) by email
pub async fn email_api(State(state): State<AppState>, Json(req): Json<EmailRequest>) -> Response {
    let Some(mailer) = state.mailer else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "EmailNotConfigured",
            "Email delivery is not configured on this server",
        );
    };

    let mut message = EmailMessage::new(req.recipient, req.subject, req.body);
    if let Some(sender) = req.sender.filter(|s| !s.trim().is_empty()) {
        message = message.with_sender(sender);
    }

    if let Err(e) = message.validate() {
        return error_response(StatusCode::BAD_REQUEST, e.kind(), e.to_string());
    }

    match mailer.send(&message).await {
        Ok(()) => Json(json!({ "status": "sent" })).into_response(),
        Err(e) => {
            tracing::error!(target: "web::email", error = %e, "email delivery failed");
            error_response(StatusCode::BAD_GATEWAY, e.kind(), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, Decision, ReasoningStep};
    use crate::core::{Config, Message, Result, ToolDefinition};
    use crate::notify::EmailSender;
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    struct Answer(&'static str);

    #[async_trait]
    impl ReasoningStep for Answer {
        async fn decide(&self, _t: &[Message], _tools: &[ToolDefinition]) -> Result<Decision> {
            Ok(Decision::FinalAnswer(self.0.to_string()))
        }
    }

    #[derive(Default)]
    struct Outbox(Mutex<Vec<EmailMessage>>);

    #[async_trait]
    impl EmailSender for Outbox {
        async fn send(&self, message: &EmailMessage) -> Result<()> {
            self.0.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn state(mailer: Option<Arc<dyn EmailSender>>) -> AppState {
        let config = Config::default();
        let agent = Agent::new(
            &config,
            Arc::new(Answer("Fly on Delta for $120")),
            Arc::new(ToolRegistry::new()),
        );
        AppState::new(Arc::new(agent), mailer, &config)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_answer() {
        let response = query_api(
            State(state(None)),
            Json(QueryRequest {
                query: "flights NYC to LA".into(),
                trip: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "Fly on Delta for $120");
        assert_eq!(body["steps"], 1);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let response = query_api(
            State(state(None)),
            Json(QueryRequest {
                query: "  ".into(),
                trip: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["kind"], "InvalidRequest");
    }

    #[tokio::test]
    async fn test_email_requires_all_fields() {
        let outbox = Arc::new(Outbox::default());
        let response = email_api(
            State(state(Some(outbox.clone() as Arc<dyn EmailSender>))),
            Json(EmailRequest {
                body: "answer".into(),
                recipient: "you@example.com".into(),
                subject: String::new(),
                sender: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(outbox.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_email_sent() {
        let outbox = Arc::new(Outbox::default());
        let response = email_api(
            State(state(Some(outbox.clone() as Arc<dyn EmailSender>))),
            Json(EmailRequest {
                body: "answer".into(),
                recipient: "you@example.com".into(),
                subject: "Trip".into(),
                sender: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(outbox.0.lock().unwrap()[0].recipient, "you@example.com");
    }

    #[tokio::test]
    async fn test_email_not_configured() {
        let response = email_api(
            State(state(None)),
            Json(EmailRequest {
                body: "answer".into(),
                recipient: "you@example.com".into(),
                subject: "Trip".into(),
                sender: None,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
