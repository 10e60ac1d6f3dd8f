//! Web front end
//!
//! A single page with a query form and an email form, backed by a small JSON
//! API. One `Agent` is shared by all requests; each request runs its own
//! episode.

pub mod handlers;
mod page;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::Agent;
use crate::core::{Config, Result};
use crate::notify::EmailSender;

/// Shared state for the handlers
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
    /// `None` when no email transport is configured
    pub mailer: Option<Arc<dyn EmailSender>>,
    pub default_subject: String,
}

impl AppState {
    pub fn new(agent: Arc<Agent>, mailer: Option<Arc<dyn EmailSender>>, config: &Config) -> Self {
        Self {
            agent,
            mailer,
            default_subject: config.email.default_subject.clone(),
        }
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/query", post(handlers::query_api))
        .route("/api/email", post(handlers::email_api))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind to the configured address and serve until the process exits
pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "web server listening");
    println!("Itinera web UI running on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
