//! HTTP server for ticket webhooks.
//!
//! This layer owns the inbound contract: method and secret checks, payload
//! validation, and mapping flow outcomes onto status codes. Orchestration
//! itself lives in `interaction`.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::{
    base::{
        config::Config,
        types::{REQUIRED_FIELDS, Res, TicketEvent, UpstreamError, WebhookAck},
    },
    interaction,
    service::{hosting::HostingClient, tickets::TicketClient},
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The configuration for the application.
    pub config: Config,
    /// The code-hosting client instance.
    pub hosting: HostingClient,
    /// The ticketing client instance.
    pub tickets: TicketClient,
}

/// Build the HTTP router for the webhook service.
///
/// Routes only accept POST; axum answers other methods with 405.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/implement", post(implement_webhook_handler))
        .route("/webhooks/research", post(research_webhook_handler))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Handle incoming implementation-request webhooks.
async fn implement_webhook_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    let event = match admit(&state.config, &headers, &body, "implement") {
        Ok(event) => event,
        Err(rejection) => return rejection,
    };

    respond(interaction::implement::handle_implement(&event, &state.hosting, &state.tickets).await)
}

/// Handle incoming research-request webhooks.
async fn research_webhook_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    let event = match admit(&state.config, &headers, &body, "research") {
        Ok(event) => event,
        Err(rejection) => return rejection,
    };

    respond(interaction::research::handle_research(&event, &state.hosting, &state.tickets).await)
}

/// Admit or reject a webhook request before any upstream call is made.
fn admit(config: &Config, headers: &HeaderMap, body: &Bytes, flow: &str) -> Result<TicketEvent, (StatusCode, Json<Value>)> {
    // A missing secret header is tolerated; a present one must match.
    if let Some(presented) = headers.get("x-webhook-secret") {
        if presented.to_str().ok() != config.webhook_secret.as_deref() {
            warn!("Rejecting {flow} webhook: secret mismatch");
            return Err((StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid_secret" }))));
        }
    }

    // A body that is not a JSON object fails validation the same way an
    // empty one does.
    let payload: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

    let event = TicketEvent::from_payload(&payload).map_err(|missing| {
        warn!("Rejecting {flow} webhook: missing fields {missing:?}");
        (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing_fields", "required": REQUIRED_FIELDS })))
    })?;

    info!(ticket = %event.issue_key, repo = %event.repo, "Received {flow} webhook");

    Ok(event)
}

/// Map a flow outcome onto the response contract.
///
/// A hosting-API rejection becomes a 502 carrying the upstream body; any
/// other escaped error becomes a 500.
fn respond(result: Res<WebhookAck>) -> (StatusCode, Json<Value>) {
    match result {
        Ok(ack) => (StatusCode::OK, Json(json!(ack))),
        Err(err) => match err.downcast_ref::<UpstreamError>() {
            Some(upstream) => {
                error!("Issue creation failed upstream ({}): {}", upstream.status, upstream.body);
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": "github_request_failed", "details": upstream.body })))
            }
            None => {
                error!("Unexpected error while handling webhook: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal", "message": err.to_string() })))
            }
        },
    }
}
