#![cfg(test)]

//! End-to-end tests for the webhook contract.
//!
//! The real axum router is served on a loopback listener with mocked service
//! clients, so every assertion covers the full HTTP surface: status codes,
//! error payloads, and the advisory fields merged into success responses.
//! Steps that must not run (issue creation after a dedup hit, transition and
//! notification after a creation failure) simply get no expectation; calling
//! them would panic the handler and fail the assertions.

use std::sync::Arc;

use async_trait::async_trait;
use handoff_bot::{
    base::{
        config::{Config, ConfigInner},
        types::{CreatedIssue, Res, TicketComment, TicketTransition, UpstreamError, Void},
    },
    server::{AppState, build_router},
    service::{
        hosting::{GenericHostingClient, HostingClient, IssueSearchScope},
        tickets::{GenericTicketClient, TicketClient},
    },
};
use mockall::mock;
use serde_json::{Value, json};

// Mocks.

mock! {
    pub Hosting {}

    #[async_trait]
    impl GenericHostingClient for Hosting {
        async fn find_existing_issue(&self, repo: &str, ticket_key: &str, scope: IssueSearchScope) -> Res<Option<u64>>;
        async fn create_issue(&self, repo: &str, title: &str, body: &str, labels: &'static [&'static str]) -> Res<CreatedIssue>;
    }
}

mock! {
    pub Tickets {}

    #[async_trait]
    impl GenericTicketClient for Tickets {
        async fn list_comments(&self, ticket_key: &str) -> Res<Vec<TicketComment>>;
        async fn available_transitions(&self, ticket_key: &str) -> Res<Vec<TicketTransition>>;
        async fn apply_transition(&self, ticket_key: &str, transition_id: &str) -> Void;
        async fn post_comment(&self, ticket_key: &str, text: &str) -> Void;
        fn browse_url(&self, ticket_key: &str) -> String;
    }
}

fn created_issue() -> CreatedIssue {
    CreatedIssue {
        number: 42,
        url: "https://github.com/acme/widgets/issues/42".to_string(),
    }
}

fn in_progress_transitions() -> Vec<TicketTransition> {
    vec![TicketTransition {
        id: "31".to_string(),
        name: "In Progress".to_string(),
    }]
}

/// A hosting mock where the duplicate search misses and creation succeeds.
fn happy_hosting() -> MockHosting {
    let mut mock = MockHosting::new();

    mock.expect_find_existing_issue().returning(|_, _, _| Ok(None));
    mock.expect_create_issue().returning(|_, _, _, _| Ok(created_issue()));

    mock
}

/// A ticketing mock where every call succeeds.
fn happy_tickets() -> MockTickets {
    let mut mock = MockTickets::new();

    mock.expect_list_comments().returning(|_| Ok(vec![]));
    mock.expect_available_transitions().returning(|_| Ok(in_progress_transitions()));
    mock.expect_apply_transition().returning(|_, _| Ok(()));
    mock.expect_post_comment().returning(|_, _| Ok(()));
    mock.expect_browse_url().returning(|key| format!("https://example.atlassian.net/browse/{key}"));

    mock
}

/// Serve the router on a loopback listener and return its base URL.
async fn serve(hosting: MockHosting, tickets: MockTickets) -> String {
    let config = Config {
        inner: Arc::new(ConfigInner {
            github_token: "gh-token".to_string(),
            webhook_secret: Some("s3cret".to_string()),
            jira_base_url: "https://example.atlassian.net".to_string(),
            jira_email: "bot@example.com".to_string(),
            jira_api_token: "jira-token".to_string(),
            ..Default::default()
        }),
    };

    let state = AppState {
        config,
        hosting: HostingClient::new(Arc::new(hosting)),
        tickets: TicketClient::new(Arc::new(tickets)),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.expect("Test server crashed");
    });

    format!("http://{addr}")
}

fn payload() -> Value {
    json!({
        "issueKey": "ABC-123",
        "summary": "Fix the flux capacitor",
        "description": "It fluxes the wrong way.",
        "repo": "acme/widgets",
    })
}

async fn post(base: &str, path: &str, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(body)
        .send()
        .await
        .expect("Request failed")
}

// Tests.

#[tokio::test]
async fn non_post_methods_are_rejected() {
    let base = serve(MockHosting::new(), MockTickets::new()).await;

    let response = reqwest::get(format!("{base}/webhooks/implement")).await.unwrap();

    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn mismatched_secret_is_rejected() {
    let base = serve(MockHosting::new(), MockTickets::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/webhooks/implement"))
        .header("x-webhook-secret", "wrong")
        .json(&payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "invalid_secret" }));
}

#[tokio::test]
async fn matching_secret_is_accepted() {
    let mut hosting = MockHosting::new();
    hosting.expect_find_existing_issue().returning(|_, _, _| Ok(Some(17)));

    let base = serve(hosting, MockTickets::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/webhooks/implement"))
        .header("x-webhook-secret", "s3cret")
        .json(&payload())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn missing_fields_are_rejected_with_the_required_list() {
    let base = serve(MockHosting::new(), MockTickets::new()).await;

    let response = post(&base, "/webhooks/implement", &json!({ "summary": "only a summary" })).await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "missing_fields", "required": ["issueKey", "summary", "repo"] }));
}

#[tokio::test]
async fn duplicate_ticket_short_circuits_without_creating() {
    let mut hosting = MockHosting::new();
    hosting.expect_find_existing_issue().returning(|_, _, _| Ok(Some(17)));
    // No create_issue expectation: creating would panic the handler.

    let base = serve(hosting, MockTickets::new()).await;

    let response = post(&base, "/webhooks/implement", &payload()).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["skipped"], json!(true));
    assert_eq!(body["reason"], json!("issue_already_exists"));
    assert_eq!(body["issue_number"], json!(17));
}

#[tokio::test]
async fn failed_duplicate_search_does_not_block_creation() {
    let mut hosting = MockHosting::new();
    hosting
        .expect_find_existing_issue()
        .returning(|_, _, _| Err(anyhow::anyhow!("GitHub search API error: 403 - rate limited")));
    hosting.expect_create_issue().returning(|_, _, _, _| Ok(created_issue()));

    let base = serve(hosting, happy_tickets()).await;

    let response = post(&base, "/webhooks/implement", &payload()).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["issue_number"], json!(42));
}

#[tokio::test]
async fn comment_fetch_failure_degrades_to_placeholder() {
    let mut hosting = MockHosting::new();
    hosting.expect_find_existing_issue().returning(|_, _, _| Ok(None));
    hosting
        .expect_create_issue()
        .withf(|_, _, body, labels| body.contains("(no comments)") && labels.contains(&"from-jira") && labels.contains(&"ai-task"))
        .returning(|_, _, _, _| Ok(created_issue()));

    let mut tickets = MockTickets::new();
    tickets.expect_list_comments().returning(|_| Err(anyhow::anyhow!("Jira responded with 500")));
    tickets.expect_available_transitions().returning(|_| Ok(in_progress_transitions()));
    tickets.expect_apply_transition().returning(|_, _| Ok(()));
    tickets.expect_post_comment().returning(|_, _| Ok(()));
    tickets.expect_browse_url().returning(|key| format!("https://example.atlassian.net/browse/{key}"));

    let base = serve(hosting, tickets).await;

    let response = post(&base, "/webhooks/implement", &payload()).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["jira_transition"]["success"], json!(true));
    assert_eq!(body["jira_transition"]["transition"], json!("In Progress"));
}

#[tokio::test]
async fn unmatched_transitions_are_advisory_only() {
    let mut tickets = MockTickets::new();
    tickets.expect_list_comments().returning(|_| Ok(vec![]));
    tickets.expect_available_transitions().returning(|_| {
        Ok(vec![
            TicketTransition { id: "1".to_string(), name: "Done".to_string() },
            TicketTransition { id: "2".to_string(), name: "Blocked".to_string() },
        ])
    });
    // No apply_transition expectation: applying would panic the handler.
    tickets.expect_post_comment().returning(|_, _| Ok(()));
    tickets.expect_browse_url().returning(|key| format!("https://example.atlassian.net/browse/{key}"));

    let base = serve(happy_hosting(), tickets).await;

    let response = post(&base, "/webhooks/implement", &payload()).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["jira_transition"]["success"], json!(false));
    assert_eq!(body["jira_transition"]["error"], json!("transition_not_found"));
    assert_eq!(body["jira_transition"]["available"], json!(["Done", "Blocked"]));
}

#[tokio::test]
async fn failed_issue_creation_maps_to_bad_gateway() {
    let mut hosting = MockHosting::new();
    hosting.expect_find_existing_issue().returning(|_, _, _| Ok(None));
    hosting.expect_create_issue().returning(|_, _, _, _| {
        Err(UpstreamError {
            status: 422,
            body: "Validation Failed".to_string(),
        }
        .into())
    });

    // Transition and notification must not be attempted after a creation
    // failure, so neither gets an expectation.
    let mut tickets = MockTickets::new();
    tickets.expect_list_comments().returning(|_| Ok(vec![]));
    tickets.expect_browse_url().returning(|key| format!("https://example.atlassian.net/browse/{key}"));

    let base = serve(hosting, tickets).await;

    let response = post(&base, "/webhooks/implement", &payload()).await;

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "github_request_failed", "details": "Validation Failed" }));
}

#[tokio::test]
async fn research_flow_scopes_dedup_and_skips_transition() {
    let mut hosting = MockHosting::new();
    hosting
        .expect_find_existing_issue()
        .withf(|_, _, scope| scope.label == Some("ai-research") && scope.open_only)
        .returning(|_, _, _| Ok(None));
    hosting
        .expect_create_issue()
        .withf(|_, title, body, labels| {
            title.contains("[AI Research]") && body.contains("## Follow-up") && labels.contains(&"ai-research")
        })
        .returning(|_, _, _, _| {
            Ok(CreatedIssue {
                number: 7,
                url: "https://github.com/acme/widgets/issues/7".to_string(),
            })
        });

    let mut tickets = MockTickets::new();
    tickets.expect_list_comments().returning(|_| {
        Ok(vec![TicketComment {
            author: "Ada".to_string(),
            created: "2024-03-01T12:34:56.000+0000".to_string(),
            body: "<p>Please look into this.</p>".to_string(),
        }])
    });
    tickets.expect_post_comment().times(1).returning(|_, _| Ok(()));
    tickets.expect_browse_url().returning(|key| format!("https://example.atlassian.net/browse/{key}"));
    // No available_transitions expectation: the research flow never moves
    // the ticket.

    let base = serve(hosting, tickets).await;

    let response = post(&base, "/webhooks/research", &payload()).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["issue_number"], json!(7));
    assert_eq!(body["action"], json!("research_issue_created"));
    assert!(body.get("jira_transition").is_none());
}

#[tokio::test]
async fn notification_failure_does_not_fail_the_request() {
    let mut tickets = MockTickets::new();
    tickets.expect_list_comments().returning(|_| Ok(vec![]));
    tickets.expect_available_transitions().returning(|_| Ok(in_progress_transitions()));
    tickets.expect_apply_transition().returning(|_, _| Ok(()));
    tickets.expect_post_comment().returning(|_, _| Err(anyhow::anyhow!("Jira responded with 403")));
    tickets.expect_browse_url().returning(|key| format!("https://example.atlassian.net/browse/{key}"));

    let base = serve(happy_hosting(), tickets).await;

    let response = post(&base, "/webhooks/implement", &payload()).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["issue_number"], json!(42));
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let base = serve(MockHosting::new(), MockTickets::new()).await;

    let response = reqwest::get(format!("{base}/health")).await.unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "healthy" }));
}
