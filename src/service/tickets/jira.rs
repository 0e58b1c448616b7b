//! Jira implementation of the ticketing service.
//!
//! Talks to the Jira Cloud REST v3 API with service-account basic auth.
//! When a cloud id is configured, calls route through the tenant-scoped
//! gateway path so restricted-scope credentials keep working; browse links
//! always use the site base URL.

use async_trait::async_trait;
use anyhow::Context;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::base::{
    config::Config,
    types::{Res, TicketComment, TicketTransition, UpstreamError, Void},
};

use super::GenericTicketClient;

/// Author name used when a comment has no resolvable author.
const UNKNOWN_AUTHOR: &str = "Unknown";

/// Jira client implementation.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    api_base: String,
    site_url: String,
    auth: String,
}

impl JiraClient {
    pub fn new(config: &Config) -> Self {
        let site_url = config.jira_base_url.trim_end_matches('/').to_string();

        let api_base = match config.jira_cloud_id.as_deref() {
            Some(cloud_id) => format!("https://api.atlassian.com/ex/jira/{cloud_id}/rest/api/3"),
            None => format!("{site_url}/rest/api/3"),
        };

        let credentials = format!("{}:{}", config.jira_email, config.jira_api_token);
        let auth = format!("Basic {}", BASE64_STANDARD.encode(credentials));

        Self {
            http: reqwest::Client::new(),
            api_base,
            site_url,
            auth,
        }
    }

    fn issue_endpoint(&self, ticket_key: &str, resource: &str) -> String {
        format!("{}/issue/{ticket_key}/{resource}", self.api_base)
    }

    /// Check a Jira response, converting non-success into an `UpstreamError`.
    async fn checked(response: reqwest::Response) -> Res<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(UpstreamError { status: status.as_u16(), body }.into())
    }
}

#[async_trait]
impl GenericTicketClient for JiraClient {
    #[instrument(skip(self))]
    async fn list_comments(&self, ticket_key: &str) -> Res<Vec<TicketComment>> {
        let response = self
            .http
            .get(self.issue_endpoint(ticket_key, "comment"))
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/json")
            .query(&[("expand", "renderedBody")])
            .send()
            .await
            .context("Failed to send comment list request")?;

        let page: JiraCommentPage = Self::checked(response).await?.json().await.context("Failed to parse comment list response")?;

        let comments = page
            .comments
            .into_iter()
            .map(|comment| {
                let author = comment.author.and_then(|a| a.display_name).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
                let body = comment.rendered_body.unwrap_or_else(|| comment.body.as_ref().map(document_text).unwrap_or_default());

                TicketComment {
                    author,
                    created: comment.created.unwrap_or_default(),
                    body,
                }
            })
            .collect();

        Ok(comments)
    }

    #[instrument(skip(self))]
    async fn available_transitions(&self, ticket_key: &str) -> Res<Vec<TicketTransition>> {
        let response = self
            .http
            .get(self.issue_endpoint(ticket_key, "transitions"))
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .context("Failed to send transition list request")?;

        let listing: JiraTransitionPage = Self::checked(response).await?.json().await.context("Failed to parse transition list response")?;

        Ok(listing.transitions.into_iter().map(|t| TicketTransition { id: t.id, name: t.name }).collect())
    }

    #[instrument(skip(self))]
    async fn apply_transition(&self, ticket_key: &str, transition_id: &str) -> Void {
        let request = JiraTransitionRequest {
            transition: JiraTransitionRef { id: transition_id },
        };

        let response = self
            .http
            .post(self.issue_endpoint(ticket_key, "transitions"))
            .header(AUTHORIZATION, &self.auth)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send transition request")?;

        Self::checked(response).await?;

        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn post_comment(&self, ticket_key: &str, text: &str) -> Void {
        let request = JiraCommentRequest {
            body: JiraDocument::from_text(text),
        };

        let response = self
            .http
            .post(self.issue_endpoint(ticket_key, "comment"))
            .header(AUTHORIZATION, &self.auth)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send comment request")?;

        Self::checked(response).await?;

        Ok(())
    }

    fn browse_url(&self, ticket_key: &str) -> String {
        format!("{}/browse/{ticket_key}", self.site_url)
    }
}

/// Flatten an Atlassian document value into its text content.
///
/// Fallback for installations where `renderedBody` is not expanded.
fn document_text(value: &Value) -> String {
    fn walk(node: &Value, out: &mut Vec<String>) {
        if let Some(text) = node.get("text").and_then(Value::as_str) {
            out.push(text.to_string());
        }

        if let Some(children) = node.get("content").and_then(Value::as_array) {
            for child in children {
                walk(child, out);
            }
        }
    }

    let mut parts = Vec::new();
    walk(value, &mut parts);
    parts.join(" ")
}

// Wire types.

#[derive(Deserialize)]
struct JiraCommentPage {
    #[serde(default)]
    comments: Vec<JiraComment>,
}

#[derive(Deserialize)]
struct JiraComment {
    author: Option<JiraAuthor>,
    created: Option<String>,
    #[serde(rename = "renderedBody")]
    rendered_body: Option<String>,
    body: Option<Value>,
}

#[derive(Deserialize)]
struct JiraAuthor {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct JiraTransitionPage {
    #[serde(default)]
    transitions: Vec<JiraTransitionEntry>,
}

#[derive(Deserialize)]
struct JiraTransitionEntry {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct JiraTransitionRequest<'a> {
    transition: JiraTransitionRef<'a>,
}

#[derive(Serialize)]
struct JiraTransitionRef<'a> {
    id: &'a str,
}

#[derive(Serialize)]
struct JiraCommentRequest {
    body: JiraDocument,
}

#[derive(Serialize)]
struct JiraDocument {
    #[serde(rename = "type")]
    doc_type: &'static str,
    version: u8,
    content: Vec<JiraDocNode>,
}

impl JiraDocument {
    /// Wrap plain text in the structured rich-text document format, one
    /// paragraph per non-empty line.
    fn from_text(text: &str) -> Self {
        let mut paragraphs = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| JiraDocNode::paragraph(line.to_string()))
            .collect::<Vec<_>>();

        if paragraphs.is_empty() {
            paragraphs.push(JiraDocNode::paragraph(String::new()));
        }

        Self {
            doc_type: "doc",
            version: 1,
            content: paragraphs,
        }
    }
}

#[derive(Serialize)]
struct JiraDocNode {
    #[serde(rename = "type")]
    node_type: &'static str,
    content: Vec<JiraDocText>,
}

impl JiraDocNode {
    fn paragraph(text: String) -> Self {
        Self {
            node_type: "paragraph",
            content: vec![JiraDocText { text_type: "text", text }],
        }
    }
}

#[derive(Serialize)]
struct JiraDocText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: String,
}

// Tests.
