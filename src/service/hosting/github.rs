//! GitHub implementation of the code-hosting service.
//!
//! Covers the two REST calls the webhook flows depend on:
//! - issue search, used as the best-effort duplicate check
//! - issue creation, the one fatal step of each flow

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    types::{CreatedIssue, Res, UpstreamError},
};

use super::{GenericHostingClient, IssueSearchScope};

const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub client implementation.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
}

impl GitHubClient {
    /// Create a new GitHub client with the standard API headers.
    pub fn new(config: &Config) -> Res<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        headers.insert(USER_AGENT, HeaderValue::from_static("handoff-bot/0.2"));

        let client = reqwest::Client::builder().default_headers(headers).build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token: config.github_token.clone(),
        })
    }

    /// Build the search query for the duplicate check.
    fn search_query(repo: &str, ticket_key: &str, scope: IssueSearchScope) -> String {
        let mut query = format!("repo:{repo} type:issue \"{ticket_key}\"");

        if let Some(label) = scope.label {
            query.push_str(&format!(" label:{label}"));
        }

        if scope.open_only {
            query.push_str(" state:open");
        }

        query
    }
}

#[async_trait]
impl GenericHostingClient for GitHubClient {
    #[instrument(skip(self))]
    async fn find_existing_issue(&self, repo: &str, ticket_key: &str, scope: IssueSearchScope) -> Res<Option<u64>> {
        let query = Self::search_query(repo, ticket_key, scope);
        debug!("Searching for existing issue: {query}");

        let response = self
            .client
            .get(format!("{GITHUB_API_URL}/search/issues"))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .query(&[("q", query.as_str()), ("per_page", "1")])
            .send()
            .await
            .context("Failed to send issue search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GitHub search API error: {status} - {body}"));
        }

        let results: SearchResults = response.json().await.context("Failed to parse issue search response")?;

        Ok(results.items.first().map(|item| item.number))
    }

    #[instrument(skip(self, body))]
    async fn create_issue(&self, repo: &str, title: &str, body: &str, labels: &'static [&'static str]) -> Res<CreatedIssue> {
        let request = CreateIssueRequest { title, body, labels };

        let response = self
            .client
            .post(format!("{GITHUB_API_URL}/repos/{repo}/issues"))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&request)
            .send()
            .await
            .context("Failed to send create issue request")?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError { status, body }.into());
        }

        let issue: IssueResponse = response.json().await.context("Failed to parse create issue response")?;

        Ok(CreatedIssue {
            number: issue.number,
            url: issue.html_url,
        })
    }
}

// Wire types.

#[derive(Serialize)]
struct CreateIssueRequest<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'static [&'static str],
}

#[derive(Deserialize)]
struct SearchResults {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    number: u64,
}

#[derive(Deserialize)]
struct IssueResponse {
    number: u64,
    html_url: String,
}

// Tests.
