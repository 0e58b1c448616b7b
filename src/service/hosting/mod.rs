pub mod github;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{
    config::Config,
    types::{CreatedIssue, Res},
};

// Traits.

/// Filters applied to the pre-creation duplicate search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IssueSearchScope {
    /// Restrict matches to issues carrying this label.
    pub label: Option<&'static str>,
    /// Restrict matches to open issues.
    pub open_only: bool,
}

/// Generic code-hosting trait that clients must implement.
///
/// This trait defines the two issue-tracker operations the webhook flows need.
/// Implementing it allows different hosting providers to be used with
/// handoff-bot.
#[async_trait]
pub trait GenericHostingClient: Send + Sync + 'static {
    /// Search the repository for an existing issue referencing the ticket key.
    ///
    /// Returns the first matching issue number, if any. Callers treat a
    /// search failure as "no duplicate found"; the check is best-effort.
    async fn find_existing_issue(&self, repo: &str, ticket_key: &str, scope: IssueSearchScope) -> Res<Option<u64>>;

    /// Create an issue and return its number and browse URL.
    ///
    /// A non-success upstream response surfaces as an `UpstreamError` so the
    /// caller can relay the status and body.
    async fn create_issue(&self, repo: &str, title: &str, body: &str, labels: &'static [&'static str]) -> Res<CreatedIssue>;
}

// Structs.

/// Code-hosting client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct HostingClient {
    inner: Arc<dyn GenericHostingClient>,
}

impl Deref for HostingClient {
    type Target = dyn GenericHostingClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl HostingClient {
    pub fn new(inner: Arc<dyn GenericHostingClient>) -> Self {
        Self { inner }
    }

    /// Creates a new GitHub hosting client.
    pub fn github(config: &Config) -> Res<Self> {
        let client = github::GitHubClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}
