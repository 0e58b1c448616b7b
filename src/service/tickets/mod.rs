pub mod jira;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{
    config::Config,
    types::{Res, TicketComment, TicketTransition, Void},
};

// Traits.

/// Generic ticketing trait that clients must implement.
///
/// This trait defines the ticket-side operations used by the webhook flows:
/// reading the comment thread, moving the ticket between states, and posting
/// status comments back. Implementing it allows different ticketing systems
/// to be used with handoff-bot.
#[async_trait]
pub trait GenericTicketClient: Send + Sync + 'static {
    /// Fetch the ticket's comment thread.
    async fn list_comments(&self, ticket_key: &str) -> Res<Vec<TicketComment>>;

    /// List the state transitions currently available on the ticket.
    async fn available_transitions(&self, ticket_key: &str) -> Res<Vec<TicketTransition>>;

    /// Apply a transition by id.
    async fn apply_transition(&self, ticket_key: &str, transition_id: &str) -> Void;

    /// Post a plain-text comment on the ticket.
    async fn post_comment(&self, ticket_key: &str, text: &str) -> Void;

    /// Human-facing browse URL for the ticket.
    fn browse_url(&self, ticket_key: &str) -> String;
}

// Structs.

/// Ticketing client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct TicketClient {
    inner: Arc<dyn GenericTicketClient>,
}

impl Deref for TicketClient {
    type Target = dyn GenericTicketClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl TicketClient {
    pub fn new(inner: Arc<dyn GenericTicketClient>) -> Self {
        Self { inner }
    }

    /// Creates a new Jira ticketing client.
    pub fn jira(config: &Config) -> Self {
        Self {
            inner: Arc::new(jira::JiraClient::new(config)),
        }
    }
}
