//! Library root for `handoff-bot`.
//!
//! Handoff-bot is a webhook bridge between a ticketing system and a hosted
//! issue tracker designed to:
//! - Receive ticket webhooks and validate them
//! - Deduplicate against issues that already track the ticket
//! - Compose issue bodies from ticket metadata and comment threads
//! - Hand work to coding agents via labeled issues
//! - Report progress back on the ticket (state transition and comment)
//!
//! The bot integrates with Jira for ticketing and GitHub for issue hosting.
//! The architecture is built around extensible traits that allow for
//! different implementations of each service.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod server;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the handoff-bot runtime:
/// - Creates the runtime context with hosting and ticketing clients
/// - Serves the webhook endpoints until shutdown
pub async fn start(config: Config) -> Void {
    info!("Starting handoff-bot ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config)?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
