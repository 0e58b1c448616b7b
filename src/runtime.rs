//! Runtime services and shared state for handoff-bot.

use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    server::{self, AppState},
    service::{hosting::HostingClient, tickets::TicketClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the code-hosting client, ticketing client, and
/// configuration. It is designed to be trivially cloneable, allowing it to be
/// passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The code-hosting client instance.
    pub hosting: HostingClient,
    /// The ticketing client instance.
    pub tickets: TicketClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<Self> {
        // Initialize the code-hosting client.
        let hosting = HostingClient::github(&config)?;

        // Initialize the ticketing client.
        let tickets = TicketClient::jira(&config);

        Ok(Self { config, hosting, tickets })
    }

    /// Serve the webhook endpoints until shutdown.
    pub async fn start(&self) -> Void {
        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        info!("Listening on {}", listener.local_addr()?);

        let router = server::build_router(AppState {
            config: self.config.clone(),
            hosting: self.hosting.clone(),
            tickets: self.tickets.clone(),
        });

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down ...");
            })
            .await?;

        Ok(())
    }
}
