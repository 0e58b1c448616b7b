//! Load configuration via `config` crate with env-override support.

use std::{net::SocketAddr, ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default address the webhook listener binds to.
fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Configuration for the handoff-bot application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Code-hosting API token (`HANDOFF_BOT_GITHUB_TOKEN`).
    pub github_token: String,
    /// Shared webhook secret (`HANDOFF_BOT_WEBHOOK_SECRET`).
    ///
    /// Checked only when the caller sends an `x-webhook-secret` header.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Ticketing site base URL (`HANDOFF_BOT_JIRA_BASE_URL`), e.g.
    /// `https://example.atlassian.net`.
    pub jira_base_url: String,
    /// Ticketing cloud id (`HANDOFF_BOT_JIRA_CLOUD_ID`).
    ///
    /// When set, API calls route through the tenant-scoped gateway path
    /// instead of the site base URL.
    #[serde(default)]
    pub jira_cloud_id: Option<String>,
    /// Service-account email for the ticketing API (`HANDOFF_BOT_JIRA_EMAIL`).
    pub jira_email: String,
    /// Service-account API token (`HANDOFF_BOT_JIRA_API_TOKEN`).
    pub jira_api_token: String,
    /// Address to serve webhooks on (`HANDOFF_BOT_BIND_ADDRESS`).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Config {
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("HANDOFF_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.bind_address.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!("Bind address must be a valid socket address, got `{}`.", result.bind_address));
        }

        if result.jira_base_url.trim_end_matches('/').is_empty() {
            return Err(anyhow::anyhow!("Jira base URL must not be empty."));
        }

        Ok(result)
    }
}
