//! Network relay that physically switches the toaster.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::intent::Command;
use crate::{Error, Result};

/// Drives the appliance for a resolved command. `Unknown` is a no-op.
#[async_trait]
pub trait ApplianceSwitch: Send + Sync {
    async fn switch(&self, command: Command) -> Result<()>;
}

/// Relay controlled by one GET per state change.
pub struct HttpRelay {
    client: Client,
    on_url: String,
    off_url: String,
}

impl HttpRelay {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            on_url: config.on_url.clone(),
            off_url: config.off_url.clone(),
        })
    }

    fn url_for(&self, command: Command) -> Option<&str> {
        match command {
            Command::On => Some(&self.on_url),
            Command::Off => Some(&self.off_url),
            Command::Unknown => None,
        }
    }
}

#[async_trait]
impl ApplianceSwitch for HttpRelay {
    async fn switch(&self, command: Command) -> Result<()> {
        let Some(url) = self.url_for(command) else {
            debug!("No relay action for '{command}'");
            return Ok(());
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ApplianceUnreachable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApplianceUnreachable(format!("{url} returned {status}")));
        }

        info!("Relay switched {command} ({status})");
        Ok(())
    }
}
