//! Event publishing seam.
//!
//! The compiler never signs or transmits anything itself; rendered drafts
//! are handed to an [`EventPublisher`]. [`RelayPublisher`] is the production
//! implementation over the nostr SDK client; tests inject their own sink.

use std::time::Duration;

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use tracing::info;

use crate::events::EventDraft;
use crate::Error;

/// Outcome of publishing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub event_id: String,
    pub success: usize,
    pub failed: usize,
}

/// Signs and transmits rendered events; owns all network and auth concerns.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, draft: &EventDraft) -> Result<PublishResult, Error>;

    /// Hex public key of the signing identity, when known.
    fn pubkey(&self) -> Option<String> {
        None
    }
}

#[derive(Clone)]
pub struct RelayPublisherConfig {
    pub relays: Vec<String>,
    pub secret_key: String,
    pub min_acks: usize,
    pub timeout: Duration,
}

impl RelayPublisherConfig {
    pub fn keys(&self) -> Result<Keys, Error> {
        Ok(Keys::parse(&self.secret_key)?)
    }
}

/// Publisher backed by a nostr SDK relay client.
#[derive(Clone)]
pub struct RelayPublisher {
    client: Client,
    config: RelayPublisherConfig,
    pubkey: String,
}

impl RelayPublisher {
    pub async fn new(config: RelayPublisherConfig) -> Result<Self, Error> {
        let keys = config.keys()?;
        let pubkey = keys.public_key().to_string();
        let client = Client::builder().signer(keys).build();

        for relay in &config.relays {
            client.add_relay(relay).await?;
        }

        client.connect().await;
        Ok(Self {
            client,
            config,
            pubkey,
        })
    }
}

#[async_trait]
impl EventPublisher for RelayPublisher {
    async fn publish(&self, draft: &EventDraft) -> Result<PublishResult, Error> {
        let builder = draft.to_builder()?;
        let output = tokio::time::timeout(
            self.config.timeout,
            self.client.send_event_builder(builder),
        )
        .await
        .map_err(|_| Error::Timeout)??;

        let success = output.success.len();
        let failed = output.failed.len();
        if self.config.min_acks > 0 && success < self.config.min_acks {
            return Err(Error::Quorum {
                required: self.config.min_acks,
                actual: success,
            });
        }

        let event_id = output.id().to_string();
        info!(event_id = %event_id, kind = draft.kind, success, failed, "published event");

        Ok(PublishResult {
            event_id,
            success,
            failed,
        })
    }

    fn pubkey(&self) -> Option<String> {
        Some(self.pubkey.clone())
    }
}
