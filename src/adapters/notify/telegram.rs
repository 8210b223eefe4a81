//! Telegram Notifier - Alert Delivery via the Bot API
//!
//! Implements the `NotificationSink` port over the Telegram Bot HTTP
//! API. The bot token is a secret and comes from the environment
//! (TELEGRAM_BOT_TOKEN), never from config.toml.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::ports::notifier::{DeliveryError, NotificationSink};

/// Telegram Bot API delivery channel.
pub struct TelegramNotifier {
    /// Underlying HTTP client.
    http: Client,
    /// Bot API base, token baked in: `https://api.telegram.org/bot<token>`.
    api_base: String,
}

impl TelegramNotifier {
    /// Load the bot token from TELEGRAM_BOT_TOKEN and build the client.
    ///
    /// # Errors
    /// Returns error if the env var is unset or the client cannot be
    /// built.
    pub fn from_env() -> Result<Self> {
        let token =
            std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;
        Self::with_base(format!("https://api.telegram.org/bot{token}"))
    }

    /// Build a notifier against an explicit API base URL.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_base(api_base: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self { http, api_base })
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, recipient: &str, text: &str) -> Result<(), DeliveryError> {
        if recipient.trim().is_empty() {
            return Err(DeliveryError::InvalidRecipient(
                "empty chat id".to_string(),
            ));
        }

        let url = format!("{}/sendMessage", self.api_base);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": recipient,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(anyhow!(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Transport(anyhow!(
                "Telegram API returned {status}: {body}"
            )));
        }

        debug!(recipient = %recipient, "Telegram notification sent");
        Ok(())
    }
}
