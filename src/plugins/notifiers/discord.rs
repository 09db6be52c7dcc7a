use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::DiscordConfig;
use crate::models::{PriceDropAlert, format_price};
use crate::plugins::traits::NotificationSink;
use crate::utils::error::AppError;

const DROP_COLOR: u32 = 0x00ff00;

/// Posts alerts to a Discord webhook as a single embed.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
    currency_symbol: String,
}

impl DiscordNotifier {
    pub fn new(client: Client, webhook_url: impl Into<String>, username: impl Into<String>, currency_symbol: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            username: username.into(),
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Build a notifier when the config carries a webhook URL.
    pub fn from_config(client: Client, config: &DiscordConfig, currency_symbol: &str) -> Option<Self> {
        config
            .webhook_url
            .as_ref()
            .map(|url| Self::new(client, url.clone(), config.username.clone(), currency_symbol))
    }

    fn create_embed(&self, alert: &PriceDropAlert) -> serde_json::Value {
        let mut fields = Vec::new();

        if alert.is_lower_price {
            fields.push(json!({
                "name": "💰 New Price",
                "value": format_price(alert.current_price, &self.currency_symbol),
                "inline": true
            }));
        }

        if alert.is_lower_alt {
            fields.push(json!({
                "name": "♻️ New Used Price",
                "value": format_price(alert.alt_price, &self.currency_symbol),
                "inline": true
            }));
        }

        json!({
            "title": format!("📉 {}", alert.headline()),
            "description": alert.message(&self.currency_symbol),
            "url": alert.url,
            "color": DROP_COLOR,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "fields": fields
        })
    }

    fn create_webhook_payload(&self, alert: &PriceDropAlert) -> serde_json::Value {
        json!({
            "username": self.username,
            "embeds": [self.create_embed(alert)]
        })
    }
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn notify(&self, alert: &PriceDropAlert) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.create_webhook_payload(alert))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Notification(format!(
                "Discord webhook returned {}",
                response.status()
            )));
        }

        tracing::debug!("Sent Discord alert for {}", alert.url);
        Ok(())
    }
}
