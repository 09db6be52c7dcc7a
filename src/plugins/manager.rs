use async_trait::async_trait;

use super::notifiers::{DiscordNotifier, LogNotifier};
use super::traits::NotificationSink;
use crate::config::NotificationsConfig;
use crate::models::PriceDropAlert;
use crate::utils::error::AppError;

pub type NotificationSinkBox = Box<dyn NotificationSink>;

/// Fans an alert out to every registered sink.
#[derive(Default)]
pub struct NotifierRegistry {
    sinks: Vec<NotificationSinkBox>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Register the sinks enabled in configuration.
    pub fn from_config(config: &NotificationsConfig, client: reqwest::Client) -> Self {
        let mut registry = Self::new();

        if config.log_enabled {
            registry.register(Box::new(LogNotifier::new(config.currency_symbol.clone())));
        }

        if let Some(discord) = DiscordNotifier::from_config(client, &config.discord, &config.currency_symbol) {
            registry.register(Box::new(discord));
        }

        registry
    }

    pub fn register(&mut self, sink: NotificationSinkBox) {
        tracing::debug!("Registered notification sink: {}", sink.name());
        self.sinks.push(sink);
    }

    pub fn list_sinks(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|sink| sink.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl NotificationSink for NotifierRegistry {
    fn name(&self) -> &'static str {
        "registry"
    }

    /// Every sink is tried even if an earlier one fails.
    async fn notify(&self, alert: &PriceDropAlert) -> Result<(), AppError> {
        let mut failures = Vec::new();

        for sink in &self.sinks {
            if let Err(e) = sink.notify(alert).await {
                tracing::warn!("Notifier {} failed for {}: {}", sink.name(), alert.url, e);
                failures.push(format!("{}: {}", sink.name(), e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::Notification(failures.join("; ")))
        }
    }
}
