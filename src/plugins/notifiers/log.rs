use async_trait::async_trait;

use crate::models::PriceDropAlert;
use crate::plugins::traits::NotificationSink;
use crate::utils::error::AppError;

/// Writes alerts to the tracing output.
pub struct LogNotifier {
    currency_symbol: String,
}

impl LogNotifier {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, alert: &PriceDropAlert) -> Result<(), AppError> {
        tracing::info!(
            url = %alert.url,
            "{}: {}",
            alert.headline(),
            alert.message(&self.currency_symbol).replace('\n', " | ")
        );
        Ok(())
    }
}
