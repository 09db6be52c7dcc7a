use async_trait::async_trait;

use crate::models::PriceDropAlert;
use crate::utils::error::AppError;

/// Delivers a price drop alert to the user (log line, webhook, ...).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn notify(&self, alert: &PriceDropAlert) -> Result<(), AppError>;
}
