use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::core::aggregation::{first_write, merge};
use crate::core::clock::{Clock, SystemClock};
use crate::core::database::ProductStore;
use crate::extractor::PriceExtractor;
use crate::models::{PriceDropAlert, TrackedProduct};
use crate::plugins::traits::NotificationSink;
use crate::utils::error::{AppError, PersistenceError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshReport {
    pub checked: usize,
    pub updated: usize,
    pub notified: usize,
    pub failures: Vec<ItemFailure>,
    pub total_time_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct ItemOutcome {
    notified: bool,
    persisted: bool,
}

/// Add, remove and refresh tracked listings.
pub struct ProductManager {
    store: Arc<dyn ProductStore>,
    extractor: Arc<dyn PriceExtractor>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    // Held for the whole of a refresh cycle, and by `add_product` while it
    // writes, so no merge is computed from a record that is being replaced.
    refresh_guard: Mutex<()>,
}

impl ProductManager {
    pub fn new(
        store: Arc<dyn ProductStore>,
        extractor: Arc<dyn PriceExtractor>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::with_clock(store, extractor, notifier, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn ProductStore>,
        extractor: Arc<dyn PriceExtractor>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            extractor,
            notifier,
            clock,
            refresh_guard: Mutex::new(()),
        }
    }

    /// Start tracking a listing. Fetches it immediately and overwrites any
    /// existing record for the same URL, discarding its history.
    pub async fn add_product(&self, url: &str) -> Result<TrackedProduct> {
        let url = validate_listing_url(url)?;

        let snapshot = self.extractor.extract(url).await?;

        // Wait out a running cycle so its merge cannot land on top of this write.
        let _guard = self.refresh_guard.lock().await;
        let product = first_write(url, &snapshot, self.clock.now());
        self.store.insert_or_replace(&product).await?;

        tracing::info!("Now tracking {} at {}", product.title, product.current_price);
        Ok(product)
    }

    /// Stop tracking a listing. Returns `false` if it was not tracked.
    pub async fn remove_product(&self, url: &str) -> Result<bool> {
        let removed = self.store.remove(url.trim()).await?;
        if removed {
            tracing::info!("Stopped tracking {}", url.trim());
        }
        Ok(removed)
    }

    pub async fn get_product(&self, url: &str) -> Result<Option<TrackedProduct>> {
        Ok(self.store.get(url.trim()).await?)
    }

    /// Every readable record. Rows that no longer decode are logged and left out.
    pub async fn list_products(&self) -> Result<Vec<TrackedProduct>> {
        let rows = self.store.list_all().await?;
        let mut products = Vec::with_capacity(rows.len());

        for row in rows {
            match row {
                Ok(product) => products.push(product),
                Err(e) => tracing::warn!("Skipping unreadable product: {}", e),
            }
        }

        Ok(products)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_guard.try_lock().is_err()
    }

    /// Re-fetch every tracked listing, one at a time.
    ///
    /// A failing item is logged and reported but never stops the cycle. Fails
    /// with [`AppError::RefreshInProgress`] if another cycle is still running.
    pub async fn refresh_all(&self) -> Result<RefreshReport> {
        let _guard = self
            .refresh_guard
            .try_lock()
            .map_err(|_| AppError::RefreshInProgress)?;

        let start_time = Instant::now();
        let rows = self.store.list_all().await?;
        let mut report = RefreshReport::default();

        tracing::info!("Refreshing {} tracked products", rows.len());

        for row in rows {
            report.checked += 1;

            let product = match row {
                Ok(product) => product,
                Err(e) => {
                    tracing::warn!("Cannot refresh unreadable product: {}", e);
                    report.failures.push(ItemFailure {
                        url: failed_row_url(&e),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            match self.refresh_product(&product).await {
                Ok(outcome) => {
                    if outcome.persisted {
                        report.updated += 1;
                    }
                    if outcome.notified {
                        report.notified += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to refresh {}: {}", product.url, e);
                    report.failures.push(ItemFailure {
                        url: product.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report.total_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            "Refresh finished: {} checked, {} updated, {} alerts, {} failed in {}ms",
            report.checked,
            report.updated,
            report.notified,
            report.failures.len(),
            report.total_time_ms
        );
        Ok(report)
    }

    async fn refresh_product(&self, prior: &TrackedProduct) -> Result<ItemOutcome> {
        let snapshot = self.extractor.extract(&prior.url).await?;

        // Decide against the stored record before it is overwritten.
        let outcome = merge(Some(prior), &prior.url, &snapshot, self.clock.now());

        let mut notified = false;
        if outcome.decision.should_notify() {
            let alert = PriceDropAlert::new(&prior.url, &snapshot, outcome.decision);
            match self.notifier.notify(&alert).await {
                Ok(()) => notified = true,
                Err(e) => tracing::warn!("Could not deliver price drop alert for {}: {}", prior.url, e),
            }
        }

        let persisted = self.store.merge_update(prior, &outcome.record).await?;
        if persisted {
            tracing::debug!(
                "Updated {}: current {}, low {}, high {}",
                prior.url,
                outcome.record.current_price,
                outcome.record.lowest_price,
                outcome.record.highest_price
            );
        } else {
            tracing::debug!("{} was removed or replaced during refresh; skipping update", prior.url);
        }

        Ok(ItemOutcome { notified, persisted })
    }
}

fn failed_row_url(error: &PersistenceError) -> String {
    match error {
        PersistenceError::CorruptRow { url, .. } => url.clone(),
        PersistenceError::Database(_) => String::new(),
    }
}

fn validate_listing_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("Please enter a valid listing URL".to_string()));
    }

    let parsed = Url::parse(url).map_err(|e| AppError::Validation(format!("Invalid URL {}: {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!("Unsupported URL scheme: {}", parsed.scheme())));
    }

    Ok(url)
}
