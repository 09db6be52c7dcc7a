use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::config::SchedulerConfig;
use crate::product_manager::{ProductManager, RefreshReport};
use crate::utils::error::{AppError, Result};

/// Drives periodic refresh cycles and publishes a countdown to the next one.
///
/// The countdown is read off the refresh task's own next-fire instant, so it
/// always agrees with when the timer will actually run.
pub struct RefreshScheduler {
    product_manager: Arc<ProductManager>,
    config: SchedulerConfig,
    next_fire: Arc<watch::Sender<Instant>>,
    countdown_tx: Arc<watch::Sender<u64>>,
    countdown_rx: watch::Receiver<u64>,
    refresh_task: Option<JoinHandle<()>>,
    countdown_task: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn new(product_manager: Arc<ProductManager>, config: SchedulerConfig) -> Self {
        let (next_fire, _) = watch::channel(Instant::now() + config.refresh_interval());
        let (countdown_tx, countdown_rx) = watch::channel(config.refresh_interval_secs);

        Self {
            product_manager,
            config,
            next_fire: Arc::new(next_fire),
            countdown_tx: Arc::new(countdown_tx),
            countdown_rx,
            refresh_task: None,
            countdown_task: None,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(AppError::Internal("Scheduler is already running".to_string()));
        }

        let period = self.config.refresh_interval();
        let first_fire = Instant::now() + period;
        self.next_fire.send_replace(first_fire);

        self.refresh_task = Some(tokio::spawn(Self::run_refresh_loop(
            Arc::clone(&self.product_manager),
            Arc::clone(&self.next_fire),
            first_fire,
            period,
        )));

        self.countdown_task = Some(tokio::spawn(Self::run_countdown_loop(
            self.next_fire.subscribe(),
            Arc::clone(&self.countdown_tx),
            self.config.countdown_tick(),
        )));

        tracing::info!(
            "Scheduler started: refreshing every {}s",
            self.config.refresh_interval_secs
        );
        Ok(())
    }

    pub fn shutdown(&mut self) {
        for handle in [self.refresh_task.take(), self.countdown_task.take()].into_iter().flatten() {
            handle.abort();
        }
        tracing::info!("Scheduler shutdown");
    }

    pub fn is_running(&self) -> bool {
        self.refresh_task.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Seconds until the next timer-driven refresh, updated every countdown tick.
    pub fn countdown(&self) -> watch::Receiver<u64> {
        self.countdown_rx.clone()
    }

    /// Run a refresh cycle immediately. The timer schedule is left untouched.
    pub async fn trigger_now(&self) -> Result<RefreshReport> {
        tracing::info!("Running manual refresh");
        self.product_manager.refresh_all().await
    }

    async fn run_refresh_loop(
        product_manager: Arc<ProductManager>,
        next_fire: Arc<watch::Sender<Instant>>,
        first_fire: Instant,
        period: Duration,
    ) {
        let mut deadline = first_fire;

        loop {
            tokio::time::sleep_until(deadline).await;

            // Publish the following deadline before the cycle runs so the
            // countdown restarts on time even when the cycle is slow.
            let next = deadline + period;
            next_fire.send_replace(next);

            match product_manager.refresh_all().await {
                Ok(report) => {
                    tracing::debug!("Scheduled refresh checked {} products", report.checked);
                }
                Err(AppError::RefreshInProgress) => {
                    tracing::warn!("Skipping scheduled refresh: previous cycle still running");
                }
                Err(e) => {
                    tracing::error!("Scheduled refresh failed: {}", e);
                }
            }

            let now = Instant::now();
            deadline = if next > now {
                next
            } else {
                // Missed one or more fires while the cycle ran
                let fresh = now + period;
                next_fire.send_replace(fresh);
                fresh
            };
        }
    }

    async fn run_countdown_loop(
        next_fire: watch::Receiver<Instant>,
        countdown: Arc<watch::Sender<u64>>,
        tick: Duration,
    ) {
        let mut ticker = tokio::time::interval(tick);

        loop {
            ticker.tick().await;
            let deadline = *next_fire.borrow();
            let remaining = deadline.saturating_duration_since(Instant::now());
            countdown.send_replace(remaining.as_secs());
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        for handle in [self.refresh_task.take(), self.countdown_task.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

pub fn format_countdown(seconds: u64) -> String {
    format!("Next Refresh: {:02}:{:02}", seconds / 60, seconds % 60)
}
