use super::display::render_price_table;
use crate::price_provider::{PriceProvider, fetch_prices_or_empty};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

pub const INITIAL_FETCH_DELAY: Duration = Duration::from_secs(1);

/// Polls a [`PriceProvider`] for a fixed id list and logs a price table on
/// every tick. The period is read from a watch channel so it can be changed
/// at runtime.
pub struct PriceMonitor {
    provider: Arc<dyn PriceProvider>,
    ids: Vec<String>,
    interval_rx: watch::Receiver<u64>,
    cancel: CancellationToken,
    ticks: Arc<AtomicU64>,
}

impl PriceMonitor {
    pub fn new(
        provider: Arc<dyn PriceProvider>,
        ids: Vec<String>,
        interval_rx: watch::Receiver<u64>,
        cancel: CancellationToken,
    ) -> Self {
        PriceMonitor {
            provider,
            ids,
            interval_rx,
            cancel,
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Completed ticks, shared with the running task.
    pub fn ticks(&self) -> Arc<AtomicU64> {
        self.ticks.clone()
    }

    async fn tick(&self) {
        let quotes = fetch_prices_or_empty(self.provider.as_ref(), &self.ids).await;
        for line in render_price_table(self.provider.as_ref(), &quotes) {
            info!("{}", line);
        }
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn run(mut self) {
        let name = self.provider.name().to_string();
        info!("[{}] price monitor tracking {:?}", name, self.ids);

        tokio::select! {
            _ = self.cancel.cancelled() => {
                info!("[{}] price monitor cancelled before first fetch", name);
                return;
            }
            _ = tokio::time::sleep(INITIAL_FETCH_DELAY) => {}
        }
        self.tick().await;

        let mut period = Duration::from_secs((*self.interval_rx.borrow_and_update()).max(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut watching = true;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                changed = self.interval_rx.changed(), if watching => {
                    if changed.is_err() {
                        warn!("[{}] interval channel closed, keeping {}s", name, period.as_secs());
                        watching = false;
                        continue;
                    }
                    let secs = (*self.interval_rx.borrow_and_update()).max(1);
                    info!("[{}] interval changed from {}s to {}s", name, period.as_secs(), secs);
                    period = Duration::from_secs(secs);
                    ticker = interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
        info!("[{}] price monitor stopped", name);
    }
}
