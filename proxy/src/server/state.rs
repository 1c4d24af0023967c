use crate::catalog::{CoinCatalog, SymbolCatalog};
use crate::config::{BinanceConfig, CoinGeckoConfig};
use crate::price_provider::{BinanceSpotPriceProvider, CoinGeckoPriceProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Runtime-adjustable polling interval, shared between a REST server and its
/// price monitor.
pub struct IntervalControl {
    tx: watch::Sender<u64>,
    started_at: Instant,
}

impl IntervalControl {
    pub fn new(initial_secs: u64) -> Self {
        let (tx, _) = watch::channel(initial_secs);
        IntervalControl {
            tx,
            started_at: Instant::now(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Returns the previous interval.
    pub fn set(&self, secs: u64) -> u64 {
        self.tx.send_replace(secs)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

pub struct BinanceState {
    pub catalog: Arc<SymbolCatalog>,
    pub prices: Arc<BinanceSpotPriceProvider>,
    pub config: BinanceConfig,
    pub interval: IntervalControl,
}

pub struct CoinGeckoState {
    pub catalog: Arc<CoinCatalog>,
    pub prices: Arc<CoinGeckoPriceProvider>,
    pub config: CoinGeckoConfig,
    pub interval: IntervalControl,
}
