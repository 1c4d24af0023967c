use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Fixed pacing in front of an upstream API.
///
/// Every call to [`Pacer::wait`] sleeps for the configured delay before it
/// returns. Waiters sharing one pacer are serialised, so the requests they
/// guard start at least `delay` apart. Only the waiting task is suspended.
pub struct Pacer {
    delay: Duration,
    gate: Mutex<()>,
    calls: AtomicU64,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: Mutex::new(()),
            calls: AtomicU64::new(0),
        }
    }

    pub fn from_millis(delay_millis: u64) -> Self {
        Self::new(Duration::from_millis(delay_millis))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    // 已放行的请求数
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub async fn wait(&self) {
        if self.delay.is_zero() {
            self.calls.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let _gate = self.gate.lock().await;
        debug!("Pacer sleeping for {:?} before upstream call", self.delay);
        tokio::time::sleep(self.delay).await;
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}
