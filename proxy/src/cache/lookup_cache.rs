use super::traits::{Record, RecordSource};
use crate::errors::Result;
use arc_swap::ArcSwap;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use time::LatencyGuard;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60 * 60);

// 一次刷新产生的不可变快照，读路径只做load，不加锁
struct Snapshot<R> {
    upstream: Vec<Arc<R>>,
    custom: Vec<Arc<R>>,
    index: HashMap<String, Arc<R>>,
    last_refresh: Option<Instant>,
    last_refresh_millis: Option<u64>,
}

impl<R: Record> Snapshot<R> {
    fn empty() -> Self {
        Snapshot {
            upstream: Vec::new(),
            custom: Vec::new(),
            index: HashMap::new(),
            last_refresh: None,
            last_refresh_millis: None,
        }
    }

    // upstream在前、custom在后，key冲突时后者覆盖前者
    fn build(
        upstream: Vec<Arc<R>>,
        custom: Vec<Arc<R>>,
        last_refresh: Option<Instant>,
        last_refresh_millis: Option<u64>,
    ) -> Self {
        let mut index = HashMap::with_capacity(upstream.len() * 2 + custom.len() * 2);
        for record in upstream.iter().chain(custom.iter()) {
            for key in record.index_keys() {
                index.insert(key, record.clone());
            }
        }
        Snapshot {
            upstream,
            custom,
            index,
            last_refresh,
            last_refresh_millis,
        }
    }

    fn len(&self) -> usize {
        self.upstream.len() + self.custom.len()
    }

    fn records(&self) -> impl Iterator<Item = &Arc<R>> {
        self.upstream.iter().chain(self.custom.iter())
    }
}

struct RefreshGate {
    generation: u64,
    last_outcome: Option<Result<usize>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub source: String,
    pub count: usize,
    pub custom_count: usize,
    pub last_refresh: Option<String>,
    pub stale: bool,
    pub refresh_attempts: u64,
    pub refresh_failures: u64,
}

/// In-memory record table that refreshes itself from a [`RecordSource`].
///
/// Reads never block on I/O unless the table is stale: `ensure_fresh`,
/// `lookup` and `scan` may suspend on a refresh, `get` and `filter` never do.
/// Concurrent refreshes collapse into a single upstream call; a failed
/// refresh leaves the previous snapshot in place.
pub struct LookupCache<S: RecordSource> {
    source: S,
    stale_after: Duration,
    snapshot: ArcSwap<Snapshot<S::Record>>,
    gate: Mutex<RefreshGate>,
    generation: AtomicU64,
    refresh_attempts: AtomicU64,
    refresh_failures: AtomicU64,
}

impl<S: RecordSource> LookupCache<S> {
    pub fn new(source: S, stale_after: Duration) -> Self {
        LookupCache {
            source,
            stale_after,
            snapshot: ArcSwap::from_pointee(Snapshot::empty()),
            gate: Mutex::new(RefreshGate {
                generation: 0,
                last_outcome: None,
            }),
            generation: AtomicU64::new(0),
            refresh_attempts: AtomicU64::new(0),
            refresh_failures: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn is_stale(&self) -> bool {
        let snapshot = self.snapshot.load();
        if snapshot.len() == 0 {
            return true;
        }
        match snapshot.last_refresh {
            Some(last_refresh) => last_refresh.elapsed() > self.stale_after,
            None => true,
        }
    }

    /// Refresh when stale; returns immediately otherwise.
    pub async fn ensure_fresh(&self) -> Result<()> {
        if !self.is_stale() {
            return Ok(());
        }
        self.refresh_gated(false).await.map(|_| ())
    }

    /// Unconditional refresh. Joins an in-flight refresh instead of issuing
    /// a second upstream call. Returns the number of upstream records.
    pub async fn refresh(&self) -> Result<usize> {
        self.refresh_gated(true).await
    }

    async fn refresh_gated(&self, force: bool) -> Result<usize> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut gate = self.gate.lock().await;

        // 等锁期间已有刷新完成，直接复用其结果
        if gate.generation != observed {
            if let Some(outcome) = &gate.last_outcome {
                return outcome.clone();
            }
        }
        if !force && !self.is_stale() {
            return Ok(self.snapshot.load().upstream.len());
        }

        let outcome = self.do_refresh().await;
        gate.generation += 1;
        gate.last_outcome = Some(outcome.clone());
        self.generation.store(gate.generation, Ordering::Release);
        outcome
    }

    async fn do_refresh(&self) -> Result<usize> {
        let name = self.source.name().to_string();
        let _lg = LatencyGuard::new(format!("LookupCache[{}]::refresh", name));
        self.refresh_attempts.fetch_add(1, Ordering::Relaxed);

        match self.source.fetch_all().await {
            Ok(records) => {
                let upstream: Vec<Arc<S::Record>> = records.into_iter().map(Arc::new).collect();
                let count = upstream.len();
                let now = Instant::now();
                let now_millis = time::get_current_milli_timestamp();
                // rcu: 与insert_custom并发时不丢custom记录
                self.snapshot.rcu(|current| {
                    Snapshot::build(
                        upstream.clone(),
                        current.custom.clone(),
                        Some(now),
                        Some(now_millis),
                    )
                });
                info!("[{}] refreshed {} records", name, count);
                Ok(count)
            }
            Err(e) => {
                self.refresh_failures.fetch_add(1, Ordering::Relaxed);
                if e.is_rate_limited() {
                    error!("[{}] refresh rate limited, widen the polling interval: {}", name, e);
                } else {
                    error!("[{}] refresh failed: {}", name, e);
                }
                Err(e)
            }
        }
    }

    /// Point lookup without any I/O.
    pub fn get(&self, key: &str) -> Option<Arc<S::Record>> {
        let snapshot = self.snapshot.load();
        self.source
            .lookup_keys(key)
            .iter()
            .find_map(|k| snapshot.index.get(k).cloned())
    }

    /// Records matching `pred`, in insertion order, without any I/O.
    pub fn filter<F>(&self, pred: F) -> Vec<Arc<S::Record>>
    where
        F: Fn(&S::Record) -> bool,
    {
        self.snapshot
            .load()
            .records()
            .filter(|r| pred(r.as_ref()))
            .cloned()
            .collect()
    }

    pub fn records(&self) -> Vec<Arc<S::Record>> {
        self.snapshot.load().records().cloned().collect()
    }

    pub async fn lookup(&self, key: &str) -> Option<Arc<S::Record>> {
        self.ensure_fresh_or_stale().await;
        self.get(key)
    }

    pub async fn scan<F>(&self, pred: F) -> Vec<Arc<S::Record>>
    where
        F: Fn(&S::Record) -> bool + Send,
    {
        self.ensure_fresh_or_stale().await;
        self.filter(pred)
    }

    pub async fn all(&self) -> Vec<Arc<S::Record>> {
        self.ensure_fresh_or_stale().await;
        self.records()
    }

    // 读路径：刷新失败时继续使用旧数据（可能为空）
    async fn ensure_fresh_or_stale(&self) {
        if let Err(e) = self.ensure_fresh().await {
            warn!(
                "[{}] serving {} cached records after refresh failure: {}",
                self.source.name(),
                self.len(),
                e
            );
        }
    }

    /// Append an operator-supplied record. No I/O and no staleness check; the
    /// record shadows any upstream record sharing one of its keys and
    /// survives later refreshes. A custom record with the same id is
    /// replaced in place.
    pub fn insert_custom(&self, record: S::Record) -> Arc<S::Record> {
        let record = Arc::new(record);
        self.snapshot.rcu(|current| {
            let mut custom = current.custom.clone();
            if let Some(pos) = custom.iter().position(|r| r.id() == record.id()) {
                // 替换后旧记录的key可能失效，整体重建索引
                custom[pos] = record.clone();
                return Snapshot::build(
                    current.upstream.clone(),
                    custom,
                    current.last_refresh,
                    current.last_refresh_millis,
                );
            }
            custom.push(record.clone());
            let mut index = current.index.clone();
            for key in record.index_keys() {
                index.insert(key, record.clone());
            }
            Snapshot {
                upstream: current.upstream.clone(),
                custom,
                index,
                last_refresh: current.last_refresh,
                last_refresh_millis: current.last_refresh_millis,
            }
        });
        info!("[{}] added custom record: {}", self.source.name(), record.id());
        record
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn custom_len(&self) -> usize {
        self.snapshot.load().custom.len()
    }

    pub fn distinct_count<F>(&self, f: F) -> usize
    where
        F: Fn(&S::Record) -> &str,
    {
        let snapshot = self.snapshot.load();
        snapshot
            .records()
            .map(|r| f(r.as_ref()))
            .collect::<HashSet<&str>>()
            .len()
    }

    pub fn stats(&self) -> CacheStats {
        let snapshot = self.snapshot.load();
        CacheStats {
            source: self.source.name().to_string(),
            count: snapshot.len(),
            custom_count: snapshot.custom.len(),
            last_refresh: snapshot.last_refresh_millis.map(time::millis_to_rfc3339),
            stale: self.is_stale(),
            refresh_attempts: self.refresh_attempts.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
        }
    }
}
