#[cfg(test)]
mod tests_lookup_cache {
    use crate::cache::{LookupCache, Record, RecordSource};
    use crate::errors::{ProxyError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    // ============================================================================
    // Helpers
    // ============================================================================

    #[derive(Debug, Clone, PartialEq)]
    struct Coin {
        id: String,
        symbol: String,
        name: String,
    }

    impl Record for Coin {
        fn id(&self) -> &str {
            &self.id
        }

        fn index_keys(&self) -> Vec<String> {
            vec![
                self.id.clone(),
                self.symbol.to_uppercase(),
                self.name.to_lowercase(),
            ]
        }
    }

    fn coin(id: &str, symbol: &str, name: &str) -> Coin {
        Coin {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }

    #[derive(Clone)]
    struct FakeSource {
        records: Arc<Mutex<Vec<Coin>>>,
        fetches: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
        rate_limited: Arc<AtomicBool>,
        latency: Duration,
    }

    impl FakeSource {
        fn new(records: Vec<Coin>) -> Self {
            FakeSource {
                records: Arc::new(Mutex::new(records)),
                fetches: Arc::new(AtomicUsize::new(0)),
                failing: Arc::new(AtomicBool::new(false)),
                rate_limited: Arc::new(AtomicBool::new(false)),
                latency: Duration::ZERO,
            }
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn set_records(&self, records: Vec<Coin>) {
            *self.records.lock().unwrap() = records;
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RecordSource for FakeSource {
        type Record = Coin;

        fn name(&self) -> &str {
            "fake"
        }

        async fn fetch_all(&self) -> Result<Vec<Coin>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.rate_limited.load(Ordering::SeqCst) {
                return Err(ProxyError::UpstreamRateLimited {
                    message: "429".to_string(),
                });
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(ProxyError::UpstreamUnavailable {
                    message: "connection refused".to_string(),
                });
            }
            Ok(self.records.lock().unwrap().clone())
        }

        fn lookup_keys(&self, key: &str) -> Vec<String> {
            vec![key.to_lowercase(), key.to_uppercase()]
        }
    }

    fn three_coins() -> Vec<Coin> {
        vec![
            coin("bitcoin", "btc", "Bitcoin"),
            coin("ethereum", "eth", "Ethereum"),
            coin("dogecoin", "doge", "Dogecoin"),
        ]
    }

    const HOUR: Duration = Duration::from_secs(3600);

    // ============================================================================
    // Staleness
    // ============================================================================

    #[tokio::test]
    async fn test_new_cache_is_stale() {
        let cache = LookupCache::new(FakeSource::new(three_coins()), HOUR);
        assert!(cache.is_stale());
        assert!(cache.is_empty());
        assert_eq!(cache.source().fetches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_after_threshold() {
        let cache = LookupCache::new(FakeSource::new(three_coins()), HOUR);
        cache.ensure_fresh().await.unwrap();
        assert!(!cache.is_stale());

        tokio::time::advance(HOUR).await;
        assert!(!cache.is_stale(), "exactly stale_after is still fresh");

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.is_stale());
    }

    #[tokio::test]
    async fn test_empty_upstream_stays_stale() {
        let source = FakeSource::new(vec![]);
        let cache = LookupCache::new(source.clone(), HOUR);
        assert_eq!(cache.refresh().await.unwrap(), 0);
        assert!(cache.is_stale());

        cache.ensure_fresh().await.unwrap();
        assert_eq!(source.fetches(), 2);
    }

    // ============================================================================
    // Reads
    // ============================================================================

    #[tokio::test]
    async fn test_scan_triggers_first_load() {
        let source = FakeSource::new(three_coins());
        let cache = LookupCache::new(source.clone(), HOUR);

        let hits = cache.scan(|c| c.id.contains("coin")).await;
        let ids: Vec<&str> = hits.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "dogecoin"]);
        assert_eq!(source.fetches(), 1);

        let all = cache.scan(|c| c.name.to_lowercase().contains("coin") || c.id == "ethereum").await;
        assert_eq!(all.len(), 3);
        assert_eq!(source.fetches(), 1, "fresh cache does not refetch");
    }

    #[tokio::test]
    async fn test_lookup_by_any_key() {
        let cache = LookupCache::new(FakeSource::new(three_coins()), HOUR);

        let by_id = cache.lookup("bitcoin").await.unwrap();
        let by_symbol = cache.lookup("btc").await.unwrap();
        let by_name = cache.lookup("BITCOIN").await.unwrap();
        assert_eq!(by_id.id, "bitcoin");
        assert!(Arc::ptr_eq(&by_id, &by_symbol));
        assert!(Arc::ptr_eq(&by_id, &by_name));

        assert!(cache.lookup("solana").await.is_none());
    }

    #[tokio::test]
    async fn test_get_and_filter_do_no_io() {
        let source = FakeSource::new(three_coins());
        let cache = LookupCache::new(source.clone(), HOUR);

        assert!(cache.get("bitcoin").is_none());
        assert!(cache.filter(|_| true).is_empty());
        assert_eq!(source.fetches(), 0);
    }

    // ============================================================================
    // Failures
    // ============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let source = FakeSource::new(three_coins());
        let cache = LookupCache::new(source.clone(), HOUR);
        cache.ensure_fresh().await.unwrap();

        tokio::time::advance(HOUR + Duration::from_secs(1)).await;
        source.set_failing(true);
        source.set_records(vec![]);

        assert!(cache.ensure_fresh().await.is_err());
        let doge = cache.lookup("dogecoin").await;
        assert_eq!(doge.map(|c| c.id.clone()), Some("dogecoin".to_string()));
        assert_eq!(cache.len(), 3);

        let stats = cache.stats();
        assert!(stats.stale);
        assert!(stats.refresh_failures >= 1);
    }

    #[tokio::test]
    async fn test_failure_on_empty_cache_serves_empty() {
        let source = FakeSource::new(three_coins());
        source.set_failing(true);
        let cache = LookupCache::new(source.clone(), HOUR);

        assert!(cache.scan(|_| true).await.is_empty());
        assert!(cache.lookup("bitcoin").await.is_none());
        assert!(matches!(
            cache.refresh().await,
            Err(ProxyError::UpstreamUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_rate_limited_refresh_propagates() {
        let source = FakeSource::new(three_coins());
        source.rate_limited.store(true, Ordering::SeqCst);
        let cache = LookupCache::new(source, HOUR);

        let err = cache.refresh().await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    // ============================================================================
    // Single-flight
    // ============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_ensure_fresh_fetches_once() {
        let source = FakeSource::new(three_coins()).with_latency(Duration::from_millis(500));
        let cache = Arc::new(LookupCache::new(source.clone(), HOUR));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.ensure_fresh().await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(source.fetches(), 1);
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_share_failed_outcome() {
        let source = FakeSource::new(three_coins()).with_latency(Duration::from_millis(500));
        source.set_failing(true);
        let cache = Arc::new(LookupCache::new(source.clone(), HOUR));

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.ensure_fresh().await })
        };

        assert!(first.await.unwrap().is_err());
        assert!(second.await.unwrap().is_err());
        assert_eq!(source.fetches(), 1);
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_fetch() {
        let source = FakeSource::new(three_coins());
        let cache = LookupCache::new(source.clone(), HOUR);
        cache.refresh().await.unwrap();
        cache.refresh().await.unwrap();
        assert_eq!(source.fetches(), 2);
        assert_eq!(cache.stats().refresh_attempts, 2);
    }

    // ============================================================================
    // Custom records
    // ============================================================================

    #[tokio::test]
    async fn test_insert_custom_without_io() {
        let source = FakeSource::new(three_coins());
        let cache = LookupCache::new(source.clone(), HOUR);

        cache.insert_custom(coin("koge-coin", "koge", "KOGE"));
        let koge = cache.get("KOGE").unwrap();
        assert_eq!(koge.id, "koge-coin");
        assert_eq!(source.fetches(), 0);
        assert_eq!(cache.custom_len(), 1);
    }

    #[tokio::test]
    async fn test_custom_survives_refresh_and_shadows_upstream() {
        let source = FakeSource::new(three_coins());
        let cache = LookupCache::new(source.clone(), HOUR);
        cache.refresh().await.unwrap();

        cache.insert_custom(coin("my-doge", "doge", "My Doge"));
        assert_eq!(cache.get("doge").unwrap().id, "my-doge");

        cache.refresh().await.unwrap();
        assert_eq!(cache.get("doge").unwrap().id, "my-doge");
        assert_eq!(cache.get("dogecoin").unwrap().id, "dogecoin");
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.custom_len(), 1);
    }

    #[tokio::test]
    async fn test_reinserting_custom_replaces_by_id() {
        let source = FakeSource::new(three_coins());
        let cache = LookupCache::new(source.clone(), HOUR);

        cache.insert_custom(coin("koge-coin", "koge", "KOGE"));
        cache.insert_custom(coin("koge-coin", "koge", "KOGE"));
        cache.insert_custom(coin("koge-coin", "kog", "Koge Token"));
        cache.refresh().await.unwrap();

        let koges = cache.scan(|c| c.id == "koge-coin").await;
        assert_eq!(koges.len(), 1);
        assert_eq!(koges[0].name, "Koge Token");
        assert_eq!(cache.custom_len(), 1);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get("KOG").unwrap().id, "koge-coin");
        // 旧key随替换一起移除
        assert!(cache.get("KOGE").is_none());
        assert!(cache.get("koge").is_none());
    }

    #[tokio::test]
    async fn test_custom_only_cache_still_loads_upstream() {
        let source = FakeSource::new(three_coins());
        let cache = LookupCache::new(source.clone(), HOUR);
        cache.insert_custom(coin("koge-coin", "koge", "KOGE"));

        // 从未刷新过，仍需要加载上游
        assert!(cache.is_stale());
        cache.ensure_fresh().await.unwrap();
        assert_eq!(source.fetches(), 1);
        assert_eq!(cache.len(), 4);
    }

    // ============================================================================
    // Stats
    // ============================================================================

    #[tokio::test]
    async fn test_stats_and_distinct_count() {
        let source = FakeSource::new(vec![
            coin("bitcoin", "btc", "Bitcoin"),
            coin("bitcoin-bep2", "btc", "Bitcoin BEP2"),
            coin("ethereum", "eth", "Ethereum"),
        ]);
        let cache = LookupCache::new(source, HOUR);

        let stats = cache.stats();
        assert_eq!(stats.count, 0);
        assert!(stats.last_refresh.is_none());

        cache.refresh().await.unwrap();
        let stats = cache.stats();
        assert_eq!(stats.source, "fake");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.custom_count, 0);
        assert!(stats.last_refresh.unwrap().ends_with('Z'));
        assert!(!stats.stale);
        assert_eq!(cache.distinct_count(|c| c.symbol.as_str()), 2);
    }
}
