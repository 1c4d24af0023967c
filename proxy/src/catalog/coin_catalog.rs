use crate::cache::{CacheStats, LookupCache, Record, RecordSource};
use crate::errors::Result;
use async_trait::async_trait;
use exchange::coingecko::CoinApi;
use exchange::coingecko::models::CoinListItem;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub id: String,
    pub symbol: String, // 大写
    pub name: String,
    #[serde(default)]
    pub platforms: BTreeMap<String, Option<String>>,
}

impl CoinRecord {
    pub fn has_contract(&self, address: &str) -> bool {
        self.platforms
            .values()
            .flatten()
            .any(|a| !a.is_empty() && a.eq_ignore_ascii_case(address))
    }
}

impl From<CoinListItem> for CoinRecord {
    fn from(item: CoinListItem) -> Self {
        CoinRecord {
            id: item.id,
            symbol: item.symbol.to_uppercase(),
            name: item.name,
            platforms: item.platforms,
        }
    }
}

impl Record for CoinRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn index_keys(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.symbol.clone(),
            self.name.to_lowercase(),
        ]
    }
}

pub struct CoinGeckoCoinSource {
    api: Arc<CoinApi>,
}

impl CoinGeckoCoinSource {
    pub fn new(api: Arc<CoinApi>) -> Self {
        CoinGeckoCoinSource { api }
    }

    pub fn api(&self) -> &Arc<CoinApi> {
        &self.api
    }
}

#[async_trait]
impl RecordSource for CoinGeckoCoinSource {
    type Record = CoinRecord;

    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_all(&self) -> Result<Vec<CoinRecord>> {
        let coins = self.api.get_coins_list().await?;
        Ok(coins.into_iter().map(CoinRecord::from).collect())
    }

    // id和name按小写索引，symbol按大写
    fn lookup_keys(&self, key: &str) -> Vec<String> {
        vec![key.to_lowercase(), key.to_uppercase()]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoinFilter {
    pub symbol: Option<String>,
    pub name: Option<String>,
}

impl CoinFilter {
    fn matches(&self, record: &CoinRecord) -> bool {
        let symbol_ok = self
            .symbol
            .as_ref()
            .is_none_or(|s| record.symbol.contains(&s.to_uppercase()));
        let name_ok = self
            .name
            .as_ref()
            .is_none_or(|n| record.name.to_lowercase().contains(&n.to_lowercase()));
        symbol_ok && name_ok
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinCatalogStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    pub unique_symbols: usize,
    pub api_endpoint: String,
    pub rate_limit_delay_ms: u64,
}

fn matches_term(record: &CoinRecord, term: &str) -> bool {
    record.id.to_lowercase().contains(term)
        || record.symbol.to_lowercase().contains(term)
        || record.name.to_lowercase().contains(term)
}

/// CoinGecko coin list with id / symbol / name indexes.
pub struct CoinCatalog {
    cache: LookupCache<CoinGeckoCoinSource>,
}

impl CoinCatalog {
    pub fn new(api: Arc<CoinApi>, stale_after: Duration) -> Self {
        CoinCatalog {
            cache: LookupCache::new(CoinGeckoCoinSource::new(api), stale_after),
        }
    }

    pub fn cache(&self) -> &LookupCache<CoinGeckoCoinSource> {
        &self.cache
    }

    pub fn api(&self) -> &Arc<CoinApi> {
        self.cache.source().api()
    }

    pub async fn all_coins(&self, filter: &CoinFilter) -> Vec<Arc<CoinRecord>> {
        self.cache.scan(|r| filter.matches(r)).await
    }

    pub async fn search(&self, query: &str) -> Vec<Arc<CoinRecord>> {
        let term = query.to_lowercase();
        self.cache.scan(|r| matches_term(r, &term)).await
    }

    pub async fn get_coin(&self, key: &str) -> Option<Arc<CoinRecord>> {
        self.cache.lookup(key).await
    }

    /// Coins matching any of `variants`, first match wins on duplicate ids.
    pub async fn find_variants(&self, variants: &[String]) -> Vec<Arc<CoinRecord>> {
        if let Err(e) = self.cache.ensure_fresh().await {
            log::warn!("find_variants on stale coin list: {}", e);
        }
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for variant in variants {
            let term = variant.to_lowercase();
            for record in self.cache.filter(|r| matches_term(r, &term)) {
                if seen.insert(record.id.clone()) {
                    found.push(record);
                }
            }
        }
        found
    }

    pub async fn find_by_contract_address(&self, address: &str) -> Vec<Arc<CoinRecord>> {
        self.cache.scan(|r| r.has_contract(address)).await
    }

    pub async fn refresh(&self) -> Result<usize> {
        self.cache.refresh().await
    }

    pub fn stats(&self) -> CoinCatalogStats {
        let api = self.api();
        CoinCatalogStats {
            cache: self.cache.stats(),
            unique_symbols: self.cache.distinct_count(|r| r.symbol.as_str()),
            api_endpoint: api.base_url().to_string(),
            rate_limit_delay_ms: api.pacing_delay_milli_secs(),
        }
    }
}
