use crate::cache::{CacheStats, LookupCache, Record, RecordSource};
use crate::errors::Result;
use async_trait::async_trait;
use exchange::binance::consts::SYMBOL_STATUS_TRADING;
use exchange::binance::spot::MarketApi;
use exchange::binance::spot::models::SymbolInfo;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const CUSTOM_STATUS: &str = "CUSTOM";
pub const DEFAULT_QUOTE_ASSET: &str = "USDT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRecord {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub pair: String, // BASE/QUOTE
    pub status: String,
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SymbolRecord {
    pub fn custom(symbol: &str, base_asset: &str, quote_asset: &str, name: Option<String>) -> Self {
        let base_asset = base_asset.to_uppercase();
        let quote_asset = quote_asset.to_uppercase();
        SymbolRecord {
            symbol: symbol.to_uppercase(),
            pair: format!("{}/{}", base_asset, quote_asset),
            base_asset,
            quote_asset,
            status: CUSTOM_STATUS.to_string(),
            permissions: vec![CUSTOM_STATUS.to_string()],
            is_custom: true,
            name,
        }
    }
}

impl From<SymbolInfo> for SymbolRecord {
    fn from(info: SymbolInfo) -> Self {
        SymbolRecord {
            pair: format!("{}/{}", info.base_asset, info.quote_asset),
            symbol: info.symbol,
            base_asset: info.base_asset,
            quote_asset: info.quote_asset,
            status: info.status,
            permissions: info.permissions,
            is_custom: false,
            name: None,
        }
    }
}

impl Record for SymbolRecord {
    fn id(&self) -> &str {
        &self.symbol
    }

    // 同一base_asset有多个交易对时，索引指向最后一个
    fn index_keys(&self) -> Vec<String> {
        vec![self.symbol.to_uppercase(), self.base_asset.to_uppercase()]
    }
}

pub struct BinanceSymbolSource {
    api: Arc<MarketApi>,
}

impl BinanceSymbolSource {
    pub fn new(api: Arc<MarketApi>) -> Self {
        BinanceSymbolSource { api }
    }

    pub fn api(&self) -> &Arc<MarketApi> {
        &self.api
    }
}

#[async_trait]
impl RecordSource for BinanceSymbolSource {
    type Record = SymbolRecord;

    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_all(&self) -> Result<Vec<SymbolRecord>> {
        let exchange_info = self.api.get_exchange_info().await?;
        Ok(exchange_info
            .symbols
            .into_iter()
            .filter(|s| s.status == SYMBOL_STATUS_TRADING)
            .map(SymbolRecord::from)
            .collect())
    }

    fn lookup_keys(&self, key: &str) -> Vec<String> {
        vec![key.to_uppercase()]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolFilter {
    pub quote_asset: Option<String>,
    pub base_asset: Option<String>,
}

impl SymbolFilter {
    fn matches(&self, record: &SymbolRecord) -> bool {
        let quote_ok = self
            .quote_asset
            .as_ref()
            .is_none_or(|q| record.quote_asset == q.to_uppercase());
        let base_ok = self
            .base_asset
            .as_ref()
            .is_none_or(|b| record.base_asset == b.to_uppercase());
        quote_ok && base_ok
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolCatalogStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    pub unique_base_assets: usize,
    pub unique_quote_assets: usize,
}

/// Binance trading symbols, refreshed from `exchangeInfo` at most once per
/// staleness window.
pub struct SymbolCatalog {
    cache: LookupCache<BinanceSymbolSource>,
}

impl SymbolCatalog {
    pub fn new(api: Arc<MarketApi>, stale_after: Duration) -> Self {
        SymbolCatalog {
            cache: LookupCache::new(BinanceSymbolSource::new(api), stale_after),
        }
    }

    pub fn cache(&self) -> &LookupCache<BinanceSymbolSource> {
        &self.cache
    }

    pub fn api(&self) -> &Arc<MarketApi> {
        self.cache.source().api()
    }

    pub async fn all_symbols(&self, filter: &SymbolFilter) -> Vec<Arc<SymbolRecord>> {
        self.cache.scan(|r| filter.matches(r)).await
    }

    pub async fn search(&self, query: &str) -> Vec<Arc<SymbolRecord>> {
        let term = query.to_uppercase();
        self.cache
            .scan(|r| {
                r.symbol.contains(&term)
                    || r.base_asset.contains(&term)
                    || r.quote_asset.contains(&term)
                    || r.pair.contains(&term)
            })
            .await
    }

    /// Look a symbol up by its name or its base asset.
    pub async fn get_symbol(&self, key: &str) -> Option<Arc<SymbolRecord>> {
        self.cache.lookup(key).await
    }

    /// Every pair where `coin` is the base or the quote asset.
    pub async fn coin_pairs(&self, coin: &str) -> Vec<Arc<SymbolRecord>> {
        let coin = coin.to_uppercase();
        self.cache
            .scan(|r| r.base_asset == coin || r.quote_asset == coin)
            .await
    }

    pub fn add_custom_symbol(
        &self,
        symbol: &str,
        base_asset: &str,
        quote_asset: Option<&str>,
        name: Option<String>,
    ) -> Arc<SymbolRecord> {
        let record = SymbolRecord::custom(
            symbol,
            base_asset,
            quote_asset.unwrap_or(DEFAULT_QUOTE_ASSET),
            name,
        );
        self.cache.insert_custom(record)
    }

    pub async fn refresh(&self) -> Result<usize> {
        self.cache.refresh().await
    }

    pub fn stats(&self) -> SymbolCatalogStats {
        SymbolCatalogStats {
            cache: self.cache.stats(),
            unique_base_assets: self.cache.distinct_count(|r| r.base_asset.as_str()),
            unique_quote_assets: self.cache.distinct_count(|r| r.quote_asset.as_str()),
        }
    }
}
