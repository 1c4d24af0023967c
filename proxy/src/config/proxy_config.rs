use super::Config;
use crate::errors::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const MIN_INTERVAL_SECS: u64 = 1;
pub const MAX_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proxy {
    pub url: String,
}

fn default_user_agent() -> String {
    exchange::http::DEFAULT_USER_AGENT.to_string()
}

fn default_stale_after_secs() -> u64 {
    3600
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSymbolConfig {
    pub symbol: String,
    pub base_asset: String,
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_binance_api_base_url() -> String {
    exchange::binance::consts::SPOT_BASE_URL.to_string()
}

fn default_binance_port() -> u16 {
    10000
}

fn default_binance_interval_secs() -> u64 {
    2
}

fn default_tracked_symbols() -> Vec<String> {
    ["BTCUSDT", "ETHUSDT", "BNBUSDT", "DOGEUSDT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_binance_pacing_delay_ms() -> u64 {
    exchange::binance::consts::DEFAULT_PACING_DELAY_MILLI_SECS
}

fn default_exchange_info_timeout_ms() -> u64 {
    exchange::binance::consts::DEFAULT_EXCHANGE_INFO_TIMEOUT_MILLI_SECS
}

fn default_binance_price_timeout_ms() -> u64 {
    exchange::binance::consts::DEFAULT_PRICE_TIMEOUT_MILLI_SECS
}

fn default_custom_symbols() -> Vec<CustomSymbolConfig> {
    vec![CustomSymbolConfig {
        symbol: "KOGEUSDT".to_string(),
        base_asset: "KOGE".to_string(),
        quote_asset: default_quote_asset(),
        name: Some("KOGE".to_string()),
    }]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceConfig {
    #[serde(default = "default_binance_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_binance_port")]
    pub port: u16,
    #[serde(default = "default_binance_interval_secs")]
    pub interval_secs: u64, // 价格轮询间隔（秒）
    #[serde(default = "default_tracked_symbols")]
    pub tracked_symbols: Vec<String>,

    #[serde(default = "default_binance_pacing_delay_ms")]
    pub pacing_delay_ms: u64, // 每次上游调用前的固定延迟
    #[serde(default = "default_exchange_info_timeout_ms")]
    pub exchange_info_timeout_ms: u64,
    #[serde(default = "default_binance_price_timeout_ms")]
    pub price_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    #[serde(default = "default_custom_symbols")]
    pub custom_symbols: Vec<CustomSymbolConfig>,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        BinanceConfig {
            api_base_url: default_binance_api_base_url(),
            port: default_binance_port(),
            interval_secs: default_binance_interval_secs(),
            tracked_symbols: default_tracked_symbols(),
            pacing_delay_ms: default_binance_pacing_delay_ms(),
            exchange_info_timeout_ms: default_exchange_info_timeout_ms(),
            price_timeout_ms: default_binance_price_timeout_ms(),
            user_agent: default_user_agent(),
            stale_after_secs: default_stale_after_secs(),
            custom_symbols: default_custom_symbols(),
        }
    }
}

impl BinanceConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

fn default_alpha_token_name() -> String {
    "KOGE".to_string()
}

fn default_alpha_variants() -> Vec<String> {
    ["koge", "kog", "koge-alpha", "kogecoin"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_alpha_contract_address() -> String {
    "0xe6df05ce8c8301223373cf5b969afcb1498c5528".to_string()
}

fn default_alpha_platform() -> String {
    "binance-smart-chain".to_string()
}

fn default_alpha_description() -> String {
    "Alpha token from BSC".to_string()
}

fn default_alpha_display_suffix() -> String {
    "48 Club Token".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaTokenConfig {
    #[serde(default = "default_alpha_token_name")]
    pub name: String,
    #[serde(default = "default_alpha_variants")]
    pub variants: Vec<String>,
    #[serde(default = "default_alpha_contract_address")]
    pub contract_address: String,
    #[serde(default = "default_alpha_platform")]
    pub platform: String,
    #[serde(default = "default_alpha_description")]
    pub description: String,
    #[serde(default = "default_alpha_display_suffix")]
    pub display_suffix: String, // coin-names中显示为 "<name> - <suffix>"
}

impl AlphaTokenConfig {
    pub fn display_name(&self, coin_name: &str) -> String {
        if self.display_suffix.is_empty() {
            return coin_name.to_string();
        }
        format!("{} - {}", coin_name, self.display_suffix)
    }
}

impl Default for AlphaTokenConfig {
    fn default() -> Self {
        AlphaTokenConfig {
            name: default_alpha_token_name(),
            variants: default_alpha_variants(),
            contract_address: default_alpha_contract_address(),
            platform: default_alpha_platform(),
            description: default_alpha_description(),
            display_suffix: default_alpha_display_suffix(),
        }
    }
}

fn default_coingecko_api_base_url() -> String {
    exchange::coingecko::consts::BASE_URL.to_string()
}

fn default_coingecko_port() -> u16 {
    10001
}

fn default_coingecko_interval_secs() -> u64 {
    5
}

fn default_tracked_coin_ids() -> Vec<String> {
    ["bitcoin", "ethereum", "binancecoin", "dogecoin"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_coingecko_pacing_delay_ms() -> u64 {
    exchange::coingecko::consts::DEFAULT_PACING_DELAY_MILLI_SECS
}

fn default_list_timeout_ms() -> u64 {
    exchange::coingecko::consts::DEFAULT_LIST_TIMEOUT_MILLI_SECS
}

fn default_coingecko_price_timeout_ms() -> u64 {
    exchange::coingecko::consts::DEFAULT_PRICE_TIMEOUT_MILLI_SECS
}

fn default_symbol_aliases() -> BTreeMap<String, String> {
    [
        ("BTC", "bitcoin"),
        ("ETH", "ethereum"),
        ("BNB", "binancecoin"),
        ("DOGE", "dogecoin"),
        ("KOGE", "koge-coin"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinGeckoConfig {
    #[serde(default = "default_coingecko_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_coingecko_port")]
    pub port: u16,
    #[serde(default = "default_coingecko_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_tracked_coin_ids")]
    pub tracked_coin_ids: Vec<String>,

    #[serde(default = "default_coingecko_pacing_delay_ms")]
    pub pacing_delay_ms: u64, // 免费档约50次/分钟
    #[serde(default = "default_list_timeout_ms")]
    pub list_timeout_ms: u64,
    #[serde(default = "default_coingecko_price_timeout_ms")]
    pub price_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    // 短symbol到coin id的映射，key统一大写
    #[serde(default = "default_symbol_aliases")]
    pub symbol_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub alpha_token: AlphaTokenConfig,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        CoinGeckoConfig {
            api_base_url: default_coingecko_api_base_url(),
            port: default_coingecko_port(),
            interval_secs: default_coingecko_interval_secs(),
            tracked_coin_ids: default_tracked_coin_ids(),
            pacing_delay_ms: default_coingecko_pacing_delay_ms(),
            list_timeout_ms: default_list_timeout_ms(),
            price_timeout_ms: default_coingecko_price_timeout_ms(),
            user_agent: default_user_agent(),
            stale_after_secs: default_stale_after_secs(),
            symbol_aliases: default_symbol_aliases(),
            alpha_token: AlphaTokenConfig::default(),
        }
    }
}

impl CoinGeckoConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn resolve_alias(&self, symbol: &str) -> Option<&String> {
        self.symbol_aliases.get(&symbol.to_uppercase())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProxyConfig {
    pub log_file: Option<String>,
    pub proxy: Option<Proxy>,
    pub binance: BinanceConfig,
    pub coingecko: CoinGeckoConfig,
}

impl ProxyConfig {
    pub fn from_config(config: &Config) -> Result<Self> {
        let log_file: Option<String> =
            config
                .get_optional("log_file")
                .map_err(|e| ProxyError::ConfigError {
                    message: format!("get log_file err: {}", e),
                })?;
        let proxy: Option<Proxy> =
            config
                .get_optional("proxy")
                .map_err(|e| ProxyError::ConfigError {
                    message: format!("get proxy err: {}", e),
                })?;
        let binance: BinanceConfig = config
            .get_optional("binance")
            .map_err(|e| ProxyError::ConfigError {
                message: format!("get binance config err: {}", e),
            })?
            .unwrap_or_default();
        let mut coingecko: CoinGeckoConfig = config
            .get_optional("coingecko")
            .map_err(|e| ProxyError::ConfigError {
                message: format!("get coingecko config err: {}", e),
            })?
            .unwrap_or_default();
        coingecko.symbol_aliases = coingecko
            .symbol_aliases
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();

        let proxy_config = ProxyConfig {
            log_file,
            proxy,
            binance,
            coingecko,
        };
        proxy_config.validate()?;
        Ok(proxy_config)
    }

    /// CLI / environment overrides; non-positive values are ignored.
    pub fn apply_overrides(&mut self, binance_interval: Option<i64>, coingecko_interval: Option<i64>) {
        if let Some(secs) = binance_interval.filter(|s| *s > 0) {
            self.binance.interval_secs = secs as u64;
        }
        if let Some(secs) = coingecko_interval.filter(|s| *s > 0) {
            self.coingecko.interval_secs = secs as u64;
        }
    }

    pub fn proxy_url(&self) -> Option<String> {
        self.proxy.as_ref().map(|p| p.url.clone())
    }

    fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("binance", self.binance.interval_secs),
            ("coingecko", self.coingecko.interval_secs),
        ] {
            if secs < MIN_INTERVAL_SECS {
                return Err(ProxyError::ConfigError {
                    message: format!("{}.interval_secs must be >= {}", name, MIN_INTERVAL_SECS),
                });
            }
        }
        if self.binance.port == self.coingecko.port {
            return Err(ProxyError::ConfigError {
                message: format!("binance and coingecko share port {}", self.binance.port),
            });
        }
        Ok(())
    }
}
