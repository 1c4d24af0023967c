use super::consts::*;
use super::models::*;
use super::parser::*;
use super::requests::*;
use crate::errors::{ExchangeError, Result};
use crate::http::HttpApi;
use rate_limiter::Pacer;
use std::sync::Arc;

pub struct CoinApi {
    http: HttpApi,
    list_timeout_milli_secs: u64,
    price_timeout_milli_secs: u64,
}

impl CoinApi {
    pub fn new(
        base_url: String,
        proxy_url: Option<String>,
        user_agent: Option<String>,
        pacer: Option<Arc<Pacer>>,
    ) -> Self {
        CoinApi {
            http: HttpApi::new(base_url, proxy_url, user_agent, pacer),
            list_timeout_milli_secs: DEFAULT_LIST_TIMEOUT_MILLI_SECS,
            price_timeout_milli_secs: DEFAULT_PRICE_TIMEOUT_MILLI_SECS,
        }
    }

    pub fn with_timeouts(mut self, list_timeout_milli_secs: u64, price_timeout_milli_secs: u64) -> Self {
        self.list_timeout_milli_secs = list_timeout_milli_secs;
        self.price_timeout_milli_secs = price_timeout_milli_secs;
        self
    }

    pub fn init(&mut self) -> Result<()> {
        self.http.init()
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    pub fn pacing_delay_milli_secs(&self) -> u64 {
        self.http
            .pacer()
            .map(|p| p.delay().as_millis() as u64)
            .unwrap_or(0)
    }

    pub async fn get_coins_list(&self) -> Result<Vec<CoinListItem>> {
        let params = [("include_platform", "true".to_string())];
        let text = self
            .http
            .get(COINS_LIST_ENDPOINT, &params, self.list_timeout_milli_secs)
            .await?;

        parse_coins_list(&text).map_err(|e| ExchangeError::parse_error(&text, e))
    }

    pub async fn get_simple_price(&self, req: GetSimplePriceRequest) -> Result<SimplePrices> {
        if req.ids.is_empty() {
            return Ok(SimplePrices::new());
        }

        let params = [
            ("ids", req.ids.join(",")),
            ("vs_currencies", req.vs_currency.clone()),
            ("include_24hr_change", req.include_24hr_change.to_string()),
            ("include_24hr_vol", req.include_24hr_vol.to_string()),
            ("include_market_cap", req.include_market_cap.to_string()),
            (
                "include_last_updated_at",
                req.include_last_updated_at.to_string(),
            ),
        ];
        let text = self
            .http
            .get(SIMPLE_PRICE_ENDPOINT, &params, self.price_timeout_milli_secs)
            .await?;

        parse_simple_prices(&text).map_err(|e| ExchangeError::parse_error(&text, e))
    }

    pub async fn get_coin_details(&self, coin_id: &str) -> Result<CoinDetails> {
        validate_coin_id(coin_id)?;

        let params = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
            ("sparkline", "false".to_string()),
        ];
        let endpoint = format!("{}/{}", COINS_ENDPOINT, coin_id);
        let text = self
            .http
            .get(&endpoint, &params, self.list_timeout_milli_secs)
            .await?;

        parse_coin_details(&text).map_err(|e| ExchangeError::parse_error(&text, e))
    }

    pub async fn get_trending(&self) -> Result<Vec<TrendingCoin>> {
        let text = self
            .http
            .get(TRENDING_ENDPOINT, &[], self.price_timeout_milli_secs)
            .await?;

        parse_trending(&text).map_err(|e| ExchangeError::parse_error(&text, e))
    }

    pub async fn get_markets(&self, req: GetMarketsRequest) -> Result<Vec<CoinMarket>> {
        let params = [
            ("vs_currency", req.vs_currency.to_lowercase()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", req.per_page.to_string()),
            ("page", req.page.to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];
        let text = self
            .http
            .get(MARKETS_ENDPOINT, &params, self.list_timeout_milli_secs)
            .await?;

        parse_markets(&text).map_err(|e| ExchangeError::parse_error(&text, e))
    }

    pub async fn get_asset_platforms(&self) -> Result<Vec<AssetPlatform>> {
        let text = self
            .http
            .get(ASSET_PLATFORMS_ENDPOINT, &[], self.price_timeout_milli_secs)
            .await?;

        parse_asset_platforms(&text).map_err(|e| ExchangeError::parse_error(&text, e))
    }
}

// coin id会拼进路径，只允许小写字母、数字、'-'、'_'、'.'
fn validate_coin_id(coin_id: &str) -> Result<()> {
    let valid = !coin_id.is_empty()
        && coin_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && coin_id != "."
        && coin_id != "..";
    if valid {
        Ok(())
    } else {
        Err(ExchangeError::ParametersInvalid {
            message: format!("invalid coin id: {:?}", coin_id),
        })
    }
}
