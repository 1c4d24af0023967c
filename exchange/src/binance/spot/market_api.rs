use super::super::consts::*;
use super::models::*;
use super::parser::*;
use super::requests::*;
use crate::errors::{ExchangeError, Result};
use crate::http::HttpApi;
use log::error;
use rate_limiter::Pacer;
use std::sync::Arc;

pub struct MarketApi {
    http: HttpApi,
    exchange_info_timeout_milli_secs: u64,
    price_timeout_milli_secs: u64,
}

impl MarketApi {
    pub fn new(
        base_url: String,
        proxy_url: Option<String>,
        user_agent: Option<String>,
        pacer: Option<Arc<Pacer>>,
    ) -> Self {
        MarketApi {
            http: HttpApi::new(base_url, proxy_url, user_agent, pacer),
            exchange_info_timeout_milli_secs: DEFAULT_EXCHANGE_INFO_TIMEOUT_MILLI_SECS,
            price_timeout_milli_secs: DEFAULT_PRICE_TIMEOUT_MILLI_SECS,
        }
    }

    pub fn with_timeouts(
        mut self,
        exchange_info_timeout_milli_secs: u64,
        price_timeout_milli_secs: u64,
    ) -> Self {
        self.exchange_info_timeout_milli_secs = exchange_info_timeout_milli_secs;
        self.price_timeout_milli_secs = price_timeout_milli_secs;
        self
    }

    pub fn init(&mut self) -> Result<()> {
        self.http.init()
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    pub async fn get_exchange_info(&self) -> Result<ExchangeInfo> {
        let text = self
            .http
            .get(
                EXCHANGE_INFO_ENDPOINT,
                &[],
                self.exchange_info_timeout_milli_secs,
            )
            .await?;

        parse_exchange_info(&text).map_err(|e| ExchangeError::parse_error(&text, e))
    }

    pub async fn get_ticker_price(&self, req: GetTickerPriceRequest) -> Result<Vec<TickerPrice>> {
        if req.symbols.is_empty() {
            return Ok(Vec::new());
        }

        let symbols_json = serde_json::to_string(&req.symbols).map_err(|e| {
            error!("Serialize symbols error: {:?}", e);
            ExchangeError::ParametersInvalid {
                message: e.to_string(),
            }
        })?;
        let params = [("symbols", symbols_json)];

        let text = self
            .http
            .get(TICKER_PRICE_ENDPOINT, &params, self.price_timeout_milli_secs)
            .await?;

        parse_ticker_prices(&text).map_err(|e| ExchangeError::parse_error(&text, e))
    }
}
