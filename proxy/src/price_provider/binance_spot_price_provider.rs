use super::price_provider::{PriceProvider, PriceQuote};
use crate::errors::Result;
use async_trait::async_trait;
use exchange::binance::spot::MarketApi;
use exchange::binance::spot::requests::GetTickerPriceRequest;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

pub struct BinanceSpotPriceProvider {
    api: Arc<MarketApi>,
}

impl BinanceSpotPriceProvider {
    pub fn new(api: Arc<MarketApi>) -> Self {
        BinanceSpotPriceProvider { api }
    }
}

#[async_trait]
impl PriceProvider for BinanceSpotPriceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_prices(&self, ids: &[String]) -> Result<Vec<PriceQuote>> {
        let symbols: Vec<String> = ids.iter().map(|s| s.to_uppercase()).collect();
        let req = GetTickerPriceRequest {
            symbols: symbols.clone(),
        };
        let mut prices: HashMap<String, Decimal> = self
            .api
            .get_ticker_price(req)
            .await?
            .into_iter()
            .map(|t| (t.symbol, t.price))
            .collect();
        // 按请求顺序返回，上游缺失的跳过
        Ok(symbols
            .into_iter()
            .filter_map(|symbol| {
                prices.remove(&symbol).map(|price| PriceQuote {
                    id: symbol,
                    price,
                    change_24h: None,
                })
            })
            .collect())
    }

    fn label(&self, id: &str) -> String {
        id.strip_suffix("USDT").unwrap_or(id).to_string()
    }
}
