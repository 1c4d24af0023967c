use super::price_provider::{PriceProvider, PriceQuote};
use crate::errors::Result;
use async_trait::async_trait;
use exchange::coingecko::CoinApi;
use exchange::coingecko::models::SimplePrices;
use exchange::coingecko::requests::GetSimplePriceRequest;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::sync::Arc;

pub const DEFAULT_VS_CURRENCY: &str = "usd";

pub struct CoinGeckoPriceProvider {
    api: Arc<CoinApi>,
    vs_currency: String,
}

impl CoinGeckoPriceProvider {
    pub fn new(api: Arc<CoinApi>) -> Self {
        CoinGeckoPriceProvider {
            api,
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
        }
    }

    /// Raw `simple/price` map, keyed by coin id then by field
    /// (`usd`, `usd_24h_change`, ...).
    pub async fn fetch_simple_prices(
        &self,
        ids: &[String],
        vs_currency: &str,
        include_market_cap: bool,
    ) -> Result<SimplePrices> {
        let mut req = GetSimplePriceRequest::new(ids.to_vec(), vs_currency);
        req.include_market_cap = include_market_cap;
        Ok(self.api.get_simple_price(req).await?)
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoPriceProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_prices(&self, ids: &[String]) -> Result<Vec<PriceQuote>> {
        let prices = self.fetch_simple_prices(ids, &self.vs_currency, false).await?;
        let change_key = format!("{}_24h_change", self.vs_currency);
        Ok(ids
            .iter()
            .filter_map(|id| {
                let fields = prices.get(&id.to_lowercase())?;
                let price = fields.get(&self.vs_currency).copied().flatten()?;
                Some(PriceQuote {
                    id: id.to_lowercase(),
                    price: Decimal::from_f64(price)?,
                    change_24h: fields
                        .get(&change_key)
                        .copied()
                        .flatten()
                        .and_then(Decimal::from_f64),
                })
            })
            .collect())
    }

    fn label(&self, id: &str) -> String {
        let mut chars = id.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn max_fraction_digits(&self) -> u32 {
        8
    }
}
