use crate::errors::Result;
use async_trait::async_trait;
use log::error;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub id: String,
    pub price: Decimal,
    pub change_24h: Option<Decimal>, // 百分比
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Current quotes for `ids`, in request order. Ids the upstream does not
    /// know are left out.
    async fn fetch_prices(&self, ids: &[String]) -> Result<Vec<PriceQuote>>;

    /// Short label used in the price table.
    fn label(&self, id: &str) -> String {
        id.to_string()
    }

    fn max_fraction_digits(&self) -> u32 {
        6
    }
}

/// Read-path wrapper: a failed price call is logged and yields no quotes.
pub async fn fetch_prices_or_empty(provider: &dyn PriceProvider, ids: &[String]) -> Vec<PriceQuote> {
    match provider.fetch_prices(ids).await {
        Ok(quotes) => quotes,
        Err(e) => {
            if e.is_rate_limited() {
                error!(
                    "[{}] price fetch rate limited, consider a longer interval: {}",
                    provider.name(),
                    e
                );
            } else {
                error!("[{}] price fetch failed: {}", provider.name(), e);
            }
            Vec::new()
        }
    }
}
