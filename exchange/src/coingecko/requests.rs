#[derive(Debug, Clone)]
pub struct GetSimplePriceRequest {
    pub ids: Vec<String>,
    pub vs_currency: String,
    pub include_24hr_change: bool,
    pub include_24hr_vol: bool,
    pub include_market_cap: bool,
    pub include_last_updated_at: bool,
}

impl GetSimplePriceRequest {
    pub fn new(ids: Vec<String>, vs_currency: &str) -> Self {
        GetSimplePriceRequest {
            ids,
            vs_currency: vs_currency.to_lowercase(),
            include_24hr_change: true,
            include_24hr_vol: true,
            include_market_cap: false,
            include_last_updated_at: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetMarketsRequest {
    pub vs_currency: String,
    pub per_page: u32,
    pub page: u32,
}

impl Default for GetMarketsRequest {
    fn default() -> Self {
        GetMarketsRequest {
            vs_currency: "usd".to_string(),
            per_page: 10,
            page: 1,
        }
    }
}
