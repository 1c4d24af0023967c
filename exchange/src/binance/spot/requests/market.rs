#[derive(Debug, Clone, Default)]
pub struct GetTickerPriceRequest {
    pub symbols: Vec<String>,
}
