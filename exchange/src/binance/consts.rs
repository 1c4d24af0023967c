pub const SPOT_BASE_URL: &str = "https://api.binance.com";

pub const EXCHANGE_INFO_ENDPOINT: &str = "/api/v3/exchangeInfo";
pub const TICKER_PRICE_ENDPOINT: &str = "/api/v3/ticker/price";

pub const DEFAULT_EXCHANGE_INFO_TIMEOUT_MILLI_SECS: u64 = 10000;
pub const DEFAULT_PRICE_TIMEOUT_MILLI_SECS: u64 = 5000;

// 公开文档：1200 weight / 分钟，20次/秒以内是安全的
pub const DEFAULT_PACING_DELAY_MILLI_SECS: u64 = 50;

pub const SYMBOL_STATUS_TRADING: &str = "TRADING";
