pub const BASE_URL: &str = "https://api.coingecko.com/api/v3";

pub const COINS_LIST_ENDPOINT: &str = "/coins/list";
pub const SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";
pub const COINS_ENDPOINT: &str = "/coins";
pub const TRENDING_ENDPOINT: &str = "/search/trending";
pub const MARKETS_ENDPOINT: &str = "/coins/markets";
pub const ASSET_PLATFORMS_ENDPOINT: &str = "/asset_platforms";

pub const DEFAULT_LIST_TIMEOUT_MILLI_SECS: u64 = 15000;
pub const DEFAULT_PRICE_TIMEOUT_MILLI_SECS: u64 = 10000;

// 免费档 50次/分钟
pub const DEFAULT_PACING_DELAY_MILLI_SECS: u64 = 1100;
