mod binance_spot_price_provider;
mod coingecko_price_provider;
mod price_provider;

pub use binance_spot_price_provider::BinanceSpotPriceProvider;
pub use coingecko_price_provider::CoinGeckoPriceProvider;
pub use price_provider::{PriceProvider, PriceQuote, fetch_prices_or_empty};
