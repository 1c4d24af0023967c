pub mod binance;
pub mod coingecko;
pub mod errors;
pub mod http;

pub use errors::{ExchangeError, Result};
pub use http::HttpApi;

#[cfg(test)]
mod test_server;
