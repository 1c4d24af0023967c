pub mod models;
pub mod requests;

mod market_api;

mod parser;

pub use market_api::MarketApi;
