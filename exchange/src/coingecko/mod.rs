pub mod consts;
pub mod models;
pub mod requests;

mod coin_api;
#[cfg(test)]
mod coin_api_test;

mod parser;

pub use coin_api::CoinApi;
