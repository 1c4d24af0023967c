pub mod args;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod monitor;
pub mod price_provider;
pub mod server;

#[cfg(test)]
mod test_util;
