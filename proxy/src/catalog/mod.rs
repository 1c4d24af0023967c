pub mod coin_catalog;
pub mod symbol_catalog;

pub use coin_catalog::{CoinCatalog, CoinCatalogStats, CoinFilter, CoinGeckoCoinSource, CoinRecord};
pub use symbol_catalog::{
    BinanceSymbolSource, SymbolCatalog, SymbolCatalogStats, SymbolFilter, SymbolRecord,
};
