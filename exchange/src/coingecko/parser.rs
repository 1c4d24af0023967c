use super::models::*;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct CoinListItemRaw {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    platforms: Option<BTreeMap<String, Option<String>>>,
}

impl From<CoinListItemRaw> for CoinListItem {
    fn from(raw: CoinListItemRaw) -> Self {
        CoinListItem {
            id: raw.id,
            symbol: raw.symbol,
            name: raw.name,
            platforms: raw.platforms.unwrap_or_default(),
        }
    }
}

pub fn parse_coins_list(data: &str) -> Result<Vec<CoinListItem>, serde_json::Error> {
    let raws: Vec<CoinListItemRaw> = serde_json::from_str(data)?;
    Ok(raws.into_iter().map(CoinListItem::from).collect())
}

pub fn parse_simple_prices(data: &str) -> Result<SimplePrices, serde_json::Error> {
    serde_json::from_str(data)
}

pub fn parse_coin_details(data: &str) -> Result<CoinDetails, serde_json::Error> {
    serde_json::from_str(data)
}

#[derive(Debug, Deserialize)]
struct TrendingRaw {
    #[serde(default)]
    coins: Vec<TrendingCoin>,
}

pub fn parse_trending(data: &str) -> Result<Vec<TrendingCoin>, serde_json::Error> {
    let raw: TrendingRaw = serde_json::from_str(data)?;
    Ok(raw.coins)
}

pub fn parse_markets(data: &str) -> Result<Vec<CoinMarket>, serde_json::Error> {
    serde_json::from_str(data)
}

pub fn parse_asset_platforms(data: &str) -> Result<Vec<AssetPlatform>, serde_json::Error> {
    serde_json::from_str(data)
}
