use super::super::models::market::*;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfoRaw {
    symbol: String,
    status: String,
    base_asset: String,
    quote_asset: String,
    #[serde(default)]
    permissions: Option<Vec<String>>, // 新版接口可能为空或缺失
}

impl From<SymbolInfoRaw> for SymbolInfo {
    fn from(raw: SymbolInfoRaw) -> Self {
        SymbolInfo {
            symbol: raw.symbol,
            status: raw.status,
            base_asset: raw.base_asset,
            quote_asset: raw.quote_asset,
            permissions: raw.permissions.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeInfoRaw {
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    server_time: u64,
    symbols: Vec<SymbolInfoRaw>,
}

pub fn parse_exchange_info(data: &str) -> Result<ExchangeInfo, serde_json::Error> {
    let raw: ExchangeInfoRaw = serde_json::from_str(data)?;
    Ok(ExchangeInfo {
        timezone: raw.timezone,
        server_time: raw.server_time,
        symbols: raw.symbols.into_iter().map(SymbolInfo::from).collect(),
    })
}

#[derive(Debug, Deserialize)]
struct TickerPriceRaw {
    symbol: String,
    price: Decimal,
}

// 单个symbol时返回对象，多个时返回数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TickerPriceResponseRaw {
    Many(Vec<TickerPriceRaw>),
    One(TickerPriceRaw),
}

pub fn parse_ticker_prices(data: &str) -> Result<Vec<TickerPrice>, serde_json::Error> {
    let raw: TickerPriceResponseRaw = serde_json::from_str(data)?;
    let raws = match raw {
        TickerPriceResponseRaw::Many(raws) => raws,
        TickerPriceResponseRaw::One(raw) => vec![raw],
    };
    Ok(raws
        .into_iter()
        .map(|raw| TickerPrice {
            symbol: raw.symbol,
            price: raw.price,
        })
        .collect())
}
