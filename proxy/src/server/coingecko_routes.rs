use super::common::{ApiQuery, calls_per_minute, check_query, cron_expression, parse_body, take, update_interval};
use super::error::ApiError;
use super::state::CoinGeckoState;
use crate::catalog::{CoinFilter, CoinRecord};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use exchange::coingecko::models::{CoinDetails, SimplePrices};
use exchange::coingecko::requests::GetMarketsRequest;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

const SERVICE: &str = "coingecko";
const DESCRIPTION_MAX_CHARS: usize = 500;
const MAX_SELECTED_COINS: usize = 100;
const MAX_TOP_LIMIT: u32 = 250;

type ApiResult = Result<Json<Value>, ApiError>;

fn default_coins_limit() -> usize {
    100
}

fn default_search_limit() -> usize {
    50
}

fn default_top_limit() -> u32 {
    10
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_true() -> String {
    "true".to_string()
}

fn default_names_limit() -> usize {
    500
}

#[derive(Debug, Deserialize)]
pub struct CoinsQuery {
    symbol: Option<String>,
    name: Option<String>,
    #[serde(default = "default_coins_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default = "default_search_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct CoinQuery {
    #[serde(default)]
    detailed: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_top_limit")]
    limit: u32,
    #[serde(default = "default_currency")]
    currency: String,
}

#[derive(Debug, Deserialize)]
pub struct ContractQuery {
    platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoinNamesQuery {
    #[serde(default = "default_true")]
    include_trending: String,
    #[serde(default = "default_true")]
    include_alpha: String,
    #[serde(default = "default_names_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct SelectedCoinsRequest {
    coins: Option<Vec<Value>>,
    currency: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailsSummary {
    description: String,
    market_cap: Option<f64>,
    volume24h: Option<f64>,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    max_supply: Option<f64>,
    homepage: Option<String>,
    #[serde(rename = "blockchain_site")]
    blockchain_site: Vec<String>,
    categories: Vec<String>,
}

impl From<CoinDetails> for DetailsSummary {
    fn from(details: CoinDetails) -> Self {
        let description = details
            .description
            .get("en")
            .cloned()
            .flatten()
            .map(|en| {
                let mut text: String = en.chars().take(DESCRIPTION_MAX_CHARS).collect();
                text.push_str("...");
                text
            })
            .unwrap_or_default();
        let market_data = details.market_data.unwrap_or_default();
        let links = details.links.unwrap_or_default();
        DetailsSummary {
            description,
            market_cap: market_data.market_cap.get("usd").copied().flatten(),
            volume24h: market_data.total_volume.get("usd").copied().flatten(),
            circulating_supply: market_data.circulating_supply,
            total_supply: market_data.total_supply,
            max_supply: market_data.max_supply,
            homepage: links.homepage.into_iter().next().flatten().filter(|h| !h.is_empty()),
            blockchain_site: links
                .blockchain_site
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .collect(),
            categories: details.categories.into_iter().flatten().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CoinName {
    id: String,
    name: String,
    symbol: String,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    market_cap_rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl CoinName {
    fn regular(coin: &CoinRecord) -> Self {
        CoinName {
            id: coin.id.clone(),
            name: coin.name.clone(),
            symbol: coin.symbol.to_uppercase(),
            kind: "regular",
            market_cap_rank: None,
            description: None,
        }
    }
}

pub fn routes() -> Router<Arc<CoinGeckoState>> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/config", get(get_config))
        .route("/api/config/interval", post(set_interval))
        .route("/api/docs", get(docs))
        .route("/api/coins", get(list_coins))
        .route("/api/search/{query}", get(search_coins))
        .route("/api/coin/{coin_id}", get(get_coin))
        .route("/api/prices", get(get_prices))
        .route("/api/trending", get(get_trending))
        .route("/api/top", get(get_top))
        .route("/api/alpha", get(get_alpha))
        .route("/api/koge", get(get_alpha))
        .route("/api/contract/{address}", get(get_by_contract))
        .route("/api/coin-names", get(get_coin_names))
        .route("/api/selected-coins-prices", post(selected_coins_prices))
        .route("/api/platforms", get(get_platforms))
        .route("/api/coins/refresh", post(refresh_coins))
}

fn endpoints() -> Value {
    json!({
        "health": "GET /",
        "coins": "GET /api/coins",
        "search": "GET /api/search/{query}",
        "coin": "GET /api/coin/{coin_id}",
        "prices": "GET /api/prices",
        "trending": "GET /api/trending",
        "top": "GET /api/top",
        "alpha": "GET /api/alpha",
        "koge": "GET /api/koge",
        "coinNames": "GET /api/coin-names",
        "selectedPrices": "POST /api/selected-coins-prices",
        "setInterval": "POST /api/config/interval",
    })
}

async fn index(State(state): State<Arc<CoinGeckoState>>) -> Json<Value> {
    let interval = state.interval.current();
    Json(json!({
        "status": "running",
        "service": "CoinGecko Price Monitor & Coin API",
        "uptime": state.interval.uptime_secs(),
        "timestamp": time::now_rfc3339(),
        "tracking": state.config.tracked_coin_ids,
        "interval_seconds": interval,
        "cron_expression": cron_expression(interval),
        "endpoints": endpoints(),
    }))
}

async fn health(State(state): State<Arc<CoinGeckoState>>) -> Json<Value> {
    let interval = state.interval.current();
    Json(json!({
        "status": "running",
        "service": "CoinGecko Price Monitor",
        "uptime": state.interval.uptime_secs(),
        "timestamp": time::now_rfc3339(),
        "tracking": state.config.tracked_coin_ids,
        "interval_seconds": interval,
        "cron_expression": cron_expression(interval),
        "stats": state.catalog.stats(),
    }))
}

async fn get_config(State(state): State<Arc<CoinGeckoState>>) -> Json<Value> {
    let interval = state.interval.current();
    Json(json!({
        "success": true,
        "config": {
            "interval_seconds": interval,
            "cron_expression": cron_expression(interval),
            "port": state.config.port,
            "tracking_coins": state.config.tracked_coin_ids,
            "pacing_delay_ms": state.config.pacing_delay_ms,
            "rate_limit_info": {
                "coingecko_free_tier": "50 calls per minute",
                "recommended_min_interval": "1.2 seconds",
                "current_calls_per_minute": calls_per_minute(interval),
            },
        },
    }))
}

async fn set_interval(State(state): State<Arc<CoinGeckoState>>, body: Bytes) -> Response {
    update_interval(SERVICE, &state.interval, &body)
}

async fn list_coins(
    State(state): State<Arc<CoinGeckoState>>,
    ApiQuery(query): ApiQuery<CoinsQuery>,
) -> ApiResult {
    let filter = CoinFilter {
        symbol: query.symbol.filter(|s| !s.is_empty()),
        name: query.name.filter(|n| !n.is_empty()),
    };
    let coins = state.catalog.all_coins(&filter).await;
    let limited = take(&coins, query.limit);
    Ok(Json(json!({
        "success": true,
        "total": coins.len(),
        "returned": limited.len(),
        "coins": limited,
    })))
}

async fn search_coins(
    State(state): State<Arc<CoinGeckoState>>,
    Path(query): Path<String>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> ApiResult {
    check_query(&query)?;
    let results = state.catalog.search(&query).await;
    let limited = take(&results, params.limit);
    Ok(Json(json!({
        "success": true,
        "query": query,
        "total": results.len(),
        "returned": limited.len(),
        "coins": limited,
    })))
}

// 读路径：价格失败时记录日志并返回空
async fn simple_prices_or_empty(
    state: &CoinGeckoState,
    ids: &[String],
    currency: &str,
    include_market_cap: bool,
) -> SimplePrices {
    state
        .prices
        .fetch_simple_prices(ids, currency, include_market_cap)
        .await
        .unwrap_or_else(|e| {
            warn!("[{}] simple price for {:?} failed: {}", SERVICE, ids, e);
            SimplePrices::new()
        })
}

async fn get_coin(
    State(state): State<Arc<CoinGeckoState>>,
    Path(coin_id): Path<String>,
    ApiQuery(query): ApiQuery<CoinQuery>,
) -> ApiResult {
    let record = state
        .catalog
        .get_coin(&coin_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Coin '{}' not found", coin_id)))?;

    let mut coin = serde_json::to_value(record.as_ref())
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let prices = simple_prices_or_empty(&state, std::slice::from_ref(&record.id), "usd", false).await;
    if let Some(price) = prices.get(&record.id) {
        coin["currentPrice"] = json!(price);
    }

    if query.detailed.as_deref() == Some("true") {
        match state.catalog.api().get_coin_details(&record.id).await {
            Ok(details) => coin["details"] = json!(DetailsSummary::from(details)),
            Err(e) => warn!("[{}] details for {} failed: {}", SERVICE, record.id, e),
        }
    }

    Ok(Json(json!({ "success": true, "coin": coin })))
}

async fn get_prices(State(state): State<Arc<CoinGeckoState>>) -> ApiResult {
    let prices = simple_prices_or_empty(&state, &state.config.tracked_coin_ids, "usd", false).await;
    Ok(Json(json!({
        "success": true,
        "timestamp": time::now_rfc3339(),
        "coinIds": state.config.tracked_coin_ids,
        "prices": prices,
    })))
}

async fn get_trending(State(state): State<Arc<CoinGeckoState>>) -> ApiResult {
    let trending = state.catalog.api().get_trending().await?;
    Ok(Json(json!({
        "success": true,
        "timestamp": time::now_rfc3339(),
        "trending": trending,
    })))
}

async fn get_top(
    State(state): State<Arc<CoinGeckoState>>,
    ApiQuery(query): ApiQuery<TopQuery>,
) -> ApiResult {
    if query.limit == 0 || query.limit > MAX_TOP_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_TOP_LIMIT
        )));
    }
    let req = GetMarketsRequest {
        vs_currency: query.currency.to_lowercase(),
        per_page: query.limit,
        page: 1,
    };
    let coins = state.catalog.api().get_markets(req).await?;
    Ok(Json(json!({
        "success": true,
        "timestamp": time::now_rfc3339(),
        "limit": query.limit,
        "currency": query.currency,
        "coins": coins,
    })))
}

async fn alpha_coins(state: &CoinGeckoState) -> Vec<Arc<CoinRecord>> {
    let alpha = &state.config.alpha_token;
    let mut coins = state.catalog.find_variants(&alpha.variants).await;
    let mut seen: HashSet<String> = coins.iter().map(|c| c.id.clone()).collect();
    for coin in state
        .catalog
        .find_by_contract_address(&alpha.contract_address)
        .await
    {
        if seen.insert(coin.id.clone()) {
            coins.push(coin);
        }
    }
    coins
}

async fn get_alpha(State(state): State<Arc<CoinGeckoState>>) -> ApiResult {
    let alpha = &state.config.alpha_token;
    let coins = alpha_coins(&state).await;
    Ok(Json(json!({
        "success": true,
        "query": format!("{} Alpha Token", alpha.name),
        "contractAddress": alpha.contract_address,
        "platform": alpha.platform,
        "found": coins.len(),
        "coins": coins,
    })))
}

async fn get_by_contract(
    State(state): State<Arc<CoinGeckoState>>,
    Path(address): Path<String>,
    ApiQuery(query): ApiQuery<ContractQuery>,
) -> ApiResult {
    let platform = query
        .platform
        .unwrap_or_else(|| state.config.alpha_token.platform.clone());
    let coins = state.catalog.find_by_contract_address(&address).await;
    Ok(Json(json!({
        "success": true,
        "contractAddress": address,
        "platform": platform,
        "found": coins.len(),
        "coins": coins,
    })))
}

async fn get_coin_names(
    State(state): State<Arc<CoinGeckoState>>,
    ApiQuery(query): ApiQuery<CoinNamesQuery>,
) -> ApiResult {
    let include_trending = query.include_trending == "true";
    let include_alpha = query.include_alpha == "true";

    let all = state.catalog.all_coins(&CoinFilter::default()).await;
    let mut names: Vec<CoinName> = all.iter().take(query.limit).map(|c| CoinName::regular(c)).collect();
    let mut seen: HashSet<String> = names.iter().map(|n| n.id.clone()).collect();

    if include_trending {
        match state.catalog.api().get_trending().await {
            Ok(trending) => {
                for coin in trending {
                    let item = coin.item;
                    if seen.insert(item.id.clone()) {
                        names.push(CoinName {
                            id: item.id,
                            name: item.name,
                            symbol: item.symbol.to_uppercase(),
                            kind: "trending",
                            market_cap_rank: item.market_cap_rank,
                            description: None,
                        });
                    }
                }
            }
            Err(e) => warn!("[{}] coin-names without trending: {}", SERVICE, e),
        }
    }

    if include_alpha {
        let alpha = &state.config.alpha_token;
        for coin in state.catalog.find_variants(&alpha.variants).await {
            if seen.insert(coin.id.clone()) {
                names.push(CoinName {
                    id: coin.id.clone(),
                    name: alpha.display_name(&coin.name),
                    symbol: coin.symbol.to_uppercase(),
                    kind: "alpha",
                    market_cap_rank: None,
                    description: Some(alpha.description.clone()),
                });
            }
        }
    }

    names.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });

    Ok(Json(json!({
        "success": true,
        "timestamp": time::now_rfc3339(),
        "total": names.len(),
        "include_trending": include_trending,
        "include_alpha": include_alpha,
        "coins": names,
    })))
}

fn coin_id_for(state: &CoinGeckoState, raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if lower.contains('-') || lower.chars().count() > 5 {
        return lower;
    }
    state.config.resolve_alias(raw.trim()).cloned().unwrap_or(lower)
}

async fn selected_coins_prices(State(state): State<Arc<CoinGeckoState>>, body: Bytes) -> ApiResult {
    const NEED_COINS: &str = "Please provide an array of coin IDs or symbols";
    let req: SelectedCoinsRequest = parse_body(&body, NEED_COINS)?;
    let coins = req.coins.filter(|c| !c.is_empty()).ok_or_else(|| ApiError::BadRequest(NEED_COINS.to_string()))?;
    if coins.len() > MAX_SELECTED_COINS {
        return Err(ApiError::BadRequest(format!(
            "Maximum {} coins allowed per request",
            MAX_SELECTED_COINS
        )));
    }
    let currency = req
        .currency
        .filter(|c| !c.is_empty())
        .unwrap_or_else(default_currency)
        .to_lowercase();

    let mut seen = HashSet::new();
    let ids: Vec<String> = coins
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .map(|raw| coin_id_for(&state, &raw))
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let prices = simple_prices_or_empty(&state, &ids, &currency, true).await;
    let now = time::now_rfc3339();
    let mut results = Vec::with_capacity(ids.len());
    let mut found = 0;
    for id in &ids {
        let fields = prices.get(id);
        let price = fields.and_then(|f| f.get(&currency).copied().flatten());
        match (fields, price) {
            (Some(fields), Some(price)) => {
                found += 1;
                let field = |suffix: &str| fields.get(&format!("{}_{}", currency, suffix)).copied().flatten();
                let info = state.catalog.cache().get(id);
                results.push(json!({
                    "id": id,
                    "name": info.as_ref().map(|c| c.name.clone()).unwrap_or_else(|| id.clone()),
                    "symbol": info.as_ref().map(|c| c.symbol.to_uppercase()).unwrap_or_else(|| id.to_uppercase()),
                    "current_price": price,
                    "price_change_24h": field("24h_change"),
                    "market_cap": field("market_cap"),
                    "volume_24h": field("24h_vol"),
                    "last_updated": now,
                }));
            }
            _ => results.push(json!({
                "id": id,
                "name": id,
                "symbol": id.to_uppercase(),
                "current_price": null,
                "error": "Price data not available",
                "last_updated": now,
            })),
        }
    }

    Ok(Json(json!({
        "success": true,
        "timestamp": now,
        "currency": currency.to_uppercase(),
        "requested_count": coins.len(),
        "found_count": found,
        "coins": results,
    })))
}

async fn get_platforms(State(state): State<Arc<CoinGeckoState>>) -> ApiResult {
    let platforms = state.catalog.api().get_asset_platforms().await?;
    Ok(Json(json!({
        "success": true,
        "total": platforms.len(),
        "platforms": platforms,
    })))
}

async fn refresh_coins(State(state): State<Arc<CoinGeckoState>>) -> ApiResult {
    let refreshed = state.catalog.refresh().await?;
    Ok(Json(json!({
        "success": true,
        "refreshed": refreshed,
        "stats": state.catalog.stats(),
    })))
}

async fn docs() -> Json<Value> {
    Json(json!({
        "title": "CoinGecko API Documentation",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /": "Service information and available endpoints",
            "GET /health": "Health check with service statistics",
            "GET /api/config": "Current polling configuration",
            "POST /api/config/interval": "Change polling interval (body: {seconds: 1..300})",
            "GET /api/coins": "All coins (query: ?symbol=BTC&name=Bitcoin&limit=100)",
            "GET /api/search/{query}": "Search coins by name, symbol, or ID (query: ?limit=50)",
            "GET /api/coin/{coin_id}": "Coin information with price (query: ?detailed=true)",
            "GET /api/prices": "Current prices for tracked coins",
            "GET /api/trending": "Trending coins",
            "GET /api/top": "Top coins by market cap (query: ?limit=10&currency=usd)",
            "GET /api/alpha": "Configured alpha token by name variants and contract address",
            "GET /api/koge": "Alias of /api/alpha",
            "GET /api/contract/{address}": "Find coin by contract address (query: ?platform=binance-smart-chain)",
            "GET /api/coin-names": "Coin names for selection UIs (query: ?include_trending=true&include_alpha=true&limit=500)",
            "POST /api/selected-coins-prices": "Prices for selected coins (body: {coins: ['BTC', 'ETH'], currency: 'usd'})",
            "GET /api/platforms": "Supported asset platforms",
            "POST /api/coins/refresh": "Reload the coin list from CoinGecko",
            "GET /api/docs": "This documentation",
        },
    }))
}
