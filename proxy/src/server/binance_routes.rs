use super::common::{ApiQuery, calls_per_minute, check_query, cron_expression, parse_body, take, update_interval};
use super::error::ApiError;
use super::state::BinanceState;
use crate::catalog::SymbolFilter;
use crate::price_provider::fetch_prices_or_empty;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

const SERVICE: &str = "binance";

type ApiResult = Result<Json<Value>, ApiError>;

fn default_symbols_limit() -> usize {
    100
}

fn default_search_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct SymbolsQuery {
    quote: Option<String>,
    base: Option<String>,
    #[serde(default = "default_symbols_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default = "default_search_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomSymbolRequest {
    symbol: Option<String>,
    base_asset: Option<String>,
    quote_asset: Option<String>,
    name: Option<String>,
}

pub fn routes() -> Router<Arc<BinanceState>> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/config", get(get_config))
        .route("/api/config/interval", post(set_interval))
        .route("/api/docs", get(docs))
        .route("/api/symbols", get(list_symbols))
        .route("/api/search/{query}", get(search_symbols))
        .route("/api/symbol/custom", post(add_custom_symbol))
        .route("/api/symbol/{symbol}", get(get_symbol))
        .route("/api/prices", get(get_prices))
        .route("/api/coin/{coin}", get(get_coin_pairs))
        .route("/api/symbols/refresh", post(refresh_symbols))
}

fn endpoints() -> Value {
    json!({
        "health": "GET /",
        "symbols": "GET /api/symbols",
        "search": "GET /api/search/{query}",
        "symbol": "GET /api/symbol/{symbol}",
        "prices": "GET /api/prices",
        "coin": "GET /api/coin/{coin}",
        "setInterval": "POST /api/config/interval",
    })
}

async fn index(State(state): State<Arc<BinanceState>>) -> Json<Value> {
    let interval = state.interval.current();
    Json(json!({
        "status": "running",
        "service": "Binance Price Monitor & Symbol API",
        "uptime": state.interval.uptime_secs(),
        "timestamp": time::now_rfc3339(),
        "tracking": state.config.tracked_symbols,
        "interval_seconds": interval,
        "cron_expression": cron_expression(interval),
        "endpoints": endpoints(),
    }))
}

async fn health(State(state): State<Arc<BinanceState>>) -> Json<Value> {
    let interval = state.interval.current();
    Json(json!({
        "status": "running",
        "service": "Binance Price Monitor",
        "uptime": state.interval.uptime_secs(),
        "timestamp": time::now_rfc3339(),
        "tracking": state.config.tracked_symbols,
        "interval_seconds": interval,
        "cron_expression": cron_expression(interval),
        "stats": state.catalog.stats(),
    }))
}

async fn get_config(State(state): State<Arc<BinanceState>>) -> Json<Value> {
    let interval = state.interval.current();
    Json(json!({
        "success": true,
        "config": {
            "interval_seconds": interval,
            "cron_expression": cron_expression(interval),
            "port": state.config.port,
            "tracking_symbols": state.config.tracked_symbols,
            "pacing_delay_ms": state.config.pacing_delay_ms,
            "rate_limit_info": {
                "binance_rate_limit": "1200 calls per minute",
                "current_calls_per_minute": calls_per_minute(interval),
                "safe_minimum_interval": "0.05 seconds (20 per second max)",
            },
        },
    }))
}

async fn set_interval(State(state): State<Arc<BinanceState>>, body: Bytes) -> Response {
    update_interval(SERVICE, &state.interval, &body)
}

async fn list_symbols(
    State(state): State<Arc<BinanceState>>,
    ApiQuery(query): ApiQuery<SymbolsQuery>,
) -> ApiResult {
    let filter = SymbolFilter {
        quote_asset: query.quote.filter(|q| !q.is_empty()),
        base_asset: query.base.filter(|b| !b.is_empty()),
    };
    let symbols = state.catalog.all_symbols(&filter).await;
    let limited = take(&symbols, query.limit);
    Ok(Json(json!({
        "success": true,
        "total": symbols.len(),
        "returned": limited.len(),
        "symbols": limited,
    })))
}

async fn search_symbols(
    State(state): State<Arc<BinanceState>>,
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
        "symbols": limited,
    })))
}

async fn get_symbol(State(state): State<Arc<BinanceState>>, Path(symbol): Path<String>) -> ApiResult {
    let record = state
        .catalog
        .get_symbol(&symbol)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Symbol '{}' not found", symbol)))?;

    // custom交易对在上游没有价格
    let current_price = if record.is_custom {
        None
    } else {
        fetch_prices_or_empty(state.prices.as_ref(), std::slice::from_ref(&record.symbol))
            .await
            .into_iter()
            .next()
            .map(|q| q.price)
    };

    Ok(Json(json!({
        "success": true,
        "symbol": record,
        "currentPrice": current_price,
    })))
}

async fn get_prices(State(state): State<Arc<BinanceState>>) -> ApiResult {
    let quotes = fetch_prices_or_empty(state.prices.as_ref(), &state.config.tracked_symbols).await;
    let prices: Vec<Value> = quotes
        .iter()
        .map(|q| json!({ "symbol": q.id, "price": q.price }))
        .collect();
    Ok(Json(json!({
        "success": true,
        "timestamp": time::now_rfc3339(),
        "symbols": state.config.tracked_symbols,
        "prices": prices,
    })))
}

async fn get_coin_pairs(State(state): State<Arc<BinanceState>>, Path(coin): Path<String>) -> ApiResult {
    let pairs = state.catalog.coin_pairs(&coin).await;
    if pairs.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No trading pairs found for '{}'",
            coin
        )));
    }
    Ok(Json(json!({
        "success": true,
        "coin": coin.to_uppercase(),
        "totalPairs": pairs.len(),
        "pairs": pairs,
    })))
}

async fn add_custom_symbol(State(state): State<Arc<BinanceState>>, body: Bytes) -> ApiResult {
    const REQUIRED: &str = "Symbol and baseAsset are required";
    let req: CustomSymbolRequest = parse_body(&body, REQUIRED)?;
    let symbol = req.symbol.filter(|s| !s.trim().is_empty());
    let base_asset = req.base_asset.filter(|s| !s.trim().is_empty());
    let (Some(symbol), Some(base_asset)) = (symbol, base_asset) else {
        return Err(ApiError::BadRequest(REQUIRED.to_string()));
    };

    let record = state.catalog.add_custom_symbol(
        symbol.trim(),
        base_asset.trim(),
        req.quote_asset.as_deref().map(str::trim).filter(|q| !q.is_empty()),
        req.name.filter(|n| !n.is_empty()),
    );
    Ok(Json(json!({
        "success": true,
        "message": "Custom symbol added successfully",
        "symbol": record,
    })))
}

async fn refresh_symbols(State(state): State<Arc<BinanceState>>) -> ApiResult {
    let refreshed = state.catalog.refresh().await?;
    Ok(Json(json!({
        "success": true,
        "refreshed": refreshed,
        "stats": state.catalog.stats(),
    })))
}

async fn docs() -> Json<Value> {
    Json(json!({
        "title": "Binance Symbol API Documentation",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /": "Service information and available endpoints",
            "GET /health": "Health check with symbol statistics",
            "GET /api/config": "Current polling configuration",
            "POST /api/config/interval": "Change polling interval (body: {seconds: 1..300})",
            "GET /api/symbols": "All symbols (query: ?quote=USDT&base=BTC&limit=100)",
            "GET /api/search/{query}": "Search symbols (query: ?limit=50)",
            "GET /api/symbol/{symbol}": "Symbol information with current price",
            "GET /api/prices": "Current prices for tracked symbols",
            "GET /api/coin/{coin}": "All trading pairs for a coin",
            "POST /api/symbol/custom": "Add custom symbol (body: {symbol, baseAsset, quoteAsset?, name?})",
            "POST /api/symbols/refresh": "Reload the symbol list from Binance",
            "GET /api/docs": "This documentation",
        },
        "examples": {
            "searchBTC": "/api/search/BTC",
            "getBTCPairs": "/api/coin/BTC",
            "getSymbolInfo": "/api/symbol/BTCUSDT",
            "getAllUSDTPairs": "/api/symbols?quote=USDT&limit=10",
        },
    }))
}
