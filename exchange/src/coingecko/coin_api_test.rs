use super::coin_api::CoinApi;
use super::consts::*;
use super::requests::*;
use crate::errors::ExchangeError;
use crate::test_server::{Route, TestServer};
use env_logger::Env;

fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

async fn coin_api(server: &TestServer) -> CoinApi {
    let mut api = CoinApi::new(server.base_url.clone(), None, None, None);
    api.init().unwrap();
    api
}

#[tokio::test]
async fn test_get_coins_list() {
    init_logger();
    let server = TestServer::start(vec![Route::ok(
        COINS_LIST_ENDPOINT,
        r#"[
            {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "platforms": {}},
            {"id": "koge", "symbol": "koge", "name": "BNB48 Club Token",
             "platforms": {"binance-smart-chain": "0xe6DF05CE8C8301223373CF5B969AFCb1498c5528", "ethereum": null}},
            {"id": "legacy", "symbol": "old", "name": "Legacy"}
        ]"#,
    )])
    .await;
    let api = coin_api(&server).await;

    let coins = api.get_coins_list().await.unwrap();
    assert_eq!(coins.len(), 3);
    assert_eq!(coins[0].id, "bitcoin");
    assert!(coins[0].platforms.is_empty());
    assert_eq!(
        coins[1].platforms["binance-smart-chain"].as_deref(),
        Some("0xe6DF05CE8C8301223373CF5B969AFCb1498c5528")
    );
    assert_eq!(coins[1].platforms["ethereum"], None);
    // 缺失platforms字段
    assert!(coins[2].platforms.is_empty());

    let requests = server.requests();
    assert_eq!(requests[0], format!("{}?include_platform=true", COINS_LIST_ENDPOINT));
}

#[tokio::test]
async fn test_get_simple_price() {
    init_logger();
    let server = TestServer::start(vec![Route::ok(
        SIMPLE_PRICE_ENDPOINT,
        r#"{"bitcoin": {"usd": 43000.5, "usd_24h_change": -1.25, "usd_24h_vol": 1.0e10, "last_updated_at": 1700000000},
            "dogecoin": {"usd": 0.08, "usd_24h_change": null}}"#,
    )])
    .await;
    let api = coin_api(&server).await;

    let prices = api
        .get_simple_price(GetSimplePriceRequest::new(
            vec!["bitcoin".to_string(), "dogecoin".to_string()],
            "USD",
        ))
        .await
        .unwrap();
    assert_eq!(prices["bitcoin"]["usd"], Some(43000.5));
    assert_eq!(prices["bitcoin"]["usd_24h_change"], Some(-1.25));
    assert_eq!(prices["dogecoin"]["usd_24h_change"], None);

    let requests = server.requests();
    assert!(requests[0].contains("ids=bitcoin%2Cdogecoin"));
    assert!(requests[0].contains("vs_currencies=usd"));
    assert!(requests[0].contains("include_24hr_change=true"));
}

#[tokio::test]
async fn test_get_simple_price_empty_ids() {
    init_logger();
    let server = TestServer::start(vec![]).await;
    let api = coin_api(&server).await;

    let prices = api
        .get_simple_price(GetSimplePriceRequest::new(vec![], "usd"))
        .await
        .unwrap();
    assert!(prices.is_empty());
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_get_coin_details() {
    init_logger();
    let server = TestServer::start(vec![Route::ok(
        "/coins/bitcoin",
        r#"{
            "id": "bitcoin", "symbol": "btc", "name": "Bitcoin",
            "description": {"en": "Bitcoin is the first decentralized cryptocurrency."},
            "links": {"homepage": ["http://www.bitcoin.org", "", ""], "blockchain_site": ["https://mempool.space/", "", null]},
            "categories": ["Cryptocurrency", null],
            "market_data": {"market_cap": {"usd": 850000000000}, "total_volume": {"usd": 20000000000},
                            "circulating_supply": 19500000, "total_supply": 21000000, "max_supply": 21000000}
        }"#,
    )])
    .await;
    let api = coin_api(&server).await;

    let details = api.get_coin_details("bitcoin").await.unwrap();
    assert_eq!(details.name, "Bitcoin");
    let market_data = details.market_data.unwrap();
    assert_eq!(market_data.market_cap["usd"], Some(850000000000.0));
    assert_eq!(market_data.max_supply, Some(21000000.0));
    assert_eq!(details.links.unwrap().homepage.len(), 3);
    assert_eq!(details.categories.len(), 2);

    assert!(server.requests()[0].contains("market_data=true"));
}

#[tokio::test]
async fn test_get_coin_details_invalid_id() {
    init_logger();
    let server = TestServer::start(vec![]).await;
    let api = coin_api(&server).await;

    for id in ["", "../admin", "a/b", "x?y", ".."] {
        let err = api.get_coin_details(id).await.unwrap_err();
        assert!(matches!(err, ExchangeError::ParametersInvalid { .. }), "id: {}", id);
    }
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_get_trending() {
    init_logger();
    let server = TestServer::start(vec![Route::ok(
        TRENDING_ENDPOINT,
        r#"{"coins": [{"item": {"id": "pepe", "coin_id": 29850, "name": "Pepe", "symbol": "PEPE", "market_cap_rank": 40, "score": 0}}],
            "nfts": [], "categories": []}"#,
    )])
    .await;
    let api = coin_api(&server).await;

    let trending = api.get_trending().await.unwrap();
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].item.id, "pepe");
    assert_eq!(trending[0].item.market_cap_rank, Some(40));
}

#[tokio::test]
async fn test_get_markets() {
    init_logger();
    let server = TestServer::start(vec![Route::ok(
        MARKETS_ENDPOINT,
        r#"[{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 43000,
             "market_cap": 850000000000, "market_cap_rank": 1, "price_change_percentage_24h": 1.5}]"#,
    )])
    .await;
    let api = coin_api(&server).await;

    let markets = api
        .get_markets(GetMarketsRequest {
            vs_currency: "EUR".to_string(),
            per_page: 5,
            page: 1,
        })
        .await
        .unwrap();
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].market_cap_rank, Some(1));
    assert_eq!(markets[0].total_volume, None);

    let requests = server.requests();
    assert!(requests[0].contains("vs_currency=eur"));
    assert!(requests[0].contains("per_page=5"));
    assert!(requests[0].contains("order=market_cap_desc"));
}

#[tokio::test]
async fn test_get_asset_platforms() {
    init_logger();
    let server = TestServer::start(vec![Route::ok(
        ASSET_PLATFORMS_ENDPOINT,
        r#"[{"id": "binance-smart-chain", "chain_identifier": 56, "name": "BNB Smart Chain", "shortname": "BSC"},
            {"id": "solana", "chain_identifier": null, "name": "Solana", "shortname": ""}]"#,
    )])
    .await;
    let api = coin_api(&server).await;

    let platforms = api.get_asset_platforms().await.unwrap();
    assert_eq!(platforms.len(), 2);
    assert_eq!(platforms[0].chain_identifier, Some(56));
    assert_eq!(platforms[1].chain_identifier, None);
}

#[tokio::test]
async fn test_rate_limited_and_malformed() {
    init_logger();
    let server = TestServer::start(vec![
        Route::status(COINS_LIST_ENDPOINT, 429, r#"{"status": {"error_code": 429}}"#),
        Route::ok(TRENDING_ENDPOINT, "not json"),
    ])
    .await;
    let api = coin_api(&server).await;

    let err = api.get_coins_list().await.unwrap_err();
    assert!(err.is_rate_limited());

    let err = api.get_trending().await.unwrap_err();
    assert!(matches!(err, ExchangeError::ParseResultError { .. }));
}
