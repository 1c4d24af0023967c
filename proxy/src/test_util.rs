// 测试辅助：本地mock上游、本地起服务、日志初始化
use axum::Router;
use axum::http::{StatusCode, header};
use axum::routing::get;
use env_logger::Env;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

pub struct MockUpstream {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    /// Serve each `(path, status, body)` as a fixed JSON GET response.
    pub async fn start(routes: Vec<(&'static str, u16, String)>) -> Self {
        let hits = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        for (path, status, body) in routes {
            let hits = hits.clone();
            router = router.route(
                path,
                get(move || {
                    let body = body.clone();
                    let hits = hits.clone();
                    async move {
                        hits.lock().unwrap().push(path.to_string());
                        (
                            StatusCode::from_u16(status).unwrap(),
                            [(header::CONTENT_TYPE, "application/json")],
                            body,
                        )
                    }
                }),
            );
        }
        MockUpstream {
            base_url: serve(router).await,
            hits,
        }
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

/// Serve `router` on an ephemeral local port and return its base url.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub const EXCHANGE_INFO_BODY: &str = r#"{
    "timezone": "UTC",
    "serverTime": 1700000000000,
    "symbols": [
        {"symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC", "quoteAsset": "USDT", "permissions": ["SPOT"]},
        {"symbol": "ETHUSDT", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "USDT", "permissions": ["SPOT"]},
        {"symbol": "ETHBTC", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "BTC"},
        {"symbol": "DOGEUSDT", "status": "TRADING", "baseAsset": "DOGE", "quoteAsset": "USDT"},
        {"symbol": "LUNAUSDT", "status": "BREAK", "baseAsset": "LUNA", "quoteAsset": "USDT"}
    ]
}"#;

pub const COINS_LIST_BODY: &str = r#"[
    {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "platforms": {}},
    {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "platforms": {}},
    {"id": "dogecoin", "symbol": "doge", "name": "Dogecoin", "platforms": null},
    {"id": "koge-coin", "symbol": "koge", "name": "KOGE", "platforms": {"binance-smart-chain": "0xE6DF05CE8C8301223373CF5B969AFCB1498C5528"}},
    {"id": "kogecoin-io", "symbol": "kogecoin", "name": "KogeCoin.io", "platforms": {"polygon-pos": "0x13efaa3d5e09266d7e0f7f2b8eb1a2cbb5a2ad5d", "ethereum": ""}}
]"#;
