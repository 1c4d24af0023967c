pub mod binance_routes;
pub mod coingecko_routes;
mod common;
pub mod error;
pub mod state;

pub use error::ApiError;
pub use state::{BinanceState, CoinGeckoState, IntervalControl};

use crate::errors::{ProxyError, Result};
use axum::Router;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

pub fn binance_router(state: Arc<BinanceState>) -> Router {
    binance_routes::routes()
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn coingecko_router(state: Arc<CoinGeckoState>) -> Router {
    coingecko_routes::routes()
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `router` on `0.0.0.0:port` until `cancel` fires.
pub async fn serve(name: &str, port: u16, router: Router, cancel: CancellationToken) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ProxyError::ServerError {
            message: format!("[{}] bind {} err: {}", name, addr, e),
        })?;
    info!("[{}] listening on http://{}/api/docs", name, addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| ProxyError::ServerError {
            message: format!("[{}] serve err: {}", name, e),
        })?;
    info!("[{}] server stopped", name);
    Ok(())
}
