use std::{fs::OpenOptions, io::Write, path::Path, sync::Arc};

use clap::Parser;
use env_logger::Env;
use exchange::{binance::spot::MarketApi, coingecko::CoinApi};
use proxy::{
    args::Args,
    catalog::{CoinCatalog, SymbolCatalog},
    config::{Config, ProxyConfig},
    errors::{ProxyError, Result},
    monitor::PriceMonitor,
    price_provider::{BinanceSpotPriceProvider, CoinGeckoPriceProvider, PriceProvider},
    server::{self, BinanceState, CoinGeckoState, IntervalControl},
};
use rate_limiter::Pacer;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

fn load_config(args: &Args) -> Result<ProxyConfig> {
    let config = if Path::new(&args.config).exists() {
        Config::from_toml(&args.config)
    } else {
        Config::empty()
    }
    .map_err(|e| ProxyError::ConfigError {
        message: format!("load {} err: {}", args.config, e),
    })?;
    let mut proxy_config = ProxyConfig::from_config(&config)?;
    proxy_config.apply_overrides(args.binance_interval, args.coingecko_interval);
    Ok(proxy_config)
}

fn init_logger(log_file: Option<&str>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(move |buf, record| {
        let ts = buf.timestamp();
        writeln!(buf, "{} [{}] - {}", ts, record.level(), record.args())
    });
    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ProxyError::ConfigError {
                message: format!("open log file {} err: {}", path, e),
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn api_err(name: &str, e: exchange::ExchangeError) -> ProxyError {
    ProxyError::ConfigError {
        message: format!("init {} api err: {}", name, e),
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("install ctrl-c handler err: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("install SIGTERM handler err: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = cancel.cancelled() => return,
    }
    log::info!("shutdown signal received, stopping services");
    cancel.cancel();
}

async fn run(config: ProxyConfig) -> Result<()> {
    let proxy_url = config.proxy_url();
    let binance = &config.binance;
    let coingecko = &config.coingecko;

    let mut market_api = MarketApi::new(
        binance.api_base_url.clone(),
        proxy_url.clone(),
        Some(binance.user_agent.clone()),
        Some(Arc::new(Pacer::from_millis(binance.pacing_delay_ms))),
    )
    .with_timeouts(binance.exchange_info_timeout_ms, binance.price_timeout_ms);
    market_api.init().map_err(|e| api_err("binance", e))?;
    let market_api = Arc::new(market_api);

    let mut coin_api = CoinApi::new(
        coingecko.api_base_url.clone(),
        proxy_url,
        Some(coingecko.user_agent.clone()),
        Some(Arc::new(Pacer::from_millis(coingecko.pacing_delay_ms))),
    )
    .with_timeouts(coingecko.list_timeout_ms, coingecko.price_timeout_ms);
    coin_api.init().map_err(|e| api_err("coingecko", e))?;
    let coin_api = Arc::new(coin_api);

    let symbol_catalog = Arc::new(SymbolCatalog::new(market_api.clone(), binance.stale_after()));
    for custom in binance.custom_symbols.iter() {
        let record = symbol_catalog.add_custom_symbol(
            &custom.symbol,
            &custom.base_asset,
            Some(&custom.quote_asset),
            custom.name.clone(),
        );
        log::info!("custom symbol added: {}", record.symbol);
    }
    let coin_catalog = Arc::new(CoinCatalog::new(coin_api.clone(), coingecko.stale_after()));

    // 后台预热，失败不影响启动
    let catalog = symbol_catalog.clone();
    tokio::spawn(async move {
        match catalog.refresh().await {
            Ok(n) => log::info!("binance symbols warmed up: {}", n),
            Err(e) => log::warn!("binance symbols warm up err: {}", e),
        }
    });
    let catalog = coin_catalog.clone();
    tokio::spawn(async move {
        match catalog.refresh().await {
            Ok(n) => log::info!("coingecko coins warmed up: {}", n),
            Err(e) => log::warn!("coingecko coins warm up err: {}", e),
        }
    });

    let binance_state = Arc::new(BinanceState {
        catalog: symbol_catalog,
        prices: Arc::new(BinanceSpotPriceProvider::new(market_api)),
        interval: IntervalControl::new(binance.interval_secs),
        config: binance.clone(),
    });
    let coingecko_state = Arc::new(CoinGeckoState {
        catalog: coin_catalog,
        prices: Arc::new(CoinGeckoPriceProvider::new(coin_api)),
        interval: IntervalControl::new(coingecko.interval_secs),
        config: coingecko.clone(),
    });

    let cancel = CancellationToken::new();
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    let binance_monitor = PriceMonitor::new(
        binance_state.prices.clone() as Arc<dyn PriceProvider>,
        binance.tracked_symbols.clone(),
        binance_state.interval.subscribe(),
        cancel.clone(),
    );
    tasks.spawn(async move {
        binance_monitor.run().await;
        Ok(())
    });
    let coingecko_monitor = PriceMonitor::new(
        coingecko_state.prices.clone() as Arc<dyn PriceProvider>,
        coingecko.tracked_coin_ids.clone(),
        coingecko_state.interval.subscribe(),
        cancel.clone(),
    );
    tasks.spawn(async move {
        coingecko_monitor.run().await;
        Ok(())
    });

    let router = server::binance_router(binance_state);
    let (port, token) = (binance.port, cancel.clone());
    tasks.spawn(async move { server::serve("binance", port, router, token).await });
    let router = server::coingecko_router(coingecko_state);
    let (port, token) = (coingecko.port, cancel.clone());
    tasks.spawn(async move { server::serve("coingecko", port, router, token).await });

    tokio::spawn(shutdown_signal(cancel.clone()));

    let mut result = Ok(());
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| ProxyError::ServerError {
            message: format!("task join err: {}", e),
        });
        if let Err(e) = outcome.and_then(|r| r) {
            // 任一服务失败则整体退出
            log::error!("{}", e);
            cancel.cancel();
            if result.is_ok() {
                result = Err(e);
            }
        }
    }
    result
}

#[tokio::main]
pub async fn main() {
    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = init_logger(config.log_file.as_deref()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    log::info!(
        "price proxy starting, binance port {} every {}s, coingecko port {} every {}s",
        config.binance.port,
        config.binance.interval_secs,
        config.coingecko.port,
        config.coingecko.interval_secs
    );
    if let Err(e) = run(config).await {
        log::error!("price proxy stopped with error: {}", e);
        std::process::exit(1);
    }
    log::info!("price proxy stopped");
}
