use clap::Parser;

pub const DEFAULT_CONFIG_PATH: &str = "conf/proxy_conf.toml";

#[derive(Parser, Debug, Clone)]
#[command(name = "price-proxy")]
#[command(about = "Caching proxy in front of the Binance and CoinGecko public APIs")]
pub struct Args {
    /// Path to the TOML configuration file (optional)
    #[arg(long, env = "PROXY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Binance price polling interval in seconds
    #[arg(long, env = "BINANCE_INTERVAL", allow_negative_numbers = true)]
    pub binance_interval: Option<i64>,

    /// CoinGecko price polling interval in seconds
    #[arg(long, env = "COINGECKO_INTERVAL", allow_negative_numbers = true)]
    pub coingecko_interval: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["price-proxy"]).unwrap();
        assert_eq!(args.config, DEFAULT_CONFIG_PATH);
    }

    #[test]
    fn test_parse_intervals() {
        let args = Args::try_parse_from([
            "price-proxy",
            "--config",
            "/tmp/p.toml",
            "--binance-interval",
            "3",
            "--coingecko-interval",
            "-1",
        ])
        .unwrap();
        assert_eq!(args.config, "/tmp/p.toml");
        assert_eq!(args.binance_interval, Some(3));
        assert_eq!(args.coingecko_interval, Some(-1));
    }

    #[test]
    fn test_reject_non_numeric_interval() {
        assert!(Args::try_parse_from(["price-proxy", "--binance-interval", "fast"]).is_err());
    }
}
