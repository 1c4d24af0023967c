use exchange::ExchangeError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ProxyError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("Upstream rate limited: {message}")]
    UpstreamRateLimited { message: String },

    #[error("Upstream malformed response: {message}")]
    UpstreamMalformed { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Server error: {message}")]
    ServerError { message: String },
}

impl ProxyError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProxyError::UpstreamRateLimited { .. })
    }
}

impl From<ExchangeError> for ProxyError {
    fn from(e: ExchangeError) -> Self {
        match e {
            ExchangeError::RateLimited { .. } => ProxyError::UpstreamRateLimited {
                message: e.to_string(),
            },
            ExchangeError::ParseResultError { .. } => ProxyError::UpstreamMalformed {
                message: e.to_string(),
            },
            ExchangeError::NetworkError { .. }
            | ExchangeError::StatusError { .. }
            | ExchangeError::ParametersInvalid { .. } => ProxyError::UpstreamUnavailable {
                message: e.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;
