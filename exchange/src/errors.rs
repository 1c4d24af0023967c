use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExchangeError {
    #[error("Parameters invalid: {message}")]
    ParametersInvalid { message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Rate limited: status: {status}, text: {message}")]
    RateLimited { status: u16, message: String },

    #[error("Response error: status: {status}, text: {message}")]
    StatusError { status: u16, message: String },

    #[error("Parse result error: {message}")]
    ParseResultError { message: String },
}

impl ExchangeError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ExchangeError::RateLimited { status, .. } | ExchangeError::StatusError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ExchangeError::RateLimited { .. })
    }

    pub(crate) fn parse_error(text: &str, e: serde_json::Error) -> Self {
        let head: String = text.chars().take(512).collect();
        log::error!("Parse result: {:?} error: {:?}", head, e);
        ExchangeError::ParseResultError {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExchangeError>;
