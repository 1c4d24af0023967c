use crate::errors::{ExchangeError, Result};
use log::{error, warn};
use rate_limiter::Pacer;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "price-proxy/0.1";

// 上游REST接口的公共部分：client构建、限速、状态码映射
pub struct HttpApi {
    client: Option<reqwest::Client>,
    base_url: String,
    proxy_url: Option<String>,
    user_agent: String,
    pacer: Option<Arc<Pacer>>,
}

impl HttpApi {
    pub fn new(
        base_url: String,
        proxy_url: Option<String>,
        user_agent: Option<String>,
        pacer: Option<Arc<Pacer>>,
    ) -> Self {
        HttpApi {
            client: None,
            base_url: base_url.trim_end_matches('/').to_string(),
            proxy_url,
            user_agent: user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            pacer,
        }
    }

    pub fn init(&mut self) -> Result<()> {
        let client_builder = reqwest::Client::builder().user_agent(self.user_agent.clone());

        let client = if let Some(proxy_url) = &self.proxy_url {
            client_builder
                .proxy(reqwest::Proxy::all(proxy_url).map_err(|e| {
                    ExchangeError::ParametersInvalid {
                        message: format!("proxy url invalid: {}, error: {}", proxy_url, e),
                    }
                })?)
                .build()
                .map_err(|e| ExchangeError::ParametersInvalid {
                    message: format!("build client with proxy url: {} failed: {}", proxy_url, e),
                })?
        } else {
            client_builder
                .build()
                .map_err(|e| ExchangeError::ParametersInvalid {
                    message: format!("build client failed: {}", e),
                })?
        };

        self.client = Some(client);
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pacer(&self) -> Option<&Arc<Pacer>> {
        self.pacer.as_ref()
    }

    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        timeout_milli_secs: u64,
    ) -> Result<String> {
        let Some(client) = &self.client else {
            return Err(ExchangeError::ParametersInvalid {
                message: "client is not initialized, please call init() first".to_string(),
            });
        };

        if let Some(pacer) = &self.pacer {
            pacer.wait().await;
        }

        let resp = client
            .get(format!("{}{}", self.base_url, endpoint))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(params)
            .timeout(Duration::from_millis(timeout_milli_secs))
            .send()
            .await
            .map_err(|e| {
                error!("Network error: {} {:?}", endpoint, e);
                ExchangeError::NetworkError {
                    message: e.to_string(),
                }
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let text = resp.text().await.unwrap_or_default();
            warn!("Rate limited by upstream: {} text: {}", endpoint, text);
            return Err(ExchangeError::RateLimited {
                status: status.as_u16(),
                message: text,
            });
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Response error: {} status: {}, text: {}", endpoint, status, text);
            return Err(ExchangeError::StatusError {
                status: status.as_u16(),
                message: text,
            });
        }

        resp.text().await.map_err(|e| {
            error!("Network error: {} {:?}", endpoint, e);
            ExchangeError::NetworkError {
                message: e.to_string(),
            }
        })
    }
}
