use crate::config::InfluxConfig;
use crate::error::{ConnectionError, Result};
use async_trait::async_trait;
use tracing::debug;

/// 时序后端查询传输接口
///
/// 执行查询文本并原样返回响应文本，重试与连接池策略由实现方负责。
#[async_trait]
pub trait FluxTransport: Send + Sync {
    async fn execute_query(&self, query: &str) -> Result<String>;
}

/// 基于 HTTP 的查询传输实现
pub struct HttpFluxTransport {
    client: reqwest::Client,
    url: String,
    org: String,
    token: String,
}

impl HttpFluxTransport {
    pub fn new(config: &InfluxConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            org: config.org.clone(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl FluxTransport for HttpFluxTransport {
    async fn execute_query(&self, query: &str) -> Result<String> {
        let endpoint = format!("{}/api/v2/query?org={}", self.url, self.org);

        debug!(endpoint = %endpoint, "Executing flux query");

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "application/vnd.flux")
            .header("Accept", "application/csv")
            .body(query.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Transport(format!(
                "Query endpoint returned {}: {}",
                status, body
            )));
        }

        Ok(response.text().await?)
    }
}
