use crate::config::{ApiConfig, InfluxConfig};
use crate::error::{ConnectionError, Result};
use crate::traits::{ensure_valid_params, DataSourceConnection, SupportsAggregation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use telehub_query::{FluxQueryBuilder, FluxResponseParser};
use telehub_types::{
    AggregateFunction, BackendKind, ConnectionInfo, ConnectionResult, DataPoint, QueryParams,
    TimeWindow,
};
use tracing::{debug, warn};

/// API 查询请求描述符
///
/// 携带托管连接引用或完整内联后端凭证，加上查询文本。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiQueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub influx: Option<InfluxConfig>,

    pub query: String,
}

/// API 查询响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiQueryResponse {
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    /// 后端原样转发的查询响应文本
    #[serde(default)]
    pub data: Option<String>,
}

/// API 传输接口
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn query(&self, request: &ApiQueryRequest) -> Result<ApiQueryResponse>;
}

/// 基于 HTTP 的 API 传输实现
pub struct HttpApiTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpApiTransport {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl ApiTransport for HttpApiTransport {
    async fn query(&self, request: &ApiQueryRequest) -> Result<ApiQueryResponse> {
        let endpoint = format!("{}/api/v1/query", self.base_url);

        debug!(endpoint = %endpoint, "Sending API query request");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Transport(format!(
                "API endpoint returned {}: {}",
                status, body
            )));
        }

        Ok(response.json::<ApiQueryResponse>().await?)
    }
}

/// API 前置的时序库连接
///
/// 查询构建与响应解析和直连一致，只是经由 API 转发，
/// 同样支持服务端聚合下推。
pub struct ApiConnection {
    info: ConnectionInfo,
    config: ApiConfig,
    builder: FluxQueryBuilder,
    parser: FluxResponseParser,
    transport: Box<dyn ApiTransport>,
}

impl ApiConnection {
    pub fn new(name: &str, config: ApiConfig) -> Self {
        let transport = Box::new(HttpApiTransport::new(&config));
        Self::with_transport(name, config, transport)
    }

    /// 注入自定义传输（测试或备用通道）
    pub fn with_transport(
        name: &str,
        config: ApiConfig,
        transport: Box<dyn ApiTransport>,
    ) -> Self {
        let info = ConnectionInfo::new(name, BackendKind::InfluxApi)
            .with_metadata("base_url", &config.base_url)
            .with_metadata("bucket", &config.bucket);

        Self {
            info,
            builder: FluxQueryBuilder::new(config.bucket.clone(), config.measurement.clone()),
            parser: FluxResponseParser::new(),
            config,
            transport,
        }
    }

    fn request_for(&self, query: String) -> ApiQueryRequest {
        // 优先托管连接引用，否则带内联凭证
        ApiQueryRequest {
            connection_id: self.config.connection_id.clone(),
            influx: if self.config.connection_id.is_some() {
                None
            } else {
                self.config.inline.clone()
            },
            query,
        }
    }

    async fn run_query(&self, query: String) -> Result<Vec<DataPoint>> {
        let request = self.request_for(query);
        let response = self.transport.query(&request).await?;

        if !response.success {
            return Err(ConnectionError::Api(
                response
                    .message
                    .unwrap_or_else(|| "API reported failure without message".to_string()),
            ));
        }

        Ok(self
            .parser
            .parse_data_points(&response.data.unwrap_or_default()))
    }
}

#[async_trait]
impl DataSourceConnection for ApiConnection {
    async fn test_connection(&self) -> ConnectionResult {
        let started = Instant::now();
        let request = self.request_for(self.builder.build_test_query());

        match self.transport.query(&request).await {
            Ok(response) if response.success => {
                ConnectionResult::success("API connection OK", started.elapsed().as_millis() as u64)
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "API reported failure".to_string());
                warn!(message = %message, "API connectivity test failed");
                ConnectionResult::failure(message)
            }
            Err(e) => {
                warn!(error = %e, "API connectivity test failed");
                ConnectionResult::failure(format!("API connection failed: {}", e))
            }
        }
    }

    async fn query_data(&self, params: &QueryParams) -> Result<Vec<DataPoint>> {
        ensure_valid_params(params)?;
        self.run_query(self.builder.build_data_query(params)).await
    }

    fn connection_info(&self) -> ConnectionInfo {
        self.info.clone()
    }

    fn backend_kind(&self) -> BackendKind {
        BackendKind::InfluxApi
    }

    fn as_aggregation(&self) -> Option<&dyn SupportsAggregation> {
        Some(self)
    }
}

#[async_trait]
impl SupportsAggregation for ApiConnection {
    async fn query_aggregated_data(
        &self,
        params: &QueryParams,
        function: AggregateFunction,
        window: TimeWindow,
    ) -> Result<Vec<DataPoint>> {
        ensure_valid_params(params)?;
        self.run_query(self.builder.build_aggregated_query(params, function, window))
            .await
    }
}
