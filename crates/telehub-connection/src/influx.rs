use crate::config::InfluxConfig;
use crate::error::Result;
use crate::traits::{ensure_valid_params, DataSourceConnection, SupportsAggregation};
use crate::transport::{FluxTransport, HttpFluxTransport};
use async_trait::async_trait;
use std::time::Instant;
use telehub_query::{FluxQueryBuilder, FluxResponseParser};
use telehub_types::{
    AggregateFunction, BackendKind, ConnectionInfo, ConnectionResult, DataPoint, QueryParams,
    TimeWindow,
};
use tracing::{debug, warn};

/// InfluxDB 直连
///
/// 组合查询构建器、响应解析器和查询传输，支持服务端聚合下推。
pub struct InfluxConnection {
    info: ConnectionInfo,
    builder: FluxQueryBuilder,
    parser: FluxResponseParser,
    transport: Box<dyn FluxTransport>,
}

impl InfluxConnection {
    pub fn new(name: &str, config: InfluxConfig) -> Self {
        let transport = Box::new(HttpFluxTransport::new(&config));
        Self::with_transport(name, config, transport)
    }

    /// 注入自定义传输（测试或备用通道）
    pub fn with_transport(
        name: &str,
        config: InfluxConfig,
        transport: Box<dyn FluxTransport>,
    ) -> Self {
        let info = ConnectionInfo::new(name, BackendKind::InfluxDb)
            .with_metadata("url", &config.url)
            .with_metadata("bucket", &config.bucket);

        Self {
            info,
            builder: FluxQueryBuilder::new(config.bucket, config.measurement),
            parser: FluxResponseParser::new(),
            transport,
        }
    }

    async fn run_query(&self, flux: String) -> Result<Vec<DataPoint>> {
        debug!(query = %flux, "Running flux query");
        let response = self.transport.execute_query(&flux).await?;
        Ok(self.parser.parse_data_points(&response))
    }
}

#[async_trait]
impl DataSourceConnection for InfluxConnection {
    async fn test_connection(&self) -> ConnectionResult {
        let started = Instant::now();

        match self
            .transport
            .execute_query(&self.builder.build_test_query())
            .await
        {
            Ok(_) => ConnectionResult::success(
                "InfluxDB connection OK",
                started.elapsed().as_millis() as u64,
            ),
            Err(e) => {
                warn!(error = %e, "InfluxDB connectivity test failed");
                ConnectionResult::failure(format!("InfluxDB connection failed: {}", e))
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
        BackendKind::InfluxDb
    }

    fn as_aggregation(&self) -> Option<&dyn SupportsAggregation> {
        Some(self)
    }
}

#[async_trait]
impl SupportsAggregation for InfluxConnection {
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
