use crate::error::{ConnectionError, Result};
use async_trait::async_trait;
use telehub_types::{
    AggregateFunction, BackendKind, ConnectionInfo, ConnectionResult, DataPoint, QueryParams,
    TimeWindow,
};

/// 数据源连接统一接口
///
/// 可选能力通过 `as_aggregation` / `as_raw_tables` 探测，
/// 不支持的连接返回 None，调用方据此保持后端无关。
#[async_trait]
pub trait DataSourceConnection: Send + Sync {
    /// 连通性测试
    ///
    /// 认证、超时、HTTP 等已处理的失败类别一律转为失败结果，不抛错。
    async fn test_connection(&self) -> ConnectionResult;

    /// 查询明细数据；参数无效时在任何网络调用前报错
    async fn query_data(&self, params: &QueryParams) -> Result<Vec<DataPoint>>;

    /// 连接描述信息
    fn connection_info(&self) -> ConnectionInfo;

    /// 后端类型
    fn backend_kind(&self) -> BackendKind;

    /// 服务端聚合能力（仅支持下推的后端实现）
    fn as_aggregation(&self) -> Option<&dyn SupportsAggregation> {
        None
    }

    /// 表结构发现能力（仅关系型后端实现）
    fn as_raw_tables(&self) -> Option<&dyn SupportsRawTables> {
        None
    }
}

/// 服务端聚合能力
#[async_trait]
pub trait SupportsAggregation: Send + Sync {
    /// 下推一次窗口聚合查询
    async fn query_aggregated_data(
        &self,
        params: &QueryParams,
        function: AggregateFunction,
        window: TimeWindow,
    ) -> Result<Vec<DataPoint>>;
}

/// 表结构发现能力
#[async_trait]
pub trait SupportsRawTables: Send + Sync {
    /// 列出可见表
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// 列出某表的列名
    async fn list_columns(&self, table: &str) -> Result<Vec<String>>;
}

/// 查询前的参数校验，失败即拒绝，不发起任何 I/O
pub fn ensure_valid_params(params: &QueryParams) -> Result<()> {
    if !params.has_valid_range() {
        return Err(ConnectionError::InvalidParams(
            "start_time must be earlier than end_time".to_string(),
        ));
    }
    Ok(())
}
