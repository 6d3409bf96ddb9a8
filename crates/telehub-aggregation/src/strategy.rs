use crate::error::{AggregationError, Result};
use async_trait::async_trait;
use telehub_types::{AggregationConfiguration, DataPoint, QueryParams};

/// 聚合策略统一接口
///
/// 策略持有其服务的连接，按调用无状态；
/// 无论哪个策略产出，结果形状和标注字段的含义完全一致。
#[async_trait]
pub trait AggregationStrategy: Send + Sync {
    /// 按配置的聚合类型 × 时间窗口矩阵执行聚合
    async fn apply(
        &self,
        params: &QueryParams,
        config: &AggregationConfiguration,
    ) -> Result<Vec<DataPoint>>;

    /// 供调用方展示的策略说明
    fn description(&self) -> String;
}

/// 执行前的配置校验，任一集合为空即拒绝
pub(crate) fn ensure_valid_config(config: &AggregationConfiguration) -> Result<()> {
    if !config.is_valid() {
        return Err(AggregationError::InvalidConfiguration(
            "aggregation kinds and time windows must both be non-empty".to_string(),
        ));
    }
    Ok(())
}
