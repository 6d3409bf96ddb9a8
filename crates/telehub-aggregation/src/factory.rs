use crate::error::{AggregationError, Result};
use crate::local_filter::LocalFilterStrategy;
use crate::push_down::PushDownStrategy;
use crate::strategy::AggregationStrategy;
use std::sync::Arc;
use telehub_connection::DataSourceConnection;
use telehub_types::BackendKind;

/// 聚合策略工厂
///
/// 策略选择是后端类型的纯函数，集中在这里，
/// 调用方拿到策略后只调一个方法，不做类型分支。
pub struct StrategyFactory;

impl StrategyFactory {
    /// 具备服务端聚合下推能力的后端
    const PUSH_DOWN_KINDS: [BackendKind; 2] = [BackendKind::InfluxDb, BackendKind::InfluxApi];

    /// 策略工厂覆盖的后端
    const STRATEGY_KINDS: [BackendKind; 3] = [
        BackendKind::InfluxDb,
        BackendKind::InfluxApi,
        BackendKind::Postgres,
    ];

    /// 后端是否支持服务端聚合下推
    pub fn is_aggregation_supported(kind: BackendKind) -> bool {
        Self::PUSH_DOWN_KINDS.contains(&kind)
    }

    /// 为后端类型创建聚合策略
    pub fn create_strategy(
        kind: BackendKind,
        connection: Arc<dyn DataSourceConnection>,
    ) -> Result<Box<dyn AggregationStrategy>> {
        match kind {
            BackendKind::InfluxDb | BackendKind::InfluxApi => {
                Ok(Box::new(PushDownStrategy::new(connection)))
            }
            BackendKind::Postgres => Ok(Box::new(LocalFilterStrategy::new(connection))),
            other => Err(AggregationError::NotSupported {
                kind: other.to_string(),
                supported: Self::supported_list(),
            }),
        }
    }

    /// 供调用方展示的聚合方式说明
    pub fn aggregation_description(kind: BackendKind) -> String {
        match kind {
            BackendKind::InfluxDb | BackendKind::InfluxApi => {
                "Aggregates are computed by the backend per kind/window pair".to_string()
            }
            BackendKind::Postgres => {
                "Pre-aggregated rows are fetched and filtered client-side".to_string()
            }
            other => format!("Aggregation is not available for backend '{}'", other),
        }
    }

    fn supported_list() -> String {
        Self::STRATEGY_KINDS
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_down_support_matrix() {
        assert!(StrategyFactory::is_aggregation_supported(BackendKind::InfluxDb));
        assert!(StrategyFactory::is_aggregation_supported(BackendKind::InfluxApi));
        assert!(!StrategyFactory::is_aggregation_supported(BackendKind::Postgres));
        assert!(!StrategyFactory::is_aggregation_supported(BackendKind::Mysql));
    }

    #[test]
    fn test_description_mentions_backend_for_unsupported() {
        let description = StrategyFactory::aggregation_description(BackendKind::Mysql);
        assert!(description.contains("mysql"));
    }
}
