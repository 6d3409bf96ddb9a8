use crate::error::Result;
use crate::strategy::{ensure_valid_config, AggregationStrategy};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use telehub_connection::DataSourceConnection;
use telehub_types::{AggregationConfiguration, DataPoint, QueryParams};
use tracing::debug;

/// 本地过滤策略
///
/// 面向预聚合存储：一次性取回整个时间范围的行，
/// 再按点位 ID 中编码的聚合元数据在客户端筛选。
/// 该后端 schema 中设备列和点位列携带的是聚合元数据而非层次标识，
/// 查询前清掉这两级过滤。
pub struct LocalFilterStrategy {
    connection: Arc<dyn DataSourceConnection>,
}

impl LocalFilterStrategy {
    pub fn new(connection: Arc<dyn DataSourceConnection>) -> Self {
        Self { connection }
    }

    /// 在最后一个下划线处拆出 (类型 token, 窗口 token)；
    /// 无下划线或下划线在首位视为不可解析
    fn split_metadata(tag_id: &str) -> Option<(&str, &str)> {
        let index = tag_id.rfind('_')?;
        if index == 0 {
            return None;
        }
        Some((&tag_id[..index], &tag_id[index + 1..]))
    }
}

#[async_trait]
impl AggregationStrategy for LocalFilterStrategy {
    async fn apply(
        &self,
        params: &QueryParams,
        config: &AggregationConfiguration,
    ) -> Result<Vec<DataPoint>> {
        ensure_valid_config(config)?;

        let mut unfiltered = params.clone();
        unfiltered.equipment_ids = None;
        unfiltered.tag_ids = None;

        let rows = self.connection.query_data(&unfiltered).await?;

        let kind_tokens: HashSet<&str> = config
            .kinds
            .iter()
            .flat_map(|kind| kind.accepted_tokens().iter().copied())
            .collect();
        let window_tokens: HashSet<&str> =
            config.windows.iter().map(|window| window.as_str()).collect();

        let total = rows.len();
        let mut kept = Vec::new();

        for mut point in rows {
            let (kind_token, window_token) = match Self::split_metadata(&point.tag_id) {
                Some((kind, window)) => (kind.to_string(), window.to_string()),
                // 不可解析的元数据直接丢弃
                None => continue,
            };

            if kind_tokens.contains(kind_token.as_str())
                && window_tokens.contains(window_token.as_str())
            {
                point.aggregation_kind = Some(kind_token);
                point.time_window = Some(window_token);
                kept.push(point);
            }
        }

        debug!(
            total = total,
            kept = kept.len(),
            "Filtered pre-aggregated rows locally"
        );

        Ok(kept)
    }

    fn description(&self) -> String {
        "Client-side filtering: the backend stores pre-aggregated rows and the \
         requested kind/window subset is selected by parsing per-row metadata"
            .to_string()
    }
}
