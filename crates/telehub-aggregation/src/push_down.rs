use crate::error::{AggregationError, Result};
use crate::strategy::{ensure_valid_config, AggregationStrategy};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use telehub_connection::{DataSourceConnection, SupportsAggregation};
use telehub_types::{
    AggregateFunction, AggregationConfiguration, AggregationKind, DataPoint, QueryParams,
    TimeWindow,
};
use tracing::{debug, warn};

/// 服务端聚合下推策略
///
/// 对配置的每个 (类型, 窗口) 组合下发一次或多次聚合查询；
/// 复合类型（MinMax / FirstLast / Delta）由两次基础查询组合而成。
/// 单个组合失败只丢弃该组合的贡献，整批仍返回全部成功结果。
pub struct PushDownStrategy {
    connection: Arc<dyn DataSourceConnection>,
}

impl PushDownStrategy {
    pub fn new(connection: Arc<dyn DataSourceConnection>) -> Self {
        Self { connection }
    }

    async fn apply_pair(
        &self,
        aggregation: &dyn SupportsAggregation,
        params: &QueryParams,
        kind: AggregationKind,
        window: TimeWindow,
    ) -> Result<Vec<DataPoint>> {
        match kind {
            AggregationKind::Average => {
                let points = aggregation
                    .query_aggregated_data(params, AggregateFunction::Mean, window)
                    .await?;
                Ok(Self::tag_all(points, kind.as_str(), window))
            }
            AggregationKind::Total => {
                let points = aggregation
                    .query_aggregated_data(params, AggregateFunction::Sum, window)
                    .await?;
                Ok(Self::tag_all(points, kind.as_str(), window))
            }
            AggregationKind::MinMax => {
                let min = aggregation
                    .query_aggregated_data(params, AggregateFunction::Min, window)
                    .await?;
                let max = aggregation
                    .query_aggregated_data(params, AggregateFunction::Max, window)
                    .await?;

                let mut points = Self::tag_all(min, &format!("{}_min", kind.as_str()), window);
                points.extend(Self::tag_all(
                    max,
                    &format!("{}_max", kind.as_str()),
                    window,
                ));
                Ok(points)
            }
            AggregationKind::FirstLast => {
                let first = aggregation
                    .query_aggregated_data(params, AggregateFunction::First, window)
                    .await?;
                let last = aggregation
                    .query_aggregated_data(params, AggregateFunction::Last, window)
                    .await?;

                let mut points = Self::tag_all(first, &format!("{}_first", kind.as_str()), window);
                points.extend(Self::tag_all(
                    last,
                    &format!("{}_last", kind.as_str()),
                    window,
                ));
                Ok(points)
            }
            AggregationKind::Delta => {
                let first = aggregation
                    .query_aggregated_data(params, AggregateFunction::First, window)
                    .await?;
                let last = aggregation
                    .query_aggregated_data(params, AggregateFunction::Last, window)
                    .await?;
                Ok(Self::join_delta(first, last, window))
            }
        }
    }

    fn tag_all(points: Vec<DataPoint>, label: &str, window: TimeWindow) -> Vec<DataPoint> {
        points
            .into_iter()
            .map(|mut point| {
                point.aggregation_kind = Some(label.to_string());
                point.time_window = Some(window.as_str().to_string());
                point
            })
            .collect()
    }

    /// 按点位 ID 内联两侧结果：last − first，保留 last 侧时间戳，
    /// 任一侧缺失或非数值的行直接丢弃
    fn join_delta(first: Vec<DataPoint>, last: Vec<DataPoint>, window: TimeWindow) -> Vec<DataPoint> {
        let first_by_tag: HashMap<&str, &DataPoint> = first
            .iter()
            .map(|point| (point.tag_id.as_str(), point))
            .collect();

        let mut points = Vec::new();
        for last_point in &last {
            let first_point = match first_by_tag.get(last_point.tag_id.as_str()) {
                Some(point) => point,
                None => continue,
            };

            let (first_value, last_value) =
                match (first_point.value_as_f64(), last_point.value_as_f64()) {
                    (Some(f), Some(l)) => (f, l),
                    _ => continue,
                };

            points.push(DataPoint {
                time: last_point.time,
                collector_id: last_point.collector_id.clone(),
                gateway_id: last_point.gateway_id.clone(),
                equipment_id: last_point.equipment_id.clone(),
                tag_id: last_point.tag_id.clone(),
                value: format!("{:.2}", last_value - first_value),
                aggregation_kind: Some(AggregationKind::Delta.as_str().to_string()),
                time_window: Some(window.as_str().to_string()),
            });
        }

        points
    }
}

#[async_trait]
impl AggregationStrategy for PushDownStrategy {
    async fn apply(
        &self,
        params: &QueryParams,
        config: &AggregationConfiguration,
    ) -> Result<Vec<DataPoint>> {
        ensure_valid_config(config)?;

        let aggregation = self
            .connection
            .as_aggregation()
            .ok_or(AggregationError::CapabilityMissing)?;

        let mut points = Vec::new();
        for kind in &config.kinds {
            for window in &config.windows {
                match self.apply_pair(aggregation, params, *kind, *window).await {
                    Ok(mut pair_points) => {
                        debug!(
                            kind = %kind.as_str(),
                            window = %window.as_str(),
                            count = pair_points.len(),
                            "Aggregation pair completed"
                        );
                        points.append(&mut pair_points);
                    }
                    Err(e) => {
                        warn!(
                            kind = %kind.as_str(),
                            window = %window.as_str(),
                            error = %e,
                            "Aggregation pair failed, skipping its contribution"
                        );
                    }
                }
            }
        }

        Ok(points)
    }

    fn description(&self) -> String {
        "Server-side aggregation: each kind/window pair is computed by the backend \
         via windowed aggregate queries"
            .to_string()
    }
}
