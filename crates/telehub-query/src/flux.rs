use crate::columns::{COL_COLLECTOR, COL_EQUIPMENT, COL_GATEWAY, COL_TAG, COL_TIME};
use chrono::{DateTime, Utc};
use telehub_types::{AggregateFunction, QueryParams, TimeWindow};

/// 流式查询构建器
///
/// 将后端无关的 [`QueryParams`] 翻译为时序库的原生查询文本。
/// 过滤值只作为不透明 ID 字符串做等值比较，经转义后嵌入，
/// 不会成为查询结构的一部分。
#[derive(Debug, Clone)]
pub struct FluxQueryBuilder {
    /// 目标 bucket
    pub bucket: String,

    /// 目标 measurement
    pub measurement: String,
}

impl FluxQueryBuilder {
    pub fn new(bucket: impl Into<String>, measurement: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            measurement: measurement.into(),
        }
    }

    /// 连通性测试查询
    pub fn build_test_query(&self) -> String {
        "buckets()\n  |> limit(n: 1)".to_string()
    }

    /// 参数是否有效（开始时间必须早于结束时间）
    pub fn validate_params(&self, params: &QueryParams) -> bool {
        params.has_valid_range()
    }

    /// 构建明细数据查询
    ///
    /// 结果合并为单一分组并按时间倒序，保证传输层只看到一个表头。
    pub fn build_data_query(&self, params: &QueryParams) -> String {
        let mut flux = self.build_filtered_source(params);

        flux.push_str("\n  |> group()");
        flux.push_str(&format!(
            "\n  |> sort(columns: [\"{}\"], desc: true)",
            COL_TIME
        ));

        if let Some(limit) = params.limit {
            flux.push_str(&format!("\n  |> limit(n: {})", limit));
        }

        flux
    }

    /// 构建窗口聚合查询
    ///
    /// 值字段先转为浮点再做窗口聚合，结果重新按时间倒序。
    pub fn build_aggregated_query(
        &self,
        params: &QueryParams,
        function: AggregateFunction,
        window: TimeWindow,
    ) -> String {
        let mut flux = self.build_filtered_source(params);

        flux.push_str("\n  |> toFloat()");
        flux.push_str(&format!(
            "\n  |> aggregateWindow(every: {}, fn: {}, createEmpty: false)",
            window.as_str(),
            function.flux_name()
        ));
        flux.push_str("\n  |> group()");
        flux.push_str(&format!(
            "\n  |> sort(columns: [\"{}\"], desc: true)",
            COL_TIME
        ));

        flux
    }

    /// range + measurement + 层次过滤的公共前缀
    fn build_filtered_source(&self, params: &QueryParams) -> String {
        let mut flux = format!(
            "from(bucket: \"{}\")\n  |> range(start: {}, stop: {})\n  |> filter(fn: (r) => r[\"_measurement\"] == \"{}\")",
            Self::escape(&self.bucket),
            Self::format_time(params.start_time),
            Self::format_time(params.end_time),
            Self::escape(&self.measurement)
        );

        let levels = [
            (COL_COLLECTOR, params.collector_ids.as_deref()),
            (COL_GATEWAY, params.gateway_ids.as_deref()),
            (COL_EQUIPMENT, params.equipment_ids.as_deref()),
            (COL_TAG, params.tag_ids.as_deref()),
        ];

        for (column, filter) in levels {
            if let Some(predicate) = Self::tag_predicate(column, filter) {
                flux.push_str(&format!("\n  |> filter(fn: (r) => {})", predicate));
            }
        }

        flux
    }

    /// 逗号分隔的多值过滤编译为等值 OR 谓词；空过滤不产生谓词
    fn tag_predicate(column: &str, filter: Option<&str>) -> Option<String> {
        let ids = QueryParams::split_filter(filter?);
        if ids.is_empty() {
            return None;
        }

        let terms: Vec<String> = ids
            .iter()
            .map(|id| format!("r[\"{}\"] == \"{}\"", column, Self::escape(id)))
            .collect();

        Some(terms.join(" or "))
    }

    /// RFC3339 UTC 毫秒精度时间
    fn format_time(time: DateTime<Utc>) -> String {
        time.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    fn escape(value: &str) -> String {
        value.replace('\\', "\\\\").replace('"', "\\\"")
    }
}
