use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 后端无关的查询参数
///
/// 四级层次过滤均为可选的逗号分隔 ID 列表；
/// 多个 ID 逻辑上是 OR/IN 谓词，空过滤表示该层不限制。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParams {
    /// 采集器 ID 过滤（逗号分隔）
    pub collector_ids: Option<String>,

    /// 网关 ID 过滤（逗号分隔）
    pub gateway_ids: Option<String>,

    /// 设备 ID 过滤（逗号分隔）
    pub equipment_ids: Option<String>,

    /// 点位 ID 过滤（逗号分隔）
    pub tag_ids: Option<String>,

    /// 开始时间
    pub start_time: DateTime<Utc>,

    /// 结束时间
    pub end_time: DateTime<Utc>,

    /// 限制返回数量
    pub limit: Option<u64>,
}

impl QueryParams {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            collector_ids: None,
            gateway_ids: None,
            equipment_ids: None,
            tag_ids: None,
            start_time,
            end_time,
            limit: None,
        }
    }

    pub fn with_collectors(mut self, ids: impl Into<String>) -> Self {
        self.collector_ids = Some(ids.into());
        self
    }

    pub fn with_gateways(mut self, ids: impl Into<String>) -> Self {
        self.gateway_ids = Some(ids.into());
        self
    }

    pub fn with_equipments(mut self, ids: impl Into<String>) -> Self {
        self.equipment_ids = Some(ids.into());
        self
    }

    pub fn with_tags(mut self, ids: impl Into<String>) -> Self {
        self.tag_ids = Some(ids.into());
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 时间范围是否有效（开始时间必须早于结束时间）
    pub fn has_valid_range(&self) -> bool {
        self.start_time < self.end_time
    }

    /// 拆分逗号分隔的过滤列表，去除空白项
    pub fn split_filter(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
