use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 遥测数据点
///
/// 四级层次 ID（采集器/网关/设备/点位）+ 时间戳 + 值。
/// 值以字符串保存，因为不同后端返回的数值表示不一致，
/// 数值转换由调用方驱动（见 [`DataPoint::value_as_f64`]）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    /// 时间戳
    pub time: DateTime<Utc>,

    /// 采集器 ID（第一级）
    pub collector_id: String,

    /// 网关 ID（第二级）
    pub gateway_id: String,

    /// 设备 ID（第三级）
    pub equipment_id: String,

    /// 点位 ID（第四级）
    pub tag_id: String,

    /// 原始值
    pub value: String,

    /// 聚合类型标注（仅聚合策略写入）
    pub aggregation_kind: Option<String>,

    /// 时间窗口标注（仅聚合策略写入）
    pub time_window: Option<String>,
}

impl Default for DataPoint {
    fn default() -> Self {
        Self {
            time: Utc::now(),
            collector_id: String::new(),
            gateway_id: String::new(),
            equipment_id: String::new(),
            tag_id: String::new(),
            value: String::new(),
            aggregation_kind: None,
            time_window: None,
        }
    }
}

impl DataPoint {
    pub fn new(time: DateTime<Utc>, value: impl Into<String>) -> Self {
        Self {
            time,
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_hierarchy(
        mut self,
        collector_id: impl Into<String>,
        gateway_id: impl Into<String>,
        equipment_id: impl Into<String>,
        tag_id: impl Into<String>,
    ) -> Self {
        self.collector_id = collector_id.into();
        self.gateway_id = gateway_id.into();
        self.equipment_id = equipment_id.into();
        self.tag_id = tag_id.into();
        self
    }

    pub fn with_aggregation(
        mut self,
        kind: impl Into<String>,
        window: impl Into<String>,
    ) -> Self {
        self.aggregation_kind = Some(kind.into());
        self.time_window = Some(window.into());
        self
    }

    /// 尝试将值解析为浮点数，失败返回 None（不报错）
    pub fn value_as_f64(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok()
    }
}
