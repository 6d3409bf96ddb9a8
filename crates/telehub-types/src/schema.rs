use serde::{Deserialize, Serialize};

/// 关系库表结构映射
///
/// 将时间列、值列和四级层次列映射到任意物理列名，
/// 让 SQL 构建器可以面向不同命名的表。默认值采用约定列名。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableSchema {
    /// 表名
    pub table: String,

    /// 时间列
    pub time_column: String,

    /// 值列
    pub value_column: String,

    /// 采集器列
    pub collector_column: String,

    /// 网关列
    pub gateway_column: String,

    /// 设备列
    pub equipment_column: String,

    /// 点位列
    pub tag_column: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            table: "telemetry_data".to_string(),
            time_column: "time".to_string(),
            value_column: "value".to_string(),
            collector_column: "collector_id".to_string(),
            gateway_column: "gateway_id".to_string(),
            equipment_column: "equipment_id".to_string(),
            tag_column: "tag_id".to_string(),
        }
    }
}

impl TableSchema {
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }
}
