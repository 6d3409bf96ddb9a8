//! 时序后端返回结果的规范列名

/// 时间列
pub const COL_TIME: &str = "_time";

/// 值列
pub const COL_VALUE: &str = "_value";

/// 采集器列
pub const COL_COLLECTOR: &str = "collector_id";

/// 网关列
pub const COL_GATEWAY: &str = "gateway_id";

/// 设备列
pub const COL_EQUIPMENT: &str = "equipment_id";

/// 点位列
pub const COL_TAG: &str = "tag_id";
