use crate::backend::BackendKind;
use serde::{Deserialize, Serialize};

/// 聚合类型
///
/// MinMax / FirstLast / Delta 为复合类型，需要组合两次基础查询的结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    Average,
    Total,
    MinMax,
    FirstLast,
    Delta,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 5] = [
        AggregationKind::Average,
        AggregationKind::Total,
        AggregationKind::MinMax,
        AggregationKind::FirstLast,
        AggregationKind::Delta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::Average => "average",
            AggregationKind::Total => "total",
            AggregationKind::MinMax => "minmax",
            AggregationKind::FirstLast => "firstlast",
            AggregationKind::Delta => "delta",
        }
    }

    /// 本地过滤时可接受的元数据 token 集合（复合类型展开）
    pub fn accepted_tokens(&self) -> &'static [&'static str] {
        match self {
            AggregationKind::Average => &["average"],
            AggregationKind::Total => &["total"],
            AggregationKind::MinMax => &["min", "max"],
            AggregationKind::FirstLast => &["first", "last"],
            AggregationKind::Delta => &["delta"],
        }
    }
}

/// 后端可下推的基础窗口聚合函数
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Mean,
    Sum,
    Min,
    Max,
    Count,
    Stddev,
    First,
    Last,
}

impl AggregateFunction {
    /// 流式查询语言中的函数名
    pub fn flux_name(&self) -> &'static str {
        match self {
            AggregateFunction::Mean => "mean",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Count => "count",
            AggregateFunction::Stddev => "stddev",
            AggregateFunction::First => "first",
            AggregateFunction::Last => "last",
        }
    }

    /// SQL 聚合函数名
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunction::Mean => "AVG",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Stddev => "STDDEV",
            AggregateFunction::First => "FIRST",
            AggregateFunction::Last => "LAST",
        }
    }
}

/// 时间窗口
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::FiveMinutes,
        TimeWindow::FifteenMinutes,
        TimeWindow::ThirtyMinutes,
        TimeWindow::SixtyMinutes,
    ];

    /// 短文本时长，如 "5m"
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::FiveMinutes => "5m",
            TimeWindow::FifteenMinutes => "15m",
            TimeWindow::ThirtyMinutes => "30m",
            TimeWindow::SixtyMinutes => "60m",
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            TimeWindow::FiveMinutes => 5,
            TimeWindow::FifteenMinutes => 15,
            TimeWindow::ThirtyMinutes => 30,
            TimeWindow::SixtyMinutes => 60,
        }
    }
}

/// 聚合配置
///
/// 聚合类型集合 × 时间窗口集合，两者都不能为空。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfiguration {
    pub kinds: Vec<AggregationKind>,
    pub windows: Vec<TimeWindow>,
    pub backend: BackendKind,
}

impl AggregationConfiguration {
    pub fn new(
        kinds: Vec<AggregationKind>,
        windows: Vec<TimeWindow>,
        backend: BackendKind,
    ) -> Self {
        Self {
            kinds,
            windows,
            backend,
        }
    }

    /// 配置是否可执行（两个集合均非空）
    pub fn is_valid(&self) -> bool {
        !self.kinds.is_empty() && !self.windows.is_empty()
    }
}
