use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 数据后端类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// InfluxDB 时序库（流式查询语言直连）
    #[serde(rename = "influxdb")]
    InfluxDb,

    /// HTTP API 前置的时序库变体
    #[serde(rename = "influx-api")]
    InfluxApi,

    /// PostgreSQL / TimescaleDB 关系库
    #[serde(rename = "postgres")]
    Postgres,

    /// MySQL 关系库
    #[serde(rename = "mysql")]
    Mysql,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::InfluxDb,
        BackendKind::InfluxApi,
        BackendKind::Postgres,
        BackendKind::Mysql,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::InfluxDb => "influxdb",
            BackendKind::InfluxApi => "influx-api",
            BackendKind::Postgres => "postgres",
            BackendKind::Mysql => "mysql",
        }
    }

    /// 是否为关系型后端
    pub fn is_relational(&self) -> bool {
        matches!(self, BackendKind::Postgres | BackendKind::Mysql)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "influxdb" => Ok(BackendKind::InfluxDb),
            "influx-api" | "influxapi" => Ok(BackendKind::InfluxApi),
            "postgres" | "postgresql" | "timescale" => Ok(BackendKind::Postgres),
            "mysql" => Ok(BackendKind::Mysql),
            other => Err(format!("Unknown backend kind: {}", other)),
        }
    }
}
