use serde::{Deserialize, Serialize};
use telehub_types::{BackendKind, TableSchema};

/// InfluxDB 后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// 服务地址
    pub url: String,

    /// 组织
    pub org: String,

    /// 数据 bucket
    pub bucket: String,

    /// measurement 名
    pub measurement: String,

    /// 访问令牌（落盘时为密文）
    pub token: String,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            org: "telehub".to_string(),
            bucket: "telemetry".to_string(),
            measurement: "sensor_data".to_string(),
            token: String::new(),
        }
    }
}

/// API 前置后端配置
///
/// 请求描述符携带托管连接引用（`connection_id`）
/// 或完整内联后端凭证（`inline`），二选一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 服务地址
    pub base_url: String,

    /// 凭证令牌（落盘时为密文）
    pub token: String,

    /// 数据 bucket
    pub bucket: String,

    /// measurement 名
    pub measurement: String,

    /// 托管连接引用
    pub connection_id: Option<String>,

    /// 内联后端凭证
    pub inline: Option<InfluxConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".to_string(),
            token: String::new(),
            bucket: "telemetry".to_string(),
            measurement: "sensor_data".to_string(),
            connection_id: None,
            inline: None,
        }
    }
}

/// 关系库后端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,

    /// 密码（落盘时为密文）
    pub password: String,

    /// 显式连接串，提供时优先于上面的分字段
    pub connection_string: Option<String>,

    /// 表结构映射，缺省用约定列名
    pub schema: Option<TableSchema>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "telehub".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
            connection_string: None,
            schema: None,
        }
    }
}

impl DatabaseConfig {
    /// 组装连接串；显式连接串优先
    pub fn connection_url(&self, kind: BackendKind) -> String {
        if let Some(url) = &self.connection_string {
            return url.clone();
        }

        let scheme = match kind {
            BackendKind::Mysql => "mysql",
            _ => "postgres",
        };

        format!(
            "{}://{}:{}@{}:{}/{}",
            scheme, self.username, self.password, self.host, self.port, self.database
        )
    }
}

/// 一个数据源连接的完整描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// 连接名称
    pub name: String,

    /// 后端类型
    pub backend: BackendKind,

    pub influx: Option<InfluxConfig>,
    pub api: Option<ApiConfig>,
    pub database: Option<DatabaseConfig>,
}

impl ConnectionConfig {
    pub fn new(name: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            name: name.into(),
            backend,
            influx: None,
            api: None,
            database: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url_from_fields() {
        let config = DatabaseConfig {
            password: "pw".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.connection_url(BackendKind::Postgres),
            "postgres://postgres:pw@localhost:5432/telehub"
        );
        assert_eq!(
            config.connection_url(BackendKind::Mysql),
            "mysql://postgres:pw@localhost:5432/telehub"
        );
    }

    #[test]
    fn test_explicit_connection_string_wins() {
        let config = DatabaseConfig {
            connection_string: Some("postgres://u:p@db:5433/x".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.connection_url(BackendKind::Postgres),
            "postgres://u:p@db:5433/x"
        );
    }
}
