use thiserror::Error;

/// 数据源连接错误类型
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// 查询参数无效
    #[error("Invalid query parameters: {0}")]
    InvalidParams(String),

    /// 后端类型不支持
    #[error("Backend '{kind}' not implemented, supported types are: {supported}")]
    UnsupportedBackend { kind: String, supported: String },

    /// 连接配置无效
    #[error("Invalid connection config: {0}")]
    Config(String),

    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(String),

    /// API 返回业务失败
    #[error("API error: {0}")]
    Api(String),

    /// HTTP 错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 连接层结果类型
pub type Result<T> = std::result::Result<T, ConnectionError>;
