use telehub_connection::ConnectionError;
use thiserror::Error;

/// 聚合策略错误类型
#[derive(Error, Debug)]
pub enum AggregationError {
    /// 聚合配置无效
    #[error("Invalid aggregation configuration: {0}")]
    InvalidConfiguration(String),

    /// 后端不支持聚合
    #[error("Aggregation not supported for backend '{kind}', supported types are: {supported}")]
    NotSupported { kind: String, supported: String },

    /// 连接未暴露服务端聚合能力
    #[error("Connection does not expose server-side aggregation capability")]
    CapabilityMissing,

    /// 连接层错误
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// 其他错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 聚合层结果类型
pub type Result<T> = std::result::Result<T, AggregationError>;
