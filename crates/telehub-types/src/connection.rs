use crate::backend::BackendKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// 连接描述信息（创建后只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// 连接 ID（全局唯一）
    pub id: String,

    /// 连接名称
    pub name: String,

    /// 后端类型
    pub backend: BackendKind,

    /// 附加元数据
    pub metadata: HashMap<String, String>,
}

impl ConnectionInfo {
    pub fn new(name: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            backend,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// 连通性测试结果（创建后只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResult {
    /// 是否成功
    pub success: bool,

    /// 人类可读消息
    pub message: String,

    /// 往返延迟（毫秒）
    pub latency_ms: Option<u64>,

    /// 附加元数据
    pub metadata: HashMap<String, String>,
}

impl ConnectionResult {
    pub fn success(message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            success: true,
            message: message.into(),
            latency_ms: Some(latency_ms),
            metadata: HashMap::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            latency_ms: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
