use crate::api::ApiConnection;
use crate::config::{ApiConfig, ConnectionConfig, DatabaseConfig, InfluxConfig};
use crate::crypto::CredentialEncryptor;
use crate::error::{ConnectionError, Result};
use crate::influx::InfluxConnection;
use crate::sql::SqlConnection;
use crate::traits::DataSourceConnection;
use std::sync::Arc;
use telehub_types::BackendKind;
use tracing::{info, warn};

/// 连接工厂
///
/// 将抽象的后端 + 配置描述解析为可用连接：
/// 校验配置一致性、通过注入的加密协作方解密落盘密文、
/// 组装查询构建器（时序后端再加响应解析器）。
/// 工厂不持有创建出的连接，生命周期归调用方。
pub struct ConnectionFactory {
    encryptor: Arc<dyn CredentialEncryptor>,
}

impl ConnectionFactory {
    pub fn new(encryptor: Arc<dyn CredentialEncryptor>) -> Self {
        Self { encryptor }
    }

    /// 工厂支持的后端类型
    pub fn supported_kinds() -> &'static [BackendKind] {
        &BackendKind::ALL
    }

    pub fn is_supported(kind: BackendKind) -> bool {
        Self::supported_kinds().contains(&kind)
    }

    fn supported_list() -> String {
        Self::supported_kinds()
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 生成某后端类型的默认配置
    pub fn create_default_config(kind: BackendKind) -> ConnectionConfig {
        let mut config = ConnectionConfig::new(format!("new-{}", kind), kind);
        match kind {
            BackendKind::InfluxDb => config.influx = Some(InfluxConfig::default()),
            BackendKind::InfluxApi => config.api = Some(ApiConfig::default()),
            BackendKind::Postgres => config.database = Some(DatabaseConfig::default()),
            BackendKind::Mysql => {
                config.database = Some(DatabaseConfig {
                    port: 3306,
                    username: "root".to_string(),
                    ..Default::default()
                })
            }
        }
        config
    }

    /// 校验配置对其声明的后端类型是否内部一致
    pub fn validate_config(config: &ConnectionConfig) -> Result<()> {
        match config.backend {
            BackendKind::InfluxDb => {
                let influx = config
                    .influx
                    .as_ref()
                    .ok_or_else(|| ConnectionError::Config("influx section is required".into()))?;
                if influx.url.trim().is_empty() {
                    return Err(ConnectionError::Config("influx url must not be empty".into()));
                }
                if influx.org.trim().is_empty() {
                    return Err(ConnectionError::Config("influx org must not be empty".into()));
                }
                if influx.bucket.trim().is_empty() {
                    return Err(ConnectionError::Config(
                        "influx bucket must not be empty".into(),
                    ));
                }
            }
            BackendKind::InfluxApi => {
                let api = config
                    .api
                    .as_ref()
                    .ok_or_else(|| ConnectionError::Config("api section is required".into()))?;
                if api.base_url.trim().is_empty() {
                    return Err(ConnectionError::Config("api base_url must not be empty".into()));
                }
                // API 后端必须携带非空凭证令牌
                if api.token.trim().is_empty() {
                    return Err(ConnectionError::Config(
                        "api credential token must not be empty".into(),
                    ));
                }
                if api.bucket.trim().is_empty() {
                    return Err(ConnectionError::Config("api bucket must not be empty".into()));
                }
            }
            BackendKind::Postgres | BackendKind::Mysql => {
                let db = config.database.as_ref().ok_or_else(|| {
                    ConnectionError::Config("database section is required".into())
                })?;
                if db.connection_string.is_none() {
                    if db.host.trim().is_empty()
                        || db.database.trim().is_empty()
                        || db.username.trim().is_empty()
                    {
                        return Err(ConnectionError::Config(
                            "database host, name and username are required \
                             unless an explicit connection string is given"
                                .into(),
                        ));
                    }
                    if db.port == 0 {
                        return Err(ConnectionError::Config("database port must not be 0".into()));
                    }
                }
            }
        }
        Ok(())
    }

    /// 创建连接
    pub async fn create_connection(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Arc<dyn DataSourceConnection>> {
        if !Self::is_supported(config.backend) {
            return Err(ConnectionError::UnsupportedBackend {
                kind: config.backend.to_string(),
                supported: Self::supported_list(),
            });
        }

        Self::validate_config(config)?;

        info!(
            name = %config.name,
            backend = %config.backend,
            "Creating data source connection"
        );

        match config.backend {
            BackendKind::InfluxDb => {
                let mut influx = config.influx.clone().unwrap();
                influx.token = self.decrypt_secret(&influx.token);
                Ok(Arc::new(InfluxConnection::new(&config.name, influx)))
            }
            BackendKind::InfluxApi => {
                let mut api = config.api.clone().unwrap();
                api.token = self.decrypt_secret(&api.token);
                if let Some(inline) = api.inline.as_mut() {
                    inline.token = self.decrypt_secret(&inline.token);
                }
                Ok(Arc::new(ApiConnection::new(&config.name, api)))
            }
            BackendKind::Postgres | BackendKind::Mysql => {
                let mut db = config.database.clone().unwrap();
                db.password = self.decrypt_secret(&db.password);
                let connection =
                    SqlConnection::connect(&config.name, config.backend, &db).await?;
                Ok(Arc::new(connection))
            }
        }
    }

    /// 解密落盘密文；未加密的值原样返回并告警
    fn decrypt_secret(&self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }

        if self.encryptor.is_encrypted(value) {
            self.encryptor.decrypt(value)
        } else {
            warn!("Credential value is not encrypted, using as-is");
            value.to_string()
        }
    }
}
