use crate::config::ConnectionConfig;
use crate::factory::ConnectionFactory;
use anyhow::{anyhow, Result};
use config::{Config, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 数据源配置加载器
///
/// 从目录中按名称加载 TOML 连接描述文件。
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// 加载单个连接配置
    pub fn load_connection(&self, name: &str) -> Result<ConnectionConfig> {
        let config_path = self.config_dir.join(format!("{}.toml", name));

        if !config_path.exists() {
            return Err(anyhow!("Connection config not found: {}", name));
        }

        let config = Config::builder()
            .add_source(File::new(
                config_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 加载目录下全部连接配置
    pub fn load_all(&self) -> Result<Vec<ConnectionConfig>> {
        let mut configs = Vec::new();

        if !self.config_dir.exists() {
            return Ok(configs);
        }

        for entry in std::fs::read_dir(&self.config_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            debug!(name = %stem, "Loading connection config");
            configs.push(self.load_connection(stem)?);
        }

        Ok(configs)
    }

    /// 加载并校验
    pub fn validate(&self, name: &str) -> Result<ConnectionConfig> {
        let config = self.load_connection(name)?;
        ConnectionFactory::validate_config(&config)?;
        Ok(config)
    }
}
