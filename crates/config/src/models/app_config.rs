use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{api::ApiConfig, database::DatabaseConfig, logging::LogConfig};
use crate::validation::ConfigValidator;

pub const ENV_PREFIX: &str = "MARKETPLACE";

const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/marketplace.toml",
    "marketplace.toml",
    "/etc/marketplace/config.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

impl AppConfig {
    /// 加载配置：默认值 < 配置文件 < `MARKETPLACE_` 环境变量
    ///
    /// 环境变量使用双下划线分隔层级，例如 `MARKETPLACE_DATABASE__URL`。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = ConfigBuilder::builder()
            .set_default("database.url", defaults.database.url.clone())?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds,
            )?
            .set_default(
                "database.idle_timeout_seconds",
                defaults.database.idle_timeout_seconds,
            )?
            .set_default("api.bind_address", defaults.api.bind_address.clone())?
            .set_default("api.cors_enabled", defaults.api.cors_enabled)?
            .set_default("api.cors_origins", defaults.api.cors_origins.clone())?
            .set_default(
                "api.request_timeout_seconds",
                defaults.api.request_timeout_seconds,
            )?
            .set_default(
                "api.max_request_size_mb",
                defaults.api.max_request_size_mb as u64,
            )?
            .set_default("logging.level", defaults.logging.level.to_string())?
            .set_default("logging.format", "pretty")?;

        match config_path {
            Some(path) => {
                if !Path::new(path).exists() {
                    return Err(anyhow::anyhow!("配置文件不存在: {}", path));
                }
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
            None => {
                if let Some(path) = DEFAULT_CONFIG_PATHS
                    .iter()
                    .find(|path| Path::new(path).exists())
                {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("api.cors_origins")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.database.validate()?;
        self.api.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogLevel, OutputFormat};
    use std::io::Write;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.api.bind_address, "0.0.0.0:8080");
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_toml_round_trip() {
        let config = AppConfig::default();
        let toml_str = config.to_toml().expect("Failed to serialize");
        let parsed = AppConfig::from_toml(&toml_str).expect("Failed to parse");
        assert_eq!(parsed.database.url, config.database.url);
        assert_eq!(parsed.api.cors_origins, config.api.cors_origins);
    }

    #[test]
    fn test_app_config_from_toml() {
        let toml_str = r#"
[database]
url = "sqlite::memory:"
max_connections = 1
min_connections = 1
connection_timeout_seconds = 30
idle_timeout_seconds = 600

[api]
bind_address = "127.0.0.1:3000"
cors_enabled = false
cors_origins = []
request_timeout_seconds = 15
max_request_size_mb = 5

[logging]
level = "debug"
format = "json"
"#;
        let config = AppConfig::from_toml(toml_str).expect("Failed to parse");
        assert!(config.database.is_in_memory());
        assert_eq!(config.api.bind_address, "127.0.0.1:3000");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, OutputFormat::Json);
    }

    #[test]
    fn test_app_config_from_toml_rejects_invalid() {
        let toml_str = r#"
[database]
url = "mysql://localhost/marketplace"
max_connections = 10
min_connections = 1
connection_timeout_seconds = 30
idle_timeout_seconds = 600

[api]
bind_address = "0.0.0.0:8080"
cors_enabled = true
cors_origins = ["*"]
request_timeout_seconds = 30
max_request_size_mb = 10
"#;
        assert!(AppConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_load_from_partial_file_uses_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Failed to create temp file");
        writeln!(
            file,
            "[api]\nbind_address = \"127.0.0.1:9090\"\n\n[database]\nmax_connections = 4"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::load(Some(&path)).expect("Failed to load config");
        assert_eq!(config.api.bind_address, "127.0.0.1:9090");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.url, "sqlite://marketplace.db");
        assert_eq!(config.api.request_timeout_seconds, 30);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(AppConfig::load(Some("/nonexistent/marketplace.toml")).is_err());
    }
}
