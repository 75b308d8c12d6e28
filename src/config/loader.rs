//! Configuration Loader
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `BOOKLIST_SERVER__PORT=8080`
/// - `BOOKLIST_DATABASE__PATH=/data/booklist.db`
/// - `BOOKLIST_LISTING__DEFAULT_PAGE_SIZE=20`
/// - `BOOKLIST_SEED__ENABLED=false`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置，`None` 时搜索默认文件名
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5080)?
        .set_default("database.path", "data/booklist.db")?
        .set_default("database.max_connections", 5)?
        .set_default("listing.default_page_size", 10)?
        .set_default("listing.max_page_size", 100)?
        .set_default("seed.enabled", true)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: BOOKLIST_SERVER__PORT=8080，变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("BOOKLIST")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let app_config: AppConfig = builder.build()?.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "Database max_connections cannot be 0".to_string(),
        ));
    }

    let listing = &config.listing;
    if listing.default_page_size == 0 || listing.default_page_size > listing.max_page_size {
        return Err(ConfigError::ValidationError(format!(
            "Default page size must be within 1..={}, got {}",
            listing.max_page_size, listing.default_page_size
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!(
        "Listing Page Size: {} (max {})",
        config.listing.default_page_size,
        config.listing.max_page_size
    );
    tracing::info!("Seed Enabled: {}", config.seed.enabled);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
