//! # Config 模块
//!
//! 命令行工具配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (motion.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use motion_runtime::MotionConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认配置文件名
pub const DEFAULT_CONFIG_PATH: &str = "motion.json";

/// 命令行工具配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 演示 helper 的加载延迟（tick 数，0 表示同步可用）
    #[serde(default = "default_helper_latency_ticks")]
    pub helper_latency_ticks: u32,

    /// 页面脚本结束后最多推进的 tick 数
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,

    /// runtime 配置
    #[serde(default)]
    pub runtime: MotionConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_helper_latency_ticks() -> u32 {
    1
}

fn default_max_ticks() -> u32 {
    32
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            helper_latency_ticks: default_helper_latency_ticks(),
            max_ticks: default_max_ticks(),
            runtime: MotionConfig::default(),
        }
    }
}

impl CliConfig {
    /// 加载配置文件
    ///
    /// 文件不存在时返回默认配置；存在但无法读取或解析时返回错误。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// 解析日志级别
    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Validation(format!("无效的日志级别: '{}'", self.log_level)))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level()?;

        if self.max_ticks == 0 {
            return Err(ConfigError::Validation("max_ticks 必须大于 0".to_string()));
        }

        if self.helper_latency_ticks >= self.max_ticks {
            return Err(ConfigError::Validation(format!(
                "helper_latency_ticks ({}) 必须小于 max_ticks ({})",
                self.helper_latency_ticks, self.max_ticks
            )));
        }

        if self.runtime.directive_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "runtime.directive_prefix 不能为空".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件读取失败 {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败 {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置验证失败: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.max_ticks, 32);
        assert_eq!(config.runtime.directive_prefix, "x-motion");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = CliConfig::load("definitely/not/here/motion.json").unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CliConfig =
            serde_json::from_str(r#"{"log_level": "debug", "runtime": {"in_view_once": false}}"#)
                .unwrap();
        assert_eq!(config.level().unwrap(), tracing::Level::DEBUG);
        assert_eq!(config.helper_latency_ticks, 1);
        assert!(!config.runtime.in_view_once);
        assert_eq!(config.runtime.directive_prefix, "x-motion");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = CliConfig {
            log_level: "loud".to_string(),
            ..CliConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = CliConfig {
            max_ticks: 2,
            helper_latency_ticks: 2,
            ..CliConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = CliConfig::default();
        config.runtime.directive_prefix.clear();
        assert!(config.validate().is_err());
    }
}
