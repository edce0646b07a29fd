//! # Config 模块
//!
//! runtime 层的可配置项。宿主通常把它嵌在自己的配置文件里。

use serde::{Deserialize, Serialize};

use crate::trigger::ScrollAxis;

/// runtime 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// 指令属性前缀
    #[serde(default = "default_directive_prefix")]
    pub directive_prefix: String,

    /// `scrollAxis` 缺省时使用的滚动轴
    #[serde(default)]
    pub default_scroll_axis: ScrollAxis,

    /// `in-view` 是否只触发一次
    ///
    /// 关闭后每次 `EnteredView` 都会重新执行动画。
    #[serde(default = "default_in_view_once")]
    pub in_view_once: bool,
}

fn default_directive_prefix() -> String {
    "x-motion".to_string()
}

fn default_in_view_once() -> bool {
    true
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            directive_prefix: default_directive_prefix(),
            default_scroll_axis: ScrollAxis::default(),
            in_view_once: default_in_view_once(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MotionConfig::default();
        assert_eq!(config.directive_prefix, "x-motion");
        assert_eq!(config.default_scroll_axis, ScrollAxis::Y);
        assert!(config.in_view_once);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MotionConfig = serde_json::from_str(r#"{"default_scroll_axis": "x"}"#).unwrap();
        assert_eq!(config.default_scroll_axis, ScrollAxis::X);
        assert_eq!(config.directive_prefix, "x-motion");
        assert!(config.in_view_once);
    }
}
