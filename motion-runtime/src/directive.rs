//! # Directive 模块
//!
//! 宿主交给 runtime 的指令输入。
//!
//! 属性语法：`x-motion[:value][.modifier]*="expression"`
//!
//! - `value`：选择命名注册模式（缺省为无名、立即执行）
//! - `modifier`：修饰符链，其中 `in-view` / `scroll` 是触发修饰符
//! - `expression`：表达式文本，可以为空

use serde::{Deserialize, Serialize};

/// 一条指令
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// 指令值（属性名中冒号之后的部分）
    #[serde(default)]
    pub value: Option<String>,
    /// 修饰符列表（保持原顺序）
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// 表达式文本
    #[serde(default)]
    pub expression: String,
}

impl Directive {
    /// 创建无名、无修饰符的指令
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Self::default()
        }
    }

    /// 设置指令值
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// 设置修饰符
    pub fn with_modifiers<I, S>(mut self, modifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modifiers = modifiers.into_iter().map(Into::into).collect();
        self
    }

    /// 从属性名解析指令
    ///
    /// 前缀不匹配时返回 `None`。空的修饰符片段（如 `a..b`）被忽略。
    pub fn from_attribute(name: &str, expression: &str, prefix: &str) -> Option<Self> {
        let rest = name.strip_prefix(prefix)?;

        let (head, modifiers) = match rest.split_once('.') {
            Some((head, tail)) => (head, tail),
            None => (rest, ""),
        };

        let value = if head.is_empty() {
            None
        } else {
            let value = head.strip_prefix(':')?;
            (!value.is_empty()).then(|| value.to_string())
        };

        let modifiers = modifiers
            .split('.')
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        Some(Self {
            value,
            modifiers,
            expression: expression.to_string(),
        })
    }

    /// 诊断中使用的指令标签
    pub fn label(&self, prefix: &str) -> String {
        match &self.value {
            Some(value) => format!("{prefix}:{value}"),
            None => prefix.to_string(),
        }
    }

    /// 表达式是否为空
    pub fn has_expression(&self) -> bool {
        !self.expression.trim().is_empty()
    }
}
