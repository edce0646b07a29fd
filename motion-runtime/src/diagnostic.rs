//! # 诊断模块
//!
//! 收集编译与运行过程中的可恢复问题。
//!
//! ## 设计原则
//!
//! - 诊断分级：Error（动画不会执行）、Warn（部分内容被忽略）、Info（信息提示）
//! - 每条诊断同时写入 `tracing`，宿主也可以通过 runtime 取回列表
//! - 诊断从不中断指令处理

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（部分内容被忽略）
    Warn,
    /// 错误（对应动画不会执行）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 来源（指令属性名、动画名或调用方能力名）
    pub source: String,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选，如出错的原始条目）
    pub detail: Option<String>,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, source, message)
    }

    /// 创建警告诊断
    pub fn warn(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, source, message)
    }

    /// 创建信息诊断
    pub fn info(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, source, message)
    }

    fn with_level(
        level: DiagnosticLevel,
        source: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            source: source.into(),
            message: message.into(),
            detail: None,
        }
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 写入 tracing
    pub fn emit(&self) {
        let detail = self.detail.as_deref().unwrap_or("");
        match self.level {
            DiagnosticLevel::Info => {
                tracing::info!(source = %self.source, detail, "{}", self.message)
            }
            DiagnosticLevel::Warn => {
                tracing::warn!(source = %self.source, detail, "{}", self.message)
            }
            DiagnosticLevel::Error => {
                tracing::error!(source = %self.source, detail, "{}", self.message)
            }
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.source, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断并写入 tracing
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// 按级别过滤
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::warn("x-motion:hero", "条目被跳过").with_detail("x: [1,");
        let text = d.to_string();
        assert!(text.starts_with("[WARN] x-motion:hero: 条目被跳过"));
        assert!(text.contains("| x: [1,"));
    }

    #[test]
    fn test_diagnostic_result_counts() {
        let mut result = DiagnosticResult::new();
        result.push(Diagnostic::error("a", "e"));
        result.push(Diagnostic::warn("a", "w"));
        result.push(Diagnostic::info("a", "i"));

        assert_eq!(result.len(), 3);
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warn_count(), 1);
        assert!(result.has_errors());
        assert_eq!(result.filter_by_level(DiagnosticLevel::Warn).len(), 2);
    }
}
