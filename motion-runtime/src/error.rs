//! # Error 模块
//!
//! 定义 motion-runtime 中使用的错误类型。
//!
//! 所有错误都在本地恢复：解析失败只跳过对应条目，查找失败只产生诊断，
//! 不会中断整个指令。

use thiserror::Error;

/// 表达式解析错误
///
/// `offset` 是相对于整条表达式文本的字节偏移。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// 意外字符
    #[error("偏移 {offset}：意外字符 '{found}'")]
    UnexpectedChar { offset: usize, found: char },

    /// 表达式意外结束
    #[error("偏移 {offset}：表达式意外结束，期望 {expected}")]
    UnexpectedEnd {
        offset: usize,
        expected: &'static str,
    },

    /// 字符串未闭合
    #[error("偏移 {offset}：字符串字面量未闭合，缺少 '{quote}'")]
    UnterminatedString { offset: usize, quote: char },

    /// 括号不匹配
    #[error("偏移 {offset}：括号不匹配，期望 '{expected}'，实际 '{found}'")]
    UnbalancedDelimiter {
        offset: usize,
        expected: char,
        found: char,
    },

    /// 条目缺少 `key: value` 中的冒号
    #[error("条目缺少冒号: '{entry}'")]
    MissingColon { entry: String },

    /// 无效的键
    #[error("无效的键: '{key}'")]
    InvalidKey { key: String },

    /// 无效的数字
    #[error("偏移 {offset}：无法解析数字 '{text}'")]
    InvalidNumber { offset: usize, text: String },

    /// 空条目
    #[error("空条目")]
    EmptyEntry,

    /// 命名动画的值不是对象字面量
    #[error("动画 '{name}' 的值必须是对象字面量")]
    NotAnObject { name: String },
}

/// 参数求值错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// 变量未定义
    #[error("变量 '{name}' 未定义")]
    UndefinedVariable { name: String },

    /// 参数中不允许嵌套 helper 调用
    #[error("参数中不允许嵌套调用 '{helper}(...)'")]
    NestedCall { helper: String },

    /// 参数文本无法解析
    #[error("参数解析失败: {0}")]
    Parse(#[from] ParseError),
}

/// helper 调用解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// helper 名称未知
    #[error("未知的 helper '{name}'")]
    UnknownHelper { name: String },

    /// helper 加载结束但不可用
    #[error("helper '{name}' 加载失败")]
    HelperUnavailable { name: String },

    /// 参数求值失败
    #[error("helper '{name}' 的参数求值失败: {source}")]
    Arguments {
        name: String,
        #[source]
        source: EvalError,
    },

    /// 选项树中仍有未解析的调用
    #[error("字段 '{field}' 中仍有未解析的 helper 调用")]
    Unresolved { field: String },
}

/// motion-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(#[from] ParseError),

    /// 求值错误
    #[error("求值错误: {0}")]
    Eval(#[from] EvalError),

    /// 调用解析错误
    #[error("调用解析错误: {0}")]
    Resolve(#[from] ResolveError),
}

/// Result 类型别名
pub type MotionResult<T> = Result<T, MotionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_context() {
        let err = ParseError::UnterminatedString {
            offset: 4,
            quote: '"',
        };
        assert!(err.to_string().contains('4'));

        let err = ResolveError::Arguments {
            name: "spring".to_string(),
            source: EvalError::UndefinedVariable {
                name: "stiff".to_string(),
            },
        };
        assert!(err.to_string().contains("spring"));
        assert!(err.to_string().contains("stiff"));
    }

    #[test]
    fn test_motion_error_from() {
        let err: MotionError = ParseError::EmptyEntry.into();
        assert!(matches!(err, MotionError::Parse(ParseError::EmptyEntry)));

        let err: MotionError = ResolveError::UnknownHelper {
            name: "bounce".to_string(),
        }
        .into();
        assert!(err.to_string().contains("bounce"));
    }
}
