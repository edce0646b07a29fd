//! # Eval 模块
//!
//! 对模板值与 helper 参数求值。
//!
//! ## 设计原则
//!
//! - 求值是**无副作用**的：只读取作用域链的当前值
//! - 参数文本在每次执行时重新求值，因此响应式参数总是读到最新值
//! - 参数中不允许嵌套 helper 调用

use crate::compiler::{parse_literal, split_top_level};
use crate::error::EvalError;
use crate::scope::EvalContext;
use crate::value::{OptionValue, ReactiveRef, Value};

/// 读取响应式引用的当前值
///
/// 根字段不存在或成员路径断开时返回 `Undefined`。
pub fn resolve_reactive<C: EvalContext + ?Sized>(reference: &ReactiveRef, ctx: &C) -> Value {
    ctx.get_var(reference.root())
        .and_then(|root| root.get_path(reference.members()).cloned())
        .unwrap_or_default()
}

/// 对参数值求值
///
/// 与 [`resolve_reactive`] 不同，根字段不存在视为错误。
pub fn evaluate<C: EvalContext + ?Sized>(value: &OptionValue, ctx: &C) -> Result<Value, EvalError> {
    match value {
        OptionValue::Literal(v) => Ok(v.clone()),

        OptionValue::Array(items) => items
            .iter()
            .map(|item| evaluate(item, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),

        OptionValue::Object(pairs) => pairs
            .iter()
            .map(|(k, v)| Ok((k.clone(), evaluate(v, ctx)?)))
            .collect::<Result<Vec<_>, EvalError>>()
            .map(Value::Object),

        OptionValue::Reactive(reference) => {
            if !ctx.has_var(reference.root()) {
                return Err(EvalError::UndefinedVariable {
                    name: reference.root().to_string(),
                });
            }
            Ok(resolve_reactive(reference, ctx))
        }

        OptionValue::Call(call) => Err(EvalError::NestedCall {
            helper: call.helper.clone(),
        }),
    }
}

/// 解析并求值参数文本
///
/// 参数按顶层逗号切分，每个参数按字面量语法解析。空文本得到空参数列表。
pub fn evaluate_args<C: EvalContext + ?Sized>(source: &str, ctx: &C) -> Result<Vec<Value>, EvalError> {
    parse_args(source, ctx)?
        .iter()
        .map(|arg| evaluate(arg, ctx))
        .collect()
}

/// 参数文本中引用的响应式来源
///
/// 语法错误的参数被忽略，错误会在执行时由 [`evaluate_args`] 报告。
pub fn argument_refs<C: EvalContext + ?Sized>(source: &str, ctx: &C) -> Vec<ReactiveRef> {
    let Ok(args) = parse_args(source, ctx) else {
        return Vec::new();
    };

    let mut refs = Vec::new();
    for arg in &args {
        arg.collect_reactive(&mut refs);
    }
    refs.into_iter().cloned().collect()
}

fn parse_args<C: EvalContext + ?Sized>(
    source: &str,
    ctx: &C,
) -> Result<Vec<OptionValue>, EvalError> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = split_top_level(source, ',');
    // 允许尾随逗号
    if segments.last().is_some_and(|s| s.is_blank()) {
        segments.pop();
    }

    segments
        .into_iter()
        .map(|segment| parse_literal(segment.text, segment.offset, ctx).map_err(EvalError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::scope::{MapScope, ScopeChain};

    fn ctx() -> ScopeChain {
        let card = Value::Object(vec![(
            "offset".to_string(),
            Value::Object(vec![("x".to_string(), Value::Number(12.0))]),
        )]);
        ScopeChain::single(
            MapScope::new()
                .with("stiffness", 300.0)
                .with("card", card)
                .with("label", "hi"),
        )
    }

    #[test]
    fn test_evaluate_args_literals_and_refs() {
        let args = evaluate_args("stiffness, 'a,b', [1, card.offset.x], {damping: 10}", &ctx()).unwrap();
        assert_eq!(
            args,
            vec![
                Value::Number(300.0),
                Value::string("a,b"),
                Value::Array(vec![Value::Number(1.0), Value::Number(12.0)]),
                Value::Object(vec![("damping".to_string(), Value::Number(10.0))]),
            ]
        );
    }

    #[test]
    fn test_evaluate_args_empty() {
        assert!(evaluate_args("", &ctx()).unwrap().is_empty());
        assert!(evaluate_args("   ", &ctx()).unwrap().is_empty());
        assert_eq!(evaluate_args("1,", &ctx()).unwrap(), vec![Value::Number(1.0)]);
    }

    #[test]
    fn test_unknown_identifier_is_string() {
        // 不在作用域中的裸标识符与选项中的处理一致，按字符串处理
        assert_eq!(
            evaluate_args("easeOut", &ctx()).unwrap(),
            vec![Value::string("easeOut")]
        );
    }

    #[test]
    fn test_nested_call_rejected() {
        assert_eq!(
            evaluate_args("1, spring()", &ctx()),
            Err(EvalError::NestedCall {
                helper: "spring".to_string()
            })
        );
    }

    #[test]
    fn test_parse_error_propagates() {
        assert!(matches!(
            evaluate_args("1, [2", &ctx()),
            Err(EvalError::Parse(ParseError::UnexpectedEnd { .. }))
        ));
    }

    #[test]
    fn test_resolve_reactive_paths() {
        let ctx = ctx();
        assert_eq!(
            resolve_reactive(&ReactiveRef::new("card.offset.x"), &ctx),
            Value::Number(12.0)
        );
        assert_eq!(
            resolve_reactive(&ReactiveRef::new("card.missing"), &ctx),
            Value::Undefined
        );
        assert_eq!(resolve_reactive(&ReactiveRef::new("gone"), &ctx), Value::Undefined);
    }

    #[test]
    fn test_evaluate_reactive_root_missing_is_error() {
        let value = OptionValue::Reactive(ReactiveRef::new("gone"));
        assert_eq!(
            evaluate(&value, &ctx()),
            Err(EvalError::UndefinedVariable {
                name: "gone".to_string()
            })
        );
    }

    #[test]
    fn test_argument_refs() {
        let refs = argument_refs("stiffness, {d: card.offset}, 3", &ctx());
        assert_eq!(
            refs,
            vec![ReactiveRef::new("stiffness"), ReactiveRef::new("card.offset")]
        );
        assert!(argument_refs("[unclosed", &ctx()).is_empty());
    }
}
