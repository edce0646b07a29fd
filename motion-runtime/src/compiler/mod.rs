//! # Compiler 模块
//!
//! 把指令文本编译为动画选项树（手写递归下降，无 regex 依赖）。
//!
//! ## 架构
//!
//! ```text
//! 修饰符链 ──[modifiers]──────────────────────────┐
//!                                                  ├→ Vec<CompiledAnimation>
//! 表达式 ──[split: 顶层切分]→ 条目 ──[literal]────┘
//! ```
//!
//! ## 设计原则
//!
//! - 切分与解析分离：切分器只关心引号与括号深度，语法错误由字面量解析器报告
//! - 容错编译：单个条目失败只跳过该条目并记录诊断，其余条目照常编译
//! - 占位符保留：响应式引用与 helper 调用原样留在模板中，求值延后到执行时
//!
//! ## 模块结构
//!
//! - `modifiers`: 修饰符链与单位规范化
//! - `split`: 顶层切分扫描器
//! - `literal`: 字面量解析器

mod literal;
mod modifiers;
mod split;


pub use literal::{is_identifier, parse_key, parse_literal};
pub use modifiers::{normalize, parse_modifiers, to_field_name};
pub use split::{Segment, find_top_level, matching_close, split_top_level};

use crate::diagnostic::{Diagnostic, DiagnosticResult};
use crate::directive::Directive;
use crate::error::ParseError;
use crate::handle::ElementId;
use crate::scope::EvalContext;
use crate::trigger::{TriggerSet, extract_triggers};
use crate::value::{Entry, OptionEntry, PendingCall, ReactiveRef, upsert_entry, upsert_pair};

use split::{is_wrapped_object, unwrap_braces};

/// 表达式形式
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionForm {
    /// 单个选项对象 `{field: value, ...}`
    Bare(Vec<OptionEntry>),
    /// 名称到选项对象的映射 `name: {...}, name2: {...}`
    Named(Vec<(String, Vec<OptionEntry>)>),
}

/// 表达式编译结果
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    /// 编译出的表达式
    pub form: ExpressionForm,
    /// 编译过程中的诊断
    pub diagnostics: DiagnosticResult,
}

/// 编译后的动画
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledAnimation {
    /// 动画名；`None` 表示无名、立即执行
    pub name: Option<String>,
    /// 所属元素
    pub element: ElementId,
    /// 选项模板（保持插入顺序）
    pub options: Vec<OptionEntry>,
    /// 触发条件
    pub triggers: TriggerSet,
}

impl CompiledAnimation {
    /// 模板中引用的响应式来源（去重，保持首次出现顺序）
    pub fn reactive_refs(&self) -> Vec<ReactiveRef> {
        let mut refs = Vec::new();
        for entry in &self.options {
            entry.value.collect_reactive(&mut refs);
        }
        let mut unique: Vec<ReactiveRef> = Vec::with_capacity(refs.len());
        for r in refs {
            if !unique.contains(r) {
                unique.push(r.clone());
            }
        }
        unique
    }

    /// 模板中的 helper 调用
    pub fn calls(&self) -> Vec<&PendingCall> {
        let mut calls = Vec::new();
        for entry in &self.options {
            entry.value.collect_calls(&mut calls);
        }
        calls
    }

    /// 诊断中使用的标签
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("'{name}'@{}", self.element),
            None => format!("<无名>@{}", self.element),
        }
    }
}

/// 指令编译结果
#[derive(Debug, Clone)]
pub struct CompiledDirective {
    /// 编译出的动画（按出现顺序）
    pub animations: Vec<CompiledAnimation>,
    /// 编译过程中的诊断
    pub diagnostics: DiagnosticResult,
}

/// 编译表达式文本
///
/// `source` 用于诊断中标记来源（通常是指令标签）。
///
/// - 空文本 → 空的 `Bare`
/// - 整体被一个对象字面量包裹 → `Bare`
/// - 其他 → `Named`，每个值必须是对象字面量
pub fn compile_expression<C: EvalContext + ?Sized>(
    text: &str,
    source: &str,
    ctx: &C,
) -> CompiledExpression {
    let mut diagnostics = DiagnosticResult::new();

    let form = if text.trim().is_empty() {
        ExpressionForm::Bare(Vec::new())
    } else if is_wrapped_object(text) {
        let body = unwrap_braces(text);
        ExpressionForm::Bare(compile_body(body, source, ctx, &mut diagnostics))
    } else {
        ExpressionForm::Named(compile_named(text, source, ctx, &mut diagnostics))
    };

    CompiledExpression { form, diagnostics }
}

/// 编译 `name: {...}, ...` 形式
fn compile_named<C: EvalContext + ?Sized>(
    text: &str,
    source: &str,
    ctx: &C,
    diagnostics: &mut DiagnosticResult,
) -> Vec<(String, Vec<OptionEntry>)> {
    let mut animations = Vec::new();

    for segment in split_top_level(text, ',') {
        if segment.is_blank() {
            continue;
        }
        match split_entry(segment) {
            Ok((name, value)) => {
                if !is_wrapped_object(value.text) {
                    skip_entry(diagnostics, source, segment, ParseError::NotAnObject { name });
                    continue;
                }
                let inner = unwrap_braces(value.text);
                let body = Segment {
                    text: inner.text,
                    offset: value.offset + inner.offset,
                };
                let entries = compile_body(body, source, ctx, diagnostics);
                upsert_pair(&mut animations, name, entries);
            }
            Err(err) => skip_entry(diagnostics, source, segment, err),
        }
    }

    animations
}

/// 编译对象体（花括号内部）为条目列表
fn compile_body<C: EvalContext + ?Sized>(
    body: Segment<'_>,
    source: &str,
    ctx: &C,
    diagnostics: &mut DiagnosticResult,
) -> Vec<OptionEntry> {
    let mut entries = Vec::new();

    for segment in split_top_level(body.text, ',') {
        if segment.is_blank() {
            continue;
        }
        let segment = Segment {
            text: segment.text,
            offset: body.offset + segment.offset,
        };
        let parsed = split_entry(segment).and_then(|(field, value)| {
            parse_literal(value.text, value.offset, ctx).map(|v| Entry::new(field, v))
        });
        match parsed {
            Ok(entry) => upsert_entry(&mut entries, entry),
            Err(err) => skip_entry(diagnostics, source, segment, err),
        }
    }

    entries
}

/// 把 `key: value` 条目拆成键与值片段
fn split_entry(segment: Segment<'_>) -> Result<(String, Segment<'_>), ParseError> {
    let colon = find_top_level(segment.text, ':').ok_or_else(|| ParseError::MissingColon {
        entry: segment.text.trim().to_string(),
    })?;
    let key = parse_key(&segment.text[..colon])?;
    let value = Segment {
        text: &segment.text[colon + 1..],
        offset: segment.offset + colon + 1,
    };
    Ok((key, value))
}

fn skip_entry(
    diagnostics: &mut DiagnosticResult,
    source: &str,
    segment: Segment<'_>,
    err: ParseError,
) {
    diagnostics.push(
        Diagnostic::warn(source, format!("跳过无法解析的条目: {err}"))
            .with_detail(segment.text.trim()),
    );
}

/// 编译一条指令
///
/// 组合规则：
/// - 触发修饰符先从修饰符链中取出，剩余部分两两配对
/// - 修饰符条目在前，表达式中的同名字段原位覆盖
/// - 命名映射形式下每个动画都得到修饰符条目与触发条件，指令值被忽略
pub fn compile_directive<C: EvalContext + ?Sized>(
    element: ElementId,
    directive: &Directive,
    label: &str,
    ctx: &C,
) -> CompiledDirective {
    let (triggers, rest) = extract_triggers(&directive.modifiers);
    let modifier_entries = parse_modifiers(&rest);

    let compiled = compile_expression(&directive.expression, label, ctx);
    let mut diagnostics = compiled.diagnostics;

    let merge = |overrides: Vec<OptionEntry>| {
        let mut options = modifier_entries.clone();
        for entry in overrides {
            upsert_entry(&mut options, entry);
        }
        options
    };

    let animations = match compiled.form {
        ExpressionForm::Bare(entries) => vec![CompiledAnimation {
            name: directive.value.clone(),
            element,
            options: merge(entries),
            triggers,
        }],
        ExpressionForm::Named(named) => {
            if let Some(value) = &directive.value {
                diagnostics.push(Diagnostic::info(
                    label,
                    format!("表达式已给出动画名，忽略指令值 '{value}'"),
                ));
            }
            named
                .into_iter()
                .map(|(name, entries)| CompiledAnimation {
                    name: Some(name),
                    element,
                    options: merge(entries),
                    triggers,
                })
                .collect()
        }
    };

    tracing::debug!(
        directive = label,
        %element,
        animations = animations.len(),
        "指令编译完成"
    );

    CompiledDirective {
        animations,
        diagnostics,
    }
}
