//! # Sequence 模块
//!
//! 按名称列表从注册表组装时间线步骤。找不到的名称被跳过。

use serde::Serialize;

use crate::handle::ElementId;
use crate::registry::AnimationRegistry;
use crate::value::ResolvedEntry;

/// 时间线中的一步
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceStep {
    /// 动画名
    pub name: String,
    /// 目标元素
    pub element: ElementId,
    /// 动画选项
    pub options: Vec<ResolvedEntry>,
}

/// 组装时间线
///
/// 返回按调用方顺序排列的步骤，以及未找到的名称。
pub fn build_sequence<S: AsRef<str>>(
    registry: &AnimationRegistry,
    names: &[S],
) -> (Vec<SequenceStep>, Vec<String>) {
    let mut steps = Vec::with_capacity(names.len());
    let mut missing = Vec::new();

    for name in names {
        let name = name.as_ref();
        match registry.get(name) {
            Some(record) => steps.push(SequenceStep {
                name: record.name.clone(),
                element: record.element,
                options: record.options.clone(),
            }),
            None => missing.push(name.to_string()),
        }
    }

    (steps, missing)
}
