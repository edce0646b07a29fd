//! # Motion Runtime
//!
//! 声明式动画指令的核心运行时库。
//!
//! ## 架构概述
//!
//! `motion-runtime` 是纯逻辑核心，不依赖任何 IO、DOM 或动画实现。
//! 它通过能力 trait 与宿主层（Host）通信：
//!
//! ```text
//! Host                                   Runtime
//!   │                                       │
//!   │──── apply_directive(element, ..) ───►│ 编译 → 绑定 → 解析
//!   │──── MotionInput ────────────────────►│ handle_input()
//!   │──── tick() ─────────────────────────►│ 推进等待 helper 的执行
//!   │                                       │
//!   │◄─── MotionEngine::animate / .. ──────│
//!   │◄─── ReactiveHost::subscribe / .. ────│
//! ```
//!
//! ## 数据流
//!
//! ```text
//! 属性文本 → {修饰符链 | 表达式} → 选项模板（含占位符）
//!          → 解析（响应式值、helper 调用）→ 注册表 / 触发条件 → 引擎
//! ```
//!
//! ## 核心类型
//!
//! - [`Directive`]：宿主交给 runtime 的指令
//! - [`MotionRuntime`]：运行时主体
//! - [`MotionInput`]：宿主向 runtime 传递的事件
//! - [`MotionEngine`] / [`ReactiveHost`] / [`HelperSource`]：宿主能力
//! - [`ScopeChain`]：响应式数据上下文
//!
//! ## 使用示例
//!
//! ```ignore
//! use motion_runtime::{Directive, MotionRuntime, ScopeChain, MapScope, StaticHelpers};
//!
//! let data = MapScope::new().with("offset", 40.0);
//! let mut runtime = MotionRuntime::new(engine, host, StaticHelpers::new());
//!
//! let directive = Directive::new("{x: offset, opacity: [0, 1]}");
//! runtime.apply_directive(element, &directive, ScopeChain::single(data.clone()));
//!
//! // 宿主数据变化后回传
//! data.set("offset", 80.0);
//! runtime.handle_input(MotionInput::SourceChanged(id));
//! runtime.tick();
//! ```
//!
//! ## 模块结构
//!
//! - [`compiler`]：修饰符链与表达式编译
//! - [`resolver`]：helper 调用与选项树解析
//! - [`registry`]：命名动画表
//! - [`sequence`]：时间线组装
//! - [`trigger`]：视口/滚动触发
//! - [`runtime`]：运行时主体
//! - [`scope`]：数据上下文
//! - [`error`] / [`diagnostic`]：错误与诊断

pub mod compiler;
pub mod config;
pub mod diagnostic;
pub mod directive;
pub mod error;
pub mod eval;
pub mod handle;
pub mod host;
pub mod input;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod scope;
pub mod sequence;
pub mod trigger;
pub mod value;

// 重导出核心类型
pub use compiler::{
    CompiledAnimation, CompiledDirective, CompiledExpression, ExpressionForm, compile_directive,
    compile_expression, normalize, parse_modifiers,
};
pub use config::MotionConfig;
pub use diagnostic::{Diagnostic, DiagnosticLevel, DiagnosticResult};
pub use directive::Directive;
pub use error::{EvalError, MotionError, MotionResult, ParseError, ResolveError};
pub use handle::{AnimationHandle, BindingId, ElementId, SubscriptionId};
pub use host::{MotionEngine, ReactiveHost, ScrollHandler};
pub use input::MotionInput;
pub use registry::{AnimationRegistry, Registration, RegistryRecord};
pub use resolver::{CallResolver, Helper, HelperFuture, HelperLoad, HelperSource, StaticHelpers};
pub use runtime::{MotionRuntime, RunReason};
pub use scope::{DataScope, EvalContext, MapScope, ScopeChain};
pub use sequence::{SequenceStep, build_sequence};
pub use trigger::{ScrollAxis, ScrollLink, Trigger, TriggerSet};
pub use value::{
    Entry, OptionEntry, OptionValue, PendingCall, ReactiveRef, ResolvedEntry, Value,
    entries_to_json,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _directive = Directive::new("{x: 1}").with_value("hero");
        let _input = MotionInput::Teardown(ElementId(1));
        let _scope = ScopeChain::single(MapScope::new().with("x", 1.0));
        let _config = MotionConfig::default();
        let _helpers = StaticHelpers::new().with("noop", |_| Value::Null);
        let _entry: ResolvedEntry = Entry::new("x", Value::Number(1.0));
    }
}
