//! # Runner 模块
//!
//! 在命令行宿主上回放页面脚本，以及把单条指令的编译结果渲染成 JSON。

use std::collections::HashMap;

use anyhow::anyhow;
use motion_runtime::{
    DataScope, Directive, ElementId, MapScope, MotionInput, MotionRuntime, OptionEntry,
    OptionValue, ScopeChain, SubscriptionId, Value, compile_directive,
};
use serde::Serialize;

use crate::config::CliConfig;
use crate::host::{DemoHelpers, EngineEvent, PageHost, TraceEngine};
use crate::page::{Page, Step, json_to_entries};

type PageRuntime = MotionRuntime<TraceEngine, PageHost>;

/// 回放结果
#[derive(Debug, Serialize)]
pub struct Report {
    /// 引擎事件流
    pub events: Vec<EngineEvent>,
    /// 诊断（已格式化）
    pub diagnostics: Vec<String>,
    /// Error 级别诊断数量
    pub error_count: usize,
    /// 结束时注册表中的名称
    pub registry: Vec<String>,
    /// 结束时仍在等待 helper 的执行数量
    pub pending: usize,
}

/// 回放页面
pub fn run_page(page: &Page, config: &CliConfig) -> Report {
    let mut runner = PageRunner::new(page, config);
    runner.mount(page);
    for step in &page.script {
        runner.step(step);
    }
    runner.drain(config.max_ticks);
    runner.finish()
}

struct PageRunner {
    runtime: PageRuntime,
    page_scope: MapScope,
    element_scopes: HashMap<u64, MapScope>,
}

impl PageRunner {
    fn new(page: &Page, config: &CliConfig) -> Self {
        let page_scope = scope_from_json(&page.data);
        let element_scopes = page
            .elements
            .iter()
            .map(|e| (e.id, scope_from_json(&e.data)))
            .collect();

        let runtime = MotionRuntime::with_config(
            TraceEngine::new(),
            PageHost::new(),
            DemoHelpers::new(config.helper_latency_ticks),
            config.runtime.clone(),
        );

        Self {
            runtime,
            page_scope,
            element_scopes,
        }
    }

    /// 按声明顺序应用所有元素上的指令
    fn mount(&mut self, page: &Page) {
        let prefix = self.runtime.config().directive_prefix.clone();

        for element in &page.elements {
            let mut scope = ScopeChain::single(self.page_scope.clone());
            if let Some(inner) = self.element_scopes.get(&element.id) {
                scope = scope.with_inner(inner.clone());
            }

            for attribute in &element.attributes {
                let Some(directive) =
                    Directive::from_attribute(&attribute.name, &attribute.value, &prefix)
                else {
                    tracing::debug!(attribute = %attribute.name, "跳过非指令属性");
                    continue;
                };
                let bindings =
                    self.runtime
                        .apply_directive(element.element_id(), &directive, scope.clone());
                tracing::info!(
                    element = element.id,
                    attribute = %attribute.name,
                    bindings = bindings.len(),
                    "指令已应用"
                );
            }
        }
    }

    fn step(&mut self, step: &Step) {
        tracing::debug!(?step, "执行脚本步骤");
        match step {
            Step::Set {
                element,
                field,
                value,
            } => {
                let scope = element
                    .and_then(|id| self.element_scopes.get(&id))
                    .unwrap_or(&self.page_scope);
                scope.set(field.clone(), Value::from_json(value));

                let affected: Vec<SubscriptionId> = self
                    .runtime
                    .host()
                    .subscribers(field)
                    .into_iter()
                    .filter(|sub| self.sees_write(*sub, *element, field))
                    .collect();
                for sub in affected {
                    self.runtime.handle_input(MotionInput::SourceChanged(sub));
                }
            }
            Step::EnterView { element } => {
                self.runtime
                    .handle_input(MotionInput::EnteredView(ElementId(*element)));
            }
            Step::Tick { count } => {
                for _ in 0..*count {
                    self.runtime.tick();
                }
            }
            Step::Lookup { name } => {
                self.runtime.lookup(name);
            }
            Step::Sequence { names, options } => {
                self.runtime.sequence(names.as_slice(), &json_to_entries(options));
            }
            Step::Teardown { element } => {
                self.runtime
                    .handle_input(MotionInput::Teardown(ElementId(*element)));
            }
        }
    }

    /// 订阅者读到的 `field` 是否来自被写入的那一层
    ///
    /// 写元素作用域只影响该元素；写页面作用域时，自身数据覆盖了同名字段的元素不受影响。
    fn sees_write(&self, sub: SubscriptionId, written: Option<u64>, field: &str) -> bool {
        let Some(ElementId(owner)) = self.runtime.subscription_element(sub) else {
            return false;
        };
        match written {
            Some(id) => owner == id,
            None => !self
                .element_scopes
                .get(&owner)
                .is_some_and(|scope| scope.contains(field)),
        }
    }

    /// 推进直到没有等待中的执行，最多 `max_ticks` 次
    fn drain(&mut self, max_ticks: u32) {
        let mut ticks = 0;
        while self.runtime.pending_count() > 0 && ticks < max_ticks {
            self.runtime.tick();
            ticks += 1;
        }
        if self.runtime.pending_count() > 0 {
            tracing::warn!(
                pending = self.runtime.pending_count(),
                max_ticks,
                "仍有执行在等待 helper"
            );
        }
    }

    fn finish(self) -> Report {
        let diagnostics = self.runtime.diagnostics();
        Report {
            events: self.runtime.engine().events().to_vec(),
            diagnostics: diagnostics.diagnostics.iter().map(|d| d.to_string()).collect(),
            error_count: diagnostics.error_count(),
            registry: self
                .runtime
                .registry()
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            pending: self.runtime.pending_count(),
        }
    }
}

fn scope_from_json(data: &serde_json::Map<String, serde_json::Value>) -> MapScope {
    data.iter().fold(MapScope::new(), |scope, (field, value)| {
        scope.with(field.clone(), Value::from_json(value))
    })
}

// =============================================================================
// 编译输出
// =============================================================================

/// 编译单条指令属性并渲染为 JSON
///
/// 占位符渲染为 `$ref(source)` / `$call(helper: args)`。
pub fn compile_report(
    attribute: &str,
    expression: &str,
    config: &CliConfig,
) -> anyhow::Result<serde_json::Value> {
    let prefix = &config.runtime.directive_prefix;
    let directive = Directive::from_attribute(attribute, expression, prefix)
        .ok_or_else(|| anyhow!("属性 '{attribute}' 不是以 '{prefix}' 开头的指令"))?;

    let label = directive.label(prefix);
    let compiled = compile_directive(ElementId(0), &directive, &label, &ScopeChain::new());

    let animations: Vec<serde_json::Value> = compiled
        .animations
        .iter()
        .map(|animation| {
            serde_json::json!({
                "name": animation.name,
                "triggers": animation
                    .triggers
                    .iter()
                    .map(|t| format!("{t:?}"))
                    .collect::<Vec<_>>(),
                "options": entries_to_template_json(&animation.options),
            })
        })
        .collect();

    let diagnostics: Vec<String> = compiled
        .diagnostics
        .diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect();

    Ok(serde_json::json!({
        "animations": animations,
        "diagnostics": diagnostics,
    }))
}

fn entries_to_template_json(entries: &[OptionEntry]) -> serde_json::Value {
    serde_json::Value::Array(
        entries
            .iter()
            .map(|e| {
                let mut map = serde_json::Map::new();
                map.insert(e.field.clone(), template_to_json(&e.value));
                serde_json::Value::Object(map)
            })
            .collect(),
    )
}

fn template_to_json(value: &OptionValue) -> serde_json::Value {
    match value {
        OptionValue::Literal(v) => v.to_json(),
        OptionValue::Array(items) => {
            serde_json::Value::Array(items.iter().map(template_to_json).collect())
        }
        OptionValue::Object(pairs) => serde_json::Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.clone(), template_to_json(v)))
                .collect(),
        ),
        OptionValue::Reactive(r) => serde_json::Value::String(format!("$ref({})", r.source)),
        OptionValue::Call(c) => {
            serde_json::Value::String(format!("$call({}: {})", c.helper, c.args))
        }
    }
}
