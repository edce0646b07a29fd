//! # Engine 模块
//!
//! 指令运行时：编译、绑定、解析与分发。
//!
//! ## 执行模型
//!
//! ```text
//! apply_directive(element, directive, scope) -> Vec<BindingId>
//! handle_input(MotionInput)
//! tick() -> usize
//! ```
//!
//! 1. `apply_directive` 编译指令，为每个动画建立绑定并订阅响应式来源
//! 2. 每次执行都重新解析整棵选项树；helper 全部可用时立即分发，否则进入等待队列
//! 3. 宿主在每轮循环调用 `tick`，已完成的等待项被分发给引擎
//! 4. 分发时按触发条件与注册状态决定是否调用引擎

use std::collections::{BTreeMap, HashMap};
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;

use crate::compiler::{CompiledAnimation, compile_directive};
use crate::config::MotionConfig;
use crate::diagnostic::{Diagnostic, DiagnosticResult};
use crate::directive::Directive;
use crate::eval::argument_refs;
use crate::handle::{AnimationHandle, BindingId, ElementId, SubscriptionId};
use crate::host::{MotionEngine, ReactiveHost, ScrollHandler};
use crate::input::MotionInput;
use crate::registry::{AnimationRegistry, Registration};
use crate::resolver::{CallResolver, HelperSource, OptionsResolution, resolve_options};
use crate::runtime::binding::{Binding, PendingRun, RunReason, ViewState};
use crate::scope::ScopeChain;
use crate::sequence::build_sequence;
use crate::trigger::{ScrollLink, Trigger, split_scroll_options};
use crate::value::{ReactiveRef, ResolvedEntry};

/// 指令运行时
///
/// # 使用示例
///
/// ```ignore
/// let mut runtime = MotionRuntime::new(engine, host, helpers);
/// runtime.apply_directive(element, &directive, scope);
///
/// loop {
///     // 宿主回传事件...
///     runtime.handle_input(input);
///     runtime.tick();
/// }
/// ```
pub struct MotionRuntime<E: MotionEngine, R: ReactiveHost> {
    engine: E,
    host: R,
    config: MotionConfig,
    registry: AnimationRegistry,
    calls: CallResolver,
    bindings: BTreeMap<BindingId, Binding>,
    subscriptions: HashMap<SubscriptionId, BindingId>,
    pending: Vec<PendingRun>,
    diagnostics: DiagnosticResult,
    next_binding: u64,
    next_subscription: u64,
}

impl<E: MotionEngine, R: ReactiveHost> MotionRuntime<E, R> {
    /// 使用默认配置创建运行时
    pub fn new(engine: E, host: R, helpers: impl HelperSource + 'static) -> Self {
        Self::with_config(engine, host, helpers, MotionConfig::default())
    }

    /// 使用指定配置创建运行时
    pub fn with_config(
        engine: E,
        host: R,
        helpers: impl HelperSource + 'static,
        config: MotionConfig,
    ) -> Self {
        Self {
            engine,
            host,
            config,
            registry: AnimationRegistry::new(),
            calls: CallResolver::new(helpers),
            bindings: BTreeMap::new(),
            subscriptions: HashMap::new(),
            pending: Vec::new(),
            diagnostics: DiagnosticResult::new(),
            next_binding: 0,
            next_subscription: 0,
        }
    }

    // =========================================================================
    // 指令应用
    // =========================================================================

    /// 应用一条指令
    ///
    /// 同一元素上同一指令的旧绑定先被释放（注册表记录保留，
    /// 因此同名动画重新注册时按热更新处理并立即执行）。
    /// 带 `in-view` 的动画例外：视口触发优先，重新应用后只刷新注册表，
    /// 等下一次进入视口才执行。
    pub fn apply_directive(
        &mut self,
        element: ElementId,
        directive: &Directive,
        scope: ScopeChain,
    ) -> Vec<BindingId> {
        let label = directive.label(&self.config.directive_prefix);
        self.release_bindings(|b| b.element() == element && b.label == label);

        let compiled = compile_directive(element, directive, &label, &scope);
        self.diagnostics.merge(compiled.diagnostics);

        let mut ids = Vec::with_capacity(compiled.animations.len());
        for animation in compiled.animations {
            let id = self.bind(label.clone(), animation, scope.clone());
            ids.push(id);
            self.schedule_run(id, RunReason::Initial);
        }
        ids
    }

    /// 建立绑定：订阅响应式来源并安装视口观察
    fn bind(
        &mut self,
        label: String,
        animation: CompiledAnimation,
        scope: ScopeChain,
    ) -> BindingId {
        self.next_binding += 1;
        let id = BindingId(self.next_binding);

        let mut sources: Vec<ReactiveRef> = animation.reactive_refs();
        for call in animation.calls() {
            for reference in argument_refs(&call.args, &scope) {
                if !sources.contains(&reference) {
                    sources.push(reference);
                }
            }
        }

        // 每个根字段只订阅一次：`card.x` 与 `card.y` 共用 `card`
        let mut roots: Vec<&str> = Vec::with_capacity(sources.len());
        for source in &sources {
            if !roots.contains(&source.root()) {
                roots.push(source.root());
            }
        }

        let mut subscriptions = Vec::with_capacity(roots.len());
        for root in roots {
            self.next_subscription += 1;
            let sub = SubscriptionId(self.next_subscription);
            self.host.subscribe(root, sub);
            self.subscriptions.insert(sub, id);
            subscriptions.push(sub);
        }

        let view = if animation.triggers.contains(Trigger::Visible) {
            self.engine.observe_in_view(animation.element);
            ViewState::Waiting
        } else {
            ViewState::NotObserved
        };

        tracing::debug!(
            binding = %id,
            animation = %animation.label(),
            subscriptions = subscriptions.len(),
            "绑定动画"
        );

        self.bindings.insert(
            id,
            Binding {
                label,
                animation,
                scope,
                subscriptions,
                view,
                options: None,
                last_run: None,
            },
        );
        id
    }

    // =========================================================================
    // 执行
    // =========================================================================

    /// 解析选项并在可能时立即分发
    ///
    /// 返回交给引擎的动画数量。
    fn schedule_run(&mut self, id: BindingId, reason: RunReason) -> usize {
        let Some(binding) = self.bindings.get(&id) else {
            return 0;
        };

        match resolve_options(&binding.animation.options, &binding.scope, &mut self.calls) {
            Ok(OptionsResolution::Ready(options)) => self.dispatch(id, reason, options),
            Ok(OptionsResolution::Pending(future)) => {
                tracing::debug!(binding = %id, ?reason, "等待 helper 加载");
                self.pending.push(PendingRun {
                    binding: id,
                    reason,
                    future,
                });
                0
            }
            Err(err) => {
                let source = binding.animation.label();
                self.diagnostics.push(Diagnostic::error(
                    source,
                    format!("动画不会执行: {err}"),
                ));
                0
            }
        }
    }

    /// 推进等待中的执行
    ///
    /// 每个等待项用 no-op waker 轮询一次；已完成的立即分发。
    /// 所属绑定已释放的等待项被丢弃。返回交给引擎的动画数量。
    pub fn tick(&mut self) -> usize {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut dispatched = 0;

        for mut run in std::mem::take(&mut self.pending) {
            if !self.bindings.contains_key(&run.binding) {
                continue;
            }
            match run.future.as_mut().poll(&mut cx) {
                Poll::Pending => self.pending.push(run),
                Poll::Ready(Ok(options)) => {
                    dispatched += self.dispatch(run.binding, run.reason, options);
                }
                Poll::Ready(Err(err)) => {
                    let source = self
                        .bindings
                        .get(&run.binding)
                        .map(|b| b.animation.label())
                        .unwrap_or_default();
                    self.diagnostics.push(Diagnostic::error(
                        source,
                        format!("动画不会执行: {err}"),
                    ));
                }
            }
        }

        dispatched
    }

    /// 分发已解析的选项
    fn dispatch(&mut self, id: BindingId, reason: RunReason, options: Vec<ResolvedEntry>) -> usize {
        let (options, link) = split_scroll_options(options, self.config.default_scroll_axis);

        let Some(binding) = self.bindings.get_mut(&id) else {
            return 0;
        };
        binding.options = Some(options.clone());
        let name = binding.animation.name.clone();
        let element = binding.element();

        let registration = name
            .as_deref()
            .map(|name| self.registry.register(name, element, options.clone()));

        if let Some(runs) = self.apply_triggers(id, reason, &options, &link) {
            return runs;
        }

        match (registration, reason) {
            // 新名称首次注册：只登记，等待 lookup / sequence
            (Some(Registration::Inserted), RunReason::Initial) => {
                tracing::debug!(binding = %id, name = ?name, "动画已注册");
                0
            }
            _ => {
                self.run_engine(id, &options);
                1
            }
        }
    }

    /// 按触发条件分发
    ///
    /// 没有触发条件时返回 `None`，由调用方按无名/命名规则处理。
    fn apply_triggers(
        &mut self,
        id: BindingId,
        reason: RunReason,
        options: &[ResolvedEntry],
        link: &ScrollLink,
    ) -> Option<usize> {
        let binding = self.bindings.get(&id)?;
        let triggers = binding.animation.triggers;
        if triggers.is_empty() {
            return None;
        }
        let view = binding.view;

        let mut runs = 0;
        for trigger in triggers.iter() {
            match trigger {
                Trigger::Visible => {
                    let run = match reason {
                        RunReason::EnteredView => true,
                        // 等待进入视口期间只刷新选项
                        RunReason::Initial | RunReason::SourceChanged => view == ViewState::Entered,
                    };
                    if run {
                        self.run_engine(id, options);
                        runs += 1;
                    }
                }
                Trigger::Scroll => {
                    if reason != RunReason::EnteredView {
                        let handle = self.run_engine(id, options);
                        self.engine.link_scroll(handle, link);
                        runs += 1;
                    }
                }
            }
        }
        Some(runs)
    }

    /// 调用引擎并记录句柄
    fn run_engine(&mut self, id: BindingId, options: &[ResolvedEntry]) -> AnimationHandle {
        let Some(binding) = self.bindings.get_mut(&id) else {
            return AnimationHandle(0);
        };
        let element = binding.element();
        let handle = self.engine.animate(element, options);
        binding.last_run = Some(handle);

        if let Some(name) = &binding.animation.name {
            self.registry.set_last_run(name, handle);
        }

        tracing::debug!(binding = %id, %element, %handle, "动画已执行");
        handle
    }

    // =========================================================================
    // 宿主事件
    // =========================================================================

    /// 处理宿主事件
    pub fn handle_input(&mut self, input: MotionInput) {
        match input {
            MotionInput::SourceChanged(sub) => match self.subscriptions.get(&sub).copied() {
                Some(id) => {
                    tracing::debug!(subscription = %sub, binding = %id, "数据来源变化，重新执行");
                    self.schedule_run(id, RunReason::SourceChanged);
                }
                None => tracing::debug!(subscription = %sub, "忽略未知订阅的变化通知"),
            },

            MotionInput::EnteredView(element) => {
                let once = self.config.in_view_once;
                let ids: Vec<BindingId> = self
                    .bindings
                    .iter()
                    .filter(|(_, b)| b.element() == element)
                    .filter(|(_, b)| match b.view {
                        ViewState::Waiting => true,
                        ViewState::Entered => !once,
                        ViewState::NotObserved => false,
                    })
                    .map(|(id, _)| *id)
                    .collect();

                for id in ids {
                    if let Some(binding) = self.bindings.get_mut(&id) {
                        binding.view = ViewState::Entered;
                    }
                    if once {
                        self.engine.unobserve_in_view(element);
                    }
                    self.schedule_run(id, RunReason::EnteredView);
                }
            }

            MotionInput::Teardown(element) => {
                self.release_bindings(|b| b.element() == element);
                let released = self.registry.release_element(element);
                tracing::debug!(%element, released = ?released, "元素已拆除");
            }
        }
    }

    /// 释放满足条件的绑定：取消订阅、停止视口观察、丢弃等待中的执行
    fn release_bindings(&mut self, matches: impl Fn(&Binding) -> bool) {
        let ids: Vec<BindingId> = self
            .bindings
            .iter()
            .filter(|(_, b)| matches(b))
            .map(|(id, _)| *id)
            .collect();

        for id in &ids {
            let Some(binding) = self.bindings.remove(id) else {
                continue;
            };
            for sub in &binding.subscriptions {
                self.host.unsubscribe(*sub);
                self.subscriptions.remove(sub);
            }
            if binding.view == ViewState::Waiting
                || (binding.view == ViewState::Entered && !self.config.in_view_once)
            {
                self.engine.unobserve_in_view(binding.element());
            }
        }

        if !ids.is_empty() {
            self.pending.retain(|run| !ids.contains(&run.binding));
        }
    }

    // =========================================================================
    // 对外能力
    // =========================================================================

    /// 按名称重放动画
    ///
    /// 名称不存在时记录诊断并返回 `None`。
    pub fn lookup(&mut self, name: &str) -> Option<AnimationHandle> {
        let Some(record) = self.registry.get(name) else {
            self.diagnostics.push(Diagnostic::warn(
                "lookup",
                format!("未找到动画 '{name}'"),
            ));
            return None;
        };

        let handle = self.engine.animate(record.element, &record.options);
        self.registry.set_last_run(name, handle);
        Some(handle)
    }

    /// 按名称组装并执行时间线
    ///
    /// 找不到的名称被跳过；没有任何可用步骤时不调用引擎。
    pub fn sequence<S: AsRef<str>>(
        &mut self,
        names: &[S],
        options: &[ResolvedEntry],
    ) -> Option<AnimationHandle> {
        let (steps, missing) = build_sequence(&self.registry, names);

        for name in &missing {
            self.diagnostics.push(Diagnostic::warn(
                "sequence",
                format!("时间线跳过未注册的动画 '{name}'"),
            ));
        }

        if steps.is_empty() {
            self.diagnostics
                .push(Diagnostic::warn("sequence", "时间线没有可执行的步骤"));
            return None;
        }

        Some(self.engine.timeline(&steps, options))
    }

    /// 直接执行动画（透传给引擎）
    pub fn animate(&mut self, element: ElementId, options: &[ResolvedEntry]) -> AnimationHandle {
        self.engine.animate(element, options)
    }

    /// 监听滚动进度（透传给引擎）
    pub fn scroll(&mut self, handler: ScrollHandler, link: &ScrollLink) {
        self.engine.scroll(handler, link);
    }

    // =========================================================================
    // 访问器
    // =========================================================================

    /// 动画引擎
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// 动画引擎（可变）
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// 响应式宿主
    pub fn host(&self) -> &R {
        &self.host
    }

    /// 响应式宿主（可变）
    pub fn host_mut(&mut self) -> &mut R {
        &mut self.host
    }

    /// 配置
    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// 注册表
    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    /// 已收集的诊断
    pub fn diagnostics(&self) -> &DiagnosticResult {
        &self.diagnostics
    }

    /// 取走已收集的诊断
    pub fn take_diagnostics(&mut self) -> DiagnosticResult {
        std::mem::take(&mut self.diagnostics)
    }

    /// 绑定数量
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// 等待 helper 加载的执行数量
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// 绑定最近一次解析出的选项
    pub fn binding_options(&self, id: BindingId) -> Option<&[ResolvedEntry]> {
        self.bindings.get(&id)?.options.as_deref()
    }

    /// 绑定最近一次执行的句柄
    pub fn binding_last_run(&self, id: BindingId) -> Option<AnimationHandle> {
        self.bindings.get(&id)?.last_run
    }

    /// 订阅所属的元素（订阅已释放时为 `None`）
    pub fn subscription_element(&self, sub: SubscriptionId) -> Option<ElementId> {
        let id = self.subscriptions.get(&sub)?;
        Some(self.bindings.get(id)?.element())
    }
}
