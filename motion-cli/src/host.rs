//! # Host 模块
//!
//! 命令行宿主：把引擎调用记录成事件流的 [`TraceEngine`]、
//! 按字段名分发订阅的 [`PageHost`]，以及带加载延迟的演示 helper。

use std::collections::BTreeMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use motion_runtime::{
    AnimationHandle, ElementId, HelperLoad, HelperSource, MotionEngine, ReactiveHost,
    ResolvedEntry, ScrollAxis, ScrollHandler, ScrollLink, SequenceStep, StaticHelpers,
    SubscriptionId, Value, entries_to_json,
};
use serde::Serialize;

// =============================================================================
// 引擎
// =============================================================================

/// 引擎事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    Animate {
        handle: u64,
        element: ElementId,
        options: serde_json::Value,
    },
    Timeline {
        handle: u64,
        steps: Vec<SequenceStep>,
        options: serde_json::Value,
    },
    LinkScroll {
        handle: u64,
        target: Option<serde_json::Value>,
        container: Option<serde_json::Value>,
        axis: ScrollAxis,
    },
    ScrollProgress {
        axis: ScrollAxis,
        samples: Vec<f64>,
    },
    ObserveInView {
        element: ElementId,
    },
    UnobserveInView {
        element: ElementId,
    },
}

/// 记录所有调用的引擎
#[derive(Debug, Default)]
pub struct TraceEngine {
    events: Vec<EngineEvent>,
    next_handle: u64,
}

impl TraceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录的事件
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl MotionEngine for TraceEngine {
    fn animate(&mut self, element: ElementId, options: &[ResolvedEntry]) -> AnimationHandle {
        let handle = self.allocate();
        let options = entries_to_json(options);
        tracing::info!(%element, handle, %options, "animate");
        self.events.push(EngineEvent::Animate {
            handle,
            element,
            options,
        });
        AnimationHandle(handle)
    }

    fn timeline(&mut self, steps: &[SequenceStep], options: &[ResolvedEntry]) -> AnimationHandle {
        let handle = self.allocate();
        tracing::info!(handle, steps = steps.len(), "timeline");
        self.events.push(EngineEvent::Timeline {
            handle,
            steps: steps.to_vec(),
            options: entries_to_json(options),
        });
        AnimationHandle(handle)
    }

    fn link_scroll(&mut self, handle: AnimationHandle, link: &ScrollLink) {
        tracing::info!(%handle, axis = ?link.axis, "link_scroll");
        self.events.push(EngineEvent::LinkScroll {
            handle: handle.0,
            target: link.target.as_ref().map(Value::to_json),
            container: link.container.as_ref().map(Value::to_json),
            axis: link.axis,
        });
    }

    fn scroll(&mut self, mut handler: ScrollHandler, link: &ScrollLink) {
        // 没有真实滚动，直接报告起止进度
        let samples = vec![0.0, 1.0];
        for progress in &samples {
            handler(*progress);
        }
        self.events.push(EngineEvent::ScrollProgress {
            axis: link.axis,
            samples,
        });
    }

    fn observe_in_view(&mut self, element: ElementId) {
        tracing::debug!(%element, "observe_in_view");
        self.events.push(EngineEvent::ObserveInView { element });
    }

    fn unobserve_in_view(&mut self, element: ElementId) {
        tracing::debug!(%element, "unobserve_in_view");
        self.events.push(EngineEvent::UnobserveInView { element });
    }
}

// =============================================================================
// 响应式宿主
// =============================================================================

/// 按根字段名记录订阅的宿主
#[derive(Debug, Default)]
pub struct PageHost {
    subscriptions: BTreeMap<SubscriptionId, String>,
}

impl PageHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// 根字段为 `field` 的订阅（按订阅顺序）
    pub fn subscribers(&self, field: &str) -> Vec<SubscriptionId> {
        self.subscriptions
            .iter()
            .filter(|(_, source)| source.split('.').next() == Some(field))
            .map(|(id, _)| *id)
            .collect()
    }
}

impl ReactiveHost for PageHost {
    fn subscribe(&mut self, source: &str, id: SubscriptionId) {
        tracing::debug!(source, subscription = %id, "subscribe");
        self.subscriptions.insert(id, source.to_string());
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        tracing::debug!(subscription = %id, "unsubscribe");
        self.subscriptions.remove(&id);
    }
}

// =============================================================================
// 演示 helper
// =============================================================================

/// 内置演示 helper：`spring(stiffness?, damping?)` 与 `stagger(each?)`
pub fn builtin_helpers() -> StaticHelpers {
    StaticHelpers::new()
        .with("spring", |args| {
            let arg = |i: usize, default: f64| {
                args.get(i).and_then(Value::as_number).unwrap_or(default)
            };
            Value::Object(vec![
                ("type".to_string(), Value::string("spring")),
                ("stiffness".to_string(), Value::Number(arg(0, 100.0))),
                ("damping".to_string(), Value::Number(arg(1, 10.0))),
            ])
        })
        .with("stagger", |args| {
            let each = args.first().and_then(Value::as_number).unwrap_or(0.1);
            Value::Object(vec![
                ("type".to_string(), Value::string("stagger")),
                ("each".to_string(), Value::Number(each)),
            ])
        })
}

/// 模拟异步加载的 helper 来源
///
/// 已知 helper 在被轮询 `latency` 次后可用；`latency` 为 0 时同步可用。
pub struct DemoHelpers {
    helpers: StaticHelpers,
    latency: u32,
}

impl DemoHelpers {
    pub fn new(latency: u32) -> Self {
        Self {
            helpers: builtin_helpers(),
            latency,
        }
    }
}

impl HelperSource for DemoHelpers {
    fn load(&mut self, name: &str) -> HelperLoad {
        match self.helpers.load(name) {
            HelperLoad::Ready(helper) if self.latency > 0 => {
                tracing::debug!(helper = name, latency = self.latency, "模拟异步加载");
                let delay = Delay {
                    remaining: self.latency,
                };
                HelperLoad::Pending(delay.map(move |()| Some(helper)).boxed_local())
            }
            other => other,
        }
    }
}

/// 第 `remaining` 次轮询时完成
struct Delay {
    remaining: u32,
}

impl Future for Delay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining <= 1 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
