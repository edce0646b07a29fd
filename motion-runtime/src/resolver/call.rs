//! # Call Resolver
//!
//! helper 调用的解析：已加载则同步调用，否则返回等待加载完成的 future。
//!
//! 每个 helper 只加载一次，加载中的 future 被所有等待方共享。

use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use crate::error::ResolveError;
use crate::eval::evaluate_args;
use crate::scope::EvalContext;
use crate::value::{PendingCall, Value};

/// helper 函数
pub type Helper = Rc<dyn Fn(&[Value]) -> Value>;

/// helper 加载 future；`None` 表示加载结束但不可用
pub type HelperFuture = LocalBoxFuture<'static, Option<Helper>>;

/// 单次调用的结果 future
pub type CallFuture = LocalBoxFuture<'static, Result<Value, ResolveError>>;

/// helper 加载结果
pub enum HelperLoad {
    /// 已可用
    Ready(Helper),
    /// 异步加载中
    Pending(HelperFuture),
    /// 未知 helper
    Missing,
}

/// helper 来源（由宿主/动画引擎提供）
pub trait HelperSource {
    /// 开始加载指定 helper
    ///
    /// 对同一名称只会被调用一次，除非上次返回了 `Missing`。
    fn load(&mut self, name: &str) -> HelperLoad;
}

/// 同步可用的 helper 集合
#[derive(Default, Clone)]
pub struct StaticHelpers {
    helpers: HashMap<String, Helper>,
}

impl StaticHelpers {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 helper
    pub fn with(mut self, name: impl Into<String>, helper: impl Fn(&[Value]) -> Value + 'static) -> Self {
        self.helpers.insert(name.into(), Rc::new(helper));
        self
    }
}

impl HelperSource for StaticHelpers {
    fn load(&mut self, name: &str) -> HelperLoad {
        match self.helpers.get(name) {
            Some(helper) => HelperLoad::Ready(helper.clone()),
            None => HelperLoad::Missing,
        }
    }
}

/// 调用解析结果
pub enum Resolution {
    /// 已得到具体值
    Ready(Value),
    /// 等待 helper 加载
    Pending(CallFuture),
}

enum HelperSlot {
    Ready(Helper),
    Loading(Shared<HelperFuture>),
    Unavailable,
}

/// helper 调用解析器
pub struct CallResolver {
    source: Box<dyn HelperSource>,
    slots: HashMap<String, HelperSlot>,
}

impl std::fmt::Debug for CallResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.slots.keys().collect();
        names.sort();
        f.debug_struct("CallResolver").field("helpers", &names).finish()
    }
}

impl CallResolver {
    /// 创建解析器
    pub fn new(source: impl HelperSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            slots: HashMap::new(),
        }
    }

    /// 解析一次调用
    ///
    /// 参数在调用时对 `ctx` 求值。helper 未加载完成时返回 `Pending`，
    /// 其 future 在加载完成后用同一组参数调用 helper。
    pub fn resolve_call<C: EvalContext + ?Sized>(
        &mut self,
        call: &PendingCall,
        ctx: &C,
    ) -> Result<Resolution, ResolveError> {
        let args = evaluate_args(&call.args, ctx).map_err(|source| ResolveError::Arguments {
            name: call.helper.clone(),
            source,
        })?;

        match self.slot(&call.helper)? {
            HelperSlot::Ready(helper) => Ok(Resolution::Ready(helper(&args))),
            HelperSlot::Loading(loading) => {
                let name = call.helper.clone();
                let future = async move {
                    match loading.await {
                        Some(helper) => Ok(helper(&args)),
                        None => Err(ResolveError::HelperUnavailable { name }),
                    }
                };
                Ok(Resolution::Pending(future.boxed_local()))
            }
            HelperSlot::Unavailable => Err(ResolveError::HelperUnavailable {
                name: call.helper.clone(),
            }),
        }
    }

    /// helper 是否已同步可用
    pub fn is_loaded(&mut self, name: &str) -> bool {
        self.promote(name);
        matches!(self.slots.get(name), Some(HelperSlot::Ready(_)))
    }

    /// 获取（必要时开始加载）helper 的当前状态
    fn slot(&mut self, name: &str) -> Result<HelperSlot, ResolveError> {
        self.promote(name);

        if let Some(slot) = self.slots.get(name) {
            return Ok(match slot {
                HelperSlot::Ready(helper) => HelperSlot::Ready(helper.clone()),
                HelperSlot::Loading(loading) => HelperSlot::Loading(loading.clone()),
                HelperSlot::Unavailable => HelperSlot::Unavailable,
            });
        }

        match self.source.load(name) {
            HelperLoad::Ready(helper) => {
                self.slots
                    .insert(name.to_string(), HelperSlot::Ready(helper.clone()));
                Ok(HelperSlot::Ready(helper))
            }
            HelperLoad::Pending(future) => {
                tracing::debug!(helper = name, "helper 开始异步加载");
                let loading = future.shared();
                self.slots
                    .insert(name.to_string(), HelperSlot::Loading(loading.clone()));
                Ok(HelperSlot::Loading(loading))
            }
            HelperLoad::Missing => Err(ResolveError::UnknownHelper {
                name: name.to_string(),
            }),
        }
    }

    /// 已完成的加载转为最终状态
    fn promote(&mut self, name: &str) {
        let Some(HelperSlot::Loading(loading)) = self.slots.get(name) else {
            return;
        };
        let Some(output) = loading.peek() else {
            return;
        };
        let slot = match output {
            Some(helper) => HelperSlot::Ready(helper.clone()),
            None => HelperSlot::Unavailable,
        };
        self.slots.insert(name.to_string(), slot);
    }
}
