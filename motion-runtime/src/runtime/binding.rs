//! # Binding 模块
//!
//! 元素上每个编译出的动画对应一个绑定，记录它的作用域、订阅与触发状态。

use futures::future::LocalBoxFuture;

use crate::compiler::CompiledAnimation;
use crate::error::ResolveError;
use crate::handle::{AnimationHandle, BindingId, ElementId, SubscriptionId};
use crate::scope::ScopeChain;
use crate::value::ResolvedEntry;

/// 执行原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunReason {
    /// 指令首次应用
    Initial,
    /// 订阅的数据来源发生变化
    SourceChanged,
    /// 元素进入视口
    EnteredView,
}

/// 视口触发状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewState {
    /// 未安装视口触发
    NotObserved,
    /// 已安装，等待首次进入
    Waiting,
    /// 已触发
    Entered,
}

/// 元素上的一个动画绑定
pub(crate) struct Binding {
    /// 指令标签（同一元素上同一指令重新应用时用于替换旧绑定）
    pub label: String,
    /// 编译得到的动画
    pub animation: CompiledAnimation,
    /// 求值作用域
    pub scope: ScopeChain,
    /// 持有的订阅
    pub subscriptions: Vec<SubscriptionId>,
    /// 视口触发状态
    pub view: ViewState,
    /// 最近一次解析出的选项
    pub options: Option<Vec<ResolvedEntry>>,
    /// 最近一次执行的句柄
    pub last_run: Option<AnimationHandle>,
}

impl Binding {
    pub fn element(&self) -> ElementId {
        self.animation.element
    }
}

/// 等待 helper 加载的执行
pub(crate) struct PendingRun {
    pub binding: BindingId,
    pub reason: RunReason,
    pub future: LocalBoxFuture<'static, Result<Vec<ResolvedEntry>, ResolveError>>,
}
