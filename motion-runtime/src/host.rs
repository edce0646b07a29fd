//! # Host 模块
//!
//! runtime 依赖的宿主能力。
//!
//! - [`MotionEngine`]：动画引擎（补间、缓动、DOM 写入都在引擎一侧）
//! - [`ReactiveHost`]：宿主响应式系统的订阅能力
//!
//! 变化通知、视口进入与元素拆除都以 [`MotionInput`](crate::MotionInput) 的形式回传，
//! runtime 不持有宿主回调。

use crate::handle::{AnimationHandle, ElementId, SubscriptionId};
use crate::sequence::SequenceStep;
use crate::trigger::ScrollLink;
use crate::value::ResolvedEntry;

/// 滚动进度回调，参数为 0..=1 的进度
pub type ScrollHandler = Box<dyn FnMut(f64)>;

/// 动画引擎
pub trait MotionEngine {
    /// 对元素执行动画
    ///
    /// 对同一元素重复调用由引擎决定是否打断上一次动画。
    fn animate(&mut self, element: ElementId, options: &[ResolvedEntry]) -> AnimationHandle;

    /// 执行时间线
    fn timeline(&mut self, steps: &[SequenceStep], options: &[ResolvedEntry]) -> AnimationHandle;

    /// 把动画进度绑定到滚动位置
    fn link_scroll(&mut self, handle: AnimationHandle, link: &ScrollLink);

    /// 监听滚动进度
    fn scroll(&mut self, handler: ScrollHandler, link: &ScrollLink);

    /// 开始观察元素是否进入视口
    ///
    /// 进入时宿主回传 `MotionInput::EnteredView`。
    fn observe_in_view(&mut self, element: ElementId);

    /// 停止观察
    fn unobserve_in_view(&mut self, element: ElementId);
}

/// 宿主响应式系统
pub trait ReactiveHost {
    /// 订阅数据来源的根字段（`card.offset` 订阅 `card`）
    ///
    /// 同一绑定对同一根字段只订阅一次。
    /// 来源变化时宿主回传 `MotionInput::SourceChanged(id)`，每次变化一次。
    fn subscribe(&mut self, source: &str, id: SubscriptionId);

    /// 取消订阅
    fn unsubscribe(&mut self, id: SubscriptionId);
}
