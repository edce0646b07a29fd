//! # Handle 模块
//!
//! 运行时与宿主之间传递的不透明标识符。

use serde::{Deserialize, Serialize};

/// 元素标识符
///
/// 由宿主分配，runtime 不拥有元素本身，只用它作为键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Element({})", self.0)
    }
}

/// 动画句柄
///
/// 由动画引擎在每次 `animate` / `timeline` 调用时返回。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationHandle(pub u64);

impl std::fmt::Display for AnimationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Animation({})", self.0)
    }
}

/// 订阅标识符
///
/// 由 runtime 分配并交给宿主；宿主在数据变化时通过
/// [`MotionInput::SourceChanged`](crate::MotionInput::SourceChanged) 回传。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Subscription({})", self.0)
    }
}

/// 绑定标识符
///
/// 每个编译出的动画在元素上对应一个绑定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) u64);

impl BindingId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BindingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Binding({})", self.0)
    }
}
