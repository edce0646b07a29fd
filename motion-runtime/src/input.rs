//! # Input 模块
//!
//! 宿主向 runtime 传递的事件。

use serde::{Deserialize, Serialize};

use crate::handle::{ElementId, SubscriptionId};

/// 宿主事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionInput {
    /// 订阅的数据来源发生变化
    SourceChanged(SubscriptionId),

    /// 元素进入视口
    EnteredView(ElementId),

    /// 元素被拆除
    ///
    /// runtime 释放该元素的订阅、视口观察、待执行任务与注册表记录。
    Teardown(ElementId),
}

impl MotionInput {
    /// 事件关联的元素（若有）
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Self::SourceChanged(_) => None,
            Self::EnteredView(element) | Self::Teardown(element) => Some(*element),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element() {
        assert_eq!(
            MotionInput::EnteredView(ElementId(3)).element(),
            Some(ElementId(3))
        );
        assert_eq!(
            MotionInput::Teardown(ElementId(4)).element(),
            Some(ElementId(4))
        );
        assert_eq!(MotionInput::SourceChanged(SubscriptionId(1)).element(), None);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&MotionInput::Teardown(ElementId(2))).unwrap();
        assert_eq!(json, r#"{"Teardown":2}"#);

        let input: MotionInput = serde_json::from_str(r#"{"EnteredView":5}"#).unwrap();
        assert_eq!(input, MotionInput::EnteredView(ElementId(5)));
    }
}
