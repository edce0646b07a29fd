//! # Trigger 模块
//!
//! 延迟/条件启动：进入视口触发（`in-view`）与滚动联动（`scroll`）。
//!
//! 两种触发互相独立，可以同时安装；安装顺序固定为先 `in-view` 后 `scroll`。

use serde::{Deserialize, Serialize};

use crate::value::{ResolvedEntry, Value};

/// 触发修饰符：进入视口
pub const IN_VIEW_MODIFIER: &str = "in-view";
/// 触发修饰符：滚动联动
pub const SCROLL_MODIFIER: &str = "scroll";

/// 滚动联动字段
pub const SCROLL_TARGET_FIELD: &str = "scrollTarget";
/// 滚动容器字段
pub const SCROLL_CONTAINER_FIELD: &str = "scrollContainer";
/// 滚动轴字段
pub const SCROLL_AXIS_FIELD: &str = "scrollAxis";

/// 触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Trigger {
    /// 首次进入视口时执行一次
    Visible,
    /// 立即执行并把进度绑定到滚动位置
    Scroll,
}

impl Trigger {
    /// 从修饰符识别触发类型
    pub fn from_modifier(modifier: &str) -> Option<Self> {
        match modifier {
            IN_VIEW_MODIFIER => Some(Self::Visible),
            SCROLL_MODIFIER => Some(Self::Scroll),
            _ => None,
        }
    }
}

/// 触发集合
///
/// 迭代顺序固定为 `Visible` → `Scroll`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerSet {
    visible: bool,
    scroll: bool,
}

impl TriggerSet {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入触发
    pub fn insert(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Visible => self.visible = true,
            Trigger::Scroll => self.scroll = true,
        }
    }

    /// 链式加入触发
    pub fn with(mut self, trigger: Trigger) -> Self {
        self.insert(trigger);
        self
    }

    /// 是否包含
    pub fn contains(&self, trigger: Trigger) -> bool {
        match trigger {
            Trigger::Visible => self.visible,
            Trigger::Scroll => self.scroll,
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        !self.visible && !self.scroll
    }

    /// 按安装顺序迭代
    pub fn iter(&self) -> impl Iterator<Item = Trigger> + '_ {
        [Trigger::Visible, Trigger::Scroll]
            .into_iter()
            .filter(|t| self.contains(*t))
    }
}

/// 从修饰符列表中取出触发修饰符
///
/// 返回触发集合与剩余的修饰符（保持原顺序），剩余部分再按键值对解析。
pub fn extract_triggers(modifiers: &[String]) -> (TriggerSet, Vec<String>) {
    let mut triggers = TriggerSet::new();
    let mut rest = Vec::with_capacity(modifiers.len());
    for modifier in modifiers {
        match Trigger::from_modifier(modifier) {
            Some(trigger) => triggers.insert(trigger),
            None => rest.push(modifier.clone()),
        }
    }
    (triggers, rest)
}

/// 滚动轴
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollAxis {
    /// 水平
    X,
    /// 垂直
    #[default]
    Y,
}

impl ScrollAxis {
    /// 从选项值识别
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "x" | "horizontal" => Some(Self::X),
            "y" | "vertical" => Some(Self::Y),
            _ => None,
        }
    }
}

/// 滚动联动配置
///
/// `target` 缺省为被动画的元素本身，`container` 缺省为最近的可滚动祖先，
/// 两者的缺省值由引擎解释。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollLink {
    /// 滚动目标
    pub target: Option<Value>,
    /// 滚动容器
    pub container: Option<Value>,
    /// 滚动轴
    pub axis: ScrollAxis,
}

/// 从已解析选项中拆出滚动联动字段
///
/// 返回去掉 `scrollTarget` / `scrollContainer` / `scrollAxis` 后的动画选项与联动配置。
/// 无法识别的 `scrollAxis` 回落到 `default_axis`。
pub fn split_scroll_options(
    entries: Vec<ResolvedEntry>,
    default_axis: ScrollAxis,
) -> (Vec<ResolvedEntry>, ScrollLink) {
    let mut link = ScrollLink {
        axis: default_axis,
        ..ScrollLink::default()
    };
    let mut rest = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry.field.as_str() {
            SCROLL_TARGET_FIELD => link.target = Some(entry.value),
            SCROLL_CONTAINER_FIELD => link.container = Some(entry.value),
            SCROLL_AXIS_FIELD => {
                match entry.value.as_str().and_then(ScrollAxis::parse) {
                    Some(axis) => link.axis = axis,
                    None => tracing::warn!(
                        value = ?entry.value,
                        "无法识别的 scrollAxis，使用默认轴"
                    ),
                }
            }
            _ => rest.push(entry),
        }
    }

    (rest, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Entry;

    #[test]
    fn test_extract_triggers_keeps_remaining_order() {
        let modifiers: Vec<String> = ["scroll", "opacity", "0", "in-view", "duration", "300ms"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (triggers, rest) = extract_triggers(&modifiers);

        assert!(triggers.contains(Trigger::Visible));
        assert!(triggers.contains(Trigger::Scroll));
        assert_eq!(rest, vec!["opacity", "0", "duration", "300ms"]);
    }

    #[test]
    fn test_trigger_iteration_order_visible_first() {
        let set = TriggerSet::new()
            .with(Trigger::Scroll)
            .with(Trigger::Visible);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Trigger::Visible, Trigger::Scroll]
        );
        assert!(TriggerSet::new().is_empty());
    }

    #[test]
    fn test_split_scroll_options() {
        let entries = vec![
            Entry::new("opacity", Value::Number(1.0)),
            Entry::new(SCROLL_TARGET_FIELD, Value::string("#hero")),
            Entry::new(SCROLL_AXIS_FIELD, Value::string("x")),
        ];
        let (rest, link) = split_scroll_options(entries, ScrollAxis::Y);

        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].field, "opacity");
        assert_eq!(link.target, Some(Value::string("#hero")));
        assert_eq!(link.container, None);
        assert_eq!(link.axis, ScrollAxis::X);
    }

    #[test]
    fn test_split_scroll_options_defaults() {
        let entries = vec![Entry::new(SCROLL_AXIS_FIELD, Value::string("diagonal"))];
        let (rest, link) = split_scroll_options(entries, ScrollAxis::Y);

        assert!(rest.is_empty());
        assert_eq!(link.axis, ScrollAxis::Y);
        assert_eq!(link.target, None);
    }
}
