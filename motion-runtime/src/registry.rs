//! # Registry 模块
//!
//! 命名动画表：名称 → 最近一次解析出的选项与所属元素。
//!
//! 注册表由 runtime 持有，生命周期与页面会话一致，不是全局状态。
//! 同名再注册是"热更新"：记录被覆盖，是否立即重新执行由调用方根据
//! [`Registration::Updated`] 决定。

use std::collections::HashMap;

use crate::handle::{AnimationHandle, ElementId};
use crate::value::ResolvedEntry;

/// 注册表记录
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryRecord {
    /// 动画名
    pub name: String,
    /// 所属元素
    pub element: ElementId,
    /// 已解析的动画选项
    pub options: Vec<ResolvedEntry>,
    /// 最近一次执行的句柄
    pub last_run: Option<AnimationHandle>,
}

/// 注册结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// 新名称
    Inserted,
    /// 已有名称被覆盖
    Updated {
        /// 被覆盖记录的所属元素
        previous_element: ElementId,
    },
}

/// 动画注册表
#[derive(Debug, Default)]
pub struct AnimationRegistry {
    records: HashMap<String, RegistryRecord>,
}

impl AnimationRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖记录
    ///
    /// 覆盖时保留旧记录的 `last_run`，直到下一次执行。
    pub fn register(
        &mut self,
        name: &str,
        element: ElementId,
        options: Vec<ResolvedEntry>,
    ) -> Registration {
        match self.records.get_mut(name) {
            Some(record) => {
                let previous_element = record.element;
                if previous_element != element {
                    tracing::warn!(
                        name,
                        previous = %previous_element,
                        current = %element,
                        "动画名被另一个元素重新注册，旧注册被丢弃"
                    );
                }
                record.element = element;
                record.options = options;
                Registration::Updated { previous_element }
            }
            None => {
                self.records.insert(
                    name.to_string(),
                    RegistryRecord {
                        name: name.to_string(),
                        element,
                        options,
                        last_run: None,
                    },
                );
                Registration::Inserted
            }
        }
    }

    /// 查找记录
    pub fn get(&self, name: &str) -> Option<&RegistryRecord> {
        self.records.get(name)
    }

    /// 删除记录
    pub fn unregister(&mut self, name: &str) -> Option<RegistryRecord> {
        self.records.remove(name)
    }

    /// 删除某元素拥有的全部记录
    ///
    /// 已被其他元素接管的名称不受影响。返回被删除的名称。
    pub fn release_element(&mut self, element: ElementId) -> Vec<String> {
        let mut released: Vec<String> = self
            .records
            .values()
            .filter(|r| r.element == element)
            .map(|r| r.name.clone())
            .collect();
        released.sort();
        for name in &released {
            self.records.remove(name);
        }
        released
    }

    /// 更新最近一次执行的句柄
    pub fn set_last_run(&mut self, name: &str, handle: AnimationHandle) {
        if let Some(record) = self.records.get_mut(name) {
            record.last_run = Some(handle);
        }
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 已注册的名称（排序后）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.records.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
