//! # Scope 模块
//!
//! 宿主响应式数据上下文的显式建模。
//!
//! ## 设计说明
//!
//! - [`DataScope`]：一层数据帧，由宿主实现，读取的是**当前**值
//! - [`ScopeChain`]：有序的数据帧列表，最近的帧在前；查找时最近帧优先
//! - [`EvalContext`]：编译器与参数求值器需要的唯一能力
//!
//! runtime 不假设具体的响应式实现，只通过这些接口读取数据。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// 求值上下文
///
/// 提供变量查找能力
pub trait EvalContext {
    /// 获取变量当前值
    fn get_var(&self, name: &str) -> Option<Value>;

    /// 变量是否存在于上下文中
    fn has_var(&self, name: &str) -> bool {
        self.get_var(name).is_some()
    }
}

/// 单层数据帧
pub trait DataScope {
    /// 读取字段当前值
    fn get(&self, field: &str) -> Option<Value>;

    /// 字段是否存在
    fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }
}

/// 基于 `HashMap` 的数据帧
///
/// 克隆得到的是同一份数据的另一个句柄，宿主写入后所有持有者立即可见。
#[derive(Debug, Clone, Default)]
pub struct MapScope {
    fields: Rc<RefCell<HashMap<String, Value>>>,
}

impl MapScope {
    /// 创建空数据帧
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置字段（构造用）
    pub fn with(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// 设置字段
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.borrow_mut().insert(field.into(), value.into());
    }

    /// 删除字段
    pub fn remove(&self, field: &str) -> Option<Value> {
        self.fields.borrow_mut().remove(field)
    }
}

impl DataScope for MapScope {
    fn get(&self, field: &str) -> Option<Value> {
        self.fields.borrow().get(field).cloned()
    }
}

/// 作用域链
///
/// 帧按"最近优先"排列：`frames[0]` 是离元素最近的作用域。
#[derive(Clone, Default)]
pub struct ScopeChain {
    frames: Vec<Rc<dyn DataScope>>,
}

impl std::fmt::Debug for ScopeChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeChain")
            .field("frames", &self.frames.len())
            .finish()
    }
}

impl ScopeChain {
    /// 创建空作用域链
    pub fn new() -> Self {
        Self::default()
    }

    /// 从单个数据帧创建
    pub fn single(scope: impl DataScope + 'static) -> Self {
        Self::new().with_outer(scope)
    }

    /// 追加一个更外层的数据帧
    pub fn with_outer(mut self, scope: impl DataScope + 'static) -> Self {
        self.frames.push(Rc::new(scope));
        self
    }

    /// 在最前面插入一个更近的数据帧
    pub fn with_inner(mut self, scope: impl DataScope + 'static) -> Self {
        self.frames.insert(0, Rc::new(scope));
        self
    }

    /// 数据帧数量
    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl EvalContext for ScopeChain {
    fn get_var(&self, name: &str) -> Option<Value> {
        self.frames.iter().find_map(|frame| frame.get(name))
    }

    fn has_var(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.contains(name))
    }
}
