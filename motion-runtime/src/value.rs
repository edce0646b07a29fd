//! # Value 模块
//!
//! 定义动画选项树的值类型。
//!
//! ## 两层模型
//!
//! - [`Value`]：具体值，可以直接交给动画引擎
//! - [`OptionValue`]：模板值，可能包含 [`ReactiveRef`] / [`PendingCall`] 占位符
//!
//! 编译器产出 `OptionEntry`（模板），解析器把它填充为 `ResolvedEntry`（具体值）。
//! 条目的插入顺序就是传给引擎的顺序，因此对象统一用有序的键值对列表表示。

use serde::{Deserialize, Serialize, Serializer};

/// 具体值
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// 未给出值（仅有键的修饰符）
    #[default]
    Undefined,
    /// null
    Null,
    /// 布尔值
    Bool(bool),
    /// 数字
    Number(f64),
    /// 字符串
    String(String),
    /// 数组
    Array(Vec<Value>),
    /// 对象（保持插入顺序）
    Object(Vec<(String, Value)>),
}

impl Value {
    /// 创建字符串值
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// 获取字符串内容
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// 获取数字内容
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// 读取对象字段
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Object(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// 沿成员路径读取（`a.b.c` 中 `a` 之后的部分）
    ///
    /// 数组支持数字下标。
    pub fn get_path<'a>(&self, path: impl IntoIterator<Item = &'a str>) -> Option<&Value> {
        let mut current = self;
        for segment in path {
            current = match current {
                Self::Object(_) => current.field(segment)?,
                Self::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// 值的类型名（用于诊断）
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// 转换为 JSON
    ///
    /// 整数值不带小数部分输出，`Undefined` 输出为 `null`。
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Undefined | Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(pairs) => serde_json::Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// 从 JSON 转换
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Array(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_json(&json))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// 响应式引用
///
/// 指向宿主数据上下文中的一个字段（可带成员路径，如 `card.offset`）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactiveRef {
    /// 原始引用文本
    pub source: String,
}

impl ReactiveRef {
    /// 创建响应式引用
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// 根字段名（作用域查找用）
    pub fn root(&self) -> &str {
        self.source.split('.').next().unwrap_or(&self.source)
    }

    /// 根字段之后的成员路径
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.source.split('.').skip(1)
    }
}

/// 待解析的 helper 调用
///
/// `args` 保留括号内的原始文本，在解析时才对当前作用域求值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCall {
    /// helper 名称（如 `spring`）
    pub helper: String,
    /// 原始参数文本
    pub args: String,
}

impl PendingCall {
    /// 创建待解析调用
    pub fn new(helper: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            helper: helper.into(),
            args: args.into(),
        }
    }
}

/// 模板值
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// 字面量
    Literal(Value),
    /// 数组（元素可含占位符）
    Array(Vec<OptionValue>),
    /// 对象（字段可含占位符，保持插入顺序）
    Object(Vec<(String, OptionValue)>),
    /// 响应式引用
    Reactive(ReactiveRef),
    /// helper 调用
    Call(PendingCall),
}

impl OptionValue {
    /// 是否不含任何占位符
    pub fn is_concrete(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Array(items) => items.iter().all(Self::is_concrete),
            Self::Object(pairs) => pairs.iter().all(|(_, v)| v.is_concrete()),
            Self::Reactive(_) | Self::Call(_) => false,
        }
    }

    /// 收集树中的响应式引用（按出现顺序）
    pub fn collect_reactive<'a>(&'a self, out: &mut Vec<&'a ReactiveRef>) {
        match self {
            Self::Reactive(r) => out.push(r),
            Self::Array(items) => items.iter().for_each(|v| v.collect_reactive(out)),
            Self::Object(pairs) => pairs.iter().for_each(|(_, v)| v.collect_reactive(out)),
            Self::Literal(_) | Self::Call(_) => {}
        }
    }

    /// 收集树中的 helper 调用（按出现顺序）
    pub fn collect_calls<'a>(&'a self, out: &mut Vec<&'a PendingCall>) {
        match self {
            Self::Call(c) => out.push(c),
            Self::Array(items) => items.iter().for_each(|v| v.collect_calls(out)),
            Self::Object(pairs) => pairs.iter().for_each(|(_, v)| v.collect_calls(out)),
            Self::Literal(_) | Self::Reactive(_) => {}
        }
    }

    /// 转为具体值；遇到占位符返回 `None`
    pub fn to_concrete(&self) -> Option<Value> {
        Some(match self {
            Self::Literal(v) => v.clone(),
            Self::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Self::to_concrete)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Self::Object(pairs) => Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| Some((k.clone(), v.to_concrete()?)))
                    .collect::<Option<Vec<_>>>()?,
            ),
            Self::Reactive(_) | Self::Call(_) => return None,
        })
    }
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

/// 选项条目 `{field: value}`
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    /// 字段名（已规范化）
    pub field: String,
    /// 值
    pub value: V,
}

impl<V> Entry<V> {
    /// 创建条目
    pub fn new(field: impl Into<String>, value: V) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

/// 模板条目
pub type OptionEntry = Entry<OptionValue>;

/// 已解析条目
pub type ResolvedEntry = Entry<Value>;

impl Serialize for ResolvedEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

/// 按字段名插入条目；已存在时原位替换
///
/// 保证同一层级内字段唯一，同时保留首次出现的位置。
pub fn upsert_entry<V>(entries: &mut Vec<Entry<V>>, entry: Entry<V>) {
    match entries.iter_mut().find(|e| e.field == entry.field) {
        Some(existing) => existing.value = entry.value,
        None => entries.push(entry),
    }
}

/// 按键插入对象字段；已存在时原位替换
pub fn upsert_pair<V>(pairs: &mut Vec<(String, V)>, key: String, value: V) {
    match pairs.iter_mut().find(|(k, _)| *k == key) {
        Some(existing) => existing.1 = value,
        None => pairs.push((key, value)),
    }
}

/// 把已解析条目渲染为 JSON 数组（`[{field: value}, ...]`）
pub fn entries_to_json(entries: &[ResolvedEntry]) -> serde_json::Value {
    serde_json::Value::Array(
        entries
            .iter()
            .map(|e| {
                let mut map = serde_json::Map::new();
                map.insert(e.field.clone(), e.value.to_json());
                serde_json::Value::Object(map)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_numbers_render_without_fraction() {
        assert_eq!(Value::Number(100.0).to_json().to_string(), "100");
        assert_eq!(Value::Number(0.3).to_json().to_string(), "0.3");
        assert_eq!(Value::Number(-45.0).to_json().to_string(), "-45");
        assert_eq!(Value::Undefined.to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_get_path() {
        let card = Value::Object(vec![
            (
                "offset".to_string(),
                Value::Object(vec![("x".to_string(), Value::Number(12.0))]),
            ),
            (
                "steps".to_string(),
                Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
            ),
        ]);

        assert_eq!(card.get_path(["offset", "x"]), Some(&Value::Number(12.0)));
        assert_eq!(card.get_path(["steps", "1"]), Some(&Value::Number(2.0)));
        assert_eq!(card.get_path(["missing"]), None);
        assert_eq!(card.get_path(["steps", "x"]), None);
    }

    #[test]
    fn test_reactive_ref_root_and_members() {
        let r = ReactiveRef::new("card.offset.x");
        assert_eq!(r.root(), "card");
        assert_eq!(r.members().collect::<Vec<_>>(), vec!["offset", "x"]);
    }

    #[test]
    fn test_upsert_entry_keeps_first_position() {
        let mut entries = vec![
            Entry::new("x", Value::Number(1.0)),
            Entry::new("y", Value::Number(2.0)),
        ];
        upsert_entry(&mut entries, Entry::new("x", Value::Number(3.0)));
        upsert_entry(&mut entries, Entry::new("z", Value::Number(4.0)));

        let fields: Vec<_> = entries.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["x", "y", "z"]);
        assert_eq!(entries[0].value, Value::Number(3.0));
    }

    #[test]
    fn test_option_value_concrete() {
        let template = OptionValue::Array(vec![
            OptionValue::Literal(Value::Number(0.0)),
            OptionValue::Call(PendingCall::new("spring", "")),
        ]);
        assert!(!template.is_concrete());
        assert_eq!(template.to_concrete(), None);

        let mut calls = Vec::new();
        template.collect_calls(&mut calls);
        assert_eq!(calls[0].helper, "spring");

        let literal = OptionValue::Object(vec![(
            "x".to_string(),
            OptionValue::Literal(Value::Number(1.0)),
        )]);
        assert_eq!(
            literal.to_concrete(),
            Some(Value::Object(vec![("x".to_string(), Value::Number(1.0))]))
        );
    }

    #[test]
    fn test_value_json_round_trip_preserves_shape() {
        let json = serde_json::json!({"a": [1, "b", true, null]});
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_object_keys_keep_insertion_order() {
        let spring = Value::Object(vec![
            ("type".to_string(), Value::string("spring")),
            ("stiffness".to_string(), Value::Number(300.0)),
        ]);
        assert_eq!(spring.to_json().to_string(), r#"{"type":"spring","stiffness":300}"#);
        assert_eq!(
            serde_json::to_string(&spring).unwrap(),
            r#"{"type":"spring","stiffness":300}"#
        );

        let json: serde_json::Value = serde_json::from_str(r#"{"z": 1, "a": 2}"#).unwrap();
        let Value::Object(pairs) = Value::from_json(&json) else {
            panic!("期望对象");
        };
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
