//! # Page 模块
//!
//! 演示页面描述：元素及其指令属性、数据上下文，以及按顺序回放的事件脚本。
//!
//! ```json
//! {
//!   "data": { "offset": 40 },
//!   "elements": [
//!     { "id": 1, "attributes": [{ "name": "x-motion", "value": "{x: offset}" }] }
//!   ],
//!   "script": [
//!     { "set": { "field": "offset", "value": 80 } },
//!     { "tick": {} },
//!     { "teardown": { "element": 1 } }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use motion_runtime::{ElementId, ResolvedEntry, Value};
use serde::{Deserialize, Serialize};
use serde_json::Map;

/// 页面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 页面级数据（最外层作用域）
    #[serde(default)]
    pub data: Map<String, serde_json::Value>,

    /// 元素列表（按声明顺序应用指令）
    pub elements: Vec<PageElement>,

    /// 事件脚本
    #[serde(default)]
    pub script: Vec<Step>,
}

/// 页面元素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageElement {
    pub id: u64,

    /// 属性（保持声明顺序）
    #[serde(default)]
    pub attributes: Vec<Attribute>,

    /// 元素级数据（覆盖页面级同名字段）
    #[serde(default)]
    pub data: Map<String, serde_json::Value>,
}

impl PageElement {
    pub fn element_id(&self) -> ElementId {
        ElementId(self.id)
    }
}

/// 元素属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// 脚本步骤
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// 修改数据字段；`element` 缺省时修改页面级数据
    Set {
        #[serde(default)]
        element: Option<u64>,
        field: String,
        value: serde_json::Value,
    },

    /// 元素进入视口
    EnterView { element: u64 },

    /// 推进若干 tick
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// 按名称重放
    Lookup { name: String },

    /// 组装时间线
    Sequence {
        names: Vec<String>,
        #[serde(default)]
        options: Map<String, serde_json::Value>,
    },

    /// 拆除元素
    Teardown { element: u64 },
}

fn default_tick_count() -> u32 {
    1
}

impl Page {
    /// 从文件加载页面
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取页面文件: {}", path.display()))?;
        let page = Self::from_json(&content)
            .with_context(|| format!("页面文件格式错误: {}", path.display()))?;
        Ok(page)
    }

    /// 从 JSON 文本解析并校验页面
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let page: Self = serde_json::from_str(content)?;
        page.validate()?;
        Ok(page)
    }

    /// 校验元素 id 唯一，且脚本只引用已声明的元素
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut ids = HashSet::new();
        for element in &self.elements {
            if !ids.insert(element.id) {
                bail!("元素 id 重复: {}", element.id);
            }
        }

        for (index, step) in self.script.iter().enumerate() {
            let referenced = match step {
                Step::Set {
                    element: Some(id), ..
                }
                | Step::EnterView { element: id }
                | Step::Teardown { element: id } => Some(*id),
                _ => None,
            };
            if let Some(id) = referenced
                && !ids.contains(&id)
            {
                bail!("脚本第 {} 步引用了不存在的元素 {}", index + 1, id);
            }
        }

        Ok(())
    }
}

/// 把 JSON 对象转换为选项条目（保持文档中的键顺序）
pub fn json_to_entries(map: &Map<String, serde_json::Value>) -> Vec<ResolvedEntry> {
    map.iter()
        .map(|(field, value)| ResolvedEntry::new(field.clone(), Value::from_json(value)))
        .collect()
}
