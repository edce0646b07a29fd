//! # Resolver 模块
//!
//! 把编译得到的选项模板填充为可以交给引擎的具体选项。
//!
//! ## 模块结构
//!
//! - `call`: helper 调用解析（同步或异步加载）
//! - `tree`: 选项树填充与 join 汇合

mod call;
mod tree;

pub use call::{
    CallFuture, CallResolver, Helper, HelperFuture, HelperLoad, HelperSource, Resolution,
    StaticHelpers,
};
pub use tree::{OptionsResolution, resolve_options};
