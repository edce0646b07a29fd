//! # Runtime 模块
//!
//! 指令运行时，负责绑定管理、重新执行与触发分发。
//!
//! ## 模块结构
//!
//! - [`engine`]：运行时主体
//! - `binding`：元素绑定与等待中的执行

mod binding;
pub mod engine;

pub use binding::RunReason;
pub use engine::MotionRuntime;
