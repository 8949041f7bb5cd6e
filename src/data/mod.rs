//! 外部数据读取模块
//!
//! 提供文本矩阵的读取功能：参数节点的 fromFile / fromLiteral 初始化
//! 以及 revise（数值重载）都经由这里读入外部数据。
//!
//! # 主要组件
//!
//! - [`load_matrix_from_text_file`]: 从文本文件读入二维矩阵
//! - [`load_matrix_from_string_literal`]: 从字符串字面量读入二维矩阵
//! - [`DataError`]: 数据读取错误类型

pub mod error;
mod loader;

#[cfg(test)]
mod tests;

// Re-exports
pub use error::DataError;
pub use loader::{load_matrix_from_string_literal, load_matrix_from_text_file};
