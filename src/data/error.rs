//! 数据读取错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 数据读取相关错误
#[derive(Debug, Error)]
pub enum DataError {
    /// 文件未找到
    #[error("文件未找到: {0}")]
    FileNotFound(PathBuf),

    /// IO 错误
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 格式错误（如数值无法解析、各行列数不一致）
    #[error("格式错误: {0}")]
    FormatError(String),
}
