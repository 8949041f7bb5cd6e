//! 参数节点错误类型定义

use thiserror::Error;

use crate::data::DataError;

/// 参数节点操作的错误类型
///
/// 注：底层 IO 原因以文本形式保留（而非嵌套`std::io::Error`），
/// 以保证整个枚举可比较，便于测试中精确断言。
#[derive(Debug, Error, PartialEq)]
pub enum NodeError {
    /// 配置参数缺失、矛盾或无法解析（不可恢复，直接上抛给调用方）
    #[error("配置无效: {0}")]
    InvalidConfiguration(String),

    /// 调用方违反使用契约（编程错误，致命）
    #[error("非法操作: {0}")]
    InvalidOperation(String),

    /// 形状无法从给定的矩阵维度推断（调用方可换一个推断来源重试）
    #[error("维度推断失败: {0}")]
    DimensionInference(String),

    /// 数据元素个数与声明的形状不符
    #[error("数据元素数不匹配（{context}）: 形状需要{expected}个元素，实际提供{got}个")]
    DataSizeMismatch {
        expected: usize,
        got: usize,
        context: String,
    },

    /// 文件读写失败
    #[error("IO失败: {0}")]
    Io(String),
}

impl From<DataError> for NodeError {
    fn from(e: DataError) -> Self {
        Self::Io(e.to_string())
    }
}
