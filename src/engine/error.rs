// ==========================================
// 制造订单合并/拆分 - 引擎层错误类型
// ==========================================
// 前置条件错误: 直接展示给最终用户, 整个事务回滚
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 前置条件不满足 (消息已本地化, 原样展示)
    #[error("{message}")]
    Precondition { message: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    /// 构造前置条件错误
    pub fn precondition(message: impl Into<String>) -> Self {
        EngineError::Precondition {
            message: message.into(),
        }
    }

    /// 是否为前置条件错误
    pub fn is_precondition(&self) -> bool {
        matches!(self, EngineError::Precondition { .. })
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
