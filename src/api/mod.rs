// ==========================================
// 制造订单合并/拆分 - API 层
// ==========================================
// 职责: 提供宿主调用的业务接口, 管理事务与向导会话
// ==========================================

pub mod error;
pub mod production_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use production_api::{ProductionApi, WizardSession};
