// ==========================================
// 制造订单合并/拆分 - 引擎层
// ==========================================
// 职责: 实现合并/拆分业务规则, 不拼 SQL
// 红线: Engine 只经由 ProductionStore 访问记录, 不持有事务
// ==========================================

pub mod error;
pub mod lifecycle;
pub mod merge;
pub mod split;
pub mod split_wizard;
pub mod validation;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use lifecycle::{ProductionLifecycle, PRODUCTION_SEQUENCE_CODE};
pub use merge::MergeEngine;
pub use split::SplitEngine;
pub use split_wizard::{SplitLine, SplitMultiWizard, SplitSource, SplitWizard, MAX_SPLIT_COUNT};
pub use validation::ValidationGate;
