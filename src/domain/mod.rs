// ==========================================
// 制造订单合并/拆分 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、精度规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action;
pub mod action_log;
pub mod catalog;
pub mod production;
pub mod stock_move;
pub mod types;
pub mod uom;

// 重导出核心类型
pub use action::{
    ActionResId, ActionResult, ActionTarget, MODEL_PRODUCTION, MODEL_PRODUCTION_SPLIT,
    MODEL_PRODUCTION_SPLIT_MULTI,
};
pub use action_log::{ActionLog, ActionType};
pub use catalog::{Bom, BomByproduct, BomLine, PickingType, Product, ResUser};
pub use production::{ManufacturingOrder, NewProduction};
pub use stock_move::{NewStockMove, StockMove};
pub use types::{MoveState, ProcureMethod, ProductionState, SplitMergeOperation};
pub use uom::{float_compare, float_is_zero, float_round, Uom};
