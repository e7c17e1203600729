// ==========================================
// 制造订单合并/拆分 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 功能: 制造订单的前置校验、固定份数拆分、交互式拆分向导、合并
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 记录存储接口与 SQLite 绑定
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 宿主集成
pub mod app;

#[cfg(test)]
mod test_fixtures;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{MoveState, ProcureMethod, ProductionState, SplitMergeOperation};

// 领域实体
pub use domain::{ActionLog, ActionResult, ActionType, ManufacturingOrder, StockMove, Uom};

// 引擎
pub use engine::{
    EngineError, MergeEngine, ProductionLifecycle, SplitEngine, SplitMultiWizard, SplitWizard,
    ValidationGate,
};

// 仓储
pub use repository::{ProductionStore, SqliteStore};

// API
pub use api::{ApiError, ProductionApi};

// ==========================================
// 常量定义
// ==========================================

// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 名称
pub const APP_NAME: &str = "mrp-split-merge";
