// ==========================================
// 制造订单合并/拆分 - SQLite 记录存储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

mod core;
mod store_impl;


pub use core::SqliteStore;
