// ==========================================
// 制造订单合并/拆分 - 应用层
// ==========================================
// 职责: 组装共享连接、配置与API, 供宿主进程调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
