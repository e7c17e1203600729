// ==========================================
// 制造订单合并/拆分 - 配置快照
// ==========================================
// 每次请求在开启事务前读取一次, 引擎只读快照
// ==========================================

use serde::{Deserialize, Serialize};

/// 订单编号默认前缀
pub const DEFAULT_SEQUENCE_PREFIX: &str = "MO/";
/// 订单编号默认补零位数
pub const DEFAULT_SEQUENCE_PADDING: usize = 5;
/// 默认语言
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MrpSettings {
    pub sequence_prefix: String,
    pub sequence_padding: usize,
    pub locale: String,
}

impl Default for MrpSettings {
    fn default() -> Self {
        Self {
            sequence_prefix: DEFAULT_SEQUENCE_PREFIX.to_string(),
            sequence_padding: DEFAULT_SEQUENCE_PADDING,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl MrpSettings {
    /// 订单编号: 前缀 + 补零序号, 如 MO/00042
    pub fn production_name(&self, number: i64) -> String {
        format!(
            "{}{:0width$}",
            self.sequence_prefix,
            number,
            width = self.sequence_padding
        )
    }
}
