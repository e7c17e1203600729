// ==========================================
// 制造订单合并/拆分 - 操作日志领域模型
// ==========================================
// 用途: 合并/拆分溯源消息, 取消通知
// 对齐: schema action_log 表
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 红线: 合并/拆分写入后必须在源订单上留痕
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,         // 日志ID (uuid)
    pub production_id: i64,        // 留痕所在订单
    pub action_type: String,       // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,  // 操作时间戳
    pub actor: Option<i64>,        // 操作人 (系统动作可为None)
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,    // 面向用户的消息正文
}

impl ActionLog {
    /// 构造一条新的操作日志
    pub fn new(
        production_id: i64,
        action_type: ActionType,
        actor: Option<i64>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            production_id,
            action_type: action_type.to_string(),
            action_ts: Utc::now().naive_utc(),
            actor,
            payload_json: None,
            detail: Some(detail.into()),
        }
    }

    /// 附加操作参数
    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Merge,      // 合并生成的新订单
    MergedInto, // 源订单已并入新订单
    Split,      // 拆分生成的子订单
    SplitInto,  // 源订单已拆分为子订单
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Merge => write!(f, "Merge"),
            ActionType::MergedInto => write!(f, "MergedInto"),
            ActionType::Split => write!(f, "Split"),
            ActionType::SplitInto => write!(f, "SplitInto"),
        }
    }
}
