// ==========================================
// 制造订单合并/拆分 - 界面动作描述
// ==========================================
// 用途: 返回给宿主界面层, 描述下一步打开的视图
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// 制造订单模型名
pub const MODEL_PRODUCTION: &str = "mrp.production";
/// 单订单拆分向导模型名
pub const MODEL_PRODUCTION_SPLIT: &str = "mrp.production.split";
/// 多订单拆分向导模型名
pub const MODEL_PRODUCTION_SPLIT_MULTI: &str = "mrp.production.split.multi";

const ACT_WINDOW: &str = "ir.actions.act_window";

// ==========================================
// ActionTarget - 视图打开方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTarget {
    Current, // 当前窗口
    New,     // 弹窗
}

// ==========================================
// ActionResId - 目标记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResId {
    Record(i64),
    Records(Vec<i64>),
    Wizard(Uuid), // 向导会话
}

// ==========================================
// ActionResult - 窗口动作
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub action_type: String,
    pub res_model: String,
    pub view_mode: String,
    pub res_id: Option<ActionResId>,
    pub target: ActionTarget,
    pub context: Map<String, JsonValue>,
}

impl ActionResult {
    /// 构造窗口动作
    pub fn window(res_model: &str, view_mode: &str, target: ActionTarget) -> Self {
        Self {
            name: None,
            action_type: ACT_WINDOW.to_string(),
            res_model: res_model.to_string(),
            view_mode: view_mode.to_string(),
            res_id: None,
            target,
            context: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_res_id(mut self, res_id: ActionResId) -> Self {
        self.res_id = Some(res_id);
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}
