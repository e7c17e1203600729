// ==========================================
// 制造订单合并/拆分 - 领域类型定义
// ==========================================
// 依据: 制造订单生命周期 draft → confirmed → progress → to_close → done/cancel
// 序列化格式: snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 制造订单状态 (Production State)
// ==========================================
// 红线: 本模块只读取状态, 状态流转由生命周期协作方执行
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionState {
    Draft,     // 草稿
    Confirmed, // 已确认
    Progress,  // 生产中
    ToClose,   // 待关闭
    Done,      // 已完成
    Cancel,    // 已取消
}

impl fmt::Display for ProductionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ProductionState {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "confirmed" => ProductionState::Confirmed,
            "progress" => ProductionState::Progress,
            "to_close" => ProductionState::ToClose,
            "done" => ProductionState::Done,
            "cancel" => ProductionState::Cancel,
            _ => ProductionState::Draft, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProductionState::Draft => "draft",
            ProductionState::Confirmed => "confirmed",
            ProductionState::Progress => "progress",
            ProductionState::ToClose => "to_close",
            ProductionState::Done => "done",
            ProductionState::Cancel => "cancel",
        }
    }

    /// 是否允许合并/拆分 (仅草稿或已确认)
    pub fn is_splittable(&self) -> bool {
        matches!(self, ProductionState::Draft | ProductionState::Confirmed)
    }
}

// ==========================================
// 库存移动状态 (Move State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    Draft,     // 草稿
    Confirmed, // 等待
    Assigned,  // 已预留
    Done,      // 已完成
    Cancel,    // 已取消
}

impl fmt::Display for MoveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl MoveState {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "confirmed" => MoveState::Confirmed,
            "assigned" => MoveState::Assigned,
            "done" => MoveState::Done,
            "cancel" => MoveState::Cancel,
            _ => MoveState::Draft,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MoveState::Draft => "draft",
            MoveState::Confirmed => "confirmed",
            MoveState::Assigned => "assigned",
            MoveState::Done => "done",
            MoveState::Cancel => "cancel",
        }
    }
}

// ==========================================
// 补货方式 (Procure Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcureMethod {
    MakeToStock, // 按库存
    MakeToOrder, // 按订单
}

impl fmt::Display for ProcureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ProcureMethod {
    /// 从字符串解析
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "make_to_order" => ProcureMethod::MakeToOrder,
            _ => ProcureMethod::MakeToStock,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ProcureMethod::MakeToStock => "make_to_stock",
            ProcureMethod::MakeToOrder => "make_to_order",
        }
    }
}

// ==========================================
// 合并/拆分操作 (Split / Merge Operation)
// ==========================================
// 用途: 前置校验按操作类型区分规则集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMergeOperation {
    Merge,
    Split,
}

impl SplitMergeOperation {
    /// 用于错误消息的动词 (i18n key)
    pub fn verb_key(&self) -> &'static str {
        match self {
            SplitMergeOperation::Merge => "operation.merged",
            SplitMergeOperation::Split => "operation.split",
        }
    }
}
