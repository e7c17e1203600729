// ==========================================
// 制造订单合并/拆分 - 库存移动领域模型
// ==========================================
// 对齐: schema stock_move / stock_move_link 表
// ==========================================

use crate::domain::types::{MoveState, ProcureMethod};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// StockMove - 库存移动
// ==========================================
// raw_production_id: 原材料消耗移动所属订单
// finished_production_id: 成品/副产品产出移动所属订单
// created_production_id: 由该订单供货的下游移动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMove {
    pub id: i64,
    pub product_id: i64,
    pub product_uom_qty: f64,
    pub state: MoveState,

    // ===== 订单关联 =====
    pub raw_production_id: Option<i64>,
    pub finished_production_id: Option<i64>,
    pub created_production_id: Option<i64>,

    // ===== 物料清单溯源 =====
    pub bom_line_id: Option<i64>,  // None 表示手工追加的组件
    pub byproduct_id: Option<i64>, // None 表示主产品或手工追加的副产品

    // ===== 库位 / 补货 =====
    pub location_src_id: Option<i64>,
    pub location_dest_id: Option<i64>,
    pub procure_method: ProcureMethod,
    pub group_id: Option<i64>,
    pub date_deadline: Option<NaiveDateTime>,
}

impl StockMove {
    /// 是否仍可取消 (未完成且未取消)
    pub fn is_open(&self) -> bool {
        !matches!(self.state, MoveState::Done | MoveState::Cancel)
    }
}

// ==========================================
// NewStockMove - 新建移动参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStockMove {
    pub product_id: i64,
    pub product_uom_qty: f64,
    pub state: MoveState,
    pub raw_production_id: Option<i64>,
    pub finished_production_id: Option<i64>,
    pub created_production_id: Option<i64>,
    pub bom_line_id: Option<i64>,
    pub byproduct_id: Option<i64>,
    pub location_src_id: Option<i64>,
    pub location_dest_id: Option<i64>,
    pub procure_method: ProcureMethod,
    pub group_id: Option<i64>,
    pub date_deadline: Option<NaiveDateTime>,
}

impl NewStockMove {
    /// 构造一个草稿状态的独立移动 (不关联任何订单)
    pub fn draft(product_id: i64, product_uom_qty: f64) -> Self {
        Self {
            product_id,
            product_uom_qty,
            state: MoveState::Draft,
            raw_production_id: None,
            finished_production_id: None,
            created_production_id: None,
            bom_line_id: None,
            byproduct_id: None,
            location_src_id: None,
            location_dest_id: None,
            procure_method: ProcureMethod::MakeToStock,
            group_id: None,
            date_deadline: None,
        }
    }
}
