// ==========================================
// 制造订单合并/拆分 - 制造订单领域模型
// ==========================================
// 对齐: schema mrp_production 表
// ==========================================

use crate::domain::types::ProductionState;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ManufacturingOrder - 制造订单
// ==========================================
// 红线: 记录归属记录存储, 本模块只通过仓储接口读写
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturingOrder {
    // ===== 主键 =====
    pub id: i64,
    pub name: String, // 订单编号 (序列号生成)

    // ===== 产品与物料清单 =====
    pub product_id: i64,
    pub bom_id: Option<i64>,

    // ===== 数量 =====
    pub product_qty: f64,    // 计划生产数量
    pub qty_producing: f64,  // 本次生产中数量
    pub product_uom_id: i64, // 计量单位

    // ===== 责任人 / 状态 =====
    pub user_id: Option<i64>,
    pub state: ProductionState,
    pub origin: Option<String>, // 来源追溯 (自由文本)

    // ===== 作业类型 / 补货组 =====
    pub picking_type_id: Option<i64>,
    pub procurement_group_id: Option<i64>,

    // ===== 计划 / 库位 =====
    pub date_start: Option<NaiveDateTime>,
    pub location_src_id: Option<i64>,
    pub location_dest_id: Option<i64>,
}

impl ManufacturingOrder {
    /// (产品, 物料清单) 组合键
    pub fn product_bom_key(&self) -> (i64, Option<i64>) {
        (self.product_id, self.bom_id)
    }

    /// 以本订单为模板构造新订单 (不含主键/编号/补货组)
    pub fn to_template(&self) -> NewProduction {
        NewProduction {
            product_id: self.product_id,
            bom_id: self.bom_id,
            product_qty: self.product_qty,
            qty_producing: self.qty_producing,
            product_uom_id: self.product_uom_id,
            user_id: self.user_id,
            state: ProductionState::Draft,
            origin: self.origin.clone(),
            picking_type_id: self.picking_type_id,
            date_start: self.date_start,
            location_src_id: self.location_src_id,
            location_dest_id: self.location_dest_id,
        }
    }
}

// ==========================================
// NewProduction - 新建订单参数
// ==========================================
// 编号与补货组由生命周期协作方在创建时分配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduction {
    pub product_id: i64,
    pub bom_id: Option<i64>,
    pub product_qty: f64,
    pub qty_producing: f64,
    pub product_uom_id: i64,
    pub user_id: Option<i64>,
    pub state: ProductionState,
    pub origin: Option<String>,
    pub picking_type_id: Option<i64>,
    pub date_start: Option<NaiveDateTime>,
    pub location_src_id: Option<i64>,
    pub location_dest_id: Option<i64>,
}
