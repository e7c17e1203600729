// ==========================================
// 制造订单合并/拆分 - 主数据 (产品 / 物料清单 / 作业类型)
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Product - 产品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub uom_id: i64, // 产品默认计量单位
}

// ==========================================
// Bom - 物料清单
// ==========================================
// product_qty: 清单对应的成品基准数量, 组件数量按比例放大
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bom {
    pub id: i64,
    pub product_id: i64,
    pub product_qty: f64,
    pub lines: Vec<BomLine>,
    pub byproducts: Vec<BomByproduct>,
}

impl Bom {
    /// 订单数量相对清单基准数量的放大系数
    pub fn explode_factor(&self, production_qty: f64) -> f64 {
        if self.product_qty <= 0.0 {
            return production_qty;
        }
        production_qty / self.product_qty
    }
}

/// 物料清单组件行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    pub id: i64,
    pub product_id: i64,
    pub product_qty: f64,
}

/// 物料清单副产品行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomByproduct {
    pub id: i64,
    pub product_id: i64,
    pub product_qty: f64,
}

// ==========================================
// PickingType - 作业类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickingType {
    pub id: i64,
    pub name: String,
    pub default_location_src_id: Option<i64>,
    pub default_location_dest_id: Option<i64>,
}

// ==========================================
// ResUser - 用户
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResUser {
    pub id: i64,
    pub name: String,
}
