// ==========================================
// 制造订单合并/拆分 - 计量单位与精度
// ==========================================
// 职责: 按计量单位的舍入步长进行舍入/比较/换算
// 舍入规则: 四舍五入 (远离零), 带相对 epsilon 修正二进制误差
// ==========================================

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ==========================================
// Uom - 计量单位
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uom {
    pub id: i64,
    pub name: String,
    pub rounding: f64, // 舍入步长, 如 0.01
    pub factor: f64,   // 相对参考单位的比例 (参考单位 = 1.0)
}

impl Uom {
    /// 将本单位下的数量换算到目标单位, 并按目标单位精度舍入
    pub fn convert_qty(&self, qty: f64, to: &Uom) -> f64 {
        if self.id == to.id {
            return qty;
        }
        if self.factor == 0.0 {
            return qty;
        }
        float_round(qty / self.factor * to.factor, to.rounding)
    }

    /// 按本单位精度舍入
    pub fn round(&self, value: f64) -> f64 {
        float_round(value, self.rounding)
    }

    /// 按本单位精度比较
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        float_compare(a, b, self.rounding)
    }
}

/// 按舍入步长舍入
///
/// # 说明
/// - 步长 <= 0 时原样返回
/// - 步长为 10 的负整数次幂时 (0.1 / 0.01 / ...) 以除法还原, 避免 3.3300000000000001 这类尾差
pub fn float_round(value: f64, rounding: f64) -> f64 {
    if rounding <= 0.0 || !value.is_finite() {
        return value;
    }

    let normalized = value / rounding;
    if normalized == 0.0 {
        return 0.0;
    }

    // 与二进制表示误差同量级的修正量, 使 2.675 / 0.01 这类值按十进制直觉进位
    let epsilon_magnitude = normalized.abs().log2();
    let epsilon = 2f64.powf(epsilon_magnitude - 52.0);
    let nudged = normalized + normalized.signum() * epsilon;
    let steps = nudged.round();

    let inverse = 1.0 / rounding;
    if rounding < 1.0 && (inverse - inverse.round()).abs() < 1e-9 {
        steps / inverse.round()
    } else {
        steps * rounding
    }
}

/// 按舍入步长判断是否为零
pub fn float_is_zero(value: f64, rounding: f64) -> bool {
    float_round(value, rounding).abs() < rounding
}

/// 按舍入步长比较两个数量
pub fn float_compare(a: f64, b: f64, rounding: f64) -> Ordering {
    let delta = float_round(a, rounding) - float_round(b, rounding);
    if float_is_zero(delta, rounding) {
        Ordering::Equal
    } else if delta < 0.0 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}
