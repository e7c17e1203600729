// ==========================================
// 制造订单合并/拆分 - 交互式拆分向导
// ==========================================
// 职责: 维护拆分明细行 (数量/负责人/开工日期) 并判定是否可提交
// 说明: 向导本身不写库, 提交由 SplitEngine 完成
// ==========================================

use crate::config::MrpSettings;
use crate::domain::{float_compare, float_round, ManufacturingOrder, Uom};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::lifecycle::ProductionLifecycle;
use crate::i18n::t_with_args;
use crate::repository::{ProductionStore, RepositoryError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 单张订单最多拆分份数
pub const MAX_SPLIT_COUNT: i64 = 1000;

/// 拆分份数超过上限时拒绝
pub(crate) fn ensure_split_count_within_limit(count: i64) -> EngineResult<()> {
    if count > MAX_SPLIT_COUNT {
        let max = MAX_SPLIT_COUNT.to_string();
        return Err(EngineError::precondition(t_with_args(
            "errors.split_count_too_large",
            &[("max", max.as_str())],
        )));
    }
    Ok(())
}

// ==========================================
// SplitSource - 被拆分订单的快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSource {
    pub production_id: i64,
    pub name: String,
    pub product_id: i64,
    pub product_qty: f64,
    pub uom: Uom,
    pub user_id: Option<i64>,
    pub date_start: Option<NaiveDateTime>,
    pub production_capacity: f64, // 以当前组件库存可生产数量
}

impl SplitSource {
    /// 读取订单并计算可生产数量
    ///
    /// 计量单位舍入精度非正时拒绝 (无法判定数量是否相等)
    pub fn load<S: ProductionStore + ?Sized>(
        store: &S,
        settings: &MrpSettings,
        production_id: i64,
    ) -> EngineResult<Self> {
        let lifecycle = ProductionLifecycle::new(store, settings);
        let production = lifecycle.get(production_id)?;
        let uom = store
            .find_uom(production.product_uom_id)?
            .ok_or_else(|| RepositoryError::not_found("uom.uom", production.product_uom_id))?;
        let production_capacity = lifecycle.production_capacity(&production)?;
        Self::from_production(&production, uom, production_capacity)
    }

    pub fn from_production(
        production: &ManufacturingOrder,
        uom: Uom,
        production_capacity: f64,
    ) -> EngineResult<Self> {
        if uom.rounding <= 0.0 {
            return Err(EngineError::precondition(t_with_args(
                "errors.invalid_rounding",
                &[("name", uom.name.as_str())],
            )));
        }
        Ok(Self {
            production_id: production.id,
            name: production.name.clone(),
            product_id: production.product_id,
            product_qty: production.product_qty,
            uom,
            user_id: production.user_id,
            date_start: production.date_start,
            production_capacity,
        })
    }
}

// ==========================================
// SplitLine - 拆分明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitLine {
    pub production_id: i64,
    pub quantity: f64,
    pub user_id: Option<i64>,
    pub date: Option<NaiveDateTime>,
}

// ==========================================
// SplitWizard - 单订单拆分向导
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitWizard {
    pub source: SplitSource,
    pub quantity_to_split: i64,
    pub lines: Vec<SplitLine>,
}

impl SplitWizard {
    /// 未初始化的向导: 拆分份数为 0, 无明细行 (不可提交)
    pub fn new(source: SplitSource) -> Self {
        Self {
            source,
            quantity_to_split: 0,
            lines: Vec::new(),
        }
    }

    pub fn production_id(&self) -> i64 {
        self.source.production_id
    }

    /// 设置拆分份数并重建明细行
    ///
    /// 前 n-1 行取舍入后的均分量, 末行承接余量, 保证合计等于订单数量;
    /// 份数超过 MAX_SPLIT_COUNT 时拒绝且不改动向导
    pub fn set_quantity_to_split(&mut self, count: i64) -> EngineResult<()> {
        ensure_split_count_within_limit(count)?;
        self.quantity_to_split = count;
        self.lines.clear();
        if count < 1 {
            return Ok(());
        }

        let rounding = self.source.uom.rounding;
        let total = self.source.product_qty;
        let share = float_round(total / count as f64, rounding);

        let mut remaining = total;
        for _ in 0..count - 1 {
            self.lines.push(self.default_line(share));
            remaining = float_round(remaining - share, rounding);
        }
        self.lines.push(self.default_line(remaining));
        Ok(())
    }

    /// 追加一行 (默认数量 0)
    pub fn add_line(&mut self, quantity: f64) -> &SplitLine {
        let line = self.default_line(quantity);
        self.lines.push(line);
        self.sync_count();
        &self.lines[self.lines.len() - 1]
    }

    /// 删除一行, 下标越界时返回 None
    pub fn remove_line(&mut self, index: usize) -> Option<SplitLine> {
        if index >= self.lines.len() {
            return None;
        }
        let removed = self.lines.remove(index);
        self.sync_count();
        Some(removed)
    }

    /// 修改一行, 下标越界时返回 None
    pub fn update_line(
        &mut self,
        index: usize,
        quantity: f64,
        user_id: Option<i64>,
        date: Option<NaiveDateTime>,
    ) -> Option<&SplitLine> {
        let line = self.lines.get_mut(index)?;
        line.quantity = quantity;
        line.user_id = user_id;
        line.date = date;
        Some(line)
    }

    /// 明细行合计
    pub fn total_split(&self) -> f64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// 明细是否可提交: 非空且合计在计量精度内等于订单数量
    pub fn valid_details(&self) -> bool {
        !self.lines.is_empty()
            && float_compare(
                self.source.product_qty,
                self.total_split(),
                self.source.uom.rounding,
            ) == Ordering::Equal
    }

    fn default_line(&self, quantity: f64) -> SplitLine {
        SplitLine {
            production_id: self.source.production_id,
            quantity,
            user_id: self.source.user_id,
            date: self.source.date_start,
        }
    }

    // 手工增删行只同步份数, 不重建明细
    fn sync_count(&mut self) {
        self.quantity_to_split = self.lines.len() as i64;
    }
}

// ==========================================
// SplitMultiWizard - 多订单拆分向导
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitMultiWizard {
    pub wizards: Vec<SplitWizard>,
}

impl SplitMultiWizard {
    pub fn new(sources: Vec<SplitSource>) -> Self {
        Self {
            wizards: sources.into_iter().map(SplitWizard::new).collect(),
        }
    }

    pub fn wizard(&self, production_id: i64) -> Option<&SplitWizard> {
        self.wizards.iter().find(|w| w.production_id() == production_id)
    }

    pub fn wizard_mut(&mut self, production_id: i64) -> Option<&mut SplitWizard> {
        self.wizards
            .iter_mut()
            .find(|w| w.production_id() == production_id)
    }

    /// 所有子向导均可提交时才可提交
    pub fn valid_details(&self) -> bool {
        !self.wizards.is_empty() && self.wizards.iter().all(SplitWizard::valid_details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(qty: f64, rounding: f64) -> SplitSource {
        SplitSource {
            production_id: 7,
            name: "MO/00007".to_string(),
            product_id: 10,
            product_qty: qty,
            uom: Uom {
                id: 1,
                name: "Units".to_string(),
                rounding,
                factor: 1.0,
            },
            user_id: Some(2),
            date_start: None,
            production_capacity: qty,
        }
    }

    fn quantities(wizard: &SplitWizard) -> Vec<f64> {
        wizard.lines.iter().map(|l| l.quantity).collect()
    }

    #[test]
    fn test_new_wizard_is_not_valid() {
        let wizard = SplitWizard::new(source(10.0, 0.01));
        assert_eq!(wizard.quantity_to_split, 0);
        assert!(wizard.lines.is_empty());
        assert!(!wizard.valid_details());
    }

    #[test]
    fn test_split_ten_in_three_puts_remainder_last() {
        let mut wizard = SplitWizard::new(source(10.0, 0.01));
        wizard.set_quantity_to_split(3).unwrap();

        assert_eq!(quantities(&wizard), vec![3.33, 3.33, 3.34]);
        assert!(wizard.valid_details());
        assert!(wizard.lines.iter().all(|l| l.user_id == Some(2)));
    }

    #[test]
    fn test_split_even_division() {
        let mut wizard = SplitWizard::new(source(10.0, 0.01));
        wizard.set_quantity_to_split(4).unwrap();
        assert_eq!(quantities(&wizard), vec![2.5, 2.5, 2.5, 2.5]);
        assert!(wizard.valid_details());
    }

    #[test]
    fn test_split_with_unit_rounding() {
        let mut wizard = SplitWizard::new(source(10.0, 1.0));
        wizard.set_quantity_to_split(3).unwrap();
        assert_eq!(quantities(&wizard), vec![3.0, 3.0, 4.0]);
        assert!(wizard.valid_details());
    }

    #[test]
    fn test_lines_sum_to_total_for_any_count() {
        for total in [10.0, 1.0, 7.77, 0.05, 123.45] {
            for count in 1..=200 {
                let mut wizard = SplitWizard::new(source(total, 0.01));
                wizard.set_quantity_to_split(count).unwrap();

                assert_eq!(wizard.lines.len(), count as usize);
                assert!(
                    wizard.valid_details(),
                    "total={} count={} lines={:?}",
                    total,
                    count,
                    quantities(&wizard)
                );
                assert_eq!(
                    float_compare(wizard.total_split(), total, 0.01),
                    Ordering::Equal
                );
            }
        }
    }

    #[test]
    fn test_rounded_up_share_leaves_negative_last_line() {
        // 1 / 40 = 0.025 → 0.03, 39 行即超出总量
        let mut wizard = SplitWizard::new(source(1.0, 0.01));
        wizard.set_quantity_to_split(40).unwrap();

        let lines = quantities(&wizard);
        assert!(lines[..39].iter().all(|q| *q == 0.03));
        assert!(lines[39] < 0.0);
        assert_eq!(float_compare(lines[39], -0.17, 0.01), Ordering::Equal);
        assert!(wizard.valid_details());
    }

    #[test]
    fn test_count_above_limit_is_refused_and_keeps_lines() {
        let mut wizard = SplitWizard::new(source(10.0, 0.01));
        wizard.set_quantity_to_split(2).unwrap();

        let err = wizard.set_quantity_to_split(i64::MAX).unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(wizard.quantity_to_split, 2);
        assert_eq!(quantities(&wizard), vec![5.0, 5.0]);

        wizard.set_quantity_to_split(MAX_SPLIT_COUNT).unwrap();
        assert_eq!(wizard.lines.len(), MAX_SPLIT_COUNT as usize);
        assert!(wizard.valid_details());
    }

    #[test]
    fn test_non_positive_count_clears_lines() {
        let mut wizard = SplitWizard::new(source(10.0, 0.01));
        wizard.set_quantity_to_split(2).unwrap();
        wizard.set_quantity_to_split(0).unwrap();
        assert!(wizard.lines.is_empty());
        assert!(!wizard.valid_details());
    }

    #[test]
    fn test_manual_edits_sync_count_without_regenerating() {
        let mut wizard = SplitWizard::new(source(10.0, 0.01));
        wizard.set_quantity_to_split(2).unwrap();
        wizard.add_line(0.0);

        assert_eq!(wizard.quantity_to_split, 3);
        assert_eq!(quantities(&wizard), vec![5.0, 5.0, 0.0]);

        wizard.update_line(1, 3.0, None, None).unwrap();
        assert!(!wizard.valid_details());
        wizard.update_line(2, 2.0, Some(3), None).unwrap();
        assert!(wizard.valid_details());

        let removed = wizard.remove_line(2).unwrap();
        assert_eq!(removed.user_id, Some(3));
        assert_eq!(wizard.quantity_to_split, 2);
        assert!(!wizard.valid_details());

        assert!(wizard.remove_line(5).is_none());
        assert!(wizard.update_line(5, 1.0, None, None).is_none());
    }

    #[test]
    fn test_differences_below_rounding_are_equal() {
        let mut wizard = SplitWizard::new(source(1.0, 0.01));
        wizard.set_quantity_to_split(1).unwrap();
        wizard.update_line(0, 1.001, None, None).unwrap();
        assert!(wizard.valid_details());
    }

    #[test]
    fn test_invalid_rounding_is_refused() {
        let production = ManufacturingOrder {
            id: 1,
            name: "MO/00001".to_string(),
            product_id: 10,
            bom_id: Some(1),
            product_qty: 5.0,
            qty_producing: 0.0,
            product_uom_id: 1,
            user_id: None,
            state: crate::domain::ProductionState::Draft,
            origin: None,
            picking_type_id: None,
            procurement_group_id: None,
            date_start: None,
            location_src_id: None,
            location_dest_id: None,
        };
        let mut uom = source(5.0, 0.01).uom;
        uom.rounding = 0.0;

        let err = SplitSource::from_production(&production, uom, 5.0).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_multi_wizard_requires_every_child_valid() {
        let mut other = source(6.0, 0.01);
        other.production_id = 8;
        let mut multi = SplitMultiWizard::new(vec![source(10.0, 0.01), other]);
        assert!(!multi.valid_details());

        multi.wizard_mut(7).unwrap().set_quantity_to_split(2).unwrap();
        assert!(!multi.valid_details());

        multi.wizard_mut(8).unwrap().set_quantity_to_split(3).unwrap();
        assert!(multi.valid_details());
        assert_eq!(quantities(multi.wizard(8).unwrap()), vec![2.0, 2.0, 2.0]);
    }
}
