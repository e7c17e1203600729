// ==========================================
// 制造订单合并/拆分 - 拆分引擎
// ==========================================
// 职责: 按固定份数拆分; 提交拆分向导
// 事务: 由调用方持有, 任一步失败整体回滚
// ==========================================

use crate::config::MrpSettings;
use crate::domain::{
    float_compare, ActionLog, ActionType, ManufacturingOrder, SplitMergeOperation,
};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::lifecycle::ProductionLifecycle;
use crate::engine::split_wizard::{ensure_split_count_within_limit, SplitMultiWizard, SplitWizard};
use crate::engine::validation::ValidationGate;
use crate::i18n::{t, t_with_args};
use crate::repository::ProductionStore;
use serde_json::json;
use std::cmp::Ordering;

// ==========================================
// SplitEngine - 拆分引擎
// ==========================================
pub struct SplitEngine<'a, S: ProductionStore + ?Sized> {
    store: &'a S,
    lifecycle: ProductionLifecycle<'a, S>,
    actor: Option<i64>,
}

impl<'a, S: ProductionStore + ?Sized> SplitEngine<'a, S> {
    pub fn new(store: &'a S, settings: &'a MrpSettings, actor: Option<i64>) -> Self {
        Self {
            store,
            lifecycle: ProductionLifecycle::new(store, settings),
            actor,
        }
    }

    // ==========================================
    // 固定份数拆分
    // ==========================================

    /// 将订单复制为 `count` 张草稿订单, 每张数量为 product_qty / count
    ///
    /// 源订单保留, 其 qty_producing 扣减 `count` (可能为负, 不做修正)
    pub fn split_fixed(&self, production_id: i64, count: i64) -> EngineResult<Vec<i64>> {
        if count < 1 {
            return Err(EngineError::precondition(t("errors.split_count_positive")));
        }
        ensure_split_count_within_limit(count)?;

        let mut source = self.lifecycle.get(production_id)?;
        ValidationGate::new(self.store).check(
            std::slice::from_ref(&source),
            SplitMergeOperation::Split,
        )?;

        let per = source.product_qty / count as f64;
        let mut new_ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let copy = self.lifecycle.copy(&source, |vals| {
                vals.product_qty = per;
                vals.qty_producing = 1.0;
            })?;
            new_ids.push(copy.id);
        }

        source.qty_producing -= count as f64;
        self.store.write_production(&source)?;

        tracing::info!(
            "固定份数拆分完成: {} → {} 张 (每张 {})",
            source.name,
            count,
            per
        );
        Ok(new_ids)
    }

    // ==========================================
    // 向导提交
    // ==========================================

    /// 按向导明细生成子订单并取消源订单
    ///
    /// 子订单: 数量/负责人/开工日期取自明细行, 来源为源订单编号, 生成后立即确认
    pub fn commit_wizard(&self, wizard: &SplitWizard) -> EngineResult<Vec<ManufacturingOrder>> {
        let source = self.lifecycle.get(wizard.production_id())?;

        // 快照之后订单数量被改过, 明细同样视为不匹配
        let stale = float_compare(
            source.product_qty,
            wizard.source.product_qty,
            wizard.source.uom.rounding,
        ) != Ordering::Equal;
        if stale || !wizard.valid_details() {
            let message = t_with_args("errors.split_details_invalid", &[("name", source.name.as_str())]);
            tracing::warn!("拆分明细无效: {}", message);
            return Err(EngineError::precondition(message));
        }

        ValidationGate::new(self.store).check(
            std::slice::from_ref(&source),
            SplitMergeOperation::Split,
        )?;

        let mut children = Vec::with_capacity(wizard.lines.len());
        for line in &wizard.lines {
            let child = self.lifecycle.copy(&source, |vals| {
                vals.product_qty = line.quantity;
                vals.qty_producing = 0.0;
                vals.user_id = line.user_id;
                vals.date_start = line.date;
                vals.origin = Some(source.name.clone());
            })?;
            let child = self.lifecycle.confirm(child.id)?;

            let message = t_with_args("messages.split_from", &[("name", source.name.as_str())]);
            self.store
                .log_action(&ActionLog::new(child.id, ActionType::Split, self.actor, message))?;
            children.push(child);
        }

        self.lifecycle
            .cancel(std::slice::from_ref(&source))?;

        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        let message = t_with_args("messages.split_into", &[("names", names.join(", ").as_str())]);
        let payload = json!({
            "children": children.iter().map(|c| c.id).collect::<Vec<_>>(),
            "quantities": wizard.lines.iter().map(|l| l.quantity).collect::<Vec<_>>(),
        });
        self.store.log_action(
            &ActionLog::new(source.id, ActionType::SplitInto, self.actor, message)
                .with_payload(payload),
        )?;

        tracing::info!("拆分完成: {} → {}", source.name, names.join(", "));
        Ok(children)
    }

    /// 依次提交多订单向导的每个子向导 (同一事务)
    pub fn commit_multi(&self, multi: &SplitMultiWizard) -> EngineResult<Vec<ManufacturingOrder>> {
        let mut children = Vec::new();
        for wizard in &multi.wizards {
            children.extend(self.commit_wizard(wizard)?);
        }
        Ok(children)
    }
}
