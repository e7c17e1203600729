// ==========================================
// 制造订单合并/拆分 - 前置校验闸门
// ==========================================
// 职责: 合并与拆分共用的前置条件
// 输入: 订单集合 + 操作类型
// 输出: 通过 / 前置条件错误 (无副作用)
// ==========================================

use crate::domain::{ManufacturingOrder, SplitMergeOperation};
use crate::engine::error::{EngineError, EngineResult};
use crate::i18n::{t, t_with_args};
use crate::repository::ProductionStore;
use std::collections::HashSet;

// ==========================================
// ValidationGate - 前置校验闸门
// ==========================================
/// 前置校验闸门
///
/// 校验顺序即报错优先级:
/// 1. 状态必须为草稿或已确认
/// 2. 必须有物料清单
/// 3. (仅合并) 至少两张订单
/// 4. (仅合并) (产品, 物料清单) 唯一
/// 5. (仅合并) 无手工追加的组件/副产品
/// 6. (仅合并) 状态一致
/// 7. (仅合并) 作业类型一致
pub struct ValidationGate<'a, S: ProductionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ProductionStore + ?Sized> ValidationGate<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// 执行前置校验
    pub fn check(
        &self,
        productions: &[ManufacturingOrder],
        operation: SplitMergeOperation,
    ) -> EngineResult<()> {
        let verb = t(operation.verb_key());

        if productions.iter().any(|p| !p.state.is_splittable()) {
            return Err(refuse(t_with_args(
                "errors.invalid_state",
                &[("operation", verb.as_str())],
            )));
        }

        if productions.iter().any(|p| p.bom_id.is_none()) {
            return Err(refuse(t_with_args(
                "errors.missing_bom",
                &[("operation", verb.as_str())],
            )));
        }

        if operation == SplitMergeOperation::Split {
            return Ok(());
        }

        if productions.len() < 2 {
            return Err(refuse(t("errors.merge_needs_two")));
        }

        let pairs: HashSet<_> = productions.iter().map(|p| p.product_bom_key()).collect();
        if pairs.len() > 1 {
            return Err(refuse(t("errors.merge_same_product_bom")));
        }

        if self.has_additional_lines(productions)? {
            return Err(refuse(t("errors.merge_additional_lines")));
        }

        let states: HashSet<_> = productions.iter().map(|p| p.state).collect();
        if states.len() > 1 {
            return Err(refuse(t("errors.merge_same_state")));
        }

        let picking_types: HashSet<_> = productions.iter().map(|p| p.picking_type_id).collect();
        if picking_types.len() > 1 {
            return Err(refuse(t("errors.merge_same_picking_type")));
        }

        Ok(())
    }

    /// 是否存在无法追溯到物料清单的组件/副产品移动
    ///
    /// 副产品移动 = 产出移动中产品不是订单产品的那些
    fn has_additional_lines(&self, productions: &[ManufacturingOrder]) -> EngineResult<bool> {
        for production in productions {
            let raw = self.store.raw_moves(production.id)?;
            if raw.iter().any(|m| m.bom_line_id.is_none()) {
                tracing::debug!("订单 {} 存在手工追加的组件", production.name);
                return Ok(true);
            }

            let finished = self.store.finished_moves(production.id)?;
            let additional_byproduct = finished
                .iter()
                .filter(|m| m.product_id != production.product_id)
                .any(|m| m.byproduct_id.is_none());
            if additional_byproduct {
                tracing::debug!("订单 {} 存在手工追加的副产品", production.name);
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn refuse(message: String) -> EngineError {
    tracing::warn!("前置校验未通过: {}", message);
    EngineError::precondition(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewStockMove, ProductionState};
    use crate::i18n::{set_locale, LOCALE_TEST_LOCK};
    use crate::repository::SqliteStore;
    use crate::test_fixtures::{create_order, setup};

    #[test]
    fn test_single_draft_order_passes_split_gate() {
        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let order = create_order(&store, &fx, 10.0, ProductionState::Draft, Some(fx.alice));

        let gate = ValidationGate::new(&store);
        assert!(gate.check(&[order], SplitMergeOperation::Split).is_ok());
    }

    #[test]
    fn test_done_order_is_refused() {
        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let order = create_order(&store, &fx, 10.0, ProductionState::Done, None);

        let gate = ValidationGate::new(&store);
        let err = gate.check(&[order], SplitMergeOperation::Split).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_order_without_bom_is_refused() {
        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let mut order = create_order(&store, &fx, 10.0, ProductionState::Draft, None);
        order.bom_id = None;

        let gate = ValidationGate::new(&store);
        let err = gate.check(&[order], SplitMergeOperation::Split).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_merge_requires_two_orders() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("en");

        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let order = create_order(&store, &fx, 10.0, ProductionState::Draft, None);

        let gate = ValidationGate::new(&store);
        let err = gate.check(&[order], SplitMergeOperation::Merge).unwrap_err();
        assert_eq!(
            err.to_string(),
            "You need at least two production orders to merge them."
        );
    }

    #[test]
    fn test_merge_refuses_different_boms() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        set_locale("en");

        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let a = create_order(&store, &fx, 5.0, ProductionState::Draft, None);
        let mut b = create_order(&store, &fx, 7.0, ProductionState::Draft, None);
        b.bom_id = Some(fx.alt_bom);

        let gate = ValidationGate::new(&store);
        let err = gate.check(&[a, b], SplitMergeOperation::Merge).unwrap_err();
        assert!(err.to_string().contains("identical products with same BoM"));
    }

    #[test]
    fn test_merge_refuses_manual_component() {
        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let a = create_order(&store, &fx, 5.0, ProductionState::Draft, None);
        let b = create_order(&store, &fx, 7.0, ProductionState::Draft, None);

        let mut extra = NewStockMove::draft(fx.leg, 1.0);
        extra.raw_production_id = Some(b.id);
        store.insert_move(&extra).unwrap();

        let gate = ValidationGate::new(&store);
        let err = gate.check(&[a, b], SplitMergeOperation::Merge).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_merge_refuses_manual_byproduct() {
        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let a = create_order(&store, &fx, 5.0, ProductionState::Draft, None);
        let b = create_order(&store, &fx, 7.0, ProductionState::Draft, None);

        let mut extra = NewStockMove::draft(fx.sawdust, 2.0);
        extra.finished_production_id = Some(a.id);
        store.insert_move(&extra).unwrap();

        let gate = ValidationGate::new(&store);
        assert!(gate.check(&[a, b], SplitMergeOperation::Merge).is_err());
    }

    #[test]
    fn test_merge_refuses_mixed_states() {
        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let a = create_order(&store, &fx, 5.0, ProductionState::Draft, None);
        let b = create_order(&store, &fx, 7.0, ProductionState::Confirmed, None);

        let gate = ValidationGate::new(&store);
        let err = gate.check(&[a, b], SplitMergeOperation::Merge).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_merge_refuses_mixed_picking_types() {
        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let a = create_order(&store, &fx, 5.0, ProductionState::Draft, None);
        let mut b = create_order(&store, &fx, 7.0, ProductionState::Draft, None);
        b.picking_type_id = Some(fx.rework_type);

        let gate = ValidationGate::new(&store);
        let err = gate.check(&[a, b], SplitMergeOperation::Merge).unwrap_err();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_mergeable_orders_pass() {
        let fx = setup();
        let store = SqliteStore::new(&fx.conn);
        let a = create_order(&store, &fx, 5.0, ProductionState::Confirmed, Some(fx.alice));
        let b = create_order(&store, &fx, 7.0, ProductionState::Confirmed, Some(fx.bob));

        let gate = ValidationGate::new(&store);
        assert!(gate.check(&[a, b], SplitMergeOperation::Merge).is_ok());
    }
}
