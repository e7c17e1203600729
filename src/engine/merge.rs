// ==========================================
// 制造订单合并/拆分 - 合并引擎
// ==========================================
// 职责: 将多张同产品同清单的订单合并为一张新订单
// 输入: 订单主键集合 + 操作人
// 输出: 合并后的新订单 (源订单取消并留痕)
// 事务: 由调用方持有, 任一步失败整体回滚
// ==========================================

use crate::config::MrpSettings;
use crate::domain::{
    ActionLog, ActionType, ManufacturingOrder, MoveState, NewProduction, ProductionState,
    SplitMergeOperation, StockMove,
};
use crate::engine::error::EngineResult;
use crate::engine::lifecycle::ProductionLifecycle;
use crate::engine::validation::ValidationGate;
use crate::i18n::t_with_args;
use crate::repository::{ProductionStore, RepositoryError};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};

// ==========================================
// 合并前从源订单收集的移动关系
// ==========================================

/// 同一清单行上的源原材料移动汇总
#[derive(Debug, Default)]
struct LineCarryover {
    orig_move_ids: BTreeSet<i64>,
    locations: HashSet<Option<i64>>,
}

impl LineCarryover {
    /// 所有源移动来源库位一致时沿用该库位
    fn shared_location(&self) -> Option<i64> {
        if self.locations.len() == 1 {
            self.locations.iter().next().copied().flatten()
        } else {
            None
        }
    }
}

// ==========================================
// MergeEngine - 合并引擎
// ==========================================
pub struct MergeEngine<'a, S: ProductionStore + ?Sized> {
    store: &'a S,
    lifecycle: ProductionLifecycle<'a, S>,
    actor: Option<i64>,
}

impl<'a, S: ProductionStore + ?Sized> MergeEngine<'a, S> {
    pub fn new(store: &'a S, settings: &'a MrpSettings, actor: Option<i64>) -> Self {
        Self {
            store,
            lifecycle: ProductionLifecycle::new(store, settings),
            actor,
        }
    }

    /// 合并订单
    ///
    /// 1. 前置校验 (合并)
    /// 2. 负责人: 源订单一致时沿用, 否则取操作人
    /// 3. 数量: 换算到产品计量单位后求和
    /// 4. 收集清单行的上游移动与来源库位、产出移动的下游移动
    /// 5. 新建订单并回挂上述关系
    /// 6. 下游订单移动与补货组改指向新订单
    /// 7. 源订单已确认时确认新订单
    /// 8. 取消源订单 (不发取消通知), 更新上游截止日期, 留痕
    pub fn merge(&self, production_ids: &[i64]) -> EngineResult<ManufacturingOrder> {
        let sources = self.store.browse_productions(production_ids)?;
        ValidationGate::new(self.store).check(&sources, SplitMergeOperation::Merge)?;

        // 校验通过保证至少两张且 (产品, 清单) 一致
        let first = &sources[0];
        let (product_id, bom_id) = first.product_bom_key();

        let users: HashSet<Option<i64>> = sources.iter().map(|p| p.user_id).collect();
        let user_id = if users.len() == 1 {
            first.user_id
        } else {
            self.actor
        };

        let product = self
            .store
            .find_product(product_id)?
            .ok_or_else(|| RepositoryError::not_found("product.product", product_id))?;
        let product_uom = self
            .store
            .find_uom(product.uom_id)?
            .ok_or_else(|| RepositoryError::not_found("uom.uom", product.uom_id))?;

        let mut total = 0.0;
        for production in &sources {
            let uom = self
                .store
                .find_uom(production.product_uom_id)?
                .ok_or_else(|| RepositoryError::not_found("uom.uom", production.product_uom_id))?;
            total += uom.convert_qty(production.product_qty, &product_uom);
        }
        let total = product_uom.round(total);

        let carryover = self.collect_line_carryover(&sources)?;
        let byproduct_dests = self.collect_byproduct_dests(&sources)?;

        // ===== 新建合并订单 =====
        let (location_src_id, location_dest_id) = self.resolve_locations(first)?;
        let mut names: Vec<&str> = sources.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();

        let vals = NewProduction {
            product_id,
            bom_id,
            product_qty: total,
            qty_producing: 0.0,
            product_uom_id: product.uom_id,
            user_id,
            state: ProductionState::Draft,
            origin: Some(names.join(",")),
            picking_type_id: first.picking_type_id,
            date_start: sources.iter().filter_map(|p| p.date_start).min(),
            location_src_id,
            location_dest_id,
        };
        let merged = self.lifecycle.create(&vals)?;

        // ===== 回挂清单行上游与产出下游 =====
        for raw in self.store.raw_moves(merged.id)? {
            let Some(line) = raw.bom_line_id.and_then(|id| carryover.get(&id)) else {
                continue;
            };
            let orig_ids: Vec<i64> = line.orig_move_ids.iter().copied().collect();
            self.store.set_orig_move_ids(raw.id, &orig_ids)?;

            if let Some(location) = line.shared_location() {
                let mut updated = raw.clone();
                updated.location_src_id = Some(location);
                self.store.write_move(&updated)?;
            }
        }

        for finished in self.store.finished_moves(merged.id)? {
            if let Some(dests) = byproduct_dests.get(&finished.byproduct_id) {
                let dest_ids: Vec<i64> = dests.iter().copied().collect();
                self.store.set_dest_move_ids(finished.id, &dest_ids)?;
            }
        }

        // ===== 下游订单移动与补货组 =====
        let source_ids: Vec<i64> = sources.iter().map(|p| p.id).collect();
        let repointed = self.store.repoint_created_production(&source_ids, merged.id)?;

        let source_groups: Vec<i64> = sources
            .iter()
            .filter_map(|p| p.procurement_group_id)
            .collect();
        let regrouped = match merged.procurement_group_id {
            Some(group_id) => self.store.regroup_moves(&source_groups, group_id)?,
            None => 0,
        };
        tracing::debug!(
            "合并订单 {}: 改指向下游移动 {} 条, 改挂补货组移动 {} 条",
            merged.name,
            repointed,
            regrouped
        );

        // ===== 确认 =====
        if sources.iter().any(|p| p.state == ProductionState::Confirmed) {
            let raw_moves = self.store.raw_moves(merged.id)?;
            self.lifecycle.adjust_procure_method(&raw_moves)?;

            let mut move_ids: Vec<i64> = raw_moves.iter().map(|m| m.id).collect();
            move_ids.extend(self.store.finished_moves(merged.id)?.iter().map(|m| m.id));
            self.store.set_moves_state(&move_ids, MoveState::Confirmed)?;
            self.lifecycle.confirm(merged.id)?;
        }

        // ===== 取消源订单 =====
        self.lifecycle.cancel(&sources)?;

        // ===== 上游截止日期 =====
        let merged = self.lifecycle.get(merged.id)?;
        let upstream = self.upstream_move_ids(&merged)?;
        self.store.set_moves_deadline(&upstream, merged.date_start)?;

        // ===== 留痕 =====
        let into_message = t_with_args("messages.merged_into", &[("name", merged.name.as_str())]);
        for source in &sources {
            self.store.log_action(
                &ActionLog::new(source.id, ActionType::MergedInto, self.actor, into_message.as_str())
                    .with_payload(json!({ "merged_production_id": merged.id })),
            )?;
        }
        let from_message = t_with_args("messages.merged_from", &[("names", names.join(", ").as_str())]);
        self.store.log_action(
            &ActionLog::new(merged.id, ActionType::Merge, self.actor, from_message)
                .with_payload(json!({ "source_production_ids": source_ids })),
        )?;

        tracing::info!(
            "合并完成: {} → {} (数量 {})",
            names.join(","),
            merged.name,
            merged.product_qty
        );
        Ok(merged)
    }

    /// 按清单行汇总源原材料移动的上游移动与来源库位
    fn collect_line_carryover(
        &self,
        sources: &[ManufacturingOrder],
    ) -> EngineResult<BTreeMap<i64, LineCarryover>> {
        let mut carryover: BTreeMap<i64, LineCarryover> = BTreeMap::new();
        for production in sources {
            for raw in self.store.raw_moves(production.id)? {
                let Some(bom_line_id) = raw.bom_line_id else {
                    continue;
                };
                let entry = carryover.entry(bom_line_id).or_default();
                entry.orig_move_ids.extend(self.store.orig_move_ids(raw.id)?);
                entry.locations.insert(raw.location_src_id);
            }
        }
        Ok(carryover)
    }

    /// 按副产品 (None = 主产品) 汇总源产出移动的下游移动
    fn collect_byproduct_dests(
        &self,
        sources: &[ManufacturingOrder],
    ) -> EngineResult<BTreeMap<Option<i64>, BTreeSet<i64>>> {
        let mut dests: BTreeMap<Option<i64>, BTreeSet<i64>> = BTreeMap::new();
        for production in sources {
            for finished in self.store.finished_moves(production.id)? {
                dests
                    .entry(finished.byproduct_id)
                    .or_default()
                    .extend(self.store.dest_move_ids(finished.id)?);
            }
        }
        Ok(dests)
    }

    /// 合并订单库位: 取作业类型默认库位, 缺省时沿用源订单
    fn resolve_locations(&self, first: &ManufacturingOrder) -> EngineResult<(Option<i64>, Option<i64>)> {
        let picking_type = match first.picking_type_id {
            Some(id) => self.store.find_picking_type(id)?,
            None => None,
        };
        Ok(match picking_type {
            Some(pt) => (
                pt.default_location_src_id.or(first.location_src_id),
                pt.default_location_dest_id.or(first.location_dest_id),
            ),
            None => (first.location_src_id, first.location_dest_id),
        })
    }

    fn upstream_move_ids(&self, merged: &ManufacturingOrder) -> EngineResult<Vec<i64>> {
        let raw_moves: Vec<StockMove> = self.store.raw_moves(merged.id)?;
        let mut upstream = BTreeSet::new();
        for raw in &raw_moves {
            upstream.extend(self.store.orig_move_ids(raw.id)?);
        }
        Ok(upstream.into_iter().collect())
    }
}
