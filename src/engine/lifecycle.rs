// ==========================================
// 制造订单合并/拆分 - 订单生命周期协作方
// ==========================================
// 职责: 创建 (编号/补货组/物料清单展开)、复制、确认、取消、产能计算
// 说明: 仅覆盖合并/拆分需要的最小生命周期, 不生成工单, 不做预留
// ==========================================

use crate::config::MrpSettings;
use crate::domain::{
    float_round, ManufacturingOrder, MoveState, NewProduction, NewStockMove, ProcureMethod,
    ProductionState, StockMove,
};
use crate::engine::error::EngineResult;
use crate::repository::{ProductionStore, RepositoryError};

/// 订单编号序列代码
pub const PRODUCTION_SEQUENCE_CODE: &str = "mrp.production";

// ==========================================
// ProductionLifecycle - 订单生命周期
// ==========================================
pub struct ProductionLifecycle<'a, S: ProductionStore + ?Sized> {
    store: &'a S,
    settings: &'a MrpSettings,
}

impl<'a, S: ProductionStore + ?Sized> ProductionLifecycle<'a, S> {
    pub fn new(store: &'a S, settings: &'a MrpSettings) -> Self {
        Self { store, settings }
    }

    /// 读取订单, 不存在时返回 NotFound
    pub fn get(&self, production_id: i64) -> EngineResult<ManufacturingOrder> {
        self.store
            .find_production(production_id)?
            .ok_or_else(|| RepositoryError::not_found("mrp.production", production_id).into())
    }

    // ==========================================
    // 创建 / 复制
    // ==========================================

    /// 创建订单
    ///
    /// 1. 按序列分配编号
    /// 2. 新建同名补货组
    /// 3. 按物料清单展开原材料/产出移动
    pub fn create(&self, vals: &NewProduction) -> EngineResult<ManufacturingOrder> {
        let number = self.store.next_sequence_number(PRODUCTION_SEQUENCE_CODE)?;
        let name = self.settings.production_name(number);
        let group_id = self.store.create_procurement_group(&name)?;

        let id = self.store.insert_production(&name, vals, Some(group_id))?;
        let production = self.get(id)?;
        self.explode_moves(&production)?;

        tracing::debug!(
            "创建制造订单 {} (product={}, qty={})",
            production.name,
            production.product_id,
            production.product_qty
        );
        Ok(production)
    }

    /// 以源订单为模板复制新订单
    ///
    /// 新订单总是草稿状态, 拥有新的编号与补货组; `adjust` 用于覆盖复制默认值。
    pub fn copy<F>(&self, source: &ManufacturingOrder, adjust: F) -> EngineResult<ManufacturingOrder>
    where
        F: FnOnce(&mut NewProduction),
    {
        let mut vals = source.to_template();
        vals.state = ProductionState::Draft;
        adjust(&mut vals);
        self.create(&vals)
    }

    /// 按物料清单展开原材料与产出移动
    ///
    /// 组件数量 = 清单行数量 × (订单数量 / 清单基准数量), 按组件计量单位舍入
    pub fn explode_moves(&self, production: &ManufacturingOrder) -> EngineResult<()> {
        let Some(bom_id) = production.bom_id else {
            return Ok(());
        };
        let bom = self
            .store
            .find_bom(bom_id)?
            .ok_or_else(|| RepositoryError::not_found("mrp.bom", bom_id))?;

        let factor = bom.explode_factor(production.product_qty);
        let state = move_state_for(production.state);

        for line in &bom.lines {
            let qty = self.round_for_product(line.product_id, line.product_qty * factor)?;
            let mut vals = NewStockMove::draft(line.product_id, qty);
            vals.state = state;
            vals.raw_production_id = Some(production.id);
            vals.bom_line_id = Some(line.id);
            vals.location_src_id = production.location_src_id;
            vals.group_id = production.procurement_group_id;
            self.store.insert_move(&vals)?;
        }

        let mut main = NewStockMove::draft(production.product_id, production.product_qty);
        main.state = state;
        main.finished_production_id = Some(production.id);
        main.location_dest_id = production.location_dest_id;
        main.group_id = production.procurement_group_id;
        self.store.insert_move(&main)?;

        for byproduct in &bom.byproducts {
            let qty = self.round_for_product(byproduct.product_id, byproduct.product_qty * factor)?;
            let mut vals = NewStockMove::draft(byproduct.product_id, qty);
            vals.state = state;
            vals.finished_production_id = Some(production.id);
            vals.byproduct_id = Some(byproduct.id);
            vals.location_dest_id = production.location_dest_id;
            vals.group_id = production.procurement_group_id;
            self.store.insert_move(&vals)?;
        }

        Ok(())
    }

    fn round_for_product(&self, product_id: i64, qty: f64) -> EngineResult<f64> {
        let product = self
            .store
            .find_product(product_id)?
            .ok_or_else(|| RepositoryError::not_found("product.product", product_id))?;
        let rounding = self
            .store
            .find_uom(product.uom_id)?
            .map(|u| u.rounding)
            .unwrap_or(0.0);
        Ok(float_round(qty, rounding))
    }

    // ==========================================
    // 确认 / 取消
    // ==========================================

    /// 确认订单: 草稿 → 已确认, 未完成的移动一并确认
    pub fn confirm(&self, production_id: i64) -> EngineResult<ManufacturingOrder> {
        let mut production = self.get(production_id)?;
        if production.state == ProductionState::Draft {
            production.state = ProductionState::Confirmed;
            self.store.write_production(&production)?;
        }

        let move_ids = self.open_move_ids(production.id)?;
        let draft_ids: Vec<i64> = self
            .production_moves(production.id)?
            .into_iter()
            .filter(|m| m.state == MoveState::Draft && move_ids.contains(&m.id))
            .map(|m| m.id)
            .collect();
        self.store.set_moves_state(&draft_ids, MoveState::Confirmed)?;

        tracing::debug!("确认制造订单 {}", production.name);
        Ok(production)
    }

    /// 取消订单及其未完成移动
    ///
    /// 只用于合并/拆分后的源订单, 不写取消通知; 留痕由调用方写入
    pub fn cancel(&self, productions: &[ManufacturingOrder]) -> EngineResult<()> {
        for production in productions {
            let mut current = self.get(production.id)?;
            current.state = ProductionState::Cancel;
            self.store.write_production(&current)?;

            let move_ids = self.open_move_ids(current.id)?;
            self.store.set_moves_state(&move_ids, MoveState::Cancel)?;
            tracing::debug!("取消制造订单 {}", current.name);
        }
        Ok(())
    }

    /// 调整原材料移动的补货方式: 有上游移动 → 按订单, 否则 → 按库存
    pub fn adjust_procure_method(&self, raw_moves: &[StockMove]) -> EngineResult<()> {
        for stock_move in raw_moves {
            let has_origin = !self.store.orig_move_ids(stock_move.id)?.is_empty();
            let method = if has_origin {
                ProcureMethod::MakeToOrder
            } else {
                ProcureMethod::MakeToStock
            };
            if stock_move.procure_method != method {
                let mut updated = stock_move.clone();
                updated.procure_method = method;
                self.store.write_move(&updated)?;
            }
        }
        Ok(())
    }

    // ==========================================
    // 产能
    // ==========================================

    /// 以当前组件库存可生产的数量 (不超过计划数量)
    pub fn production_capacity(&self, production: &ManufacturingOrder) -> EngineResult<f64> {
        let mut capacity = production.product_qty;
        if production.product_qty <= 0.0 {
            return Ok(0.0);
        }

        for stock_move in self.store.raw_moves(production.id)? {
            if stock_move.product_uom_qty <= 0.0 || !stock_move.is_open() {
                continue;
            }
            let per_unit = stock_move.product_uom_qty / production.product_qty;
            let available = self.store.qty_available(stock_move.product_id)?.max(0.0);
            capacity = capacity.min(available / per_unit);
        }

        let rounding = self
            .store
            .find_uom(production.product_uom_id)?
            .map(|u| u.rounding)
            .unwrap_or(0.0);
        // 向下取整到精度步长, 避免显示超出库存的数量
        if rounding > 0.0 {
            let floored = (capacity / rounding + 1e-9).floor() * rounding;
            return Ok(float_round(floored, rounding));
        }
        Ok(capacity)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn production_moves(&self, production_id: i64) -> EngineResult<Vec<StockMove>> {
        let mut moves = self.store.raw_moves(production_id)?;
        moves.extend(self.store.finished_moves(production_id)?);
        Ok(moves)
    }

    fn open_move_ids(&self, production_id: i64) -> EngineResult<Vec<i64>> {
        Ok(self
            .production_moves(production_id)?
            .into_iter()
            .filter(StockMove::is_open)
            .map(|m| m.id)
            .collect())
    }
}

/// 新展开移动的初始状态跟随订单状态
fn move_state_for(state: ProductionState) -> MoveState {
    match state {
        ProductionState::Draft => MoveState::Draft,
        ProductionState::Done => MoveState::Done,
        ProductionState::Cancel => MoveState::Cancel,
        _ => MoveState::Confirmed,
    }
}
