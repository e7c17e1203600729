// ==========================================
// 制造订单合并/拆分 - 记录存储接口
// ==========================================
// 红线: Repository 不含业务逻辑
// 事务: 实现方代表一个已开启的事务, 由调用方提交/回滚
// ==========================================

use crate::domain::{
    ActionLog, Bom, ManufacturingOrder, MoveState, NewProduction, NewStockMove, PickingType,
    Product, StockMove, Uom,
};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;

// ==========================================
// ProductionStore - 记录存储接口
// ==========================================
/// 合并/拆分引擎所需的全部记录存储操作
///
/// 引擎只依赖本接口; 事务边界由持有实现的一方 (API 层) 控制,
/// 任一步骤返回 Err 时调用方放弃事务即可整体回滚。
pub trait ProductionStore {
    // ===== 制造订单 =====

    /// 按主键读取订单
    fn find_production(&self, id: i64) -> RepositoryResult<Option<ManufacturingOrder>>;

    /// 按主键批量读取订单
    ///
    /// 保持入参顺序, 重复主键只保留首次出现; 任一不存在返回 NotFound
    fn browse_productions(&self, ids: &[i64]) -> RepositoryResult<Vec<ManufacturingOrder>>;

    /// 插入订单, 返回新主键
    fn insert_production(
        &self,
        name: &str,
        vals: &NewProduction,
        procurement_group_id: Option<i64>,
    ) -> RepositoryResult<i64>;

    /// 整行回写订单
    fn write_production(&self, production: &ManufacturingOrder) -> RepositoryResult<()>;

    /// 取下一个订单编号
    fn next_sequence_number(&self, code: &str) -> RepositoryResult<i64>;

    /// 新建补货组
    fn create_procurement_group(&self, name: &str) -> RepositoryResult<i64>;

    // ===== 库存移动 =====

    /// 订单的原材料消耗移动
    fn raw_moves(&self, production_id: i64) -> RepositoryResult<Vec<StockMove>>;

    /// 订单的成品/副产品产出移动
    fn finished_moves(&self, production_id: i64) -> RepositoryResult<Vec<StockMove>>;

    /// 由订单供货的下游移动 (created_production_id = 订单)
    fn moves_created_for(&self, production_id: i64) -> RepositoryResult<Vec<StockMove>>;

    /// 补货组下的全部移动
    fn moves_in_group(&self, group_id: i64) -> RepositoryResult<Vec<StockMove>>;

    /// 插入移动, 返回新主键
    fn insert_move(&self, vals: &NewStockMove) -> RepositoryResult<i64>;

    /// 整行回写移动
    fn write_move(&self, stock_move: &StockMove) -> RepositoryResult<()>;

    /// 批量设置移动状态
    fn set_moves_state(&self, move_ids: &[i64], state: MoveState) -> RepositoryResult<()>;

    /// 批量设置移动截止日期
    fn set_moves_deadline(
        &self,
        move_ids: &[i64],
        date_deadline: Option<NaiveDateTime>,
    ) -> RepositoryResult<()>;

    /// 将 created_production_id 从一组订单改指向新订单, 返回受影响行数
    fn repoint_created_production(&self, from_ids: &[i64], to_id: i64) -> RepositoryResult<usize>;

    /// 将一组补货组下的移动改挂到新补货组, 返回受影响行数
    fn regroup_moves(&self, from_group_ids: &[i64], to_group_id: i64) -> RepositoryResult<usize>;

    /// 下游移动 (move_dest_ids)
    fn dest_move_ids(&self, move_id: i64) -> RepositoryResult<Vec<i64>>;

    /// 上游移动 (move_orig_ids)
    fn orig_move_ids(&self, move_id: i64) -> RepositoryResult<Vec<i64>>;

    /// 覆盖下游移动集合
    fn set_dest_move_ids(&self, move_id: i64, dest_ids: &[i64]) -> RepositoryResult<()>;

    /// 覆盖上游移动集合
    fn set_orig_move_ids(&self, move_id: i64, orig_ids: &[i64]) -> RepositoryResult<()>;

    // ===== 主数据 =====

    fn find_product(&self, id: i64) -> RepositoryResult<Option<Product>>;

    fn find_uom(&self, id: i64) -> RepositoryResult<Option<Uom>>;

    /// 物料清单 (含组件行与副产品行)
    fn find_bom(&self, id: i64) -> RepositoryResult<Option<Bom>>;

    fn find_picking_type(&self, id: i64) -> RepositoryResult<Option<PickingType>>;

    /// 产品在库数量
    fn qty_available(&self, product_id: i64) -> RepositoryResult<f64>;

    // ===== 操作日志 =====

    /// 在订单上留痕
    fn log_action(&self, log: &ActionLog) -> RepositoryResult<()>;

    /// 订单上的留痕 (按时间升序)
    fn action_logs(&self, production_id: i64) -> RepositoryResult<Vec<ActionLog>>;
}
