use crate::domain::{ManufacturingOrder, MoveState, ProcureMethod, ProductionState, StockMove};
use chrono::NaiveDateTime;
use rusqlite::{Connection, Row};

/// 日期时间存储格式
pub(super) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(super) const PRODUCTION_COLUMNS: &str = r#"
    id, name, product_id, bom_id,
    product_qty, qty_producing, product_uom_id,
    user_id, state, origin,
    picking_type_id, procurement_group_id,
    date_start, location_src_id, location_dest_id
"#;

pub(super) const MOVE_COLUMNS: &str = r#"
    id, product_id, product_uom_qty, state,
    raw_production_id, finished_production_id, created_production_id,
    bom_line_id, byproduct_id,
    location_src_id, location_dest_id,
    procure_method, group_id, date_deadline
"#;

// ==========================================
// SqliteStore - SQLite 记录存储
// ==========================================
/// 基于单个连接 (通常是一个已开启的事务) 的记录存储
///
/// `rusqlite::Transaction` 可解引用为 `Connection`,
/// 因此 API 层以 `SqliteStore::new(&tx)` 把事务边界显式传给引擎。
pub struct SqliteStore<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// 从连接或事务创建存储
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// 底层连接
    pub fn connection(&self) -> &Connection {
        self.conn
    }
}

// ==========================================
// 行映射
// ==========================================

pub(super) fn map_production_row(row: &Row<'_>) -> rusqlite::Result<ManufacturingOrder> {
    Ok(ManufacturingOrder {
        id: row.get(0)?,
        name: row.get(1)?,
        product_id: row.get(2)?,
        bom_id: row.get(3)?,
        product_qty: row.get(4)?,
        qty_producing: row.get(5)?,
        product_uom_id: row.get(6)?,
        user_id: row.get(7)?,
        state: ProductionState::from_str(&row.get::<_, String>(8)?),
        origin: row.get(9)?,
        picking_type_id: row.get(10)?,
        procurement_group_id: row.get(11)?,
        date_start: parse_datetime(row.get::<_, Option<String>>(12)?),
        location_src_id: row.get(13)?,
        location_dest_id: row.get(14)?,
    })
}

pub(super) fn map_move_row(row: &Row<'_>) -> rusqlite::Result<StockMove> {
    Ok(StockMove {
        id: row.get(0)?,
        product_id: row.get(1)?,
        product_uom_qty: row.get(2)?,
        state: MoveState::from_str(&row.get::<_, String>(3)?),
        raw_production_id: row.get(4)?,
        finished_production_id: row.get(5)?,
        created_production_id: row.get(6)?,
        bom_line_id: row.get(7)?,
        byproduct_id: row.get(8)?,
        location_src_id: row.get(9)?,
        location_dest_id: row.get(10)?,
        procure_method: ProcureMethod::from_str(&row.get::<_, String>(11)?),
        group_id: row.get(12)?,
        date_deadline: parse_datetime(row.get::<_, Option<String>>(13)?),
    })
}

// ==========================================
// 辅助函数
// ==========================================

pub(super) fn format_datetime(dt: Option<NaiveDateTime>) -> Option<String> {
    dt.map(|d| d.format(DATETIME_FORMAT).to_string())
}

pub(super) fn parse_datetime(raw: Option<String>) -> Option<NaiveDateTime> {
    raw.and_then(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT).ok())
}

/// 生成 IN 子句占位符: "?1, ?2, ..."
pub(super) fn placeholders(count: usize, offset: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i + offset))
        .collect::<Vec<_>>()
        .join(", ")
}
