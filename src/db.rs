// ==========================================
// 制造订单合并/拆分 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供幂等建表, 供应用启动与测试共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 幂等建表
///
/// 说明：
/// - 记录存储表 (产品/清单/订单/移动) 与模块自有表 (config_kv / action_log / ir_sequence)
/// - 多次调用不会破坏已有数据
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS ir_sequence (
    code TEXT PRIMARY KEY,
    next_number INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS res_users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS uom (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    rounding REAL NOT NULL CHECK (rounding > 0),
    factor REAL NOT NULL DEFAULT 1.0
);

CREATE TABLE IF NOT EXISTS product (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    uom_id INTEGER NOT NULL REFERENCES uom(id),
    qty_available REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS picking_type (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    default_location_src_id INTEGER,
    default_location_dest_id INTEGER
);

CREATE TABLE IF NOT EXISTS bom (
    id INTEGER PRIMARY KEY,
    product_id INTEGER NOT NULL REFERENCES product(id),
    product_qty REAL NOT NULL DEFAULT 1.0
);

CREATE TABLE IF NOT EXISTS bom_line (
    id INTEGER PRIMARY KEY,
    bom_id INTEGER NOT NULL REFERENCES bom(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES product(id),
    product_qty REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS bom_byproduct (
    id INTEGER PRIMARY KEY,
    bom_id INTEGER NOT NULL REFERENCES bom(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES product(id),
    product_qty REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS procurement_group (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mrp_production (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    product_id INTEGER NOT NULL REFERENCES product(id),
    bom_id INTEGER REFERENCES bom(id),
    product_qty REAL NOT NULL,
    qty_producing REAL NOT NULL DEFAULT 0,
    product_uom_id INTEGER NOT NULL REFERENCES uom(id),
    user_id INTEGER REFERENCES res_users(id),
    state TEXT NOT NULL DEFAULT 'draft',
    origin TEXT,
    picking_type_id INTEGER REFERENCES picking_type(id),
    procurement_group_id INTEGER REFERENCES procurement_group(id),
    date_start TEXT,
    location_src_id INTEGER,
    location_dest_id INTEGER
);

CREATE TABLE IF NOT EXISTS stock_move (
    id INTEGER PRIMARY KEY,
    product_id INTEGER NOT NULL REFERENCES product(id),
    product_uom_qty REAL NOT NULL,
    state TEXT NOT NULL DEFAULT 'draft',
    raw_production_id INTEGER REFERENCES mrp_production(id),
    finished_production_id INTEGER REFERENCES mrp_production(id),
    created_production_id INTEGER REFERENCES mrp_production(id),
    bom_line_id INTEGER REFERENCES bom_line(id),
    byproduct_id INTEGER REFERENCES bom_byproduct(id),
    location_src_id INTEGER,
    location_dest_id INTEGER,
    procure_method TEXT NOT NULL DEFAULT 'make_to_stock',
    group_id INTEGER REFERENCES procurement_group(id),
    date_deadline TEXT
);

CREATE TABLE IF NOT EXISTS stock_move_link (
    orig_move_id INTEGER NOT NULL REFERENCES stock_move(id) ON DELETE CASCADE,
    dest_move_id INTEGER NOT NULL REFERENCES stock_move(id) ON DELETE CASCADE,
    PRIMARY KEY (orig_move_id, dest_move_id)
);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    production_id INTEGER NOT NULL REFERENCES mrp_production(id),
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor INTEGER,
    payload_json TEXT,
    detail TEXT
);

CREATE INDEX IF NOT EXISTS idx_stock_move_raw ON stock_move(raw_production_id);
CREATE INDEX IF NOT EXISTS idx_stock_move_finished ON stock_move(finished_production_id);
CREATE INDEX IF NOT EXISTS idx_stock_move_group ON stock_move(group_id);
CREATE INDEX IF NOT EXISTS idx_action_log_production ON action_log(production_id);
"#;
