// ==========================================
// 单元测试公共夹具
// ==========================================
// 内存 SQLite + 家具制造示例主数据:
// 桌子 = 4 条桌腿 + 1 块桌面, 副产品 0.5 木屑
// ==========================================

use crate::config::MrpSettings;
use crate::db::{configure_sqlite_connection, init_schema};
use crate::domain::{ManufacturingOrder, NewProduction, ProductionState};
use crate::engine::ProductionLifecycle;
use crate::repository::{ProductionStore, SqliteStore};
use rusqlite::Connection;

pub struct Fixture {
    pub conn: Connection,

    pub units: i64,
    pub dozens: i64,

    pub table: i64,
    pub leg: i64,
    pub top: i64,
    pub sawdust: i64,
    pub chair: i64,

    pub bom: i64,
    pub leg_line: i64,
    pub top_line: i64,
    pub sawdust_byproduct: i64,
    pub alt_bom: i64,
    pub chair_bom: i64,

    pub mfg_type: i64,
    pub rework_type: i64,

    pub admin: i64,
    pub alice: i64,
    pub bob: i64,
}

pub fn setup() -> Fixture {
    let conn = Connection::open_in_memory().unwrap();
    configure_sqlite_connection(&conn).unwrap();
    init_schema(&conn).unwrap();

    conn.execute_batch(
        r#"
        INSERT INTO uom (id, name, rounding, factor) VALUES (1, 'Units', 0.01, 1.0);
        INSERT INTO uom (id, name, rounding, factor) VALUES (2, 'Dozens', 0.01, 0.0833333333333333);

        INSERT INTO res_users (id, name) VALUES (1, 'Administrator');
        INSERT INTO res_users (id, name) VALUES (2, 'Alice');
        INSERT INTO res_users (id, name) VALUES (3, 'Bob');

        INSERT INTO product (id, name, uom_id, qty_available) VALUES (10, 'Table', 1, 0);
        INSERT INTO product (id, name, uom_id, qty_available) VALUES (11, 'Table Leg', 1, 40);
        INSERT INTO product (id, name, uom_id, qty_available) VALUES (12, 'Table Top', 1, 3);
        INSERT INTO product (id, name, uom_id, qty_available) VALUES (13, 'Sawdust', 1, 0);
        INSERT INTO product (id, name, uom_id, qty_available) VALUES (14, 'Chair', 1, 0);

        INSERT INTO picking_type (id, name, default_location_src_id, default_location_dest_id)
            VALUES (1, 'Manufacturing', 100, 200);
        INSERT INTO picking_type (id, name, default_location_src_id, default_location_dest_id)
            VALUES (2, 'Rework', 101, 201);

        INSERT INTO bom (id, product_id, product_qty) VALUES (1, 10, 1.0);
        INSERT INTO bom_line (id, bom_id, product_id, product_qty) VALUES (1, 1, 11, 4.0);
        INSERT INTO bom_line (id, bom_id, product_id, product_qty) VALUES (2, 1, 12, 1.0);
        INSERT INTO bom_byproduct (id, bom_id, product_id, product_qty) VALUES (1, 1, 13, 0.5);

        INSERT INTO bom (id, product_id, product_qty) VALUES (2, 10, 1.0);
        INSERT INTO bom_line (id, bom_id, product_id, product_qty) VALUES (3, 2, 11, 4.0);

        INSERT INTO bom (id, product_id, product_qty) VALUES (3, 14, 1.0);
        INSERT INTO bom_line (id, bom_id, product_id, product_qty) VALUES (4, 3, 11, 4.0);
        "#,
    )
    .unwrap();

    Fixture {
        conn,
        units: 1,
        dozens: 2,
        table: 10,
        leg: 11,
        top: 12,
        sawdust: 13,
        chair: 14,
        bom: 1,
        leg_line: 1,
        top_line: 2,
        sawdust_byproduct: 1,
        alt_bom: 2,
        chair_bom: 3,
        mfg_type: 1,
        rework_type: 2,
        admin: 1,
        alice: 2,
        bob: 3,
    }
}

/// 桌子订单的创建参数 (默认制造作业类型)
pub fn table_order(fx: &Fixture, qty: f64, user_id: Option<i64>) -> NewProduction {
    NewProduction {
        product_id: fx.table,
        bom_id: Some(fx.bom),
        product_qty: qty,
        qty_producing: 0.0,
        product_uom_id: fx.units,
        user_id,
        state: ProductionState::Draft,
        origin: None,
        picking_type_id: Some(fx.mfg_type),
        date_start: None,
        location_src_id: Some(100),
        location_dest_id: Some(200),
    }
}

/// 创建订单并直接置为目标状态
pub fn create_order(
    store: &SqliteStore<'_>,
    fx: &Fixture,
    qty: f64,
    state: ProductionState,
    user_id: Option<i64>,
) -> ManufacturingOrder {
    let settings = MrpSettings::default();
    let lifecycle = ProductionLifecycle::new(store, &settings);

    let mut vals = table_order(fx, qty, user_id);
    vals.state = state;
    lifecycle.create(&vals).unwrap()
}

/// 直接改写订单字段 (绕过引擎, 用于构造边界数据)
pub fn overwrite<F>(store: &SqliteStore<'_>, production_id: i64, change: F) -> ManufacturingOrder
where
    F: FnOnce(&mut ManufacturingOrder),
{
    let mut production = store.find_production(production_id).unwrap().unwrap();
    change(&mut production);
    store.write_production(&production).unwrap();
    production
}
