// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
pub mod test_helpers;

use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

use mrp_split_merge::api::ProductionApi;
use mrp_split_merge::app::AppState;
use mrp_split_merge::config::{ConfigManager, MrpSettings};
use mrp_split_merge::db::open_sqlite_connection;
use mrp_split_merge::domain::{ManufacturingOrder, NewProduction, ProductionState};
use mrp_split_merge::engine::ProductionLifecycle;
use mrp_split_merge::logging;
use mrp_split_merge::repository::{ProductionStore, SqliteStore};
use rusqlite::Connection;

pub use test_helpers::*;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 临时库 + AppState; 另开一条连接用于准备数据和断言
pub struct ApiTestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub production_api: Arc<ProductionApi>,
    pub config_manager: Arc<ConfigManager>,
}

impl ApiTestEnv {
    /// 创建测试环境
    pub fn new() -> Result<Self, Box<dyn Error>> {
        logging::init_test();
        let (temp_file, db_path) = create_test_db()?;
        let state = AppState::new(db_path.clone())?;

        Ok(Self {
            _temp_file: temp_file,
            db_path,
            production_api: state.production_api,
            config_manager: state.config_manager,
        })
    }

    /// 打开一条独立连接
    pub fn connect(&self) -> Connection {
        open_sqlite_connection(&self.db_path).expect("无法打开测试数据库")
    }

    /// 创建桌子订单 (默认清单/制造作业类型), 并置为目标状态
    pub fn create_order(
        &self,
        qty: f64,
        state: ProductionState,
        user_id: Option<i64>,
    ) -> ManufacturingOrder {
        let conn = self.connect();
        let store = SqliteStore::new(&conn);
        let settings = MrpSettings::default();

        let vals = NewProduction {
            product_id: PRODUCT_TABLE,
            bom_id: Some(BOM_TABLE),
            product_qty: qty,
            qty_producing: 0.0,
            product_uom_id: UOM_UNITS,
            user_id,
            state,
            origin: None,
            picking_type_id: Some(PICKING_MANUFACTURING),
            date_start: None,
            location_src_id: Some(100),
            location_dest_id: Some(200),
        };
        ProductionLifecycle::new(&store, &settings)
            .create(&vals)
            .expect("创建订单失败")
    }

    /// 直接改写订单 (绕过引擎)
    pub fn overwrite<F>(&self, production_id: i64, change: F)
    where
        F: FnOnce(&mut ManufacturingOrder),
    {
        let conn = self.connect();
        let store = SqliteStore::new(&conn);
        let mut production = store
            .find_production(production_id)
            .expect("查询失败")
            .expect("订单不存在");
        change(&mut production);
        store.write_production(&production).expect("写入失败");
    }

    /// 订单总数
    pub fn production_count(&self) -> i64 {
        count_rows(&self.connect(), "mrp_production")
    }

    /// 移动总数
    pub fn move_count(&self) -> i64 {
        count_rows(&self.connect(), "stock_move")
    }
}
