// ==========================================
// 合并流程集成测试
// ==========================================
// 测试范围:
// 1. 合并成功: 数量求和、来源排序、负责人、留痕
// 2. 合并拒绝: 状态不一致、清单不一致、单张订单
// 3. 已确认订单合并、编号配置
// ==========================================

mod helpers;

use helpers::api_test_helper::*;
use mrp_split_merge::api::ApiError;
use mrp_split_merge::config::config_keys;
use mrp_split_merge::domain::{ActionResId, ActionTarget, MoveState, ProductionState, MODEL_PRODUCTION};
use mrp_split_merge::repository::{ProductionStore, SqliteStore};

fn merged_id(action: &mrp_split_merge::domain::ActionResult) -> i64 {
    match action.res_id {
        Some(ActionResId::Record(id)) => id,
        ref other => panic!("unexpected res_id: {:?}", other),
    }
}

// ==========================================
// 合并成功
// ==========================================

#[test]
fn test_merge_two_drafts_成功() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(5.0, ProductionState::Draft, Some(USER_ALICE));
    let b = env.create_order(7.0, ProductionState::Draft, Some(USER_ALICE));

    let action = env
        .production_api
        .action_merge(&[a.id, b.id], Some(USER_ADMIN))
        .expect("合并失败");

    assert_eq!(action.res_model, MODEL_PRODUCTION);
    assert_eq!(action.view_mode, "form");
    assert_eq!(action.target, ActionTarget::Current);

    let merged = env.production_api.get_production(merged_id(&action)).unwrap();
    assert_eq!(merged.product_qty, 12.0);
    assert_eq!(merged.origin.as_deref(), Some("MO/00001,MO/00002"));
    assert_eq!(merged.user_id, Some(USER_ALICE));
    assert_eq!(merged.state, ProductionState::Draft);
    assert_eq!(merged.name, "MO/00003");

    for source in [&a, &b] {
        let after = env.production_api.get_production(source.id).unwrap();
        assert_eq!(after.state, ProductionState::Cancel);

        let logs = env.production_api.list_action_logs(source.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(
            logs[0].detail.as_deref(),
            Some("This production has been merged into MO/00003.")
        );
        assert_eq!(logs[0].actor, Some(USER_ADMIN));
    }
}

#[test]
fn test_merge_confirmed_orders_保持确认() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(2.0, ProductionState::Confirmed, Some(USER_ALICE));
    let b = env.create_order(3.0, ProductionState::Confirmed, Some(USER_BOB));

    let action = env
        .production_api
        .action_merge(&[a.id, b.id], Some(USER_ADMIN))
        .expect("合并失败");
    let merged = env.production_api.get_production(merged_id(&action)).unwrap();

    assert_eq!(merged.state, ProductionState::Confirmed);
    assert_eq!(merged.user_id, Some(USER_ADMIN));

    let conn = env.connect();
    let store = SqliteStore::new(&conn);
    let raw = store.raw_moves(merged.id).unwrap();
    assert_eq!(raw.len(), 2);
    assert!(raw.iter().all(|m| m.state == MoveState::Confirmed));
    let leg = raw.iter().find(|m| m.bom_line_id == Some(BOM_LINE_LEG)).unwrap();
    assert_eq!(leg.product_uom_qty, 20.0);

    // 源订单的移动全部取消
    for source in [&a, &b] {
        assert!(store
            .raw_moves(source.id)
            .unwrap()
            .iter()
            .all(|m| m.state == MoveState::Cancel));
    }
}

#[test]
fn test_merge_uses_configured_sequence() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(1.0, ProductionState::Draft, None);
    let b = env.create_order(1.0, ProductionState::Draft, None);

    env.config_manager
        .set_config_value(config_keys::SEQUENCE_PREFIX, "WH/MO/")
        .unwrap();
    env.config_manager
        .set_config_value(config_keys::SEQUENCE_PADDING, "3")
        .unwrap();

    let action = env
        .production_api
        .action_merge(&[a.id, b.id], None)
        .expect("合并失败");
    let merged = env.production_api.get_production(merged_id(&action)).unwrap();
    assert_eq!(merged.name, "WH/MO/003");
}

// ==========================================
// 合并拒绝
// ==========================================

#[test]
fn test_merge_mixed_states_拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(5.0, ProductionState::Draft, None);
    let b = env.create_order(7.0, ProductionState::Confirmed, None);
    let before = env.production_count();

    let err = env
        .production_api
        .action_merge(&[a.id, b.id], None)
        .unwrap_err();

    assert!(err.is_precondition());
    assert_eq!(
        err.to_string(),
        "You can only merge manufacturing with the same state."
    );
    assert_eq!(env.production_count(), before);
    assert_eq!(
        env.production_api.get_production(a.id).unwrap().state,
        ProductionState::Draft
    );
}

#[test]
fn test_merge_different_boms_拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(5.0, ProductionState::Draft, None);
    let b = env.create_order(7.0, ProductionState::Draft, None);
    env.overwrite(b.id, |p| p.bom_id = Some(BOM_TABLE_ALT));

    let err = env
        .production_api
        .action_merge(&[a.id, b.id], None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "You can only merge manufacturing orders of identical products with same BoM."
    );
}

#[test]
fn test_merge_single_order_拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(5.0, ProductionState::Draft, None);

    let err = env.production_api.action_merge(&[a.id], None).unwrap_err();
    assert!(err.is_precondition());
}

#[test]
fn test_merge_same_order_twice_拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(5.0, ProductionState::Draft, None);
    let before = env.production_count();

    let err = env
        .production_api
        .action_merge(&[a.id, a.id], Some(USER_ADMIN))
        .unwrap_err();

    assert!(err.is_precondition());
    assert_eq!(
        err.to_string(),
        "You need at least two production orders to merge them."
    );
    assert_eq!(env.production_count(), before);

    let after = env.production_api.get_production(a.id).unwrap();
    assert_eq!(after.state, ProductionState::Draft);
    assert_eq!(after.product_qty, 5.0);
    assert!(env.production_api.list_action_logs(a.id).unwrap().is_empty());
}

#[test]
fn test_merge_different_operation_types_拒绝() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(5.0, ProductionState::Draft, None);
    let b = env.create_order(7.0, ProductionState::Draft, None);
    env.overwrite(b.id, |p| p.picking_type_id = Some(PICKING_REWORK));

    let err = env
        .production_api
        .action_merge(&[a.id, b.id], None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "You can only merge manufacturing with the same operation type."
    );
}

#[test]
fn test_merge_unknown_order_not_found() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let a = env.create_order(5.0, ProductionState::Draft, None);

    let err = env
        .production_api
        .action_merge(&[a.id, 999], None)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
