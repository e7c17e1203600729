// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置读取与默认值回退
// ==========================================


use mrp_split_merge::config::{config_keys, ConfigManager, MrpSettings};
use test_helpers::create_test_db;

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[test]
fn test_load_settings_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    // 未写入任何配置时使用默认值
    let settings = config_manager.load_settings().expect("Should load settings");
    assert_eq!(settings, MrpSettings::default());
    assert_eq!(settings.production_name(7), "MO/00007");
}

#[test]
fn test_load_settings_from_config_kv() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_config_value(config_keys::SEQUENCE_PREFIX, "PRD-")
        .unwrap();
    config_manager
        .set_config_value(config_keys::SEQUENCE_PADDING, "4")
        .unwrap();
    config_manager
        .set_config_value(config_keys::UI_LOCALE, "zh-CN")
        .unwrap();

    let settings = config_manager.load_settings().unwrap();
    assert_eq!(settings.locale, "zh-CN");
    assert_eq!(settings.production_name(12), "PRD-0012");
}

#[test]
fn test_malformed_padding_falls_back_to_default() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_config_value(config_keys::SEQUENCE_PADDING, "five")
        .unwrap();

    let settings = config_manager.load_settings().unwrap();
    assert_eq!(
        settings.sequence_padding,
        MrpSettings::default().sequence_padding
    );
}

#[test]
fn test_set_config_value_overwrites() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_config_value(config_keys::SEQUENCE_PREFIX, "A/")
        .unwrap();
    config_manager
        .set_config_value(config_keys::SEQUENCE_PREFIX, "B/")
        .unwrap();

    assert_eq!(
        config_manager
            .get_config_value(config_keys::SEQUENCE_PREFIX)
            .unwrap()
            .as_deref(),
        Some("B/")
    );
    assert!(config_manager
        .get_config_value("unknown.key")
        .unwrap()
        .is_none());
}

#[test]
fn test_config_snapshot_is_json() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_config_value(config_keys::SEQUENCE_PREFIX, "WH/MO/")
        .unwrap();

    let snapshot = config_manager.get_config_snapshot().unwrap();
    let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(value[config_keys::SEQUENCE_PREFIX], "WH/MO/");
}
