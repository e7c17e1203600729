// ==========================================
// 制造订单合并/拆分 - 订单操作 API
// ==========================================
// 职责: 宿主入口 (合并、拆分、拆分向导会话)
// 事务: 每个写操作一个 SQLite 事务, 出错即回滚
// 会话: 拆分向导只存在内存中, 提交成功后移除
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, MrpSettings};
use crate::domain::{
    ActionLog, ActionResId, ActionResult, ActionTarget, ManufacturingOrder, SplitMergeOperation,
    MODEL_PRODUCTION, MODEL_PRODUCTION_SPLIT, MODEL_PRODUCTION_SPLIT_MULTI,
};
use crate::engine::{
    MergeEngine, ProductionLifecycle, SplitEngine, SplitMultiWizard, SplitSource, SplitWizard,
    ValidationGate,
};
use crate::i18n::{set_locale, t};
use crate::repository::{ProductionStore, SqliteStore};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// WizardSession - 向导会话
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WizardSession {
    Single(SplitWizard),
    Multi(SplitMultiWizard),
}

// ==========================================
// ProductionApi - 订单操作 API
// ==========================================

/// 订单合并/拆分 API
///
/// 职责：
/// 1. 合并 (action_merge)
/// 2. 拆分入口与固定份数拆分 (action_split / action_split_workorder)
/// 3. 拆分向导会话的编辑与提交
/// 4. 订单与留痕查询
pub struct ProductionApi {
    conn: Arc<Mutex<Connection>>,
    config: Arc<ConfigManager>,
    wizards: Mutex<HashMap<Uuid, WizardSession>>,
}

impl ProductionApi {
    /// 创建新的ProductionApi实例
    pub fn new(conn: Arc<Mutex<Connection>>, config: Arc<ConfigManager>) -> Self {
        Self {
            conn,
            config,
            wizards: Mutex::new(HashMap::new()),
        }
    }

    // ==========================================
    // 合并
    // ==========================================

    /// 合并订单, 返回打开新订单表单的动作
    ///
    /// # 参数
    /// - production_ids: 待合并订单
    /// - acting_user: 操作人 (负责人不一致时成为新订单负责人)
    pub fn action_merge(
        &self,
        production_ids: &[i64],
        acting_user: Option<i64>,
    ) -> ApiResult<ActionResult> {
        let settings = self.load_settings()?;

        let merged = self.with_transaction(|store| {
            Ok(MergeEngine::new(store, &settings, acting_user).merge(production_ids)?)
        })?;

        tracing::info!(
            merged_id = merged.id,
            sources = ?production_ids,
            "合并订单已提交"
        );
        Ok(ActionResult::window(MODEL_PRODUCTION, "form", ActionTarget::Current)
            .with_res_id(ActionResId::Record(merged.id)))
    }

    // ==========================================
    // 拆分入口
    // ==========================================

    /// 拆分入口
    ///
    /// - 单张订单: 打开单订单拆分表单
    /// - 多张订单: 新建多订单向导会话并打开
    pub fn action_split(&self, production_ids: &[i64]) -> ApiResult<ActionResult> {
        if production_ids.is_empty() {
            return Err(ApiError::InvalidInput("订单列表不能为空".to_string()));
        }
        let settings = self.load_settings()?;

        let sources = self.with_transaction(|store| {
            let productions = store.browse_productions(production_ids)?;
            ValidationGate::new(store).check(&productions, SplitMergeOperation::Split)?;

            if productions.len() == 1 {
                return Ok(Vec::new());
            }
            productions
                .iter()
                .map(|p| Ok(SplitSource::load(store, &settings, p.id)?))
                .collect::<ApiResult<Vec<_>>>()
        })?;

        if sources.is_empty() {
            return self.action_open_split_form(production_ids[0]);
        }

        let session = self.register(WizardSession::Multi(SplitMultiWizard::new(sources)))?;
        Ok(
            ActionResult::window(MODEL_PRODUCTION_SPLIT_MULTI, "form", ActionTarget::New)
                .with_name(t("actions.split_productions"))
                .with_res_id(ActionResId::Wizard(session)),
        )
    }

    /// 打开单订单拆分表单
    pub fn action_open_split_form(&self, production_id: i64) -> ApiResult<ActionResult> {
        self.load_settings()?;
        self.get_production(production_id)?;

        Ok(
            ActionResult::window(MODEL_PRODUCTION_SPLIT, "form", ActionTarget::New)
                .with_name(t("actions.split_work_order"))
                .with_context("default_production_id", production_id),
        )
    }

    // ==========================================
    // 拆分向导会话
    // ==========================================

    /// 为单张订单新建拆分向导会话
    pub fn open_split_wizard(&self, production_id: i64) -> ApiResult<Uuid> {
        let settings = self.load_settings()?;
        let source = self.with_connection(|store| Ok(SplitSource::load(store, &settings, production_id)?))?;
        self.register(WizardSession::Single(SplitWizard::new(source)))
    }

    /// 读取单订单向导 (多订单会话需指定订单)
    pub fn get_split_wizard(
        &self,
        session: Uuid,
        production_id: Option<i64>,
    ) -> ApiResult<SplitWizard> {
        self.edit_wizard(session, production_id, |_| Ok(()))
    }

    /// 读取多订单向导
    pub fn get_split_multi(&self, session: Uuid) -> ApiResult<SplitMultiWizard> {
        match self.session(session)? {
            WizardSession::Multi(multi) => Ok(multi),
            WizardSession::Single(_) => Err(ApiError::InvalidInput(format!(
                "会话{}不是多订单拆分向导",
                session
            ))),
        }
    }

    /// 设置拆分份数 (重建明细行), 超过上限时拒绝
    pub fn set_split_count(
        &self,
        session: Uuid,
        production_id: Option<i64>,
        count: i64,
    ) -> ApiResult<SplitWizard> {
        self.load_settings()?;
        self.edit_wizard(session, production_id, |wizard| {
            Ok(wizard.set_quantity_to_split(count)?)
        })
    }

    /// 追加明细行
    pub fn add_split_line(
        &self,
        session: Uuid,
        production_id: Option<i64>,
        quantity: f64,
    ) -> ApiResult<SplitWizard> {
        self.edit_wizard(session, production_id, |wizard| {
            wizard.add_line(quantity);
            Ok(())
        })
    }

    /// 修改明细行
    pub fn update_split_line(
        &self,
        session: Uuid,
        production_id: Option<i64>,
        index: usize,
        quantity: f64,
        user_id: Option<i64>,
        date: Option<NaiveDateTime>,
    ) -> ApiResult<SplitWizard> {
        self.edit_wizard(session, production_id, |wizard| {
            wizard
                .update_line(index, quantity, user_id, date)
                .map(|_| ())
                .ok_or_else(|| ApiError::InvalidInput(format!("明细行下标越界: {}", index)))
        })
    }

    /// 删除明细行
    pub fn remove_split_line(
        &self,
        session: Uuid,
        production_id: Option<i64>,
        index: usize,
    ) -> ApiResult<SplitWizard> {
        self.edit_wizard(session, production_id, |wizard| {
            wizard
                .remove_line(index)
                .map(|_| ())
                .ok_or_else(|| ApiError::InvalidInput(format!("明细行下标越界: {}", index)))
        })
    }

    /// 按向导份数做固定份数拆分, 返回新订单列表动作
    pub fn action_split_workorder(
        &self,
        session: Uuid,
        acting_user: Option<i64>,
    ) -> ApiResult<ActionResult> {
        let wizard = match self.session(session)? {
            WizardSession::Single(wizard) => wizard,
            WizardSession::Multi(_) => {
                return Err(ApiError::InvalidInput(format!(
                    "会话{}不是单订单拆分向导",
                    session
                )))
            }
        };
        let settings = self.load_settings()?;

        let new_ids = self.with_transaction(|store| {
            Ok(SplitEngine::new(store, &settings, acting_user)
                .split_fixed(wizard.production_id(), wizard.quantity_to_split)?)
        })?;
        self.remove_session(session)?;

        tracing::info!(
            production_id = wizard.production_id(),
            count = new_ids.len(),
            "固定份数拆分已提交"
        );
        Ok(
            ActionResult::window(MODEL_PRODUCTION, "tree,form", ActionTarget::Current)
                .with_name(t("actions.manufacturing_orders"))
                .with_res_id(ActionResId::Records(new_ids)),
        )
    }

    /// 提交向导 (单订单或多订单), 返回新建的子订单
    pub fn action_commit_split(
        &self,
        session: Uuid,
        acting_user: Option<i64>,
    ) -> ApiResult<Vec<ManufacturingOrder>> {
        let wizard = self.session(session)?;
        let settings = self.load_settings()?;

        let children = self.with_transaction(|store| {
            let engine = SplitEngine::new(store, &settings, acting_user);
            let children = match &wizard {
                WizardSession::Single(single) => engine.commit_wizard(single)?,
                WizardSession::Multi(multi) => engine.commit_multi(multi)?,
            };
            Ok(children)
        })?;
        self.remove_session(session)?;

        tracing::info!(%session, children = children.len(), "拆分向导已提交");
        Ok(children)
    }

    /// 放弃向导会话
    pub fn discard_wizard(&self, session: Uuid) -> ApiResult<()> {
        self.remove_session(session)?;
        tracing::debug!(%session, "拆分向导已放弃");
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按主键查询订单
    pub fn get_production(&self, production_id: i64) -> ApiResult<ManufacturingOrder> {
        let settings = MrpSettings::default();
        self.with_connection(|store| {
            Ok(ProductionLifecycle::new(store, &settings).get(production_id)?)
        })
    }

    /// 查询订单上的留痕
    pub fn list_action_logs(&self, production_id: i64) -> ApiResult<Vec<ActionLog>> {
        self.with_connection(|store| Ok(store.action_logs(production_id)?))
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 开启事务前读取配置快照并切换语言
    fn load_settings(&self) -> ApiResult<MrpSettings> {
        let settings = self
            .config
            .load_settings()
            .map_err(|e| ApiError::InternalError(format!("配置读取失败: {}", e)))?;
        set_locale(&settings.locale);
        Ok(settings)
    }

    fn with_transaction<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&SqliteStore<'_>) -> ApiResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("锁获取失败: {}", e)))?;
        let tx = conn
            .transaction()
            .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

        // 出错时 tx 随作用域丢弃即回滚
        let result = {
            let store = SqliteStore::new(&tx);
            f(&store)?
        };

        tx.commit()
            .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;
        Ok(result)
    }

    fn with_connection<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&SqliteStore<'_>) -> ApiResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("锁获取失败: {}", e)))?;
        let store = SqliteStore::new(&conn);
        f(&store)
    }

    fn wizards(&self) -> ApiResult<std::sync::MutexGuard<'_, HashMap<Uuid, WizardSession>>> {
        self.wizards
            .lock()
            .map_err(|e| ApiError::InternalError(format!("向导会话锁获取失败: {}", e)))
    }

    fn register(&self, wizard: WizardSession) -> ApiResult<Uuid> {
        let session = Uuid::new_v4();
        self.wizards()?.insert(session, wizard);
        tracing::debug!(%session, "拆分向导会话已创建");
        Ok(session)
    }

    fn session(&self, session: Uuid) -> ApiResult<WizardSession> {
        self.wizards()?
            .get(&session)
            .cloned()
            .ok_or_else(|| ApiError::WizardNotFound(session.to_string()))
    }

    fn remove_session(&self, session: Uuid) -> ApiResult<WizardSession> {
        self.wizards()?
            .remove(&session)
            .ok_or_else(|| ApiError::WizardNotFound(session.to_string()))
    }

    /// 在会话中定位单订单向导并编辑, 返回编辑后的副本
    fn edit_wizard<F>(
        &self,
        session: Uuid,
        production_id: Option<i64>,
        edit: F,
    ) -> ApiResult<SplitWizard>
    where
        F: FnOnce(&mut SplitWizard) -> ApiResult<()>,
    {
        let mut wizards = self.wizards()?;
        let entry = wizards
            .get_mut(&session)
            .ok_or_else(|| ApiError::WizardNotFound(session.to_string()))?;

        let wizard = match entry {
            WizardSession::Single(wizard) => wizard,
            WizardSession::Multi(multi) => {
                let production_id = production_id.ok_or_else(|| {
                    ApiError::InvalidInput("多订单向导需指定订单".to_string())
                })?;
                multi.wizard_mut(production_id).ok_or_else(|| {
                    ApiError::NotFound(format!("向导中不存在订单(id={})", production_id))
                })?
            }
        };

        edit(wizard)?;
        Ok(wizard.clone())
    }
}
