use super::core::{
    format_datetime, map_move_row, map_production_row, parse_datetime, placeholders,
    SqliteStore, DATETIME_FORMAT, MOVE_COLUMNS, PRODUCTION_COLUMNS,
};
use crate::domain::{
    ActionLog, Bom, BomByproduct, BomLine, ManufacturingOrder, MoveState, NewProduction,
    NewStockMove, PickingType, Product, StockMove, Uom,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::ProductionStore;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Result as SqliteResult};
use std::collections::HashSet;

impl SqliteStore<'_> {
    /// 按条件查询移动
    fn query_moves(&self, where_clause: &str, id: i64) -> RepositoryResult<Vec<StockMove>> {
        let sql = format!(
            "SELECT {} FROM stock_move WHERE {} ORDER BY id ASC",
            MOVE_COLUMNS, where_clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let moves = stmt
            .query_map(params![id], map_move_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(moves)
    }

    /// 按主键集合更新单列
    fn update_moves_column(
        &self,
        column: &str,
        value: Value,
        move_ids: &[i64],
    ) -> RepositoryResult<usize> {
        if move_ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE stock_move SET {} = ?1 WHERE id IN ({})",
            column,
            placeholders(move_ids.len(), 1)
        );
        let mut values = vec![value];
        values.extend(move_ids.iter().map(|id| Value::Integer(*id)));
        let rows = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(rows)
    }

    fn link_ids(&self, select_col: &str, filter_col: &str, move_id: i64) -> RepositoryResult<Vec<i64>> {
        let sql = format!(
            "SELECT {} FROM stock_move_link WHERE {} = ?1 ORDER BY {} ASC",
            select_col, filter_col, select_col
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![move_id], |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(ids)
    }
}

impl ProductionStore for SqliteStore<'_> {
    // ==========================================
    // 制造订单
    // ==========================================

    fn find_production(&self, id: i64) -> RepositoryResult<Option<ManufacturingOrder>> {
        let sql = format!("SELECT {} FROM mrp_production WHERE id = ?1", PRODUCTION_COLUMNS);
        let production = self
            .conn
            .query_row(&sql, params![id], map_production_row)
            .optional()?;
        Ok(production)
    }

    fn browse_productions(&self, ids: &[i64]) -> RepositoryResult<Vec<ManufacturingOrder>> {
        let mut seen = HashSet::with_capacity(ids.len());
        ids.iter()
            .filter(|id| seen.insert(**id))
            .map(|id| {
                self.find_production(*id)?
                    .ok_or_else(|| RepositoryError::not_found("mrp.production", id))
            })
            .collect()
    }

    fn insert_production(
        &self,
        name: &str,
        vals: &NewProduction,
        procurement_group_id: Option<i64>,
    ) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO mrp_production (
                name, product_id, bom_id,
                product_qty, qty_producing, product_uom_id,
                user_id, state, origin,
                picking_type_id, procurement_group_id,
                date_start, location_src_id, location_dest_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                name,
                vals.product_id,
                vals.bom_id,
                vals.product_qty,
                vals.qty_producing,
                vals.product_uom_id,
                vals.user_id,
                vals.state.to_db_str(),
                vals.origin,
                vals.picking_type_id,
                procurement_group_id,
                format_datetime(vals.date_start),
                vals.location_src_id,
                vals.location_dest_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn write_production(&self, production: &ManufacturingOrder) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            r#"
            UPDATE mrp_production SET
                name = ?2, product_id = ?3, bom_id = ?4,
                product_qty = ?5, qty_producing = ?6, product_uom_id = ?7,
                user_id = ?8, state = ?9, origin = ?10,
                picking_type_id = ?11, procurement_group_id = ?12,
                date_start = ?13, location_src_id = ?14, location_dest_id = ?15
            WHERE id = ?1
            "#,
            params![
                production.id,
                production.name,
                production.product_id,
                production.bom_id,
                production.product_qty,
                production.qty_producing,
                production.product_uom_id,
                production.user_id,
                production.state.to_db_str(),
                production.origin,
                production.picking_type_id,
                production.procurement_group_id,
                format_datetime(production.date_start),
                production.location_src_id,
                production.location_dest_id,
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("mrp.production", production.id));
        }
        Ok(())
    }

    fn next_sequence_number(&self, code: &str) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO ir_sequence (code, next_number) VALUES (?1, 1)",
            params![code],
        )?;
        let number: i64 = self.conn.query_row(
            "SELECT next_number FROM ir_sequence WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "UPDATE ir_sequence SET next_number = next_number + 1 WHERE code = ?1",
            params![code],
        )?;
        Ok(number)
    }

    fn create_procurement_group(&self, name: &str) -> RepositoryResult<i64> {
        self.conn.execute(
            "INSERT INTO procurement_group (name) VALUES (?1)",
            params![name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    // ==========================================
    // 库存移动
    // ==========================================

    fn raw_moves(&self, production_id: i64) -> RepositoryResult<Vec<StockMove>> {
        self.query_moves("raw_production_id = ?1", production_id)
    }

    fn finished_moves(&self, production_id: i64) -> RepositoryResult<Vec<StockMove>> {
        self.query_moves("finished_production_id = ?1", production_id)
    }

    fn moves_created_for(&self, production_id: i64) -> RepositoryResult<Vec<StockMove>> {
        self.query_moves("created_production_id = ?1", production_id)
    }

    fn moves_in_group(&self, group_id: i64) -> RepositoryResult<Vec<StockMove>> {
        self.query_moves("group_id = ?1", group_id)
    }

    fn insert_move(&self, vals: &NewStockMove) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO stock_move (
                product_id, product_uom_qty, state,
                raw_production_id, finished_production_id, created_production_id,
                bom_line_id, byproduct_id,
                location_src_id, location_dest_id,
                procure_method, group_id, date_deadline
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                vals.product_id,
                vals.product_uom_qty,
                vals.state.to_db_str(),
                vals.raw_production_id,
                vals.finished_production_id,
                vals.created_production_id,
                vals.bom_line_id,
                vals.byproduct_id,
                vals.location_src_id,
                vals.location_dest_id,
                vals.procure_method.to_db_str(),
                vals.group_id,
                format_datetime(vals.date_deadline),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn write_move(&self, stock_move: &StockMove) -> RepositoryResult<()> {
        let rows = self.conn.execute(
            r#"
            UPDATE stock_move SET
                product_id = ?2, product_uom_qty = ?3, state = ?4,
                raw_production_id = ?5, finished_production_id = ?6, created_production_id = ?7,
                bom_line_id = ?8, byproduct_id = ?9,
                location_src_id = ?10, location_dest_id = ?11,
                procure_method = ?12, group_id = ?13, date_deadline = ?14
            WHERE id = ?1
            "#,
            params![
                stock_move.id,
                stock_move.product_id,
                stock_move.product_uom_qty,
                stock_move.state.to_db_str(),
                stock_move.raw_production_id,
                stock_move.finished_production_id,
                stock_move.created_production_id,
                stock_move.bom_line_id,
                stock_move.byproduct_id,
                stock_move.location_src_id,
                stock_move.location_dest_id,
                stock_move.procure_method.to_db_str(),
                stock_move.group_id,
                format_datetime(stock_move.date_deadline),
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::not_found("stock.move", stock_move.id));
        }
        Ok(())
    }

    fn set_moves_state(&self, move_ids: &[i64], state: MoveState) -> RepositoryResult<()> {
        self.update_moves_column("state", Value::Text(state.to_db_str().to_string()), move_ids)?;
        Ok(())
    }

    fn set_moves_deadline(
        &self,
        move_ids: &[i64],
        date_deadline: Option<NaiveDateTime>,
    ) -> RepositoryResult<()> {
        let value = format_datetime(date_deadline)
            .map(Value::Text)
            .unwrap_or(Value::Null);
        self.update_moves_column("date_deadline", value, move_ids)?;
        Ok(())
    }

    fn repoint_created_production(&self, from_ids: &[i64], to_id: i64) -> RepositoryResult<usize> {
        if from_ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE stock_move SET created_production_id = ?1 WHERE created_production_id IN ({})",
            placeholders(from_ids.len(), 1)
        );
        let mut values = vec![to_id];
        values.extend_from_slice(from_ids);
        let rows = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(rows)
    }

    fn regroup_moves(&self, from_group_ids: &[i64], to_group_id: i64) -> RepositoryResult<usize> {
        if from_group_ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE stock_move SET group_id = ?1 WHERE group_id IN ({})",
            placeholders(from_group_ids.len(), 1)
        );
        let mut values = vec![to_group_id];
        values.extend_from_slice(from_group_ids);
        let rows = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(rows)
    }

    fn dest_move_ids(&self, move_id: i64) -> RepositoryResult<Vec<i64>> {
        self.link_ids("dest_move_id", "orig_move_id", move_id)
    }

    fn orig_move_ids(&self, move_id: i64) -> RepositoryResult<Vec<i64>> {
        self.link_ids("orig_move_id", "dest_move_id", move_id)
    }

    fn set_dest_move_ids(&self, move_id: i64, dest_ids: &[i64]) -> RepositoryResult<()> {
        self.conn.execute(
            "DELETE FROM stock_move_link WHERE orig_move_id = ?1",
            params![move_id],
        )?;
        for dest_id in dest_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO stock_move_link (orig_move_id, dest_move_id) VALUES (?1, ?2)",
                params![move_id, dest_id],
            )?;
        }
        Ok(())
    }

    fn set_orig_move_ids(&self, move_id: i64, orig_ids: &[i64]) -> RepositoryResult<()> {
        self.conn.execute(
            "DELETE FROM stock_move_link WHERE dest_move_id = ?1",
            params![move_id],
        )?;
        for orig_id in orig_ids {
            self.conn.execute(
                "INSERT OR IGNORE INTO stock_move_link (orig_move_id, dest_move_id) VALUES (?1, ?2)",
                params![orig_id, move_id],
            )?;
        }
        Ok(())
    }

    // ==========================================
    // 主数据
    // ==========================================

    fn find_product(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let product = self
            .conn
            .query_row(
                "SELECT id, name, uom_id FROM product WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Product {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        uom_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(product)
    }

    fn find_uom(&self, id: i64) -> RepositoryResult<Option<Uom>> {
        let uom = self
            .conn
            .query_row(
                "SELECT id, name, rounding, factor FROM uom WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Uom {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        rounding: row.get(2)?,
                        factor: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(uom)
    }

    fn find_bom(&self, id: i64) -> RepositoryResult<Option<Bom>> {
        let header: Option<(i64, i64, f64)> = self
            .conn
            .query_row(
                "SELECT id, product_id, product_qty FROM bom WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((bom_id, product_id, product_qty)) = header else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT id, product_id, product_qty FROM bom_line WHERE bom_id = ?1 ORDER BY id ASC",
        )?;
        let lines = stmt
            .query_map(params![bom_id], |row| {
                Ok(BomLine {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    product_qty: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, product_id, product_qty FROM bom_byproduct WHERE bom_id = ?1 ORDER BY id ASC",
        )?;
        let byproducts = stmt
            .query_map(params![bom_id], |row| {
                Ok(BomByproduct {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    product_qty: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(Some(Bom {
            id: bom_id,
            product_id,
            product_qty,
            lines,
            byproducts,
        }))
    }

    fn find_picking_type(&self, id: i64) -> RepositoryResult<Option<PickingType>> {
        let picking_type = self
            .conn
            .query_row(
                r#"
                SELECT id, name, default_location_src_id, default_location_dest_id
                FROM picking_type WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(PickingType {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        default_location_src_id: row.get(2)?,
                        default_location_dest_id: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(picking_type)
    }

    fn qty_available(&self, product_id: i64) -> RepositoryResult<f64> {
        let qty: Option<f64> = self
            .conn
            .query_row(
                "SELECT qty_available FROM product WHERE id = ?1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?;
        qty.ok_or_else(|| RepositoryError::not_found("product.product", product_id))
    }

    // ==========================================
    // 操作日志
    // ==========================================

    fn log_action(&self, log: &ActionLog) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, production_id, action_type, action_ts, actor,
                payload_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.action_id,
                log.production_id,
                log.action_type,
                log.action_ts.format(DATETIME_FORMAT).to_string(),
                log.actor,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;
        Ok(())
    }

    fn action_logs(&self, production_id: i64) -> RepositoryResult<Vec<ActionLog>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT action_id, production_id, action_type, action_ts, actor, payload_json, detail
            FROM action_log
            WHERE production_id = ?1
            ORDER BY action_ts ASC, rowid ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![production_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.into_iter()
            .map(|(action_id, production_id, action_type, ts, actor, payload, detail)| {
                let action_ts = parse_datetime(Some(ts.clone())).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "action_ts".to_string(),
                        message: format!("无法解析时间戳: {}", ts),
                    }
                })?;
                let payload_json = payload
                    .map(|raw| serde_json::from_str(&raw))
                    .transpose()
                    .map_err(|e| RepositoryError::FieldValueError {
                        field: "payload_json".to_string(),
                        message: e.to_string(),
                    })?;
                Ok(ActionLog {
                    action_id,
                    production_id,
                    action_type,
                    action_ts,
                    actor,
                    payload_json,
                    detail,
                })
            })
            .collect()
    }
}
