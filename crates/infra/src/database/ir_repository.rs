//! SQLite-backed IR repository and registration allow-list.
//!
//! Implements the async `IrRepository` and `ProvisionedIdRepository` ports.
//! Subtree queries compare the stored path prefix with `substr`, so ids
//! containing SQL wildcard characters never need escaping. All queries
//! operate on the shared connection pool provided by `DbManager`.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::hierarchy::ports::{IrRepository, ProvisionedIdRepository};
use cadence_domain::{CadenceError, Ir, ProvisionedId, Result, Role};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Row};
use tokio::task;

use super::manager::DbManager;
use crate::errors::map_sql_error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Async IR repository backed by SQLite.
pub struct SqliteIrRepository {
    db: Arc<DbManager>,
}

impl SqliteIrRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

const INSERT_IR_SQL: &str = "INSERT INTO irs (
        ir_id, ir_name, ir_email, access_level, status,
        parent_ir, hierarchy_path, hierarchy_level, started_date
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const SELECT_IR_COLUMNS: &str = "SELECT ir_id, ir_name, ir_email, access_level, status,
        parent_ir, hierarchy_path, hierarchy_level, started_date
    FROM irs";

const UPDATE_IR_SQL: &str = "UPDATE irs SET
        ir_name = ?2, ir_email = ?3, access_level = ?4, status = ?5,
        parent_ir = ?6, hierarchy_path = ?7, hierarchy_level = ?8, started_date = ?9
    WHERE ir_id = ?1";

const DELETE_IR_SQL: &str = "DELETE FROM irs WHERE ir_id = ?1";

const REWRITE_PATHS_SQL: &str = "UPDATE irs SET
        hierarchy_path = ?2 || substr(hierarchy_path, length(?1) + 1),
        hierarchy_level = hierarchy_level + ?3
    WHERE substr(hierarchy_path, 1, length(?1)) = ?1";

#[async_trait]
impl IrRepository for SqliteIrRepository {
    async fn insert(&self, ir: Ir) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_IR_SQL,
                params![
                    ir.ir_id,
                    ir.ir_name,
                    ir.ir_email,
                    i64::from(ir.access_level.level()),
                    i64::from(ir.status),
                    ir.parent_ir,
                    ir.hierarchy_path,
                    i64::from(ir.hierarchy_level),
                    ir.started_date.format(DATE_FORMAT).to_string(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find(&self, ir_id: &str) -> Result<Option<Ir>> {
        let db = Arc::clone(&self.db);
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<Option<Ir>> {
            let conn = db.get_connection()?;
            let sql = format!("{SELECT_IR_COLUMNS} WHERE ir_id = ?1");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let mut rows =
                stmt.query_map(params![ir_id], map_ir_row).map_err(map_sql_error)?;
            rows.next().transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, ir: &Ir) -> Result<()> {
        let db = Arc::clone(&self.db);
        let ir = ir.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    UPDATE_IR_SQL,
                    params![
                        ir.ir_id,
                        ir.ir_name,
                        ir.ir_email,
                        i64::from(ir.access_level.level()),
                        i64::from(ir.status),
                        ir.parent_ir,
                        ir.hierarchy_path,
                        i64::from(ir.hierarchy_level),
                        ir.started_date.format(DATE_FORMAT).to_string(),
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(CadenceError::NotFound(format!("IR not found: {}", ir.ir_id)));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, ir_id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(DELETE_IR_SQL, params![ir_id]).map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_all(&self) -> Result<Vec<Ir>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<Ir>> {
            let conn = db.get_connection()?;
            let sql = format!("{SELECT_IR_COLUMNS} ORDER BY ir_id");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt.query_map([], map_ir_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<Ir>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_subtree(&self, path_prefix: &str) -> Result<Vec<Ir>> {
        let db = Arc::clone(&self.db);
        let path_prefix = path_prefix.to_string();
        task::spawn_blocking(move || -> Result<Vec<Ir>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "{SELECT_IR_COLUMNS} WHERE substr(hierarchy_path, 1, length(?1)) = ?1
                 ORDER BY hierarchy_path"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows =
                stmt.query_map(params![path_prefix], map_ir_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<Ir>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<Ir>> {
        let db = Arc::clone(&self.db);
        let parent_id = parent_id.to_string();
        task::spawn_blocking(move || -> Result<Vec<Ir>> {
            let conn = db.get_connection()?;
            let sql = format!("{SELECT_IR_COLUMNS} WHERE parent_ir = ?1 ORDER BY ir_id");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows =
                stmt.query_map(params![parent_id], map_ir_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<Ir>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn rewrite_subtree_paths(
        &self,
        old_prefix: &str,
        new_prefix: &str,
        level_delta: i64,
    ) -> Result<usize> {
        let db = Arc::clone(&self.db);
        let old_prefix = old_prefix.to_string();
        let new_prefix = new_prefix.to_string();
        task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            conn.execute(REWRITE_PATHS_SQL, params![old_prefix, new_prefix, level_delta])
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_ir_row(row: &Row<'_>) -> rusqlite::Result<Ir> {
    let level: i64 = row.get(3)?;
    let access_level = Role::from_level(u8::try_from(level).unwrap_or(0)).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(err))
    })?;

    let started: String = row.get(8)?;
    let started_date = NaiveDate::parse_from_str(&started, DATE_FORMAT).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(err))
    })?;

    Ok(Ir {
        ir_id: row.get(0)?,
        ir_name: row.get(1)?,
        ir_email: row.get(2)?,
        access_level,
        status: row.get::<_, i64>(4)? != 0,
        parent_ir: row.get(5)?,
        hierarchy_path: row.get(6)?,
        hierarchy_level: u32::try_from(row.get::<_, i64>(7)?).unwrap_or(0),
        started_date,
    })
}

/// Async registration allow-list backed by SQLite.
pub struct SqliteProvisionedIdRepository {
    db: Arc<DbManager>,
}

impl SqliteProvisionedIdRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProvisionedIdRepository for SqliteProvisionedIdRepository {
    async fn add(&self, ir_id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute("INSERT OR IGNORE INTO provisioned_ids (ir_id) VALUES (?1)", params![
                ir_id
            ])
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn exists(&self, ir_id: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM provisioned_ids WHERE ir_id = ?1",
                    params![ir_id],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            Ok(count > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self) -> Result<Vec<ProvisionedId>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<ProvisionedId>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare("SELECT ir_id FROM provisioned_ids ORDER BY ir_id")
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], |row| Ok(ProvisionedId { ir_id: row.get(0)? }))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<ProvisionedId>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

pub(crate) fn map_join_error(err: task::JoinError) -> CadenceError {
    if err.is_cancelled() {
        CadenceError::Internal("blocking repository task cancelled".into())
    } else {
        CadenceError::Internal(format!("blocking repository task failed: {err}"))
    }
}
