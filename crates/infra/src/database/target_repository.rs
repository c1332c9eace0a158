//! SQLite-backed weekly target repository.
//!
//! One row per `(week_number, year)` and scope; the scope is whichever of
//! the `ir_id`/`team_id` columns is non-null. Upserts replace the existing
//! row inside a transaction so the unique week/scope pairing never breaks.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::targets::ports::TargetRepository;
use cadence_domain::{
    CadenceError, Result, TargetScope, WeekKey, WeekScheme, WeeklyTarget,
};
use chrono::Utc;
use rusqlite::types::{Type, Value};
use rusqlite::{params, Row};
use tokio::task;

use super::ir_repository::map_join_error;
use super::manager::DbManager;
use crate::errors::map_sql_error;

/// Async weekly target repository backed by SQLite.
pub struct SqliteTargetRepository {
    db: Arc<DbManager>,
    scheme: WeekScheme,
}

impl SqliteTargetRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>, scheme: WeekScheme) -> Self {
        Self { db, scheme }
    }
}

const INSERT_TARGET_SQL: &str = "INSERT INTO weekly_targets (
        week_number, year, ir_id, team_id,
        info_target, plan_target, uv_target,
        week_start, week_end, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)";

const SELECT_TARGET_COLUMNS: &str = "SELECT id, week_number, year, ir_id, team_id,
        info_target, plan_target, uv_target, week_start, week_end
    FROM weekly_targets";

fn scope_columns(scope: &TargetScope) -> (Option<String>, Option<i64>) {
    match scope {
        TargetScope::Ir(ir_id) => (Some(ir_id.clone()), None),
        TargetScope::Team(team_id) => (None, Some(*team_id)),
    }
}

fn scope_predicate(scope: &TargetScope) -> &'static str {
    match scope {
        TargetScope::Ir(_) => "ir_id = ?3",
        TargetScope::Team(_) => "team_id = ?3",
    }
}

fn scope_value(scope: &TargetScope) -> Value {
    match scope {
        TargetScope::Ir(ir_id) => Value::Text(ir_id.clone()),
        TargetScope::Team(team_id) => Value::Integer(*team_id),
    }
}

#[async_trait]
impl TargetRepository for SqliteTargetRepository {
    async fn upsert(&self, target: WeeklyTarget) -> Result<WeeklyTarget> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<WeeklyTarget> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;

            let (ir_id, team_id) = scope_columns(&target.scope);
            let delete_sql = format!(
                "DELETE FROM weekly_targets
                 WHERE week_number = ?1 AND year = ?2 AND {}",
                scope_predicate(&target.scope)
            );
            tx.execute(
                &delete_sql,
                params![
                    i64::from(target.week.week_number),
                    target.week.year,
                    scope_value(&target.scope)
                ],
            )
            .map_err(map_sql_error)?;

            tx.execute(
                INSERT_TARGET_SQL,
                params![
                    i64::from(target.week.week_number),
                    target.week.year,
                    ir_id,
                    team_id,
                    target.info_target,
                    target.plan_target,
                    target.uv_target,
                    target.week_start.timestamp(),
                    target.week_end.timestamp(),
                    Utc::now().timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            let id = tx.last_insert_rowid();
            tx.commit().map_err(map_sql_error)?;

            Ok(WeeklyTarget { id, ..target })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find(&self, scope: &TargetScope, week: WeekKey) -> Result<Option<WeeklyTarget>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        let scope = scope.clone();
        task::spawn_blocking(move || -> Result<Option<WeeklyTarget>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "{SELECT_TARGET_COLUMNS}
                 WHERE week_number = ?1 AND year = ?2 AND {}",
                scope_predicate(&scope)
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let mut rows = stmt
                .query_map(
                    params![i64::from(week.week_number), week.year, scope_value(&scope)],
                    |row| map_target_row(row, scheme),
                )
                .map_err(map_sql_error)?;
            rows.next().transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_scope(&self, scope: &TargetScope) -> Result<Vec<WeeklyTarget>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        let scope = scope.clone();
        task::spawn_blocking(move || -> Result<Vec<WeeklyTarget>> {
            let conn = db.get_connection()?;
            let predicate = match &scope {
                TargetScope::Ir(_) => "ir_id = ?1",
                TargetScope::Team(_) => "team_id = ?1",
            };
            let sql = format!(
                "{SELECT_TARGET_COLUMNS} WHERE {predicate} ORDER BY year, week_number"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![scope_value(&scope)], |row| map_target_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<WeeklyTarget>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_target_row(row: &Row<'_>, scheme: WeekScheme) -> rusqlite::Result<WeeklyTarget> {
    let week_number: i64 = row.get(1)?;
    let week = WeekKey::new(u8::try_from(week_number).unwrap_or(0), row.get(2)?);

    let ir_id: Option<String> = row.get(3)?;
    let team_id: Option<i64> = row.get(4)?;
    let scope = match (ir_id, team_id) {
        (Some(id), _) => TargetScope::Ir(id),
        (None, Some(id)) => TargetScope::Team(id),
        (None, None) => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Null,
                Box::new(CadenceError::Database("target row without a scope".into())),
            ))
        }
    };

    let week_start = scheme.instant_from_epoch(row.get(8)?).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(8, Type::Integer, Box::new(err))
    })?;
    let week_end = scheme.instant_from_epoch(row.get(9)?).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(9, Type::Integer, Box::new(err))
    })?;

    Ok(WeeklyTarget {
        id: row.get(0)?,
        week,
        scope,
        info_target: row.get(5)?,
        plan_target: row.get(6)?,
        uv_target: row.get(7)?,
        week_start,
        week_end,
    })
}
