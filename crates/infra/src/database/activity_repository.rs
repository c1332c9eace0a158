//! SQLite-backed activity detail repository.
//!
//! Implements the async `ActivityRepository` port for Info, Plan, and UV
//! records. Window filtering translates a `WindowSpec` literally: the end
//! bound becomes `<=` or `<` depending on `end_inclusive`, which is what
//! keeps the inclusive Friday 23:45 tail and the half-open rollover
//! arithmetic from drifting apart in SQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::reporting::ports::ActivityRepository;
use cadence_domain::{
    CadenceError, InfoDetail, InfoResponse, InfoType, PlanDetail, PlanStatus, Result, UvDetail,
    WeekScheme, WindowSpec,
};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Row};
use tokio::task;

use super::ir_repository::map_join_error;
use super::manager::DbManager;
use super::pool::SqliteConnection;
use crate::errors::map_sql_error;

/// Async activity repository backed by SQLite.
pub struct SqliteActivityRepository {
    db: Arc<DbManager>,
    scheme: WeekScheme,
}

impl SqliteActivityRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>, scheme: WeekScheme) -> Self {
        Self { db, scheme }
    }
}

const INSERT_INFO_SQL: &str = "INSERT INTO info_details
        (ir_id, recorded_at, response, info_type, client_name, comments)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const SELECT_INFO_COLUMNS: &str =
    "SELECT id, ir_id, recorded_at, response, info_type, client_name, comments
    FROM info_details";

const UPDATE_INFO_SQL: &str = "UPDATE info_details SET
        recorded_at = ?2, response = ?3, info_type = ?4, client_name = ?5, comments = ?6
    WHERE id = ?1";

const INSERT_PLAN_SQL: &str = "INSERT INTO plan_details
        (ir_id, recorded_at, plan_name, status, comments)
    VALUES (?1, ?2, ?3, ?4, ?5)";

const SELECT_PLAN_COLUMNS: &str =
    "SELECT id, ir_id, recorded_at, plan_name, status, comments FROM plan_details";

const UPDATE_PLAN_SQL: &str = "UPDATE plan_details SET
        recorded_at = ?2, plan_name = ?3, status = ?4, comments = ?5
    WHERE id = ?1";

const INSERT_UV_SQL: &str = "INSERT INTO uv_details
        (ir_id, recorded_at, prospect_name, uv_count, comments)
    VALUES (?1, ?2, ?3, ?4, ?5)";

const SELECT_UV_COLUMNS: &str =
    "SELECT id, ir_id, recorded_at, prospect_name, uv_count, comments FROM uv_details";

/// End-bound operator for a window, honoring `end_inclusive` literally.
fn end_op(window: &WindowSpec) -> &'static str {
    if window.end_inclusive {
        "<="
    } else {
        "<"
    }
}

fn window_filter(window: Option<&WindowSpec>) -> (String, Vec<Value>) {
    match window {
        Some(w) => (
            format!(" AND recorded_at >= ? AND recorded_at {} ?", end_op(w)),
            vec![Value::Integer(w.start.timestamp()), Value::Integer(w.end.timestamp())],
        ),
        None => (String::new(), Vec::new()),
    }
}

/// Per-IR aggregate (`COUNT(*)` or `SUM(...)`) over one window.
fn aggregate_by_ir(
    conn: &SqliteConnection,
    table: &str,
    value_expr: &str,
    ir_ids: &[String],
    window: &WindowSpec,
) -> Result<HashMap<String, i64>> {
    if ir_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; ir_ids.len()].join(", ");
    let sql = format!(
        "SELECT ir_id, {value_expr} FROM {table}
         WHERE recorded_at >= ? AND recorded_at {} ? AND ir_id IN ({placeholders})
         GROUP BY ir_id",
        end_op(window)
    );

    let mut values = Vec::with_capacity(ir_ids.len() + 2);
    values.push(Value::Integer(window.start.timestamp()));
    values.push(Value::Integer(window.end.timestamp()));
    values.extend(ir_ids.iter().map(|id| Value::Text(id.clone())));

    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params_from_iter(values), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(map_sql_error)?;

    let mut result = HashMap::new();
    for row in rows {
        let (ir_id, value) = row.map_err(map_sql_error)?;
        result.insert(ir_id, value);
    }
    Ok(result)
}

#[async_trait]
impl ActivityRepository for SqliteActivityRepository {
    async fn insert_info(&self, detail: InfoDetail) -> Result<InfoDetail> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<InfoDetail> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_INFO_SQL,
                params![
                    detail.ir_id,
                    detail.recorded_at.timestamp(),
                    detail.response.to_string(),
                    detail.info_type.to_string(),
                    detail.client_name,
                    detail.comments,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(InfoDetail { id: conn.last_insert_rowid(), ..detail })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert_plan(&self, detail: PlanDetail) -> Result<PlanDetail> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<PlanDetail> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_PLAN_SQL,
                params![
                    detail.ir_id,
                    detail.recorded_at.timestamp(),
                    detail.plan_name,
                    detail.status.to_string(),
                    detail.comments,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(PlanDetail { id: conn.last_insert_rowid(), ..detail })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert_uv(&self, detail: UvDetail) -> Result<UvDetail> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<UvDetail> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_UV_SQL,
                params![
                    detail.ir_id,
                    detail.recorded_at.timestamp(),
                    detail.prospect_name,
                    detail.uv_count,
                    detail.comments,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(UvDetail { id: conn.last_insert_rowid(), ..detail })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_infos(
        &self,
        ir_id: &str,
        window: Option<WindowSpec>,
    ) -> Result<Vec<InfoDetail>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<Vec<InfoDetail>> {
            let conn = db.get_connection()?;
            let (filter, mut values) = window_filter(window.as_ref());
            values.insert(0, Value::Text(ir_id));
            let sql =
                format!("{SELECT_INFO_COLUMNS} WHERE ir_id = ?{filter} ORDER BY recorded_at");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params_from_iter(values), |row| map_info_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<InfoDetail>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_plans(
        &self,
        ir_id: &str,
        window: Option<WindowSpec>,
    ) -> Result<Vec<PlanDetail>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<Vec<PlanDetail>> {
            let conn = db.get_connection()?;
            let (filter, mut values) = window_filter(window.as_ref());
            values.insert(0, Value::Text(ir_id));
            let sql =
                format!("{SELECT_PLAN_COLUMNS} WHERE ir_id = ?{filter} ORDER BY recorded_at");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params_from_iter(values), |row| map_plan_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<PlanDetail>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_uvs(&self, ir_id: &str, window: Option<WindowSpec>) -> Result<Vec<UvDetail>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<Vec<UvDetail>> {
            let conn = db.get_connection()?;
            let (filter, mut values) = window_filter(window.as_ref());
            values.insert(0, Value::Text(ir_id));
            let sql = format!("{SELECT_UV_COLUMNS} WHERE ir_id = ?{filter} ORDER BY recorded_at");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params_from_iter(values), |row| map_uv_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<UvDetail>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn count_infos(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>> {
        let db = Arc::clone(&self.db);
        let ir_ids = ir_ids.to_vec();
        task::spawn_blocking(move || -> Result<HashMap<String, i64>> {
            let conn = db.get_connection()?;
            aggregate_by_ir(&conn, "info_details", "COUNT(*)", &ir_ids, &window)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn count_plans(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>> {
        let db = Arc::clone(&self.db);
        let ir_ids = ir_ids.to_vec();
        task::spawn_blocking(move || -> Result<HashMap<String, i64>> {
            let conn = db.get_connection()?;
            aggregate_by_ir(&conn, "plan_details", "COUNT(*)", &ir_ids, &window)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn sum_uvs(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>> {
        let db = Arc::clone(&self.db);
        let ir_ids = ir_ids.to_vec();
        task::spawn_blocking(move || -> Result<HashMap<String, i64>> {
            let conn = db.get_connection()?;
            aggregate_by_ir(&conn, "uv_details", "COALESCE(SUM(uv_count), 0)", &ir_ids, &window)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_info(&self, detail: &InfoDetail) -> Result<()> {
        let db = Arc::clone(&self.db);
        let detail = detail.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    UPDATE_INFO_SQL,
                    params![
                        detail.id,
                        detail.recorded_at.timestamp(),
                        detail.response.to_string(),
                        detail.info_type.to_string(),
                        detail.client_name,
                        detail.comments,
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(CadenceError::NotFound(format!(
                    "info record not found: {}",
                    detail.id
                )));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_plan(&self, detail: &PlanDetail) -> Result<()> {
        let db = Arc::clone(&self.db);
        let detail = detail.clone();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    UPDATE_PLAN_SQL,
                    params![
                        detail.id,
                        detail.recorded_at.timestamp(),
                        detail.plan_name,
                        detail.status.to_string(),
                        detail.comments,
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(CadenceError::NotFound(format!(
                    "plan record not found: {}",
                    detail.id
                )));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete_info(&self, id: i64) -> Result<()> {
        self.delete_row("info_details", id).await
    }

    async fn delete_plan(&self, id: i64) -> Result<()> {
        self.delete_row("plan_details", id).await
    }

    async fn delete_uv(&self, id: i64) -> Result<()> {
        self.delete_row("uv_details", id).await
    }

    async fn find_info(&self, id: i64) -> Result<Option<InfoDetail>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        task::spawn_blocking(move || -> Result<Option<InfoDetail>> {
            let conn = db.get_connection()?;
            let sql = format!("{SELECT_INFO_COLUMNS} WHERE id = ?1");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let mut rows = stmt
                .query_map(params![id], |row| map_info_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.next().transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_plan(&self, id: i64) -> Result<Option<PlanDetail>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        task::spawn_blocking(move || -> Result<Option<PlanDetail>> {
            let conn = db.get_connection()?;
            let sql = format!("{SELECT_PLAN_COLUMNS} WHERE id = ?1");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let mut rows = stmt
                .query_map(params![id], |row| map_plan_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.next().transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_uv(&self, id: i64) -> Result<Option<UvDetail>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        task::spawn_blocking(move || -> Result<Option<UvDetail>> {
            let conn = db.get_connection()?;
            let sql = format!("{SELECT_UV_COLUMNS} WHERE id = ?1");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let mut rows = stmt
                .query_map(params![id], |row| map_uv_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.next().transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

impl SqliteActivityRepository {
    async fn delete_row(&self, table: &'static str, id: i64) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let sql = format!("DELETE FROM {table} WHERE id = ?1");
            let changed = conn.execute(&sql, params![id]).map_err(map_sql_error)?;
            if changed == 0 {
                return Err(CadenceError::NotFound(format!("record not found: {id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn instant_column(
    row: &Row<'_>,
    idx: usize,
    scheme: WeekScheme,
) -> rusqlite::Result<cadence_domain::Instant> {
    scheme.instant_from_epoch(row.get(idx)?).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err))
    })
}

fn parse_column<T: std::str::FromStr<Err = String>>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into()))
}

fn map_info_row(row: &Row<'_>, scheme: WeekScheme) -> rusqlite::Result<InfoDetail> {
    Ok(InfoDetail {
        id: row.get(0)?,
        ir_id: row.get(1)?,
        recorded_at: instant_column(row, 2, scheme)?,
        response: parse_column::<InfoResponse>(row, 3)?,
        info_type: parse_column::<InfoType>(row, 4)?,
        client_name: row.get(5)?,
        comments: row.get(6)?,
    })
}

fn map_plan_row(row: &Row<'_>, scheme: WeekScheme) -> rusqlite::Result<PlanDetail> {
    Ok(PlanDetail {
        id: row.get(0)?,
        ir_id: row.get(1)?,
        recorded_at: instant_column(row, 2, scheme)?,
        plan_name: row.get(3)?,
        status: parse_column::<PlanStatus>(row, 4)?,
        comments: row.get(5)?,
    })
}

fn map_uv_row(row: &Row<'_>, scheme: WeekScheme) -> rusqlite::Result<UvDetail> {
    Ok(UvDetail {
        id: row.get(0)?,
        ir_id: row.get(1)?,
        recorded_at: instant_column(row, 2, scheme)?,
        prospect_name: row.get(3)?,
        uv_count: row.get(4)?,
        comments: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use cadence_core::hierarchy::ports::IrRepository;
    use cadence_domain::{Instant, Ir, Role, WeekKey};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::database::ir_repository::SqliteIrRepository;

    async fn setup() -> (SqliteActivityRepository, Arc<DbManager>, TempDir) {
        let temp_dir = TempDir::new().expect("tempdir created");
        let db_path = temp_dir.path().join("cadence.db");

        let manager = Arc::new(DbManager::new(&db_path, 4).expect("db manager created"));
        manager.run_migrations().expect("migrations run");

        let irs = SqliteIrRepository::new(manager.clone());
        for ir_id in ["REP1", "REP2"] {
            irs.insert(Ir {
                ir_id: ir_id.to_string(),
                ir_name: format!("{ir_id} name"),
                ir_email: format!("{}@example.com", ir_id.to_lowercase()),
                access_level: Role::Ir,
                status: true,
                parent_ir: None,
                hierarchy_path: format!("/{ir_id}/"),
                hierarchy_level: 0,
                started_date: NaiveDate::from_ymd_opt(2026, 1, 5).expect("date valid"),
            })
            .await
            .expect("ir seeded");
        }

        let repo = SqliteActivityRepository::new(manager.clone(), WeekScheme::default());
        (repo, manager, temp_dir)
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Instant {
        let scheme = WeekScheme::default();
        scheme
            .parse_instant(&format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}+05:30"))
            .expect("instant valid")
    }

    fn info(ir_id: &str, recorded_at: Instant) -> InfoDetail {
        InfoDetail {
            id: 0,
            ir_id: ir_id.to_string(),
            recorded_at,
            response: InfoResponse::A,
            info_type: InfoType::Fresh,
            client_name: "client".to_string(),
            comments: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn windowed_count_honors_the_inclusive_end() {
        let (repo, _manager, _temp_dir) = setup().await;
        let scheme = WeekScheme::default();
        let window = scheme.friday_window(WeekKey::new(1, 2026)).expect("window");

        // Window for week 1 of 2026: [Jan 2 21:30, Jan 9 23:45] inclusive.
        repo.insert_info(info("REP1", at(2026, 1, 2, 21, 30, 0))).await.expect("first instant");
        repo.insert_info(info("REP1", at(2026, 1, 9, 23, 45, 0))).await.expect("last instant");
        repo.insert_info(info("REP1", at(2026, 1, 9, 23, 45, 1))).await.expect("past the end");
        repo.insert_info(info("REP1", at(2026, 1, 2, 21, 29, 59))).await.expect("before start");
        repo.insert_info(info("REP2", at(2026, 1, 5, 12, 0, 0))).await.expect("other ir");

        let ids = vec!["REP1".to_string(), "REP2".to_string()];
        let counts = repo.count_infos(&ids, window).await.expect("counts");
        assert_eq!(counts.get("REP1"), Some(&2));
        assert_eq!(counts.get("REP2"), Some(&1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn listing_with_a_window_filters_rows() {
        let (repo, _manager, _temp_dir) = setup().await;
        let scheme = WeekScheme::default();
        let window = scheme.monday_window(WeekKey::new(2, 2026)).expect("window");

        let inside = PlanDetail {
            id: 0,
            ir_id: "REP1".to_string(),
            recorded_at: at(2026, 1, 5, 0, 0, 0),
            plan_name: Some("visit".to_string()),
            status: PlanStatus::ClosingPending,
            comments: None,
        };
        let outside = PlanDetail { recorded_at: at(2026, 1, 12, 0, 0, 0), ..inside.clone() };
        repo.insert_plan(inside).await.expect("inside inserted");
        repo.insert_plan(outside).await.expect("outside inserted");

        let rows = repo.list_plans("REP1", Some(window)).await.expect("windowed list");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recorded_at, at(2026, 1, 5, 0, 0, 0));

        let all = repo.list_plans("REP1", None).await.expect("full list");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn uv_sums_aggregate_counts_not_rows() {
        let (repo, _manager, _temp_dir) = setup().await;
        let scheme = WeekScheme::default();
        let window = scheme.friday_window(WeekKey::new(1, 2026)).expect("window");

        for count in [3, 2] {
            repo.insert_uv(UvDetail {
                id: 0,
                ir_id: "REP1".to_string(),
                recorded_at: at(2026, 1, 5, 10, 0, 0),
                prospect_name: "prospect".to_string(),
                uv_count: count,
                comments: None,
            })
            .await
            .expect("uv inserted");
        }

        let ids = vec!["REP1".to_string()];
        let sums = repo.sum_uvs(&ids, window).await.expect("sums");
        assert_eq!(sums.get("REP1"), Some(&5));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn round_trips_enum_and_timestamp_columns() {
        let (repo, _manager, _temp_dir) = setup().await;
        let recorded_at = at(2026, 1, 5, 10, 0, 0);

        let inserted = repo
            .insert_info(InfoDetail {
                id: 0,
                ir_id: "REP1".to_string(),
                recorded_at,
                response: InfoResponse::B,
                info_type: InfoType::ReInfo,
                client_name: "client".to_string(),
                comments: Some("warm lead".to_string()),
            })
            .await
            .expect("inserted");
        assert!(inserted.id > 0);

        let fetched =
            repo.find_info(inserted.id).await.expect("find").expect("present");
        assert_eq!(fetched.recorded_at, recorded_at);
        assert_eq!(fetched.response, InfoResponse::B);
        assert_eq!(fetched.info_type, InfoType::ReInfo);
        assert_eq!(fetched.comments.as_deref(), Some("warm lead"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_and_delete_target_single_rows() {
        let (repo, _manager, _temp_dir) = setup().await;

        let inserted = repo
            .insert_info(info("REP1", at(2026, 1, 5, 10, 0, 0)))
            .await
            .expect("inserted");

        let mut updated = inserted.clone();
        updated.response = InfoResponse::C;
        repo.update_info(&updated).await.expect("update succeeds");
        let fetched =
            repo.find_info(inserted.id).await.expect("find").expect("present");
        assert_eq!(fetched.response, InfoResponse::C);

        repo.delete_info(inserted.id).await.expect("delete succeeds");
        assert!(repo.find_info(inserted.id).await.expect("find").is_none());

        let err = repo.delete_info(inserted.id).await.expect_err("second delete fails");
        assert!(matches!(err, CadenceError::NotFound(_)));
    }
}
