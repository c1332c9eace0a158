//! SQLite-backed team repository.
//!
//! Implements the async `TeamRepository` port. Creation timestamps are
//! stored as epoch seconds and materialized back through the week scheme's
//! fixed offset.

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::teams::ports::TeamRepository;
use cadence_domain::{
    CadenceError, Instant, NewTeam, Result, Role, Team, TeamMember, WeekScheme,
};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use tokio::task;

use super::ir_repository::map_join_error;
use super::manager::DbManager;
use crate::errors::map_sql_error;

/// Async team repository backed by SQLite.
pub struct SqliteTeamRepository {
    db: Arc<DbManager>,
    scheme: WeekScheme,
}

impl SqliteTeamRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>, scheme: WeekScheme) -> Self {
        Self { db, scheme }
    }
}

const INSERT_TEAM_SQL: &str =
    "INSERT INTO teams (name, created_by, created_at) VALUES (?1, ?2, ?3)";

const SELECT_TEAM_COLUMNS: &str = "SELECT id, name, created_by, created_at FROM teams";

const SELECT_TEAMS_FOR_IR_SQL: &str = "SELECT t.id, t.name, t.created_by, t.created_at
    FROM teams t
    JOIN team_members m ON m.team_id = t.id
    WHERE m.ir_id = ?1
    ORDER BY t.id";

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    async fn insert(&self, team: NewTeam, created_at: Instant) -> Result<Team> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        task::spawn_blocking(move || -> Result<Team> {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_TEAM_SQL,
                params![team.name, team.created_by, created_at.timestamp()],
            )
            .map_err(map_sql_error)?;
            let id = conn.last_insert_rowid();
            Ok(Team {
                id,
                name: team.name,
                created_by: team.created_by,
                created_at: scheme.instant_from_epoch(created_at.timestamp())?,
            })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find(&self, team_id: i64) -> Result<Option<Team>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        task::spawn_blocking(move || -> Result<Option<Team>> {
            let conn = db.get_connection()?;
            let sql = format!("{SELECT_TEAM_COLUMNS} WHERE id = ?1");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let mut rows = stmt
                .query_map(params![team_id], |row| map_team_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.next().transpose().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_all(&self) -> Result<Vec<Team>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        task::spawn_blocking(move || -> Result<Vec<Team>> {
            let conn = db.get_connection()?;
            let sql = format!("{SELECT_TEAM_COLUMNS} ORDER BY id");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], |row| map_team_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<Team>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn rename(&self, team_id: i64, name: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let name = name.to_string();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute("UPDATE teams SET name = ?2 WHERE id = ?1", params![team_id, name])
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(CadenceError::NotFound(format!("team not found: {team_id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn transfer_ownership(&self, team_id: i64, new_owner: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let new_owner = new_owner.to_string();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE teams SET created_by = ?2 WHERE id = ?1",
                    params![team_id, new_owner],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(CadenceError::NotFound(format!("team not found: {team_id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, team_id: i64) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            // Membership rows fall with the team via ON DELETE CASCADE.
            conn.execute("DELETE FROM teams WHERE id = ?1", params![team_id])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn add_member(&self, member: TeamMember) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO team_members (team_id, ir_id, role) VALUES (?1, ?2, ?3)",
                params![member.team_id, member.ir_id, member.role.to_string()],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove_member(&self, team_id: i64, ir_id: &str) -> Result<()> {
        let db = Arc::clone(&self.db);
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "DELETE FROM team_members WHERE team_id = ?1 AND ir_id = ?2",
                params![team_id, ir_id],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn members(&self, team_id: i64) -> Result<Vec<TeamMember>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> Result<Vec<TeamMember>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT team_id, ir_id, role FROM team_members
                     WHERE team_id = ?1 ORDER BY ir_id",
                )
                .map_err(map_sql_error)?;
            let rows =
                stmt.query_map(params![team_id], map_member_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<TeamMember>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn member_exists(&self, team_id: i64, ir_id: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM team_members WHERE team_id = ?1 AND ir_id = ?2",
                    params![team_id, ir_id],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            Ok(count > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn teams_for_ir(&self, ir_id: &str) -> Result<Vec<Team>> {
        let db = Arc::clone(&self.db);
        let scheme = self.scheme;
        let ir_id = ir_id.to_string();
        task::spawn_blocking(move || -> Result<Vec<Team>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(SELECT_TEAMS_FOR_IR_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![ir_id], |row| map_team_row(row, scheme))
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<Team>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_team_row(row: &Row<'_>, scheme: WeekScheme) -> rusqlite::Result<Team> {
    let created_at = scheme.instant_from_epoch(row.get(3)?).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(err))
    })?;
    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        created_by: row.get(2)?,
        created_at,
    })
}

fn map_member_row(row: &Row<'_>) -> rusqlite::Result<TeamMember> {
    let role: String = row.get(2)?;
    let role = role.parse::<Role>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("invalid role: {err}").into(),
        )
    })?;
    Ok(TeamMember { team_id: row.get(0)?, ir_id: row.get(1)?, role })
}
