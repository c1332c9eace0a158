//! Weekly target endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, put};
use axum::{Json, Router};
use cadence_domain::{CadenceError, TargetScope, TargetUpsert, WeeklyTarget};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{acting_ir, WeekQuery};
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/targets", put(set_target).get(get_target))
        .route("/targets/history", get(target_history))
}

async fn set_target(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Json(body): Json<TargetUpsert>,
) -> ApiResult<Json<WeeklyTarget>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.targets.set_target(&actor, body).await?))
}

/// `?ir_id=` or `?team_id=` selects the scope; exactly one is required.
#[derive(Deserialize)]
struct ScopeQuery {
    ir_id: Option<String>,
    team_id: Option<i64>,
    week: Option<u8>,
    year: Option<i32>,
}

impl ScopeQuery {
    fn scope(&self) -> ApiResult<TargetScope> {
        match (&self.ir_id, self.team_id) {
            (Some(ir_id), None) => Ok(TargetScope::Ir(ir_id.clone())),
            (None, Some(team_id)) => Ok(TargetScope::Team(team_id)),
            _ => Err(ApiError(CadenceError::InvalidInput(
                "provide exactly one of ir_id or team_id".to_string(),
            ))),
        }
    }

    const fn week_query(&self) -> WeekQuery {
        WeekQuery { week: self.week, year: self.year }
    }
}

async fn get_target(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<Value>> {
    let scope = query.scope()?;
    let week = query.week_query().key_or_current(&ctx)?;

    let windows = ctx.targets.week_windows(week)?;
    let target = ctx.targets.get_target(&scope, week).await?;

    Ok(Json(json!({
        "week_info": windows,
        "has_weekly_targets_set": target.is_some(),
        "target": target,
    })))
}

async fn target_history(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<ScopeQuery>,
) -> ApiResult<Json<Vec<WeeklyTarget>>> {
    let scope = query.scope()?;
    Ok(Json(ctx.targets.targets_for_scope(&scope).await?))
}
