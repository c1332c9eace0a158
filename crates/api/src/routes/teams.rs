//! Team management and team progress endpoints

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use cadence_domain::{NewTeam, Role, Team, TeamMember, TeamWeeklyProgress};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{acting_ir, WeekQuery};
use crate::context::AppContext;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/teams", post(create).get(list_visible))
        .route("/teams/{team_id}", put(rename).delete(remove))
        .route("/teams/{team_id}/owner", put(transfer_ownership))
        .route("/teams/{team_id}/members", get(members).post(add_member))
        .route("/teams/{team_id}/members/{ir_id}", axum::routing::delete(remove_member))
        .route("/teams/members/move", post(move_member))
        .route("/teams/{team_id}/progress", get(progress))
}

async fn create(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Json(body): Json<NewTeam>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let actor = acting_ir(&ctx, &headers).await?;
    let team = ctx.teams.create(&actor, body, ctx.now()).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

async fn list_visible(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Team>>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.teams.visible_teams(&actor).await?))
}

#[derive(Deserialize)]
struct RenameRequest {
    name: String,
}

async fn rename(
    State(ctx): State<Arc<AppContext>>,
    Path(team_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<RenameRequest>,
) -> ApiResult<Json<Value>> {
    let actor = acting_ir(&ctx, &headers).await?;
    ctx.teams.rename(&actor, team_id, &body.name).await?;
    Ok(Json(json!({ "team_id": team_id, "name": body.name })))
}

#[derive(Deserialize)]
struct OwnerRequest {
    ir_id: String,
}

async fn transfer_ownership(
    State(ctx): State<Arc<AppContext>>,
    Path(team_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<OwnerRequest>,
) -> ApiResult<Json<Value>> {
    let actor = acting_ir(&ctx, &headers).await?;
    ctx.teams.transfer_ownership(&actor, team_id, &body.ir_id).await?;
    Ok(Json(json!({ "team_id": team_id, "created_by": body.ir_id })))
}

async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Path(team_id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let actor = acting_ir(&ctx, &headers).await?;
    ctx.teams.delete(&actor, team_id).await?;
    Ok(Json(json!({ "message": "team deleted" })))
}

async fn members(
    State(ctx): State<Arc<AppContext>>,
    Path(team_id): Path<i64>,
) -> ApiResult<Json<Vec<TeamMember>>> {
    Ok(Json(ctx.teams.members(team_id).await?))
}

#[derive(Deserialize)]
struct AddMemberRequest {
    ir_id: String,
    role: Role,
}

async fn add_member(
    State(ctx): State<Arc<AppContext>>,
    Path(team_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<TeamMember>)> {
    let actor = acting_ir(&ctx, &headers).await?;
    let member = ctx.teams.add_member(&actor, team_id, &body.ir_id, body.role).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn remove_member(
    State(ctx): State<Arc<AppContext>>,
    Path((team_id, ir_id)): Path<(i64, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let actor = acting_ir(&ctx, &headers).await?;
    ctx.teams.remove_member(&actor, team_id, &ir_id).await?;
    Ok(Json(json!({ "message": "member removed" })))
}

#[derive(Deserialize)]
struct MoveMemberRequest {
    from_team: i64,
    to_team: i64,
    ir_id: String,
    role: Role,
}

async fn move_member(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Json(body): Json<MoveMemberRequest>,
) -> ApiResult<Json<TeamMember>> {
    let actor = acting_ir(&ctx, &headers).await?;
    let member = ctx
        .teams
        .move_member(&actor, body.from_team, body.to_team, &body.ir_id, body.role)
        .await?;
    Ok(Json(member))
}

async fn progress(
    State(ctx): State<Arc<AppContext>>,
    Path(team_id): Path<i64>,
    Query(week): Query<WeekQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<TeamWeeklyProgress>> {
    let actor = acting_ir(&ctx, &headers).await?;
    let key = week.key_or_current(&ctx)?;
    Ok(Json(ctx.reporting.team_weekly_progress(&actor, team_id, key).await?))
}
