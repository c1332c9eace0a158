//! Activity detail endpoints: Info, Plan, and UV records
//!
//! Listing endpoints accept an optional `?week=&year=` pair; Info and UV
//! listings filter by the week's Friday window, Plan listings by its Monday
//! window.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use cadence_domain::{
    Dashboard, InfoDetail, IrWeeklyProgress, NewInfoDetail, NewPlanDetail, NewUvDetail,
    PlanDetail, UvDetail,
};
use serde_json::{json, Value};

use super::{acting_ir, WeekQuery};
use crate::context::AppContext;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/irs/{ir_id}/infos", post(add_infos).get(list_infos))
        .route("/irs/{ir_id}/plans", post(add_plans).get(list_plans))
        .route("/irs/{ir_id}/uvs", post(add_uv).get(list_uvs))
        .route("/infos/{id}", put(update_info).delete(delete_info))
        .route("/plans/{id}", put(update_plan).delete(delete_plan))
        .route("/uvs/{id}", delete(delete_uv))
        .route("/irs/{ir_id}/progress", get(ir_progress))
        .route("/irs/{ir_id}/dashboard", get(dashboard))
}

async fn add_infos(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
    Json(batch): Json<Vec<NewInfoDetail>>,
) -> ApiResult<(StatusCode, Json<Vec<InfoDetail>>)> {
    let actor = acting_ir(&ctx, &headers).await?;
    let created = ctx.reporting.record_infos(&actor, &ir_id, batch, ctx.now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_infos(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    Query(week): Query<WeekQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<InfoDetail>>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.reporting.list_infos(&actor, &ir_id, week.key()?).await?))
}

async fn add_plans(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
    Json(batch): Json<Vec<NewPlanDetail>>,
) -> ApiResult<(StatusCode, Json<Vec<PlanDetail>>)> {
    let actor = acting_ir(&ctx, &headers).await?;
    let created = ctx.reporting.record_plans(&actor, &ir_id, batch, ctx.now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_plans(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    Query(week): Query<WeekQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PlanDetail>>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.reporting.list_plans(&actor, &ir_id, week.key()?).await?))
}

async fn add_uv(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<NewUvDetail>,
) -> ApiResult<(StatusCode, Json<UvDetail>)> {
    let actor = acting_ir(&ctx, &headers).await?;
    let created = ctx.reporting.record_uv(&actor, &ir_id, payload, ctx.now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_uvs(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    Query(week): Query<WeekQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<UvDetail>>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.reporting.list_uvs(&actor, &ir_id, week.key()?).await?))
}

async fn update_info(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<NewInfoDetail>,
) -> ApiResult<Json<InfoDetail>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.reporting.update_info(&actor, id, payload).await?))
}

async fn delete_info(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let actor = acting_ir(&ctx, &headers).await?;
    ctx.reporting.delete_info(&actor, id).await?;
    Ok(Json(json!({ "message": "info record deleted" })))
}

async fn update_plan(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<NewPlanDetail>,
) -> ApiResult<Json<PlanDetail>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.reporting.update_plan(&actor, id, payload).await?))
}

async fn delete_plan(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let actor = acting_ir(&ctx, &headers).await?;
    ctx.reporting.delete_plan(&actor, id).await?;
    Ok(Json(json!({ "message": "plan record deleted" })))
}

async fn delete_uv(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let actor = acting_ir(&ctx, &headers).await?;
    ctx.reporting.delete_uv(&actor, id).await?;
    Ok(Json(json!({ "message": "uv record deleted" })))
}

async fn ir_progress(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    Query(week): Query<WeekQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<IrWeeklyProgress>> {
    let actor = acting_ir(&ctx, &headers).await?;
    let key = week.key_or_current(&ctx)?;
    Ok(Json(ctx.reporting.ir_weekly_progress(&actor, &ir_id, key).await?))
}

async fn dashboard(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Dashboard>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.reporting.dashboard(&actor, &ir_id, ctx.now()).await?))
}
