//! IR registration, profile, and hierarchy endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use cadence_domain::{HierarchyNode, Ir, IrUpdate, NewIr, ProvisionedId, Role};
use serde::Deserialize;
use serde_json::{json, Value};

use super::acting_ir;
use crate::context::AppContext;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/provisioned_ids", post(provision_id).get(list_provisioned))
        .route("/irs", post(register).get(list))
        .route("/irs/{ir_id}", get(fetch).put(update).delete(remove))
        .route("/irs/{ir_id}/parent", put(move_ir))
        .route("/irs/{ir_id}/access_level", put(change_access_level))
        .route("/irs/{ir_id}/downlines", get(downlines))
        .route("/irs/{ir_id}/direct_downlines", get(direct_downlines))
        .route("/irs/{ir_id}/tree", get(tree))
}

#[derive(Deserialize)]
struct ProvisionRequest {
    ir_id: String,
}

async fn provision_id(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<ProvisionRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    ctx.hierarchy.provision_id(&body.ir_id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "ir_id": body.ir_id }))))
}

async fn list_provisioned(
    State(ctx): State<Arc<AppContext>>,
) -> ApiResult<Json<Vec<ProvisionedId>>> {
    Ok(Json(ctx.hierarchy.provisioned_ids().await?))
}

async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<NewIr>,
) -> ApiResult<(StatusCode, Json<Ir>)> {
    let today = ctx.now().date_naive();
    let ir = ctx.hierarchy.register(body, today).await?;
    Ok((StatusCode::CREATED, Json(ir)))
}

async fn list(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<Value>> {
    let irs = ctx.hierarchy.list().await?;
    Ok(Json(json!({ "count": irs.len(), "data": irs })))
}

async fn fetch(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
) -> ApiResult<Json<Ir>> {
    Ok(Json(ctx.hierarchy.require(&ir_id).await?))
}

async fn update(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<IrUpdate>,
) -> ApiResult<Json<Ir>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.hierarchy.update_profile(&actor, &ir_id, body).await?))
}

async fn remove(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let actor = acting_ir(&ctx, &headers).await?;
    ctx.hierarchy.remove(&actor, &ir_id).await?;
    Ok(Json(json!({ "message": "IR deleted, downlines re-attached" })))
}

#[derive(Deserialize)]
struct MoveIrRequest {
    parent_ir: Option<String>,
}

async fn move_ir(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<MoveIrRequest>,
) -> ApiResult<Json<Ir>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.hierarchy.move_ir(&actor, &ir_id, body.parent_ir.as_deref()).await?))
}

#[derive(Deserialize)]
struct AccessLevelRequest {
    access_level: Role,
}

async fn change_access_level(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AccessLevelRequest>,
) -> ApiResult<Json<Ir>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.hierarchy.change_access_level(&actor, &ir_id, body.access_level).await?))
}

async fn downlines(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Ir>>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.hierarchy.downlines(&actor, &ir_id).await?))
}

async fn direct_downlines(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Ir>>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.hierarchy.direct_downlines(&actor, &ir_id).await?))
}

async fn tree(
    State(ctx): State<Arc<AppContext>>,
    Path(ir_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<HierarchyNode>> {
    let actor = acting_ir(&ctx, &headers).await?;
    Ok(Json(ctx.hierarchy.tree(&actor, &ir_id).await?))
}
