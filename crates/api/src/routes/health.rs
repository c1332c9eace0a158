//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route("/health", get(health))
}

async fn health(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<Value>> {
    ctx.db.health_check()?;
    Ok(Json(json!({ "status": "ok" })))
}
