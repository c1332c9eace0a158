//! Week resolution endpoints
//!
//! Expose the resolver's outputs directly so clients and the frontend week
//! picker share the exact boundary arithmetic used for aggregation.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use cadence_domain::WeekWindows;
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/weeks/current", get(current_week))
        .route("/weeks", get(weeks_of_year))
}

async fn current_week(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<WeekWindows>> {
    Ok(Json(ctx.targets.current_week(ctx.now())?))
}

#[derive(Deserialize)]
struct YearQuery {
    year: i32,
}

async fn weeks_of_year(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<YearQuery>,
) -> ApiResult<Json<Vec<WeekWindows>>> {
    Ok(Json(ctx.targets.weeks_of_year(query.year)?))
}
