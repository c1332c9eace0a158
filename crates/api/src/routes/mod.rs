//! HTTP routing
//!
//! One module per resource; every handler extracts the acting IR from the
//! `x-acting-ir` header where authorization applies and returns domain
//! errors through [`crate::error::ApiError`].

pub mod activities;
pub mod health;
pub mod irs;
pub mod targets;
pub mod teams;
pub mod weeks;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::Router;
use cadence_domain::constants::ACTING_IR_HEADER;
use cadence_domain::{CadenceError, Ir, WeekKey};
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};

/// Assemble the full application router.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(irs::router())
        .merge(teams::router())
        .merge(activities::router())
        .merge(targets::router())
        .merge(weeks::router())
        .with_state(ctx)
}

/// Resolve the acting IR from the request headers.
pub(crate) async fn acting_ir(ctx: &AppContext, headers: &HeaderMap) -> ApiResult<Ir> {
    let ir_id = headers
        .get(ACTING_IR_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ApiError(CadenceError::InvalidInput(format!(
                "missing {ACTING_IR_HEADER} header"
            )))
        })?;
    Ok(ctx.hierarchy.require(ir_id).await?)
}

/// Optional `?week=&year=` pair; both or neither must be present.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct WeekQuery {
    pub week: Option<u8>,
    pub year: Option<i32>,
}

impl WeekQuery {
    /// The requested week key, if the pair was supplied.
    pub fn key(self) -> ApiResult<Option<WeekKey>> {
        match (self.week, self.year) {
            (Some(week), Some(year)) => Ok(Some(WeekKey::new(week, year))),
            (None, None) => Ok(None),
            _ => Err(ApiError(CadenceError::InvalidInput(
                "week and year must be supplied together".to_string(),
            ))),
        }
    }

    /// The requested week key, defaulting to the week containing "now".
    pub fn key_or_current(self, ctx: &AppContext) -> ApiResult<WeekKey> {
        match self.key()? {
            Some(key) => Ok(key),
            None => Ok(ctx.scheme.resolve_week(ctx.now())?),
        }
    }
}
