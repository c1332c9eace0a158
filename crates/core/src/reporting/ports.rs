//! Port interfaces for activity detail storage
//!
//! Counting happens in the store, filtered by a [`WindowSpec`]: the
//! repository must honor the window's `end_inclusive` flag literally, since
//! the Friday window closes inclusively at 23:45:00 while rollover
//! intervals are half-open.

use std::collections::HashMap;

use async_trait::async_trait;
use cadence_domain::{InfoDetail, PlanDetail, Result, UvDetail, WindowSpec};

/// Trait for persisting and aggregating activity detail records
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Insert an Info record; returns it with the generated id
    async fn insert_info(&self, detail: InfoDetail) -> Result<InfoDetail>;

    /// Insert a Plan record; returns it with the generated id
    async fn insert_plan(&self, detail: PlanDetail) -> Result<PlanDetail>;

    /// Insert a UV record; returns it with the generated id
    async fn insert_uv(&self, detail: UvDetail) -> Result<UvDetail>;

    /// Info records of one IR, optionally filtered by a window
    async fn list_infos(&self, ir_id: &str, window: Option<WindowSpec>)
        -> Result<Vec<InfoDetail>>;

    /// Plan records of one IR, optionally filtered by a window
    async fn list_plans(&self, ir_id: &str, window: Option<WindowSpec>)
        -> Result<Vec<PlanDetail>>;

    /// UV records of one IR, optionally filtered by a window
    async fn list_uvs(&self, ir_id: &str, window: Option<WindowSpec>) -> Result<Vec<UvDetail>>;

    /// Per-IR Info counts inside a window
    async fn count_infos(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>>;

    /// Per-IR Plan counts inside a window
    async fn count_plans(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>>;

    /// Per-IR UV sums inside a window
    async fn sum_uvs(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>>;

    /// Update an existing Info record
    async fn update_info(&self, detail: &InfoDetail) -> Result<()>;

    /// Update an existing Plan record
    async fn update_plan(&self, detail: &PlanDetail) -> Result<()>;

    /// Delete one Info record
    async fn delete_info(&self, id: i64) -> Result<()>;

    /// Delete one Plan record
    async fn delete_plan(&self, id: i64) -> Result<()>;

    /// Delete one UV record
    async fn delete_uv(&self, id: i64) -> Result<()>;

    /// Fetch single records (for edits and ownership checks)
    async fn find_info(&self, id: i64) -> Result<Option<InfoDetail>>;
    async fn find_plan(&self, id: i64) -> Result<Option<PlanDetail>>;
    async fn find_uv(&self, id: i64) -> Result<Option<UvDetail>>;
}
