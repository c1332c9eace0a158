//! Port interface for weekly target storage

use async_trait::async_trait;
use cadence_domain::{Result, TargetScope, WeekKey, WeeklyTarget};

/// Trait for persisting weekly targets keyed by `(week_number, year)` and
/// scope
#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// Insert or replace the target row for `(scope, week)`; returns the
    /// stored row with its id
    async fn upsert(&self, target: WeeklyTarget) -> Result<WeeklyTarget>;

    /// Target row for one scope and week
    async fn find(&self, scope: &TargetScope, week: WeekKey) -> Result<Option<WeeklyTarget>>;

    /// Every stored target for a scope, ordered by week
    async fn list_for_scope(&self, scope: &TargetScope) -> Result<Vec<WeeklyTarget>>;
}
