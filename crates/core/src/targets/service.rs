//! Targets service - weekly target upserts and week listings
//!
//! Targets are keyed by the shared `(week_number, year)` identifier, so the
//! same row serves Info aggregation (Friday window) and Plan aggregation
//! (Monday window). The week key is validated through the resolver before
//! anything is stored; an invalid key is an error, never a clamp.

use std::sync::Arc;

use cadence_domain::{
    CadenceError, Instant, Ir, Result, TargetScope, TargetUpsert, WeekKey, WeekScheme,
    WeekWindows, WeeklyTarget,
};
use tracing::info;

use super::ports::TargetRepository;
use crate::access::policy::can_manage_targets;
use crate::hierarchy::ports::IrRepository;
use crate::teams::ports::TeamRepository;

/// Weekly target management service
pub struct TargetsService {
    scheme: WeekScheme,
    targets: Arc<dyn TargetRepository>,
    irs: Arc<dyn IrRepository>,
    teams: Arc<dyn TeamRepository>,
}

impl TargetsService {
    pub fn new(
        scheme: WeekScheme,
        targets: Arc<dyn TargetRepository>,
        irs: Arc<dyn IrRepository>,
        teams: Arc<dyn TeamRepository>,
    ) -> Self {
        Self { scheme, targets, irs, teams }
    }

    /// Insert or replace the weekly target for a scope.
    pub async fn set_target(&self, actor: &Ir, upsert: TargetUpsert) -> Result<WeeklyTarget> {
        if !can_manage_targets(actor.access_level) {
            return Err(CadenceError::Forbidden(format!(
                "{} may not manage targets",
                actor.ir_id
            )));
        }
        upsert.validate()?;

        // Validates week number and year, and yields the denormalized
        // Friday-window bounds stored alongside the numbers.
        let window = self.scheme.friday_window(upsert.week)?;

        let uv_target = match &upsert.scope {
            TargetScope::Ir(ir_id) => {
                let ir = self
                    .irs
                    .find(ir_id)
                    .await?
                    .ok_or_else(|| CadenceError::NotFound(format!("IR not found: {ir_id}")))?;
                // UV targets only exist for roles that track unit volume.
                upsert.uv_target.filter(|_| ir.access_level.tracks_uv())
            }
            TargetScope::Team(team_id) => {
                if self.teams.find(*team_id).await?.is_none() {
                    return Err(CadenceError::NotFound(format!("team not found: {team_id}")));
                }
                upsert.uv_target
            }
        };

        let stored = self
            .targets
            .upsert(WeeklyTarget {
                id: 0,
                week: upsert.week,
                scope: upsert.scope,
                info_target: upsert.info_target,
                plan_target: upsert.plan_target,
                uv_target,
                week_start: window.start,
                week_end: window.end,
            })
            .await?;

        info!(week = %stored.week, "weekly target stored");
        Ok(stored)
    }

    /// Target row for one scope and week, if set.
    pub async fn get_target(
        &self,
        scope: &TargetScope,
        week: WeekKey,
    ) -> Result<Option<WeeklyTarget>> {
        self.scheme.friday_window(week)?;
        self.targets.find(scope, week).await
    }

    /// Every stored target for a scope.
    pub async fn targets_for_scope(&self, scope: &TargetScope) -> Result<Vec<WeeklyTarget>> {
        self.targets.list_for_scope(scope).await
    }

    /// The week containing `now`, with both activity windows resolved.
    pub fn current_week(&self, now: Instant) -> Result<WeekWindows> {
        let week = self.scheme.resolve_week(now)?;
        self.week_windows(week)
    }

    /// Both activity windows for one week.
    pub fn week_windows(&self, week: WeekKey) -> Result<WeekWindows> {
        Ok(WeekWindows {
            week,
            friday_window: self.scheme.friday_window(week)?,
            monday_window: self.scheme.monday_window(week)?,
        })
    }

    /// Every regular week of a year with its windows, for week pickers.
    pub fn weeks_of_year(&self, year: i32) -> Result<Vec<WeekWindows>> {
        self.scheme
            .weeks_of_year(year)?
            .into_iter()
            .map(|week| self.week_windows(week))
            .collect()
    }
}
