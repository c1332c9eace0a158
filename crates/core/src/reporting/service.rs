//! Reporting service - activity recording and windowed aggregation
//!
//! Every number leaving this service is recomputed from detail records
//! filtered by the week's windows; nothing reads a stored running counter.
//! Info counts use the Friday window, Plan counts the Monday window, UV
//! sums the Friday window, all addressed by one `(week_number, year)` key.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_domain::{
    ActivityTally, CadenceError, Dashboard, InfoDetail, Instant, Ir, IrWeeklyProgress,
    MemberProgress, NewInfoDetail, NewPlanDetail, NewUvDetail, PlanDetail, Result, Role, Team,
    TeamWeeklyProgress, UvDetail, WeekKey, WeekScheme,
};
use tracing::debug;

use super::ports::ActivityRepository;
use crate::access::policy::{can_add_data, can_edit, can_view};
use crate::access::relation_between;
use crate::hierarchy::ports::IrRepository;
use crate::targets::ports::TargetRepository;
use crate::teams::ports::TeamRepository;
use cadence_domain::TargetScope;

/// Weekly reporting and activity recording service
pub struct ReportingService {
    scheme: WeekScheme,
    activities: Arc<dyn ActivityRepository>,
    targets: Arc<dyn TargetRepository>,
    irs: Arc<dyn IrRepository>,
    teams: Arc<dyn TeamRepository>,
}

impl ReportingService {
    pub fn new(
        scheme: WeekScheme,
        activities: Arc<dyn ActivityRepository>,
        targets: Arc<dyn TargetRepository>,
        irs: Arc<dyn IrRepository>,
        teams: Arc<dyn TeamRepository>,
    ) -> Self {
        Self { scheme, activities, targets, irs, teams }
    }

    /// The week scheme this service aggregates with.
    pub const fn scheme(&self) -> &WeekScheme {
        &self.scheme
    }

    /* ---------------------------------------------------------------------- */
    /* Recording */
    /* ---------------------------------------------------------------------- */

    /// Log a batch of Info records for `ir_id`.
    pub async fn record_infos(
        &self,
        actor: &Ir,
        ir_id: &str,
        batch: Vec<NewInfoDetail>,
        now: Instant,
    ) -> Result<Vec<InfoDetail>> {
        let target = self.require_ir(ir_id).await?;
        self.check_add(actor, &target).await?;

        let mut created = Vec::with_capacity(batch.len());
        for payload in batch {
            let recorded_at = payload.recorded_at.unwrap_or(now);
            // Rejects timestamps outside the supported year range up front.
            self.scheme.resolve_week(recorded_at)?;

            let detail = InfoDetail {
                id: 0,
                ir_id: ir_id.to_string(),
                recorded_at,
                response: payload.response,
                info_type: payload.info_type.unwrap_or_default(),
                client_name: payload.client_name,
                comments: payload.comments,
            };
            created.push(self.activities.insert_info(detail).await?);
        }
        debug!(ir_id, count = created.len(), "info records added");
        Ok(created)
    }

    /// Log a batch of Plan records for `ir_id`.
    pub async fn record_plans(
        &self,
        actor: &Ir,
        ir_id: &str,
        batch: Vec<NewPlanDetail>,
        now: Instant,
    ) -> Result<Vec<PlanDetail>> {
        let target = self.require_ir(ir_id).await?;
        self.check_add(actor, &target).await?;

        let mut created = Vec::with_capacity(batch.len());
        for payload in batch {
            let recorded_at = payload.recorded_at.unwrap_or(now);
            self.scheme.resolve_week(recorded_at)?;

            let detail = PlanDetail {
                id: 0,
                ir_id: ir_id.to_string(),
                recorded_at,
                plan_name: payload.plan_name,
                status: payload.status.unwrap_or_default(),
                comments: payload.comments,
            };
            created.push(self.activities.insert_plan(detail).await?);
        }
        debug!(ir_id, count = created.len(), "plan records added");
        Ok(created)
    }

    /// Log a UV record for `ir_id`. Only roles that track unit volume may
    /// carry UV entries.
    pub async fn record_uv(
        &self,
        actor: &Ir,
        ir_id: &str,
        payload: NewUvDetail,
        now: Instant,
    ) -> Result<UvDetail> {
        let target = self.require_ir(ir_id).await?;
        self.check_add(actor, &target).await?;
        if !target.access_level.tracks_uv() {
            return Err(CadenceError::InvalidInput(format!(
                "IR {ir_id} does not track unit volume"
            )));
        }

        let recorded_at = payload.recorded_at.unwrap_or(now);
        self.scheme.resolve_week(recorded_at)?;

        let detail = UvDetail {
            id: 0,
            ir_id: ir_id.to_string(),
            recorded_at,
            prospect_name: payload.prospect_name.unwrap_or_default(),
            uv_count: payload.uv_count,
            comments: payload.comments,
        };
        self.activities.insert_uv(detail).await
    }

    /* ---------------------------------------------------------------------- */
    /* Listing */
    /* ---------------------------------------------------------------------- */

    /// Info records of one IR, windowed by the week's Friday window.
    pub async fn list_infos(
        &self,
        actor: &Ir,
        ir_id: &str,
        week: Option<WeekKey>,
    ) -> Result<Vec<InfoDetail>> {
        let target = self.require_ir(ir_id).await?;
        self.check_view(actor, &target).await?;
        let window = match week {
            Some(key) => Some(self.scheme.friday_window(key)?),
            None => None,
        };
        self.activities.list_infos(ir_id, window).await
    }

    /// Plan records of one IR, windowed by the week's Monday window.
    pub async fn list_plans(
        &self,
        actor: &Ir,
        ir_id: &str,
        week: Option<WeekKey>,
    ) -> Result<Vec<PlanDetail>> {
        let target = self.require_ir(ir_id).await?;
        self.check_view(actor, &target).await?;
        let window = match week {
            Some(key) => Some(self.scheme.monday_window(key)?),
            None => None,
        };
        self.activities.list_plans(ir_id, window).await
    }

    /// UV records of one IR, windowed like Info records.
    pub async fn list_uvs(
        &self,
        actor: &Ir,
        ir_id: &str,
        week: Option<WeekKey>,
    ) -> Result<Vec<UvDetail>> {
        let target = self.require_ir(ir_id).await?;
        self.check_view(actor, &target).await?;
        let window = match week {
            Some(key) => Some(self.scheme.friday_window(key)?),
            None => None,
        };
        self.activities.list_uvs(ir_id, window).await
    }

    /* ---------------------------------------------------------------------- */
    /* Editing */
    /* ---------------------------------------------------------------------- */

    /// Amend an existing Info record.
    pub async fn update_info(
        &self,
        actor: &Ir,
        id: i64,
        payload: NewInfoDetail,
    ) -> Result<InfoDetail> {
        let mut detail = self
            .activities
            .find_info(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("info record not found: {id}")))?;
        let owner = self.require_ir(&detail.ir_id).await?;
        self.check_edit(actor, &owner).await?;

        if let Some(recorded_at) = payload.recorded_at {
            self.scheme.resolve_week(recorded_at)?;
            detail.recorded_at = recorded_at;
        }
        detail.response = payload.response;
        if let Some(info_type) = payload.info_type {
            detail.info_type = info_type;
        }
        detail.client_name = payload.client_name;
        detail.comments = payload.comments;

        self.activities.update_info(&detail).await?;
        Ok(detail)
    }

    /// Amend an existing Plan record.
    pub async fn update_plan(
        &self,
        actor: &Ir,
        id: i64,
        payload: NewPlanDetail,
    ) -> Result<PlanDetail> {
        let mut detail = self
            .activities
            .find_plan(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("plan record not found: {id}")))?;
        let owner = self.require_ir(&detail.ir_id).await?;
        self.check_edit(actor, &owner).await?;

        if let Some(recorded_at) = payload.recorded_at {
            self.scheme.resolve_week(recorded_at)?;
            detail.recorded_at = recorded_at;
        }
        if let Some(plan_name) = payload.plan_name {
            detail.plan_name = Some(plan_name);
        }
        if let Some(status) = payload.status {
            detail.status = status;
        }
        detail.comments = payload.comments;

        self.activities.update_plan(&detail).await?;
        Ok(detail)
    }

    /// Delete one Info record.
    pub async fn delete_info(&self, actor: &Ir, id: i64) -> Result<()> {
        let detail = self
            .activities
            .find_info(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("info record not found: {id}")))?;
        let owner = self.require_ir(&detail.ir_id).await?;
        self.check_edit(actor, &owner).await?;
        self.activities.delete_info(id).await
    }

    /// Delete one Plan record.
    pub async fn delete_plan(&self, actor: &Ir, id: i64) -> Result<()> {
        let detail = self
            .activities
            .find_plan(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("plan record not found: {id}")))?;
        let owner = self.require_ir(&detail.ir_id).await?;
        self.check_edit(actor, &owner).await?;
        self.activities.delete_plan(id).await
    }

    /// Delete one UV record.
    pub async fn delete_uv(&self, actor: &Ir, id: i64) -> Result<()> {
        let detail = self
            .activities
            .find_uv(id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("uv record not found: {id}")))?;
        let owner = self.require_ir(&detail.ir_id).await?;
        self.check_edit(actor, &owner).await?;
        self.activities.delete_uv(id).await
    }

    /* ---------------------------------------------------------------------- */
    /* Aggregation */
    /* ---------------------------------------------------------------------- */

    /// One IR's weekly progress against their targets.
    pub async fn ir_weekly_progress(
        &self,
        actor: &Ir,
        ir_id: &str,
        week: WeekKey,
    ) -> Result<IrWeeklyProgress> {
        let target_ir = self.require_ir(ir_id).await?;
        self.check_view(actor, &target_ir).await?;
        self.ir_progress(&target_ir, week).await
    }

    /// One team's weekly progress with the per-member breakdown.
    pub async fn team_weekly_progress(
        &self,
        actor: &Ir,
        team_id: i64,
        week: WeekKey,
    ) -> Result<TeamWeeklyProgress> {
        let team = self
            .teams
            .find(team_id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("team not found: {team_id}")))?;
        self.check_team_view(actor, &team).await?;
        self.team_progress(&team, week).await
    }

    /// Current-week dashboard for an IR: personal progress plus every team
    /// they belong to.
    pub async fn dashboard(&self, actor: &Ir, ir_id: &str, now: Instant) -> Result<Dashboard> {
        let target_ir = self.require_ir(ir_id).await?;
        self.check_view(actor, &target_ir).await?;

        let week = self.scheme.resolve_week(now)?;
        let personal = self.ir_progress(&target_ir, week).await?;

        let mut teams = Vec::new();
        for team in self.teams.teams_for_ir(ir_id).await? {
            teams.push(self.team_progress(&team, week).await?);
        }

        Ok(Dashboard { personal, teams })
    }

    /// Raw per-IR tallies for one week, keyed by ir_id.
    pub async fn tallies(
        &self,
        ir_ids: &[String],
        week: WeekKey,
    ) -> Result<HashMap<String, ActivityTally>> {
        let friday = self.scheme.friday_window(week)?;
        let monday = self.scheme.monday_window(week)?;

        let infos = self.activities.count_infos(ir_ids, friday).await?;
        let plans = self.activities.count_plans(ir_ids, monday).await?;
        let uvs = self.activities.sum_uvs(ir_ids, friday).await?;

        let mut tallies = HashMap::with_capacity(ir_ids.len());
        for ir_id in ir_ids {
            tallies.insert(
                ir_id.clone(),
                ActivityTally {
                    info_done: infos.get(ir_id).copied().unwrap_or(0),
                    plan_done: plans.get(ir_id).copied().unwrap_or(0),
                    uv_done: uvs.get(ir_id).copied().unwrap_or(0),
                },
            );
        }
        Ok(tallies)
    }

    async fn ir_progress(&self, ir: &Ir, week: WeekKey) -> Result<IrWeeklyProgress> {
        let ids = [ir.ir_id.clone()];
        let tally =
            self.tallies(&ids, week).await?.remove(&ir.ir_id).unwrap_or_default();

        let target =
            self.targets.find(&TargetScope::Ir(ir.ir_id.clone()), week).await?;
        let tracks_uv = ir.access_level.tracks_uv();

        Ok(IrWeeklyProgress {
            ir_id: ir.ir_id.clone(),
            ir_name: ir.ir_name.clone(),
            week,
            info_done: tally.info_done,
            plan_done: tally.plan_done,
            uv_done: tracks_uv.then_some(tally.uv_done),
            info_target: target.as_ref().map_or(0, |t| t.info_target),
            plan_target: target.as_ref().map_or(0, |t| t.plan_target),
            uv_target: target.as_ref().and_then(|t| t.uv_target).filter(|_| tracks_uv),
            has_targets_set: target.is_some(),
        })
    }

    async fn team_progress(&self, team: &Team, week: WeekKey) -> Result<TeamWeeklyProgress> {
        let memberships = self.teams.members(team.id).await?;
        let member_ids: Vec<String> =
            memberships.iter().map(|m| m.ir_id.clone()).collect();
        let tallies = self.tallies(&member_ids, week).await?;

        let mut members = Vec::with_capacity(memberships.len());
        let mut info_done = 0;
        let mut plan_done = 0;
        let mut uv_done = 0;
        for membership in &memberships {
            let Some(ir) = self.irs.find(&membership.ir_id).await? else {
                continue;
            };
            let tally = tallies.get(&ir.ir_id).copied().unwrap_or_default();
            let tracks_uv = ir.access_level.tracks_uv();

            info_done += tally.info_done;
            plan_done += tally.plan_done;
            if tracks_uv {
                uv_done += tally.uv_done;
            }
            members.push(MemberProgress {
                ir_id: ir.ir_id,
                ir_name: ir.ir_name,
                role: membership.role,
                info_done: tally.info_done,
                plan_done: tally.plan_done,
                uv_done: tracks_uv.then_some(tally.uv_done),
            });
        }

        let target = self.targets.find(&TargetScope::Team(team.id), week).await?;
        Ok(TeamWeeklyProgress {
            team_id: team.id,
            team_name: team.name.clone(),
            week,
            info_done,
            plan_done,
            uv_done,
            info_target: target.as_ref().map_or(0, |t| t.info_target),
            plan_target: target.as_ref().map_or(0, |t| t.plan_target),
            uv_target: target.as_ref().and_then(|t| t.uv_target),
            has_targets_set: target.is_some(),
            members,
        })
    }

    /* ---------------------------------------------------------------------- */
    /* Authorization helpers */
    /* ---------------------------------------------------------------------- */

    async fn require_ir(&self, ir_id: &str) -> Result<Ir> {
        self.irs
            .find(ir_id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("IR not found: {ir_id}")))
    }

    async fn check_view(&self, actor: &Ir, target: &Ir) -> Result<()> {
        let relation = relation_between(actor, target, self.teams.as_ref()).await?;
        if can_view(actor.access_level, relation) {
            Ok(())
        } else {
            Err(CadenceError::Forbidden(format!(
                "{} may not view {}",
                actor.ir_id, target.ir_id
            )))
        }
    }

    async fn check_edit(&self, actor: &Ir, target: &Ir) -> Result<()> {
        let relation = relation_between(actor, target, self.teams.as_ref()).await?;
        if can_edit(actor.access_level, relation) {
            Ok(())
        } else {
            Err(CadenceError::Forbidden(format!(
                "{} may not edit records of {}",
                actor.ir_id, target.ir_id
            )))
        }
    }

    async fn check_add(&self, actor: &Ir, target: &Ir) -> Result<()> {
        let relation = relation_between(actor, target, self.teams.as_ref()).await?;
        if can_add_data(actor.access_level, relation) {
            Ok(())
        } else {
            Err(CadenceError::Forbidden(format!(
                "{} may not add records for {}",
                actor.ir_id, target.ir_id
            )))
        }
    }

    /// Team visibility mirrors the teams service: admins see all, CTC/LDC
    /// see teams owned inside their subtree or that they belong to,
    /// everyone else only teams they belong to.
    async fn check_team_view(&self, actor: &Ir, team: &Team) -> Result<()> {
        let allowed = match actor.access_level {
            Role::Admin => true,
            Role::Ctc | Role::Ldc => {
                let owned_in_subtree = match &team.created_by {
                    Some(owner_id) => self.irs.find(owner_id).await?.is_some_and(|owner| {
                        owner.hierarchy_path.starts_with(&actor.hierarchy_path)
                    }),
                    None => false,
                };
                owned_in_subtree || self.teams.member_exists(team.id, &actor.ir_id).await?
            }
            Role::Ls | Role::Gc | Role::Ir => {
                self.teams.member_exists(team.id, &actor.ir_id).await?
            }
        };
        if allowed {
            Ok(())
        } else {
            Err(CadenceError::Forbidden(format!(
                "{} may not view team {}",
                actor.ir_id, team.id
            )))
        }
    }
}
