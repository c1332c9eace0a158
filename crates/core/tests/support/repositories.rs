//! In-memory fake repository implementations for testing
//!
//! Provide deterministic port implementations without database
//! dependencies. Window filtering honors `end_inclusive` exactly like the
//! SQL implementations must.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cadence_core::hierarchy::ports::{IrRepository, ProvisionedIdRepository};
use cadence_core::reporting::ports::ActivityRepository;
use cadence_core::targets::ports::TargetRepository;
use cadence_core::teams::ports::TeamRepository;
use cadence_domain::{
    CadenceError, InfoDetail, Instant, Ir, NewTeam, PlanDetail, ProvisionedId, Result,
    TargetScope, Team, TeamMember, UvDetail, WeekKey, WeeklyTarget, WindowSpec,
};

/* -------------------------------------------------------------------------- */
/* IRs */
/* -------------------------------------------------------------------------- */

#[derive(Default)]
pub struct InMemoryIrRepository {
    rows: Mutex<HashMap<String, Ir>>,
}

impl InMemoryIrRepository {
    pub fn seeded(irs: Vec<Ir>) -> Self {
        let rows = irs.into_iter().map(|ir| (ir.ir_id.clone(), ir)).collect();
        Self { rows: Mutex::new(rows) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Ir>> {
        self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl IrRepository for InMemoryIrRepository {
    async fn insert(&self, ir: Ir) -> Result<()> {
        let mut rows = self.lock();
        if rows.contains_key(&ir.ir_id) {
            return Err(CadenceError::Conflict(format!("duplicate ir: {}", ir.ir_id)));
        }
        rows.insert(ir.ir_id.clone(), ir);
        Ok(())
    }

    async fn find(&self, ir_id: &str) -> Result<Option<Ir>> {
        Ok(self.lock().get(ir_id).cloned())
    }

    async fn update(&self, ir: &Ir) -> Result<()> {
        let mut rows = self.lock();
        if !rows.contains_key(&ir.ir_id) {
            return Err(CadenceError::NotFound(format!("ir not found: {}", ir.ir_id)));
        }
        rows.insert(ir.ir_id.clone(), ir.clone());
        Ok(())
    }

    async fn delete(&self, ir_id: &str) -> Result<()> {
        self.lock().remove(ir_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Ir>> {
        let mut rows: Vec<Ir> = self.lock().values().cloned().collect();
        rows.sort_by(|a, b| a.ir_id.cmp(&b.ir_id));
        Ok(rows)
    }

    async fn list_subtree(&self, path_prefix: &str) -> Result<Vec<Ir>> {
        let mut rows: Vec<Ir> = self
            .lock()
            .values()
            .filter(|ir| ir.hierarchy_path.starts_with(path_prefix))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.hierarchy_path.cmp(&b.hierarchy_path));
        Ok(rows)
    }

    async fn list_children(&self, parent_id: &str) -> Result<Vec<Ir>> {
        let mut rows: Vec<Ir> = self
            .lock()
            .values()
            .filter(|ir| ir.parent_ir.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.ir_id.cmp(&b.ir_id));
        Ok(rows)
    }

    async fn rewrite_subtree_paths(
        &self,
        old_prefix: &str,
        new_prefix: &str,
        level_delta: i64,
    ) -> Result<usize> {
        let mut rows = self.lock();
        let mut touched = 0;
        for ir in rows.values_mut() {
            if ir.hierarchy_path.starts_with(old_prefix) {
                ir.hierarchy_path =
                    format!("{new_prefix}{}", &ir.hierarchy_path[old_prefix.len()..]);
                let level = i64::from(ir.hierarchy_level) + level_delta;
                ir.hierarchy_level = u32::try_from(level.max(0)).unwrap_or(0);
                touched += 1;
            }
        }
        Ok(touched)
    }
}

#[derive(Default)]
pub struct InMemoryProvisionedIds {
    ids: Mutex<Vec<String>>,
}

impl InMemoryProvisionedIds {
    pub fn seeded(ids: &[&str]) -> Self {
        Self { ids: Mutex::new(ids.iter().map(ToString::to_string).collect()) }
    }
}

#[async_trait]
impl ProvisionedIdRepository for InMemoryProvisionedIds {
    async fn add(&self, ir_id: &str) -> Result<()> {
        let mut ids = self.ids.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !ids.iter().any(|id| id == ir_id) {
            ids.push(ir_id.to_string());
        }
        Ok(())
    }

    async fn exists(&self, ir_id: &str) -> Result<bool> {
        let ids = self.ids.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(ids.iter().any(|id| id == ir_id))
    }

    async fn list(&self) -> Result<Vec<ProvisionedId>> {
        let ids = self.ids.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(ids.iter().map(|id| ProvisionedId { ir_id: id.clone() }).collect())
    }
}

/* -------------------------------------------------------------------------- */
/* Teams */
/* -------------------------------------------------------------------------- */

#[derive(Default)]
pub struct InMemoryTeamRepository {
    teams: Mutex<Vec<Team>>,
    members: Mutex<Vec<TeamMember>>,
    next_id: AtomicI64,
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn insert(&self, team: NewTeam, created_at: Instant) -> Result<Team> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let team = Team { id, name: team.name, created_by: team.created_by, created_at };
        self.teams
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(team.clone());
        Ok(team)
    }

    async fn find(&self, team_id: i64) -> Result<Option<Team>> {
        let teams = self.teams.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(teams.iter().find(|t| t.id == team_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Team>> {
        Ok(self.teams.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    async fn rename(&self, team_id: i64, name: &str) -> Result<()> {
        let mut teams = self.teams.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match teams.iter_mut().find(|t| t.id == team_id) {
            Some(team) => {
                team.name = name.to_string();
                Ok(())
            }
            None => Err(CadenceError::NotFound(format!("team not found: {team_id}"))),
        }
    }

    async fn transfer_ownership(&self, team_id: i64, new_owner: &str) -> Result<()> {
        let mut teams = self.teams.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match teams.iter_mut().find(|t| t.id == team_id) {
            Some(team) => {
                team.created_by = Some(new_owner.to_string());
                Ok(())
            }
            None => Err(CadenceError::NotFound(format!("team not found: {team_id}"))),
        }
    }

    async fn delete(&self, team_id: i64) -> Result<()> {
        self.teams
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|t| t.id != team_id);
        self.members
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|m| m.team_id != team_id);
        Ok(())
    }

    async fn add_member(&self, member: TeamMember) -> Result<()> {
        self.members
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(member);
        Ok(())
    }

    async fn remove_member(&self, team_id: i64, ir_id: &str) -> Result<()> {
        self.members
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|m| !(m.team_id == team_id && m.ir_id == ir_id));
        Ok(())
    }

    async fn members(&self, team_id: i64) -> Result<Vec<TeamMember>> {
        let members = self.members.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(members.iter().filter(|m| m.team_id == team_id).cloned().collect())
    }

    async fn member_exists(&self, team_id: i64, ir_id: &str) -> Result<bool> {
        let members = self.members.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(members.iter().any(|m| m.team_id == team_id && m.ir_id == ir_id))
    }

    async fn teams_for_ir(&self, ir_id: &str) -> Result<Vec<Team>> {
        let members = self.members.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let team_ids: Vec<i64> =
            members.iter().filter(|m| m.ir_id == ir_id).map(|m| m.team_id).collect();
        let teams = self.teams.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(teams.iter().filter(|t| team_ids.contains(&t.id)).cloned().collect())
    }
}

/* -------------------------------------------------------------------------- */
/* Activity details */
/* -------------------------------------------------------------------------- */

#[derive(Default)]
pub struct InMemoryActivityRepository {
    infos: Mutex<Vec<InfoDetail>>,
    plans: Mutex<Vec<PlanDetail>>,
    uvs: Mutex<Vec<UvDetail>>,
    next_id: AtomicI64,
}

impl InMemoryActivityRepository {
    fn next(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn insert_info(&self, mut detail: InfoDetail) -> Result<InfoDetail> {
        detail.id = self.next();
        self.infos
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(detail.clone());
        Ok(detail)
    }

    async fn insert_plan(&self, mut detail: PlanDetail) -> Result<PlanDetail> {
        detail.id = self.next();
        self.plans
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(detail.clone());
        Ok(detail)
    }

    async fn insert_uv(&self, mut detail: UvDetail) -> Result<UvDetail> {
        detail.id = self.next();
        self.uvs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(detail.clone());
        Ok(detail)
    }

    async fn list_infos(
        &self,
        ir_id: &str,
        window: Option<WindowSpec>,
    ) -> Result<Vec<InfoDetail>> {
        let infos = self.infos.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(infos
            .iter()
            .filter(|d| d.ir_id == ir_id)
            .filter(|d| window.map_or(true, |w| w.contains(d.recorded_at)))
            .cloned()
            .collect())
    }

    async fn list_plans(
        &self,
        ir_id: &str,
        window: Option<WindowSpec>,
    ) -> Result<Vec<PlanDetail>> {
        let plans = self.plans.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(plans
            .iter()
            .filter(|d| d.ir_id == ir_id)
            .filter(|d| window.map_or(true, |w| w.contains(d.recorded_at)))
            .cloned()
            .collect())
    }

    async fn list_uvs(&self, ir_id: &str, window: Option<WindowSpec>) -> Result<Vec<UvDetail>> {
        let uvs = self.uvs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(uvs
            .iter()
            .filter(|d| d.ir_id == ir_id)
            .filter(|d| window.map_or(true, |w| w.contains(d.recorded_at)))
            .cloned()
            .collect())
    }

    async fn count_infos(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>> {
        let infos = self.infos.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut counts = HashMap::new();
        for detail in infos.iter() {
            if ir_ids.contains(&detail.ir_id) && window.contains(detail.recorded_at) {
                *counts.entry(detail.ir_id.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn count_plans(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>> {
        let plans = self.plans.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut counts = HashMap::new();
        for detail in plans.iter() {
            if ir_ids.contains(&detail.ir_id) && window.contains(detail.recorded_at) {
                *counts.entry(detail.ir_id.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn sum_uvs(
        &self,
        ir_ids: &[String],
        window: WindowSpec,
    ) -> Result<HashMap<String, i64>> {
        let uvs = self.uvs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut sums = HashMap::new();
        for detail in uvs.iter() {
            if ir_ids.contains(&detail.ir_id) && window.contains(detail.recorded_at) {
                *sums.entry(detail.ir_id.clone()).or_insert(0) += detail.uv_count;
            }
        }
        Ok(sums)
    }

    async fn update_info(&self, detail: &InfoDetail) -> Result<()> {
        let mut infos = self.infos.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match infos.iter_mut().find(|d| d.id == detail.id) {
            Some(row) => {
                *row = detail.clone();
                Ok(())
            }
            None => Err(CadenceError::NotFound(format!("info not found: {}", detail.id))),
        }
    }

    async fn update_plan(&self, detail: &PlanDetail) -> Result<()> {
        let mut plans = self.plans.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match plans.iter_mut().find(|d| d.id == detail.id) {
            Some(row) => {
                *row = detail.clone();
                Ok(())
            }
            None => Err(CadenceError::NotFound(format!("plan not found: {}", detail.id))),
        }
    }

    async fn delete_info(&self, id: i64) -> Result<()> {
        self.infos
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|d| d.id != id);
        Ok(())
    }

    async fn delete_plan(&self, id: i64) -> Result<()> {
        self.plans
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|d| d.id != id);
        Ok(())
    }

    async fn delete_uv(&self, id: i64) -> Result<()> {
        self.uvs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|d| d.id != id);
        Ok(())
    }

    async fn find_info(&self, id: i64) -> Result<Option<InfoDetail>> {
        let infos = self.infos.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(infos.iter().find(|d| d.id == id).cloned())
    }

    async fn find_plan(&self, id: i64) -> Result<Option<PlanDetail>> {
        let plans = self.plans.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(plans.iter().find(|d| d.id == id).cloned())
    }

    async fn find_uv(&self, id: i64) -> Result<Option<UvDetail>> {
        let uvs = self.uvs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(uvs.iter().find(|d| d.id == id).cloned())
    }
}

/* -------------------------------------------------------------------------- */
/* Targets */
/* -------------------------------------------------------------------------- */

#[derive(Default)]
pub struct InMemoryTargetRepository {
    rows: Mutex<Vec<WeeklyTarget>>,
    next_id: AtomicI64,
}

#[async_trait]
impl TargetRepository for InMemoryTargetRepository {
    async fn upsert(&self, mut target: WeeklyTarget) -> Result<WeeklyTarget> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.retain(|t| !(t.scope == target.scope && t.week == target.week));
        target.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        rows.push(target.clone());
        Ok(target)
    }

    async fn find(&self, scope: &TargetScope, week: WeekKey) -> Result<Option<WeeklyTarget>> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(rows.iter().find(|t| &t.scope == scope && t.week == week).cloned())
    }

    async fn list_for_scope(&self, scope: &TargetScope) -> Result<Vec<WeeklyTarget>> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut result: Vec<WeeklyTarget> =
            rows.iter().filter(|t| &t.scope == scope).cloned().collect();
        result.sort_by_key(|t| t.week);
        Ok(result)
    }
}
