//! Teams service - creation, membership, and visibility

use std::collections::HashSet;
use std::sync::Arc;

use cadence_domain::{
    CadenceError, Instant, Ir, NewTeam, Result, Role, Team, TeamMember,
};
use tracing::info;

use super::ports::TeamRepository;
use crate::access::policy::can_create_team;
use crate::hierarchy::ports::IrRepository;

/// Team management service
pub struct TeamsService {
    teams: Arc<dyn TeamRepository>,
    irs: Arc<dyn IrRepository>,
}

impl TeamsService {
    pub fn new(teams: Arc<dyn TeamRepository>, irs: Arc<dyn IrRepository>) -> Self {
        Self { teams, irs }
    }

    /// Create a team owned by the actor.
    pub async fn create(&self, actor: &Ir, new: NewTeam, now: Instant) -> Result<Team> {
        if !can_create_team(actor.access_level) {
            return Err(CadenceError::Forbidden(format!(
                "{} may not create teams",
                actor.ir_id
            )));
        }
        new.validate()?;

        let new = NewTeam {
            name: new.name,
            created_by: new.created_by.or_else(|| Some(actor.ir_id.clone())),
        };
        let team = self.teams.insert(new, now).await?;
        info!(team_id = team.id, team_name = %team.name, "team created");
        Ok(team)
    }

    /// Fetch one team or fail with NotFound.
    pub async fn require(&self, team_id: i64) -> Result<Team> {
        self.teams
            .find(team_id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("team not found: {team_id}")))
    }

    /// Teams the actor may see, per the capability table: admins see all,
    /// CTC/LDC see teams owned inside their subtree plus their own
    /// memberships, everyone else sees only teams they belong to.
    pub async fn visible_teams(&self, actor: &Ir) -> Result<Vec<Team>> {
        match actor.access_level {
            Role::Admin => self.teams.list_all().await,
            Role::Ctc | Role::Ldc => {
                let subtree: HashSet<String> = self
                    .irs
                    .list_subtree(&actor.hierarchy_path)
                    .await?
                    .into_iter()
                    .map(|ir| ir.ir_id)
                    .collect();

                let mut seen = HashSet::new();
                let mut result = Vec::new();
                for team in self.teams.list_all().await? {
                    let owned_in_subtree =
                        team.created_by.as_ref().is_some_and(|owner| subtree.contains(owner));
                    if owned_in_subtree && seen.insert(team.id) {
                        result.push(team);
                    }
                }
                for team in self.teams.teams_for_ir(&actor.ir_id).await? {
                    if seen.insert(team.id) {
                        result.push(team);
                    }
                }
                Ok(result)
            }
            Role::Ls | Role::Gc | Role::Ir => self.teams.teams_for_ir(&actor.ir_id).await,
        }
    }

    /// Add an IR to a team with a role.
    pub async fn add_member(
        &self,
        actor: &Ir,
        team_id: i64,
        ir_id: &str,
        role: Role,
    ) -> Result<TeamMember> {
        let team = self.require(team_id).await?;
        self.check_team_edit(actor, &team).await?;

        if self.irs.find(ir_id).await?.is_none() {
            return Err(CadenceError::NotFound(format!("IR not found: {ir_id}")));
        }
        if self.teams.member_exists(team_id, ir_id).await? {
            return Err(CadenceError::Conflict(format!(
                "IR {ir_id} already assigned to team {team_id}"
            )));
        }

        let member = TeamMember { team_id, ir_id: ir_id.to_string(), role };
        self.teams.add_member(member.clone()).await?;
        info!(team_id, ir_id, role = %role, "team member added");
        Ok(member)
    }

    /// Remove an IR from a team.
    pub async fn remove_member(&self, actor: &Ir, team_id: i64, ir_id: &str) -> Result<()> {
        let team = self.require(team_id).await?;
        self.check_team_edit(actor, &team).await?;

        if !self.teams.member_exists(team_id, ir_id).await? {
            return Err(CadenceError::NotFound(format!(
                "IR {ir_id} is not a member of team {team_id}"
            )));
        }
        self.teams.remove_member(team_id, ir_id).await
    }

    /// Move an IR between two teams in one logical step.
    pub async fn move_member(
        &self,
        actor: &Ir,
        from_team: i64,
        to_team: i64,
        ir_id: &str,
        role: Role,
    ) -> Result<TeamMember> {
        self.remove_member(actor, from_team, ir_id).await?;
        self.add_member(actor, to_team, ir_id, role).await
    }

    /// Membership rows of one team.
    pub async fn members(&self, team_id: i64) -> Result<Vec<TeamMember>> {
        self.require(team_id).await?;
        self.teams.members(team_id).await
    }

    /// Rename a team.
    pub async fn rename(&self, actor: &Ir, team_id: i64, name: &str) -> Result<()> {
        let team = self.require(team_id).await?;
        self.check_team_edit(actor, &team).await?;
        if name.is_empty() {
            return Err(CadenceError::InvalidInput("team name is empty".to_string()));
        }
        self.teams.rename(team_id, name).await
    }

    /// Hand a team to a new owning IR.
    pub async fn transfer_ownership(
        &self,
        actor: &Ir,
        team_id: i64,
        new_owner: &str,
    ) -> Result<()> {
        let team = self.require(team_id).await?;
        self.check_team_edit(actor, &team).await?;
        if self.irs.find(new_owner).await?.is_none() {
            return Err(CadenceError::NotFound(format!("IR not found: {new_owner}")));
        }
        self.teams.transfer_ownership(team_id, new_owner).await
    }

    /// Delete a team and its memberships.
    pub async fn delete(&self, actor: &Ir, team_id: i64) -> Result<()> {
        let team = self.require(team_id).await?;
        self.check_team_edit(actor, &team).await?;
        self.teams.delete(team_id).await?;
        info!(team_id, "team deleted");
        Ok(())
    }

    /// Whether the actor may restructure this team: admins always, CTC for
    /// teams owned inside their subtree, LDC for teams they created.
    async fn check_team_edit(&self, actor: &Ir, team: &Team) -> Result<()> {
        let allowed = match actor.access_level {
            Role::Admin => true,
            Role::Ctc => match &team.created_by {
                Some(owner_id) => self
                    .irs
                    .find(owner_id)
                    .await?
                    .is_some_and(|owner| owner.hierarchy_path.starts_with(&actor.hierarchy_path)),
                None => false,
            },
            Role::Ldc => team.created_by.as_deref() == Some(actor.ir_id.as_str()),
            Role::Ls | Role::Gc | Role::Ir => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(CadenceError::Forbidden(format!(
                "{} may not manage team {}",
                actor.ir_id, team.id
            )))
        }
    }
}
