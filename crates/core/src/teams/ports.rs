//! Port interfaces for team storage

use async_trait::async_trait;
use cadence_domain::{Instant, NewTeam, Result, Team, TeamMember};

/// Trait for persisting teams and memberships
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Insert a team and return it with its generated id
    async fn insert(&self, team: NewTeam, created_at: Instant) -> Result<Team>;

    /// Fetch a single team
    async fn find(&self, team_id: i64) -> Result<Option<Team>>;

    /// All teams
    async fn list_all(&self) -> Result<Vec<Team>>;

    /// Rename a team
    async fn rename(&self, team_id: i64, name: &str) -> Result<()>;

    /// Reassign the owning IR
    async fn transfer_ownership(&self, team_id: i64, new_owner: &str) -> Result<()>;

    /// Delete a team and its membership rows
    async fn delete(&self, team_id: i64) -> Result<()>;

    /// Add a membership row
    async fn add_member(&self, member: TeamMember) -> Result<()>;

    /// Remove a membership row
    async fn remove_member(&self, team_id: i64, ir_id: &str) -> Result<()>;

    /// Memberships of one team
    async fn members(&self, team_id: i64) -> Result<Vec<TeamMember>>;

    /// Whether `(team, ir)` already exists
    async fn member_exists(&self, team_id: i64, ir_id: &str) -> Result<bool>;

    /// All teams an IR belongs to
    async fn teams_for_ir(&self, ir_id: &str) -> Result<Vec<Team>>;
}
