//! Team and membership entities

use serde::{Deserialize, Serialize};

use crate::constants::MAX_TEAM_NAME_LENGTH;
use crate::errors::{CadenceError, Result};
use crate::types::ir::Role;
use crate::week::Instant;

/// Team of IRs; weekly numbers are recomputed from member activity, not
/// stored on the team row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub created_by: Option<String>,
    pub created_at: Instant,
}

/// Membership link; one row per `(team, ir)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: i64,
    pub ir_id: String,
    pub role: Role,
}

/// Creation payload for a new team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl NewTeam {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > MAX_TEAM_NAME_LENGTH {
            return Err(CadenceError::InvalidInput(format!(
                "team name must be 1..={MAX_TEAM_NAME_LENGTH} characters"
            )));
        }
        Ok(())
    }
}
