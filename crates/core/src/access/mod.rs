//! Role-based access policy
//!
//! Visibility and edit rights are decided by a single capability table in
//! [`policy`] instead of role conditionals scattered through services. The
//! services compute a [`Relation`] between actor and target once and hand
//! it to the pure policy functions.

pub mod policy;

pub use policy::{
    can_add_data, can_create_team, can_edit, can_manage_targets, can_promote_demote, can_view,
    capabilities, visible_subtree, Capability, Relation,
};

use std::collections::HashSet;

use cadence_domain::{Ir, Result};

use crate::teams::ports::TeamRepository;

/// Compute the actor/target relation the policy functions consume.
///
/// One pass over team memberships; the subtree check is a pure path-prefix
/// comparison on the already-loaded entities.
pub async fn relation_between(
    actor: &Ir,
    target: &Ir,
    teams: &dyn TeamRepository,
) -> Result<Relation> {
    let is_self = actor.ir_id == target.ir_id;
    let in_subtree = target.is_in_subtree_of(actor);

    let actor_teams: HashSet<i64> =
        teams.teams_for_ir(&actor.ir_id).await?.into_iter().map(|t| t.id).collect();
    let target_teams = teams.teams_for_ir(&target.ir_id).await?;

    let same_team = target_teams.iter().any(|t| actor_teams.contains(&t.id));
    let in_owned_team =
        target_teams.iter().any(|t| t.created_by.as_deref() == Some(actor.ir_id.as_str()));

    Ok(Relation { is_self, in_subtree, same_team, in_owned_team })
}
