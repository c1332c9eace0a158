//! Capability table and pure policy checks
//!
//! Each role maps to a static capability set; every authorization question
//! reduces to "does any granted capability cover this relation". Adding a
//! role or loosening a rule is a table edit, not a code hunt.

use cadence_domain::Role;

/// What a role is allowed to do beyond its own data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// View any IR in the system
    ViewAll,
    /// View IRs inside the actor's hierarchy subtree
    ViewSubtree,
    /// View IRs sharing a team with the actor
    ViewTeammates,
    /// Edit any IR
    EditAll,
    /// Edit IRs inside the actor's subtree
    EditSubtree,
    /// Edit members of teams the actor created
    EditOwnedTeams,
    /// Log activity for any IR
    AddForAll,
    /// Log activity for IRs inside the actor's subtree
    AddForSubtree,
    /// Log activity for members of teams the actor created
    AddForOwnedTeams,
    /// Log activity for IRs sharing a team with the actor
    AddForTeammates,
    /// Set weekly targets
    ManageTargets,
    /// Create teams
    CreateTeam,
    /// Change other IRs' access levels
    PromoteDemote,
}

/// How the target stands to the actor. Self-access is always granted and
/// does not need a capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relation {
    pub is_self: bool,
    pub in_subtree: bool,
    pub same_team: bool,
    pub in_owned_team: bool,
}

/// The capability table. GC and IR hold no capabilities: they see and edit
/// only themselves.
pub const fn capabilities(role: Role) -> &'static [Capability] {
    use Capability as C;
    match role {
        Role::Admin => &[
            C::ViewAll,
            C::EditAll,
            C::AddForAll,
            C::ManageTargets,
            C::CreateTeam,
            C::PromoteDemote,
        ],
        Role::Ctc => &[
            C::ViewSubtree,
            C::EditSubtree,
            C::AddForSubtree,
            C::ManageTargets,
            C::CreateTeam,
            C::PromoteDemote,
        ],
        Role::Ldc => &[
            C::ViewSubtree,
            C::EditOwnedTeams,
            C::AddForOwnedTeams,
            C::ManageTargets,
            C::CreateTeam,
        ],
        Role::Ls => &[C::ViewTeammates, C::AddForTeammates],
        Role::Gc | Role::Ir => &[],
    }
}

fn covers(capability: Capability, relation: Relation) -> bool {
    use Capability as C;
    match capability {
        C::ViewAll | C::EditAll | C::AddForAll => true,
        C::ViewSubtree | C::EditSubtree | C::AddForSubtree => relation.in_subtree,
        C::ViewTeammates | C::AddForTeammates => relation.same_team,
        C::EditOwnedTeams | C::AddForOwnedTeams => relation.in_owned_team,
        C::ManageTargets | C::CreateTeam | C::PromoteDemote => false,
    }
}

fn granted(role: Role, relation: Relation, wanted: &[Capability]) -> bool {
    if relation.is_self {
        return true;
    }
    capabilities(role)
        .iter()
        .any(|cap| wanted.contains(cap) && covers(*cap, relation))
}

/// Whether `role` may view a target standing in `relation` to the actor.
pub fn can_view(role: Role, relation: Relation) -> bool {
    use Capability as C;
    granted(role, relation, &[C::ViewAll, C::ViewSubtree, C::ViewTeammates])
}

/// Whether `role` may edit a target standing in `relation` to the actor.
pub fn can_edit(role: Role, relation: Relation) -> bool {
    use Capability as C;
    granted(role, relation, &[C::EditAll, C::EditSubtree, C::EditOwnedTeams])
}

/// Whether `role` may log Info/Plan/UV records for the target.
pub fn can_add_data(role: Role, relation: Relation) -> bool {
    use Capability as C;
    granted(
        role,
        relation,
        &[C::AddForAll, C::AddForSubtree, C::AddForOwnedTeams, C::AddForTeammates],
    )
}

/// Whether `role` may set weekly targets.
pub fn can_manage_targets(role: Role) -> bool {
    capabilities(role).contains(&Capability::ManageTargets)
}

/// Whether `role` may create teams.
pub fn can_create_team(role: Role) -> bool {
    capabilities(role).contains(&Capability::CreateTeam)
}

/// Whether `role` may change access levels.
pub fn can_promote_demote(role: Role) -> bool {
    capabilities(role).contains(&Capability::PromoteDemote)
}

/// Hierarchy-path visibility: whether an actor with `role` rooted at
/// `actor_path` can see the subtree node at `target_path`.
pub fn visible_subtree(role: Role, actor_path: &str, target_path: &str) -> bool {
    match role {
        Role::Admin => true,
        Role::Ctc | Role::Ldc => target_path.starts_with(actor_path),
        Role::Ls | Role::Gc | Role::Ir => actor_path == target_path,
    }
}
