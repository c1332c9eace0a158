//! Hierarchy service - IR registration, moves, and subtree queries
//!
//! The hierarchy is materialized as path strings, so structural operations
//! (move, delete) are prefix rewrites instead of recursive row walks.
//! Structural authorization considers hierarchy relations only; team
//! co-membership never grants the right to restructure the tree.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_domain::{
    CadenceError, HierarchyNode, Ir, IrUpdate, NewIr, ProvisionedId, Result, Role,
};
use chrono::NaiveDate;
use tracing::info;

use super::ports::{IrRepository, ProvisionedIdRepository};
use crate::access::policy::{can_edit, can_promote_demote, can_view, Relation};

/// IR hierarchy service
pub struct HierarchyService {
    irs: Arc<dyn IrRepository>,
    provisioned: Arc<dyn ProvisionedIdRepository>,
}

impl HierarchyService {
    pub fn new(irs: Arc<dyn IrRepository>, provisioned: Arc<dyn ProvisionedIdRepository>) -> Self {
        Self { irs, provisioned }
    }

    /// Add an id to the registration allow-list.
    pub async fn provision_id(&self, ir_id: &str) -> Result<()> {
        if ir_id.is_empty() {
            return Err(CadenceError::InvalidInput("ir_id is empty".to_string()));
        }
        self.provisioned.add(ir_id).await
    }

    /// The registration allow-list.
    pub async fn provisioned_ids(&self) -> Result<Vec<ProvisionedId>> {
        self.provisioned.list().await
    }

    /// Register a new IR against the allow-list and attach it under its
    /// parent.
    pub async fn register(&self, new: NewIr, today: NaiveDate) -> Result<Ir> {
        new.validate()?;

        if !self.provisioned.exists(&new.ir_id).await? {
            return Err(CadenceError::NotFound(format!("IR id not provisioned: {}", new.ir_id)));
        }
        if self.irs.find(&new.ir_id).await?.is_some() {
            return Err(CadenceError::Conflict(format!("IR already registered: {}", new.ir_id)));
        }

        let (parent_ir, hierarchy_path, hierarchy_level) = match &new.parent_ir {
            Some(parent_id) => {
                let parent = self.require(parent_id).await?;
                (
                    Some(parent.ir_id.clone()),
                    Ir::child_path(&parent.hierarchy_path, &new.ir_id),
                    parent.hierarchy_level + 1,
                )
            }
            None => (None, Ir::root_path(&new.ir_id), 0),
        };
        cadence_domain::validate_path_length(&hierarchy_path)?;

        let ir = Ir {
            ir_id: new.ir_id,
            ir_name: new.ir_name,
            ir_email: new.ir_email,
            access_level: new.access_level.unwrap_or(Role::Ir),
            status: true,
            parent_ir,
            hierarchy_path,
            hierarchy_level,
            started_date: today,
        };
        self.irs.insert(ir.clone()).await?;

        info!(ir_id = %ir.ir_id, level = ir.hierarchy_level, "ir registered");
        Ok(ir)
    }

    /// Fetch one IR or fail with NotFound.
    pub async fn require(&self, ir_id: &str) -> Result<Ir> {
        self.irs
            .find(ir_id)
            .await?
            .ok_or_else(|| CadenceError::NotFound(format!("IR not found: {ir_id}")))
    }

    /// All registered IRs.
    pub async fn list(&self) -> Result<Vec<Ir>> {
        self.irs.list_all().await
    }

    /// Whole subtree rooted at `ir_id`, the root included, visibility
    /// checked against the actor's role.
    pub async fn subtree(&self, actor: &Ir, ir_id: &str) -> Result<Vec<Ir>> {
        let root = self.require(ir_id).await?;
        self.check_view(actor, &root)?;
        self.irs.list_subtree(&root.hierarchy_path).await
    }

    /// Everything below `ir_id`, the root excluded.
    pub async fn downlines(&self, actor: &Ir, ir_id: &str) -> Result<Vec<Ir>> {
        let mut rows = self.subtree(actor, ir_id).await?;
        rows.retain(|ir| ir.ir_id != ir_id);
        Ok(rows)
    }

    /// Direct children of `ir_id`.
    pub async fn direct_downlines(&self, actor: &Ir, ir_id: &str) -> Result<Vec<Ir>> {
        let root = self.require(ir_id).await?;
        self.check_view(actor, &root)?;
        self.irs.list_children(ir_id).await
    }

    /// Assemble the hierarchy tree rooted at `ir_id`.
    pub async fn tree(&self, actor: &Ir, ir_id: &str) -> Result<HierarchyNode> {
        let root = self.require(ir_id).await?;
        self.check_view(actor, &root)?;

        let rows = self.irs.list_subtree(&root.hierarchy_path).await?;
        let mut children_of: HashMap<String, Vec<Ir>> = HashMap::new();
        for row in rows {
            if row.ir_id == root.ir_id {
                continue;
            }
            if let Some(parent_id) = row.parent_ir.clone() {
                children_of.entry(parent_id).or_default().push(row);
            }
        }
        Ok(assemble(root, &mut children_of))
    }

    /// Update mutable profile fields.
    pub async fn update_profile(&self, actor: &Ir, ir_id: &str, update: IrUpdate) -> Result<Ir> {
        let mut target = self.require(ir_id).await?;
        self.check_edit(actor, &target)?;

        if let Some(name) = update.ir_name {
            target.ir_name = name;
        }
        if let Some(email) = update.ir_email {
            if !email.contains('@') {
                return Err(CadenceError::InvalidInput(format!("invalid email: {email}")));
            }
            target.ir_email = email;
        }
        if let Some(status) = update.status {
            target.status = status;
        }
        self.irs.update(&target).await?;
        Ok(target)
    }

    /// Change an IR's access level. Admin and CTC only.
    pub async fn change_access_level(
        &self,
        actor: &Ir,
        ir_id: &str,
        new_role: Role,
    ) -> Result<Ir> {
        if !can_promote_demote(actor.access_level) {
            return Err(CadenceError::Forbidden(format!(
                "{} may not change access levels",
                actor.ir_id
            )));
        }
        let mut target = self.require(ir_id).await?;
        target.access_level = new_role;
        self.irs.update(&target).await?;

        info!(ir_id = %target.ir_id, role = %new_role, "access level changed");
        Ok(target)
    }

    /// Re-attach an IR (and its whole subtree) under a new parent.
    ///
    /// Rejects moves under the IR's own subtree, which would detach the
    /// branch from the tree entirely.
    pub async fn move_ir(
        &self,
        actor: &Ir,
        ir_id: &str,
        new_parent: Option<&str>,
    ) -> Result<Ir> {
        let mut target = self.require(ir_id).await?;
        self.check_edit(actor, &target)?;

        let (parent_ir, new_path, new_level) = match new_parent {
            Some(parent_id) => {
                if parent_id == ir_id {
                    return Err(CadenceError::InvalidInput(
                        "an IR cannot be its own parent".to_string(),
                    ));
                }
                let parent = self.require(parent_id).await?;
                if parent.hierarchy_path.starts_with(&target.hierarchy_path) {
                    return Err(CadenceError::Conflict(format!(
                        "cannot move {ir_id} under its own subtree"
                    )));
                }
                (
                    Some(parent.ir_id.clone()),
                    Ir::child_path(&parent.hierarchy_path, ir_id),
                    parent.hierarchy_level + 1,
                )
            }
            None => (None, Ir::root_path(ir_id), 0),
        };
        cadence_domain::validate_path_length(&new_path)?;

        let old_path = target.hierarchy_path.clone();
        let level_delta = i64::from(new_level) - i64::from(target.hierarchy_level);
        let moved = self.irs.rewrite_subtree_paths(&old_path, &new_path, level_delta).await?;

        target.parent_ir = parent_ir;
        target.hierarchy_path = new_path;
        target.hierarchy_level = new_level;
        self.irs.update(&target).await?;

        info!(ir_id, moved, "ir moved");
        Ok(target)
    }

    /// Delete an IR, reconnecting its children to the grandparent so the
    /// hierarchy stays intact.
    pub async fn remove(&self, actor: &Ir, ir_id: &str) -> Result<()> {
        let target = self.require(ir_id).await?;
        self.check_edit(actor, &target)?;

        let grandparent = match &target.parent_ir {
            Some(parent_id) => Some(self.require(parent_id).await?),
            None => None,
        };

        let children = self.irs.list_children(ir_id).await?;
        for mut child in children {
            let (new_path, new_level) = match &grandparent {
                Some(gp) => {
                    (Ir::child_path(&gp.hierarchy_path, &child.ir_id), gp.hierarchy_level + 1)
                }
                None => (Ir::root_path(&child.ir_id), 0),
            };
            let level_delta = i64::from(new_level) - i64::from(child.hierarchy_level);
            self.irs
                .rewrite_subtree_paths(&child.hierarchy_path, &new_path, level_delta)
                .await?;

            child.parent_ir = grandparent.as_ref().map(|gp| gp.ir_id.clone());
            child.hierarchy_path = new_path;
            child.hierarchy_level = new_level;
            self.irs.update(&child).await?;
        }

        self.irs.delete(ir_id).await?;
        info!(ir_id, "ir deleted, children re-attached");
        Ok(())
    }

    fn check_view(&self, actor: &Ir, target: &Ir) -> Result<()> {
        if can_view(actor.access_level, hierarchy_relation(actor, target)) {
            Ok(())
        } else {
            Err(CadenceError::Forbidden(format!(
                "{} may not view {}",
                actor.ir_id, target.ir_id
            )))
        }
    }

    fn check_edit(&self, actor: &Ir, target: &Ir) -> Result<()> {
        if can_edit(actor.access_level, hierarchy_relation(actor, target)) {
            Ok(())
        } else {
            Err(CadenceError::Forbidden(format!(
                "{} may not edit {}",
                actor.ir_id, target.ir_id
            )))
        }
    }
}

/// Relation restricted to hierarchy facts; team co-membership is not
/// considered for structural operations.
fn hierarchy_relation(actor: &Ir, target: &Ir) -> Relation {
    Relation {
        is_self: actor.ir_id == target.ir_id,
        in_subtree: target.is_in_subtree_of(actor),
        same_team: false,
        in_owned_team: false,
    }
}

fn assemble(ir: Ir, children_of: &mut HashMap<String, Vec<Ir>>) -> HierarchyNode {
    let children = children_of
        .remove(&ir.ir_id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| assemble(child, children_of))
        .collect();
    HierarchyNode { ir, children }
}
