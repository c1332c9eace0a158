//! Individual representative (IR) entity and hierarchy helpers
//!
//! IRs form a parent/child tree materialized as a path string of the form
//! `/ROOT/CHILD/GRANDCHILD/`. Subtree membership is a path-prefix check, so
//! visibility queries never walk the tree row by row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_HIERARCHY_PATH_LENGTH, MAX_IR_ID_LENGTH, MAX_IR_NAME_LENGTH};
use crate::errors::{CadenceError, Result};
use crate::impl_status_conversions;

/// Access role, ordered from widest to narrowest authority.
///
/// The numeric level is what the database stores and what the legacy data
/// used; the enum is the only thing the rest of the code sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Ctc,
    Ldc,
    Ls,
    Gc,
    Ir,
}

impl_status_conversions!(Role {
    Admin => "admin",
    Ctc => "ctc",
    Ldc => "ldc",
    Ls => "ls",
    Gc => "gc",
    Ir => "ir",
});

impl Role {
    /// Numeric access level, 1 (admin) through 6 (plain IR).
    pub const fn level(self) -> u8 {
        match self {
            Self::Admin => 1,
            Self::Ctc => 2,
            Self::Ldc => 3,
            Self::Ls => 4,
            Self::Gc => 5,
            Self::Ir => 6,
        }
    }

    /// Parse a stored numeric level.
    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            1 => Ok(Self::Admin),
            2 => Ok(Self::Ctc),
            3 => Ok(Self::Ldc),
            4 => Ok(Self::Ls),
            5 => Ok(Self::Gc),
            6 => Ok(Self::Ir),
            other => Err(CadenceError::InvalidInput(format!("invalid access level: {other}"))),
        }
    }

    /// Whether unit-volume numbers apply to this role. UV targets and
    /// counts exist only for CTC and LDC.
    pub const fn tracks_uv(self) -> bool {
        matches!(self, Self::Ctc | Self::Ldc)
    }
}

/// Pre-provisioned IR id; registration is rejected for ids not on the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedId {
    pub ir_id: String,
}

/// Individual representative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ir {
    pub ir_id: String,
    pub ir_name: String,
    pub ir_email: String,
    pub access_level: Role,
    pub status: bool,
    pub parent_ir: Option<String>,
    pub hierarchy_path: String,
    pub hierarchy_level: u32,
    pub started_date: NaiveDate,
}

impl Ir {
    /// Path of a root IR.
    pub fn root_path(ir_id: &str) -> String {
        format!("/{ir_id}/")
    }

    /// Path of an IR attached under `parent_path`.
    pub fn child_path(parent_path: &str, ir_id: &str) -> String {
        format!("{parent_path}{ir_id}/")
    }

    /// Whether this IR sits inside `ancestor`'s subtree (self included).
    pub fn is_in_subtree_of(&self, ancestor: &Ir) -> bool {
        self.hierarchy_path.starts_with(&ancestor.hierarchy_path)
    }
}

/// Registration payload for a new IR
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIr {
    pub ir_id: String,
    pub ir_name: String,
    pub ir_email: String,
    #[serde(default)]
    pub access_level: Option<Role>,
    #[serde(default)]
    pub parent_ir: Option<String>,
}

impl NewIr {
    /// Field-level validation; hierarchy checks happen in the service.
    pub fn validate(&self) -> Result<()> {
        if self.ir_id.is_empty() || self.ir_id.len() > MAX_IR_ID_LENGTH {
            return Err(CadenceError::InvalidInput(format!(
                "ir_id must be 1..={MAX_IR_ID_LENGTH} characters"
            )));
        }
        if self.ir_id.contains('/') {
            return Err(CadenceError::InvalidInput(
                "ir_id must not contain '/'".to_string(),
            ));
        }
        if self.ir_name.is_empty() || self.ir_name.len() > MAX_IR_NAME_LENGTH {
            return Err(CadenceError::InvalidInput(format!(
                "ir_name must be 1..={MAX_IR_NAME_LENGTH} characters"
            )));
        }
        if !self.ir_email.contains('@') {
            return Err(CadenceError::InvalidInput(format!(
                "invalid email: {}",
                self.ir_email
            )));
        }
        Ok(())
    }
}

/// Partial profile update for an existing IR.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrUpdate {
    #[serde(default)]
    pub ir_name: Option<String>,
    #[serde(default)]
    pub ir_email: Option<String>,
    #[serde(default)]
    pub status: Option<bool>,
}

/// One node of the rendered hierarchy tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub ir: Ir,
    pub children: Vec<HierarchyNode>,
}

/// Validate that a computed hierarchy path still fits the storage column.
pub fn validate_path_length(path: &str) -> Result<()> {
    if path.len() > MAX_HIERARCHY_PATH_LENGTH {
        return Err(CadenceError::InvalidInput(format!(
            "hierarchy path exceeds {MAX_HIERARCHY_PATH_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ir(id: &str, path: &str) -> Ir {
        Ir {
            ir_id: id.to_string(),
            ir_name: format!("{id} name"),
            ir_email: format!("{id}@example.com"),
            access_level: Role::Ir,
            status: true,
            parent_ir: None,
            hierarchy_path: path.to_string(),
            hierarchy_level: path.matches('/').count() as u32 - 1,
            started_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        }
    }

    #[test]
    fn role_levels_round_trip() {
        for role in [Role::Admin, Role::Ctc, Role::Ldc, Role::Ls, Role::Gc, Role::Ir] {
            assert_eq!(Role::from_level(role.level()).unwrap(), role);
        }
        assert!(Role::from_level(0).is_err());
        assert!(Role::from_level(7).is_err());
    }

    #[test]
    fn uv_tracking_is_limited_to_ctc_and_ldc() {
        assert!(Role::Ctc.tracks_uv());
        assert!(Role::Ldc.tracks_uv());
        assert!(!Role::Admin.tracks_uv());
        assert!(!Role::Ir.tracks_uv());
    }

    #[test]
    fn subtree_check_uses_path_prefix() {
        let root = ir("ROOT", "/ROOT/");
        let child = ir("A", "/ROOT/A/");
        let grandchild = ir("B", "/ROOT/A/B/");
        let sibling = ir("C", "/ROOT/C/");

        assert!(child.is_in_subtree_of(&root));
        assert!(grandchild.is_in_subtree_of(&child));
        assert!(grandchild.is_in_subtree_of(&root));
        assert!(!sibling.is_in_subtree_of(&child));
        assert!(root.is_in_subtree_of(&root));
    }

    #[test]
    fn path_builders_compose() {
        assert_eq!(Ir::root_path("ROOT"), "/ROOT/");
        assert_eq!(Ir::child_path("/ROOT/", "A"), "/ROOT/A/");
        assert_eq!(Ir::child_path("/ROOT/A/", "B"), "/ROOT/A/B/");
    }

    #[test]
    fn registration_payload_validation() {
        let valid = NewIr {
            ir_id: "IR001".to_string(),
            ir_name: "Asha".to_string(),
            ir_email: "asha@example.com".to_string(),
            access_level: None,
            parent_ir: None,
        };
        assert!(valid.validate().is_ok());

        let mut bad = valid.clone();
        bad.ir_id = "X".repeat(MAX_IR_ID_LENGTH + 1);
        assert!(bad.validate().is_err());

        let mut bad = valid.clone();
        bad.ir_id = "a/b".to_string();
        assert!(bad.validate().is_err());

        let mut bad = valid;
        bad.ir_email = "nope".to_string();
        assert!(bad.validate().is_err());
    }
}
