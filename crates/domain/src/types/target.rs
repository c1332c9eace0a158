//! Weekly targets
//!
//! One target row per `(week_number, year)` and scope (an IR or a team).
//! The same key addresses Info aggregation (Friday window) and Plan
//! aggregation (Monday window), which is the point of sharing one week
//! numbering across both conventions.

use serde::{Deserialize, Serialize};

use crate::errors::{CadenceError, Result};
use crate::week::{Instant, WeekKey};

/// What a weekly target applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum TargetScope {
    Ir(String),
    Team(i64),
}

/// Stored weekly target with its denormalized Friday-window bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyTarget {
    pub id: i64,
    pub week: WeekKey,
    pub scope: TargetScope,
    pub info_target: i64,
    pub plan_target: i64,
    pub uv_target: Option<i64>,
    pub week_start: Instant,
    pub week_end: Instant,
}

/// Upsert payload for a weekly target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetUpsert {
    pub week: WeekKey,
    pub scope: TargetScope,
    pub info_target: i64,
    pub plan_target: i64,
    #[serde(default)]
    pub uv_target: Option<i64>,
}

impl TargetUpsert {
    pub fn validate(&self) -> Result<()> {
        if self.info_target < 0 || self.plan_target < 0 {
            return Err(CadenceError::InvalidInput(
                "targets must be non-negative".to_string(),
            ));
        }
        if self.uv_target.is_some_and(|uv| uv < 0) {
            return Err(CadenceError::InvalidInput(
                "uv target must be non-negative".to_string(),
            ));
        }
        if let TargetScope::Ir(ir_id) = &self.scope {
            if ir_id.is_empty() {
                return Err(CadenceError::InvalidInput("target scope ir_id is empty".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_targets_are_rejected() {
        let upsert = TargetUpsert {
            week: WeekKey::new(3, 2026),
            scope: TargetScope::Ir("IR001".to_string()),
            info_target: -1,
            plan_target: 0,
            uv_target: None,
        };
        assert!(upsert.validate().is_err());

        let upsert = TargetUpsert {
            week: WeekKey::new(3, 2026),
            scope: TargetScope::Team(7),
            info_target: 10,
            plan_target: 2,
            uv_target: Some(-5),
        };
        assert!(upsert.validate().is_err());
    }

    #[test]
    fn scope_serialization_is_tagged() {
        let scope = TargetScope::Team(9);
        let json = serde_json::to_string(&scope).unwrap();
        assert_eq!(json, r#"{"kind":"team","id":9}"#);

        let back: TargetScope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scope);
    }
}
