//! Activity detail records
//!
//! Three record kinds share the shape `(ir, timestamp, payload)`: Info
//! (client interactions, aggregated over the Friday window), Plan
//! (scheduled activities, aggregated over the Monday window), and UV
//! (unit-volume entries, riding the Friday window). Timestamps carry the
//! single fixed offset; each record is counted by filtering its timestamp
//! against a [`crate::week::WindowSpec`].

use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;
use crate::week::Instant;

/* -------------------------------------------------------------------------- */
/* Info records */
/* -------------------------------------------------------------------------- */

/// Client response grade for an Info interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoResponse {
    A,
    B,
    C,
}

impl_status_conversions!(InfoResponse {
    A => "a",
    B => "b",
    C => "c",
});

/// Whether the interaction reached a fresh prospect or re-engaged one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoType {
    Fresh,
    #[serde(rename = "Re-info")]
    ReInfo,
}

impl_status_conversions!(InfoType {
    Fresh => "fresh",
    ReInfo => "re-info",
});

impl Default for InfoType {
    fn default() -> Self {
        Self::Fresh
    }
}

/// Logged client interaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoDetail {
    pub id: i64,
    pub ir_id: String,
    pub recorded_at: Instant,
    pub response: InfoResponse,
    pub info_type: InfoType,
    pub client_name: String,
    pub comments: Option<String>,
}

/// Insertion payload for an Info record; `recorded_at` defaults to "now"
/// at the service layer when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInfoDetail {
    #[serde(default)]
    pub recorded_at: Option<Instant>,
    pub response: InfoResponse,
    #[serde(default)]
    pub info_type: Option<InfoType>,
    pub client_name: String,
    #[serde(default)]
    pub comments: Option<String>,
}

/* -------------------------------------------------------------------------- */
/* Plan records */
/* -------------------------------------------------------------------------- */

/// Lifecycle status of a scheduled plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    ClosingPending,
    Closed,
    Rejected,
    UvsOnCounter,
}

impl_status_conversions!(PlanStatus {
    ClosingPending => "closing_pending",
    Closed => "closed",
    Rejected => "rejected",
    UvsOnCounter => "uvs_on_counter",
});

impl Default for PlanStatus {
    fn default() -> Self {
        Self::ClosingPending
    }
}

/// Scheduled activity record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDetail {
    pub id: i64,
    pub ir_id: String,
    pub recorded_at: Instant,
    pub plan_name: Option<String>,
    pub status: PlanStatus,
    pub comments: Option<String>,
}

/// Insertion payload for a Plan record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlanDetail {
    #[serde(default)]
    pub recorded_at: Option<Instant>,
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub status: Option<PlanStatus>,
    #[serde(default)]
    pub comments: Option<String>,
}

/* -------------------------------------------------------------------------- */
/* UV records */
/* -------------------------------------------------------------------------- */

/// Unit-volume entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UvDetail {
    pub id: i64,
    pub ir_id: String,
    pub recorded_at: Instant,
    pub prospect_name: String,
    pub uv_count: i64,
    pub comments: Option<String>,
}

/// Insertion payload for a UV record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUvDetail {
    #[serde(default)]
    pub recorded_at: Option<Instant>,
    #[serde(default)]
    pub prospect_name: Option<String>,
    #[serde(default = "default_uv_count")]
    pub uv_count: i64,
    #[serde(default)]
    pub comments: Option<String>,
}

fn default_uv_count() -> i64 {
    1
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn plan_status_round_trips_through_storage_strings() {
        for status in [
            PlanStatus::ClosingPending,
            PlanStatus::Closed,
            PlanStatus::Rejected,
            PlanStatus::UvsOnCounter,
        ] {
            assert_eq!(PlanStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn info_type_parses_legacy_spelling() {
        assert_eq!(InfoType::from_str("Re-info").unwrap(), InfoType::ReInfo);
        assert_eq!(InfoType::from_str("FRESH").unwrap(), InfoType::Fresh);
    }

    #[test]
    fn new_uv_detail_defaults_to_a_single_unit() {
        let payload: NewUvDetail = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.uv_count, 1);
        assert!(payload.recorded_at.is_none());
    }
}
