//! Aggregated weekly progress types
//!
//! These are computed views, never stored: every number is a sum over
//! detail records filtered by the week's windows, joined with the target
//! row for the same `(week_number, year)`.

use serde::{Deserialize, Serialize};

use crate::types::ir::Role;
use crate::week::{WeekKey, WindowSpec};

/// Raw activity counts for one scope in one week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTally {
    /// Info records inside the Friday window
    pub info_done: i64,
    /// Plan records inside the Monday window
    pub plan_done: i64,
    /// Unit-volume sum inside the Friday window
    pub uv_done: i64,
}

/// One IR's weekly progress against their targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrWeeklyProgress {
    pub ir_id: String,
    pub ir_name: String,
    pub week: WeekKey,
    pub info_done: i64,
    pub plan_done: i64,
    /// Present only for roles that track unit volume
    pub uv_done: Option<i64>,
    pub info_target: i64,
    pub plan_target: i64,
    pub uv_target: Option<i64>,
    pub has_targets_set: bool,
}

/// Per-member line of a team progress report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProgress {
    pub ir_id: String,
    pub ir_name: String,
    pub role: Role,
    pub info_done: i64,
    pub plan_done: i64,
    pub uv_done: Option<i64>,
}

/// One team's weekly progress: member breakdown plus totals and targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamWeeklyProgress {
    pub team_id: i64,
    pub team_name: String,
    pub week: WeekKey,
    pub info_done: i64,
    pub plan_done: i64,
    pub uv_done: i64,
    pub info_target: i64,
    pub plan_target: i64,
    pub uv_target: Option<i64>,
    pub has_targets_set: bool,
    pub members: Vec<MemberProgress>,
}

/// Supervisor dashboard: personal progress plus every team the IR sits on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub personal: IrWeeklyProgress,
    pub teams: Vec<TeamWeeklyProgress>,
}

/// A week identifier with both of its resolved activity windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekWindows {
    pub week: WeekKey,
    pub friday_window: WindowSpec,
    pub monday_window: WindowSpec,
}
