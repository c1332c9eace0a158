//! Shared test helpers for `cadence-core` integration tests.
//!
//! In-memory repository fakes and fixtures so service tests can focus on
//! behaviour instead of storage plumbing.

pub mod repositories;

use cadence_domain::{Instant, Ir, Role};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

/// Build an instant in the default +05:30 offset.
pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Instant {
    let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
    let time = NaiveTime::from_hms_opt(hour, min, sec).unwrap();
    let offset = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
    DateTime::from_naive_utc_and_offset(date.and_time(time) - offset, offset)
}

/// Build an IR fixture with a path derived from its ancestry.
pub fn ir_fixture(ir_id: &str, role: Role, parent: Option<&Ir>) -> Ir {
    let (parent_ir, hierarchy_path, hierarchy_level) = match parent {
        Some(p) => (
            Some(p.ir_id.clone()),
            Ir::child_path(&p.hierarchy_path, ir_id),
            p.hierarchy_level + 1,
        ),
        None => (None, Ir::root_path(ir_id), 0),
    };
    Ir {
        ir_id: ir_id.to_string(),
        ir_name: format!("{ir_id} name"),
        ir_email: format!("{}@example.com", ir_id.to_lowercase()),
        access_level: role,
        status: true,
        parent_ir,
        hierarchy_path,
        hierarchy_level,
        started_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
    }
}
