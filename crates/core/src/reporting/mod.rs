//! Activity recording and weekly aggregation

pub mod ports;
pub mod service;

pub use service::ReportingService;
