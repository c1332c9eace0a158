//! IR hierarchy management

pub mod ports;
pub mod service;

pub use service::HierarchyService;
