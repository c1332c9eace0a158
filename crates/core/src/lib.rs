//! # Cadence Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for persistence
//! - Use cases and services: hierarchy, reporting, targets, teams
//! - The role capability policy
//!
//! ## Architecture Principles
//! - Only depends on `cadence-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod access;
pub mod hierarchy;
pub mod reporting;
pub mod targets;
pub mod teams;

// Re-export specific items to avoid ambiguity
pub use access::{relation_between, Capability, Relation};
pub use hierarchy::ports::{IrRepository, ProvisionedIdRepository};
pub use hierarchy::HierarchyService;
pub use reporting::ports::ActivityRepository;
pub use reporting::ReportingService;
pub use targets::ports::TargetRepository;
pub use targets::TargetsService;
pub use teams::ports::TeamRepository;
pub use teams::TeamsService;
