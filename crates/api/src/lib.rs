//! # Cadence API
//!
//! HTTP layer over the core services: routing, extraction, and domain
//! error translation. The binary entry point lives in `main.rs`; the
//! library surface exists so integration tests can drive the router
//! in-process.

pub mod context;
pub mod error;
pub mod routes;

pub use context::AppContext;
pub use routes::build_router;
