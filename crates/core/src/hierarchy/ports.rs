//! Port interfaces for IR storage
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use cadence_domain::{Ir, ProvisionedId, Result};

/// Trait for persisting IRs and their materialized hierarchy paths
#[async_trait]
pub trait IrRepository: Send + Sync {
    /// Insert a freshly registered IR
    async fn insert(&self, ir: Ir) -> Result<()>;

    /// Fetch a single IR by id
    async fn find(&self, ir_id: &str) -> Result<Option<Ir>>;

    /// Persist changed fields of an existing IR
    async fn update(&self, ir: &Ir) -> Result<()>;

    /// Remove an IR row. Children must already be re-attached.
    async fn delete(&self, ir_id: &str) -> Result<()>;

    /// All registered IRs
    async fn list_all(&self) -> Result<Vec<Ir>>;

    /// Every IR whose hierarchy path starts with `path_prefix`
    /// (the subtree root itself included)
    async fn list_subtree(&self, path_prefix: &str) -> Result<Vec<Ir>>;

    /// Direct children of `parent_id`
    async fn list_children(&self, parent_id: &str) -> Result<Vec<Ir>>;

    /// Rewrite the path prefix of a whole subtree after a move, shifting
    /// hierarchy levels by `level_delta`. Returns affected row count.
    async fn rewrite_subtree_paths(
        &self,
        old_prefix: &str,
        new_prefix: &str,
        level_delta: i64,
    ) -> Result<usize>;
}

/// Trait for the pre-provisioned id list gating registration
#[async_trait]
pub trait ProvisionedIdRepository: Send + Sync {
    /// Add an id to the allow-list
    async fn add(&self, ir_id: &str) -> Result<()>;

    /// Whether an id is on the allow-list
    async fn exists(&self, ir_id: &str) -> Result<bool>;

    /// The full allow-list
    async fn list(&self) -> Result<Vec<ProvisionedId>>;
}
