//! Core traits for quire abstractions.
//!
//! These traits define the interfaces that concrete stores must satisfy,
//! enabling pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::pagination::ListOptions;

// =============================================================================
// TREE STORE
// =============================================================================

/// Read access to the notebook hierarchy.
///
/// Every list operation orders by `user_sort` ascending and honours
/// [`ListOptions`]: `take` rows at most, optional `skip`, and an exclusive
/// cursor. Callers may ask for `take + 1` rows and trim themselves.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Fetch a notebook by id, restricted to its owner.
    async fn get_notebook(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Notebook>>;

    /// Count groups in a notebook.
    async fn count_groups(&self, notebook_id: Uuid) -> Result<i64>;

    /// List groups in a notebook, annotated with their subgroup counts.
    async fn list_groups(&self, notebook_id: Uuid, opts: &ListOptions) -> Result<Vec<Group>>;

    /// Fetch a single group if it belongs to the notebook.
    async fn get_group(&self, notebook_id: Uuid, group_id: Uuid) -> Result<Option<Group>>;

    /// Count subgroups in a group.
    async fn count_subgroups(&self, group_id: Uuid) -> Result<i64>;

    /// List subgroups in a group, annotated with their entry counts.
    async fn list_subgroups(&self, group_id: Uuid, opts: &ListOptions) -> Result<Vec<Subgroup>>;

    /// Fetch a single subgroup if it belongs to the group.
    async fn get_subgroup(&self, group_id: Uuid, subgroup_id: Uuid) -> Result<Option<Subgroup>>;

    /// Count entries matching a filter.
    async fn count_entries(&self, filter: &EntryFilter) -> Result<i64>;

    /// List entries matching a filter.
    async fn list_entries(&self, filter: &EntryFilter, opts: &ListOptions) -> Result<Vec<Entry>>;
}
