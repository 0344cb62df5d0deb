//! # quire-tree
//!
//! Tree aggregation and pagination engine for quire notebooks.
//!
//! Given a notebook id and a set of expansion/pagination directives, this
//! crate returns one nested payload (notebook → paginated groups →
//! paginated subgroups → paginated entries) with cursors, totals and
//! continuation links at every level.
//!
//! This crate provides:
//! - Parameter normalization for decoded query directives
//! - Continuation link construction per pagination scope
//! - The batched aggregator (take+1 probing, targeted expansion, concurrent fan-out)
//! - The legacy sequential traversal, selectable at request time
//! - Flat per-level listing used by the single-level endpoints
//!
//! ## Example
//!
//! ```ignore
//! use quire_tree::{TreeParams, TreeRequest, TreeVariant};
//!
//! let params = TreeParams::from_query_str("include=subgroups,entries&groups.take=10")?;
//! let request = TreeRequest::new(notebook_id, owner_id, params);
//!
//! let lease = provider.acquire().await?;
//! let tree = TreeVariant::Batched
//!     .builder()
//!     .build_tree(lease.store(), &request)
//!     .await?;
//! println!("{} groups", tree.groups.meta.total);
//! ```

pub mod batched;
pub mod builder;
pub mod legacy;
pub mod links;
pub mod listing;
pub mod params;
pub mod response;

pub use batched::BatchedTreeBuilder;
pub use builder::{tree_path, TreeBuilder, TreeRequest, TreeVariant};
pub use legacy::LegacyTreeBuilder;
pub use links::LinkBuilder;
pub use listing::{ListParams, RawListQuery};
pub use params::{CursorMap, Include, PageParams, RawTreeQuery, Scope, ScopedParams, TreeParams};
pub use response::{GroupNode, NotebookTree, SubgroupNode};
