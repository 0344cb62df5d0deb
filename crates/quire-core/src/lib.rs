//! # quire-core
//!
//! Core types, traits, and abstractions for the quire notebook service.
//!
//! This crate provides the entity model (notebook → groups → subgroups →
//! entries), the pagination primitives shared by every list scope, and the
//! store traits that the tree engine and the database layer meet at.

pub mod context;
pub mod defaults;
pub mod error;
pub mod models;
pub mod pagination;
pub mod traits;

// Re-export commonly used types at crate root
pub use context::{StoreLease, StoreProvider};
pub use error::{Error, Result};
pub use models::*;
pub use pagination::{probe_options, split_probe, HasId, ListOptions, Page, PageLinks, PageMeta};
pub use traits::*;
