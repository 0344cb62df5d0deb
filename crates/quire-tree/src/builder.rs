//! Tree builder interface and variant selection.

use async_trait::async_trait;
use uuid::Uuid;

use quire_core::defaults::API_PREFIX;
use quire_core::{Result, TreeStore};

use crate::batched::BatchedTreeBuilder;
use crate::legacy::LegacyTreeBuilder;
use crate::params::TreeParams;
use crate::response::NotebookTree;

static LEGACY: LegacyTreeBuilder = LegacyTreeBuilder::new();

/// Path of the tree endpoint for a notebook.
pub fn tree_path(notebook_id: Uuid) -> String {
    format!("{}/{}/tree", API_PREFIX, notebook_id)
}

/// One tree request: who is asking, for what, and where links point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRequest {
    pub notebook_id: Uuid,
    /// Resolved caller. Only notebooks owned by this id are visible.
    pub owner_id: Uuid,
    pub params: TreeParams,
    /// Path continuation links are built against.
    pub base_path: String,
}

impl TreeRequest {
    pub fn new(notebook_id: Uuid, owner_id: Uuid, params: TreeParams) -> Self {
        Self {
            notebook_id,
            owner_id,
            params,
            base_path: tree_path(notebook_id),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }
}

/// Builds the nested tree for one notebook.
#[async_trait]
pub trait TreeBuilder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Build the tree. A missing notebook is `Error::NotebookNotFound`; any
    /// store failure aborts the whole build.
    async fn build_tree(&self, store: &dyn TreeStore, request: &TreeRequest) -> Result<NotebookTree>;
}

/// Algorithm variant, resolved per request from the feature switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeVariant {
    #[default]
    Batched,
    Legacy,
}

impl TreeVariant {
    pub fn from_flag(batched: bool) -> Self {
        if batched {
            TreeVariant::Batched
        } else {
            TreeVariant::Legacy
        }
    }

    pub fn builder(&self) -> &'static dyn TreeBuilder {
        match self {
            TreeVariant::Batched => &BatchedTreeBuilder,
            TreeVariant::Legacy => &LEGACY,
        }
    }
}
