//! Legacy sequential traversal.
//!
//! Walks the tree level by level and materializes everything under the
//! notebook in one page per level. Each level is read in batches with the
//! exclusive cursor until a short batch comes back. No probing, no targeted
//! expansion, no links. Kept as the rollback path for the batched aggregator and as the
//! reference its output is checked against.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use quire_core::defaults::LEGACY_FETCH_BATCH;
use quire_core::{EntryFilter, Error, HasId, ListOptions, Page, PageMeta, Result, TreeStore};

use crate::builder::{TreeBuilder, TreeRequest};
use crate::response::{GroupNode, NotebookTree, SubgroupNode};

#[derive(Debug, Clone, Copy)]
pub struct LegacyTreeBuilder {
    batch_size: i64,
}

impl LegacyTreeBuilder {
    pub const fn new() -> Self {
        Self {
            batch_size: LEGACY_FETCH_BATCH,
        }
    }

    /// Rows read per store round trip. Values below 1 are raised to 1.
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Read one level to its end.
    async fn fetch_all<T, F, Fut>(&self, level: &'static str, mut fetch: F) -> Result<Vec<T>>
    where
        T: HasId,
        F: FnMut(ListOptions) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let mut rows: Vec<T> = Vec::new();
        let mut cursor = None;
        let mut batches = 0usize;
        loop {
            let batch = fetch(ListOptions {
                take: self.batch_size,
                skip: None,
                cursor,
            })
            .await?;
            batches += 1;
            let short = (batch.len() as i64) < self.batch_size;
            cursor = batch.last().map(HasId::id);
            rows.extend(batch);
            if short {
                break;
            }
        }
        if batches > 1 {
            debug!(level, batches, result_count = rows.len(), "Level read in batches");
        }
        Ok(rows)
    }
}

impl Default for LegacyTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TreeBuilder for LegacyTreeBuilder {
    fn name(&self) -> &'static str {
        "legacy"
    }

    #[instrument(skip(self, store, request), fields(
        subsystem = "tree",
        component = "legacy",
        op = "build_tree",
        notebook_id = %request.notebook_id,
    ))]
    async fn build_tree(&self, store: &dyn TreeStore, request: &TreeRequest) -> Result<NotebookTree> {
        let start = Instant::now();
        let params = &request.params;

        let notebook = store
            .get_notebook(request.notebook_id, request.owner_id)
            .await?
            .ok_or(Error::NotebookNotFound(request.notebook_id))?;

        let notebook_id = notebook.id;
        let groups = self
            .fetch_all("groups", |opts| async move {
                store.list_groups(notebook_id, &opts).await
            })
            .await?;
        let groups_meta = PageMeta::complete(params.groups.take, groups.len());

        let mut entry_count = 0usize;
        let mut group_nodes = Vec::with_capacity(groups.len());
        for group in groups {
            if !params.include.subgroups() {
                group_nodes.push(GroupNode {
                    group,
                    subgroups: None,
                });
                continue;
            }

            let group_id = group.id;
            let subgroups = self
                .fetch_all("subgroups", |opts| async move {
                    store.list_subgroups(group_id, &opts).await
                })
                .await?;
            let subgroups_meta = PageMeta::complete(params.subgroups.take, subgroups.len());
            let mut subgroup_nodes = Vec::with_capacity(subgroups.len());
            for subgroup in subgroups {
                let entries = if params.include.entries() {
                    let filter = EntryFilter::new(subgroup.id, request.owner_id)
                        .include_archived(params.include_archived);
                    let filter_ref = &filter;
                    let entries = self
                        .fetch_all("entries", |opts| async move {
                            store.list_entries(filter_ref, &opts).await
                        })
                        .await?;
                    entry_count += entries.len();
                    let meta = PageMeta::complete(params.entries.take, entries.len())
                        .with_include_archived(params.include_archived);
                    Some(Page::new(entries, meta))
                } else {
                    None
                };
                subgroup_nodes.push(SubgroupNode { subgroup, entries });
            }

            group_nodes.push(GroupNode {
                group,
                subgroups: Some(Page::new(subgroup_nodes, subgroups_meta)),
            });
        }

        info!(
            result_count = group_nodes.len(),
            entry_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tree materialized"
        );

        Ok(NotebookTree {
            notebook,
            groups: Page::new(group_nodes, groups_meta),
        })
    }
}
