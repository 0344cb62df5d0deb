//! Batched tree aggregation.
//!
//! One page of groups is read with a take+1 probe. Subgroup pages for the
//! target groups are then fetched concurrently, and entry pages for the
//! target subgroups after that. Each fetch fills a slot keyed by its parent
//! id, so assembly needs no shared mutable state. Parents that were not
//! targeted still get an empty block whose total comes from the count
//! annotation read with their own page.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::try_join_all;
use futures::try_join;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use quire_core::{
    split_probe, Entry, EntryFilter, Error, Group, HasId, Page, PageMeta, Result, Subgroup,
    TreeStore,
};

use crate::builder::{TreeBuilder, TreeRequest};
use crate::links::LinkBuilder;
use crate::params::TreeParams;
use crate::response::{GroupNode, NotebookTree, SubgroupNode};

/// Aggregator with take+1 probing, targeted expansion and concurrent fan-out.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchedTreeBuilder;

/// One probed page for a single parent.
#[derive(Debug)]
struct ScopedPage<T> {
    rows: Vec<T>,
    total: i64,
    cursor: Option<Uuid>,
    next: Option<Uuid>,
}

impl<T: HasId> ScopedPage<T> {
    fn new(rows: Vec<T>, total: i64, take: u32, cursor: Option<Uuid>) -> Self {
        let (rows, next) = split_probe(rows, take);
        Self {
            rows,
            total,
            cursor,
            next,
        }
    }

    fn meta(&self, take: u32) -> PageMeta {
        PageMeta::paged(take, None, self.cursor, self.rows.len(), self.total, self.next)
    }
}

async fn fetch_subgroups(
    store: &dyn TreeStore,
    params: &TreeParams,
    group_id: Uuid,
) -> Result<ScopedPage<Subgroup>> {
    let opts = params.subgroups.probe(group_id);
    let (total, rows) = try_join!(
        store.count_subgroups(group_id),
        store.list_subgroups(group_id, &opts)
    )?;
    Ok(ScopedPage::new(rows, total, params.subgroups.take, opts.cursor))
}

async fn fetch_entries(
    store: &dyn TreeStore,
    request: &TreeRequest,
    subgroup_id: Uuid,
) -> Result<ScopedPage<Entry>> {
    let params = &request.params;
    let filter =
        EntryFilter::new(subgroup_id, request.owner_id).include_archived(params.include_archived);
    let opts = params.entries.probe(subgroup_id);
    let (total, rows) = try_join!(
        store.count_entries(&filter),
        store.list_entries(&filter, &opts)
    )?;
    Ok(ScopedPage::new(rows, total, params.entries.take, opts.cursor))
}

#[async_trait]
impl TreeBuilder for BatchedTreeBuilder {
    fn name(&self) -> &'static str {
        "batched"
    }

    #[instrument(skip(self, store, request), fields(
        subsystem = "tree",
        component = "batched",
        op = "build_tree",
        notebook_id = %request.notebook_id,
    ))]
    async fn build_tree(&self, store: &dyn TreeStore, request: &TreeRequest) -> Result<NotebookTree> {
        let start = Instant::now();
        let params = &request.params;
        let links = LinkBuilder::new(&request.base_path, params);

        let notebook = store
            .get_notebook(request.notebook_id, request.owner_id)
            .await?
            .ok_or(Error::NotebookNotFound(request.notebook_id))?;

        let group_opts = params.groups.probe();
        let (group_total, group_rows) = try_join!(
            store.count_groups(notebook.id),
            store.list_groups(notebook.id, &group_opts)
        )?;
        let (groups, groups_next) = split_probe(group_rows, params.groups.take);
        let groups_meta = PageMeta::paged(
            params.groups.take,
            params.groups.skip,
            params.groups.cursor,
            groups.len(),
            group_total,
            groups_next,
        )
        .with_next_link(links.groups_next(groups_next));

        // Subgroup fan-out over the target groups on this page.
        let mut subgroup_pages: HashMap<Uuid, ScopedPage<Subgroup>> = HashMap::new();
        if params.include.subgroups() {
            let page_ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
            let targets = params.subgroups.targets(&page_ids);
            debug!(
                level = "subgroups",
                fanout = targets.len(),
                "Fetching subgroup pages"
            );
            let pages =
                try_join_all(targets.iter().map(|&id| fetch_subgroups(store, params, id))).await?;
            subgroup_pages = targets.into_iter().zip(pages).collect();
        }

        // Entry fan-out over the target subgroups among those just fetched.
        let mut entry_pages: HashMap<Uuid, ScopedPage<Entry>> = HashMap::new();
        if params.include.entries() {
            let fetched_ids: Vec<Uuid> = groups
                .iter()
                .filter_map(|g| subgroup_pages.get(&g.id))
                .flat_map(|page| page.rows.iter().map(|s| s.id))
                .collect();
            let targets = params.entries.targets(&fetched_ids);
            debug!(
                level = "entries",
                fanout = targets.len(),
                include_archived = params.include_archived,
                "Fetching entry pages"
            );
            let pages =
                try_join_all(targets.iter().map(|&id| fetch_entries(store, request, id))).await?;
            entry_pages = targets.into_iter().zip(pages).collect();
        }

        let subgroup_page_count = subgroup_pages.len();
        let entry_page_count = entry_pages.len();
        let mut group_nodes = Vec::with_capacity(groups.len());
        for group in groups {
            let subgroups = params
                .include
                .subgroups()
                .then(|| assemble_subgroups(&group, &mut subgroup_pages, &mut entry_pages, params, &links));
            group_nodes.push(GroupNode { group, subgroups });
        }

        info!(
            result_count = group_nodes.len(),
            subgroup_pages = subgroup_page_count,
            entry_pages = entry_page_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tree assembled"
        );

        Ok(NotebookTree {
            notebook,
            groups: Page::new(group_nodes, groups_meta),
        })
    }
}

/// Subgroups block for one group: the fetched page, or an advertised empty
/// block when the group was not targeted.
fn assemble_subgroups(
    group: &Group,
    subgroup_pages: &mut HashMap<Uuid, ScopedPage<Subgroup>>,
    entry_pages: &mut HashMap<Uuid, ScopedPage<Entry>>,
    params: &TreeParams,
    links: &LinkBuilder<'_>,
) -> Page<SubgroupNode> {
    let take = params.subgroups.take;
    let Some(page) = subgroup_pages.remove(&group.id) else {
        let hint = (group.subgroup_count > 0).then(|| links.subgroups_hint(group.id));
        return Page::empty(PageMeta::unexpanded(take, group.subgroup_count).with_next_link(hint));
    };

    let meta = page
        .meta(take)
        .with_next_link(links.subgroups_next(group.id, page.next));
    let nodes = page
        .rows
        .into_iter()
        .map(|subgroup| {
            let entries = params
                .include
                .entries()
                .then(|| assemble_entries(group.id, &subgroup, entry_pages, params, links));
            SubgroupNode { subgroup, entries }
        })
        .collect();
    Page::new(nodes, meta)
}

/// Entries block for one subgroup, with the effective archived flag echoed.
fn assemble_entries(
    group_id: Uuid,
    subgroup: &Subgroup,
    entry_pages: &mut HashMap<Uuid, ScopedPage<Entry>>,
    params: &TreeParams,
    links: &LinkBuilder<'_>,
) -> Page<Entry> {
    let take = params.entries.take;
    let include_archived = params.include_archived;
    match entry_pages.remove(&subgroup.id) {
        Some(page) => {
            let meta = page
                .meta(take)
                .with_next_link(links.entries_next(group_id, subgroup.id, page.next))
                .with_include_archived(include_archived);
            Page::new(page.rows, meta)
        }
        None => {
            let total = subgroup.entry_total(include_archived);
            let hint = (total > 0).then(|| links.entries_hint(group_id, subgroup.id));
            Page::empty(
                PageMeta::unexpanded(take, total)
                    .with_next_link(hint)
                    .with_include_archived(include_archived),
            )
        }
    }
}
