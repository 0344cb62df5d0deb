//! Flat single-level listing.
//!
//! Backs the per-level list endpoints. Each call checks that the addressed
//! parents exist and belong to the caller, then returns one probed page with
//! a continuation link. Entries come back with their full content.

use futures::try_join;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use quire_core::{
    split_probe, Entry, EntryFilter, Error, Group, Page, PageMeta, Result, Subgroup, TreeStore,
};

use crate::links::LinkBuilder;
use crate::params::{decode_query, parse_bool, PageParams, Scope};

/// Flat list directives exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawListQuery {
    pub take: Option<String>,
    pub skip: Option<String>,
    pub cursor: Option<String>,
    pub include_archived: Option<String>,
}

/// Normalized `take`/`skip`/`cursor`/`includeArchived` for a flat list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub page: PageParams,
    pub include_archived: bool,
}

impl ListParams {
    pub fn from_raw(scope: Scope, raw: &RawListQuery) -> Result<Self> {
        Ok(Self {
            page: PageParams::parse(
                "",
                scope,
                raw.take.as_deref(),
                raw.skip.as_deref(),
                raw.cursor.as_deref(),
            )?,
            include_archived: parse_bool("includeArchived", raw.include_archived.as_deref())?
                .unwrap_or(false),
        })
    }

    pub fn from_query_str(scope: Scope, query: &str) -> Result<Self> {
        Self::from_raw(scope, &decode_query(query)?)
    }
}

async fn require_notebook(store: &dyn TreeStore, notebook_id: Uuid, owner_id: Uuid) -> Result<()> {
    store
        .get_notebook(notebook_id, owner_id)
        .await?
        .map(|_| ())
        .ok_or(Error::NotebookNotFound(notebook_id))
}

async fn require_group(store: &dyn TreeStore, notebook_id: Uuid, group_id: Uuid) -> Result<Group> {
    store
        .get_group(notebook_id, group_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Group {} not found", group_id)))
}

fn page_meta(params: &ListParams, count: usize, total: i64, next: Option<Uuid>) -> PageMeta {
    let page = &params.page;
    PageMeta::paged(page.take, page.skip, page.cursor, count, total, next)
}

/// One page of a notebook's groups.
pub async fn list_groups(
    store: &dyn TreeStore,
    notebook_id: Uuid,
    owner_id: Uuid,
    params: &ListParams,
    base_path: &str,
) -> Result<Page<Group>> {
    require_notebook(store, notebook_id, owner_id).await?;
    let opts = params.page.probe();
    let (total, rows) = try_join!(
        store.count_groups(notebook_id),
        store.list_groups(notebook_id, &opts)
    )?;
    let (groups, next) = split_probe(rows, params.page.take);
    debug!(notebook_id = %notebook_id, result_count = groups.len(), "Listed groups");
    let meta = page_meta(params, groups.len(), total, next).with_next_link(LinkBuilder::list_next(
        base_path,
        params.page.take,
        next,
        None,
    ));
    Ok(Page::new(groups, meta))
}

/// One page of a group's subgroups.
pub async fn list_subgroups(
    store: &dyn TreeStore,
    notebook_id: Uuid,
    owner_id: Uuid,
    group_id: Uuid,
    params: &ListParams,
    base_path: &str,
) -> Result<Page<Subgroup>> {
    require_notebook(store, notebook_id, owner_id).await?;
    require_group(store, notebook_id, group_id).await?;
    let opts = params.page.probe();
    let (total, rows) = try_join!(
        store.count_subgroups(group_id),
        store.list_subgroups(group_id, &opts)
    )?;
    let (subgroups, next) = split_probe(rows, params.page.take);
    debug!(group_id = %group_id, result_count = subgroups.len(), "Listed subgroups");
    let meta = page_meta(params, subgroups.len(), total, next).with_next_link(
        LinkBuilder::list_next(base_path, params.page.take, next, None),
    );
    Ok(Page::new(subgroups, meta))
}

/// One page of a subgroup's entries, with content.
#[allow(clippy::too_many_arguments)]
pub async fn list_entries(
    store: &dyn TreeStore,
    notebook_id: Uuid,
    owner_id: Uuid,
    group_id: Uuid,
    subgroup_id: Uuid,
    params: &ListParams,
    base_path: &str,
) -> Result<Page<Entry>> {
    require_notebook(store, notebook_id, owner_id).await?;
    require_group(store, notebook_id, group_id).await?;
    store
        .get_subgroup(group_id, subgroup_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Subgroup {} not found", subgroup_id)))?;

    let filter = EntryFilter::new(subgroup_id, owner_id)
        .include_archived(params.include_archived)
        .with_content();
    let opts = params.page.probe();
    let (total, rows) = try_join!(
        store.count_entries(&filter),
        store.list_entries(&filter, &opts)
    )?;
    let (entries, next) = split_probe(rows, params.page.take);
    debug!(subgroup_id = %subgroup_id, result_count = entries.len(), "Listed entries");
    let meta = page_meta(params, entries.len(), total, next)
        .with_next_link(LinkBuilder::list_next(
            base_path,
            params.page.take,
            next,
            Some(params.include_archived),
        ))
        .with_include_archived(params.include_archived);
    Ok(Page::new(entries, meta))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let params = ListParams::from_query_str(Scope::Subgroups, "").unwrap();
        assert_eq!(params.page, PageParams::first(Scope::Subgroups));
        assert!(!params.include_archived);
    }

    #[test]
    fn test_list_params_validation() {
        let cursor = Uuid::now_v7();
        let err = ListParams::from_query_str(Scope::Groups, &format!("skip=1&cursor={}", cursor))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = ListParams::from_query_str(Scope::Entries, "includeArchived=yes").unwrap_err();
        assert!(err.to_string().contains("includeArchived"));

        let params =
            ListParams::from_query_str(Scope::Entries, "take=5&includeArchived=true").unwrap();
        assert_eq!(params.page.take, 5);
        assert!(params.include_archived);
    }

    #[test]
    fn test_list_params_reject_undecodable_values() {
        let err = ListParams::from_query_str(Scope::Groups, "take=%FF").unwrap_err();
        assert!(err.to_string().contains("take"));
        let err = ListParams::from_query_str(Scope::Entries, "includeArchived=%C3").unwrap_err();
        assert!(err.to_string().contains("includeArchived"));
    }
}
