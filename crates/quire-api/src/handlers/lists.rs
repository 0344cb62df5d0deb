//! Flat per-level list endpoints.

use axum::extract::rejection::QueryRejection;
use axum::extract::{OriginalUri, Path, Query, State};
use axum::Json;

use quire_core::{Entry, Group, Page, Subgroup};
use quire_tree::listing;
use quire_tree::{ListParams, RawListQuery, Scope};

use super::parse_id;
use crate::auth::RequireOwner;
use crate::error::ApiError;
use crate::AppState;

type ListQuery = Result<Query<RawListQuery>, QueryRejection>;

fn list_params(scope: Scope, query: ListQuery) -> Result<ListParams, ApiError> {
    let Query(raw) = query?;
    Ok(ListParams::from_raw(scope, &raw)?)
}

/// `GET /api/v1/notebooks/:id/groups`
pub async fn list_groups(
    State(state): State<AppState>,
    owner: RequireOwner,
    Path(id): Path<String>,
    OriginalUri(uri): OriginalUri,
    query: ListQuery,
) -> Result<Json<Page<Group>>, ApiError> {
    let notebook_id = parse_id("Notebook", &id)?;
    let params = list_params(Scope::Groups, query)?;
    let lease = state.provider.acquire().await?;
    let page = listing::list_groups(
        lease.store(),
        notebook_id,
        owner.owner_id,
        &params,
        uri.path(),
    )
    .await?;
    Ok(Json(page))
}

/// `GET /api/v1/notebooks/:id/groups/:group_id/subgroups`
pub async fn list_subgroups(
    State(state): State<AppState>,
    owner: RequireOwner,
    Path((id, group_id)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
    query: ListQuery,
) -> Result<Json<Page<Subgroup>>, ApiError> {
    let notebook_id = parse_id("Notebook", &id)?;
    let group_id = parse_id("Group", &group_id)?;
    let params = list_params(Scope::Subgroups, query)?;
    let lease = state.provider.acquire().await?;
    let page = listing::list_subgroups(
        lease.store(),
        notebook_id,
        owner.owner_id,
        group_id,
        &params,
        uri.path(),
    )
    .await?;
    Ok(Json(page))
}

/// `GET /api/v1/notebooks/:id/groups/:group_id/subgroups/:subgroup_id/entries`
pub async fn list_entries(
    State(state): State<AppState>,
    owner: RequireOwner,
    Path((id, group_id, subgroup_id)): Path<(String, String, String)>,
    OriginalUri(uri): OriginalUri,
    query: ListQuery,
) -> Result<Json<Page<Entry>>, ApiError> {
    let notebook_id = parse_id("Notebook", &id)?;
    let group_id = parse_id("Group", &group_id)?;
    let subgroup_id = parse_id("Subgroup", &subgroup_id)?;
    let params = list_params(Scope::Entries, query)?;
    let lease = state.provider.acquire().await?;
    let page = listing::list_entries(
        lease.store(),
        notebook_id,
        owner.owner_id,
        group_id,
        subgroup_id,
        &params,
        uri.path(),
    )
    .await?;
    Ok(Json(page))
}
