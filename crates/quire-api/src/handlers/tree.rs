//! Notebook tree endpoint.

use std::time::Instant;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::debug;

use quire_tree::{NotebookTree, RawTreeQuery, TreeParams, TreeRequest};

use super::parse_id;
use crate::auth::RequireOwner;
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/v1/notebooks/:id/tree`
///
/// Directives are validated before a store context is acquired. The lease is
/// released when it drops, whichever way the build ends.
pub async fn get_tree(
    State(state): State<AppState>,
    owner: RequireOwner,
    Path(id): Path<String>,
    query: Result<Query<RawTreeQuery>, QueryRejection>,
) -> Result<Json<NotebookTree>, ApiError> {
    let start = Instant::now();
    let notebook_id = parse_id("Notebook", &id)?;
    let Query(raw) = query?;
    let params = TreeParams::from_raw(&raw)?;
    let request = TreeRequest::new(notebook_id, owner.owner_id, params);

    let builder = state.tree_variant().builder();
    let lease = state.provider.acquire().await?;
    let tree = builder.build_tree(lease.store(), &request).await?;
    drop(lease);

    debug!(
        subsystem = "api",
        op = "get_tree",
        notebook_id = %notebook_id,
        variant = builder.name(),
        result_count = tree.groups.data.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Tree served"
    );
    Ok(Json(tree))
}
