//! quire-api - HTTP surface for quire notebook trees.
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/v1/notebooks/:id/tree`
//! - `GET /api/v1/notebooks/:id/groups`
//! - `GET /api/v1/notebooks/:id/groups/:group_id/subgroups`
//! - `GET /api/v1/notebooks/:id/groups/:group_id/subgroups/:subgroup_id/entries`

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use quire_core::StoreProvider;
use quire_tree::TreeVariant;

pub use auth::{RequireOwner, SessionResolver, TokenTable};
pub use config::ApiConfig;
pub use error::ApiError;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Hands out one store context per request.
    pub provider: Arc<dyn StoreProvider>,
    pub sessions: Arc<dyn SessionResolver>,
    tree_batched: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn StoreProvider>,
        sessions: Arc<dyn SessionResolver>,
        tree_batched: bool,
    ) -> Self {
        Self {
            provider,
            sessions,
            tree_batched: Arc::new(AtomicBool::new(tree_batched)),
        }
    }

    /// Aggregation variant for the current request.
    pub fn tree_variant(&self) -> TreeVariant {
        TreeVariant::from_flag(self.tree_batched.load(Ordering::Relaxed))
    }

    /// Flip between the batched aggregator and the legacy traversal.
    pub fn set_tree_batched(&self, batched: bool) {
        self.tree_batched.store(batched, Ordering::Relaxed);
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/notebooks/:id/tree", get(handlers::tree::get_tree))
        .route(
            "/api/v1/notebooks/:id/groups",
            get(handlers::lists::list_groups),
        )
        .route(
            "/api/v1/notebooks/:id/groups/:group_id/subgroups",
            get(handlers::lists::list_subgroups),
        )
        .route(
            "/api/v1/notebooks/:id/groups/:group_id/subgroups/:subgroup_id/entries",
            get(handlers::lists::list_entries),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new()),
        )
        .with_state(state)
}
