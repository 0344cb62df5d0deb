//! Test server harness: the real router over an in-memory store.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use quire_api::{router, AppState, TokenTable};
use quire_core::{Entry, EntryStatus};
use quire_db::{MemoryStoreProvider, MemoryTreeStore};
use uuid::Uuid;

pub const TOKEN: &str = "test-token";

/// Notebook `nb` with groups `g1` (subgroups `sg1`, `sg2`) and `g2` (none).
/// `sg1` holds three entries, one archived; `sg2` holds one.
pub struct Seed {
    pub nb: Uuid,
    pub g1: Uuid,
    pub g2: Uuid,
    pub sg1: Uuid,
    pub sg2: Uuid,
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub owner: Uuid,
    pub state: AppState,
    pub provider: Arc<MemoryStoreProvider>,
    pub seed: Seed,
}

fn long_entry(subgroup_id: Uuid, owner_id: Uuid, title: &str, user_sort: i32, archived: bool) -> Entry {
    let now = Utc::now();
    Entry {
        id: Uuid::now_v7(),
        title: title.to_string(),
        content: Some(format!(
            "<h1>{}</h1>{}",
            title,
            "<p>Rich text body with enough markup to look like a real entry.</p>".repeat(8)
        )),
        status: EntryStatus::Active,
        archived,
        user_sort,
        subgroup_id,
        owner_id,
        created_at: now,
        updated_at: now,
        tags: Vec::new(),
    }
}

fn seed(store: &MemoryTreeStore, owner: Uuid) -> Seed {
    let nb = store.add_notebook(owner, "Journal");
    let g1 = store.add_group(nb, "g1", 10);
    let g2 = store.add_group(nb, "g2", 20);
    let sg1 = store.add_subgroup(g1, "sg1", 10);
    let sg2 = store.add_subgroup(g1, "sg2", 20);
    store.insert_entry(long_entry(sg1, owner, "first", 10, false));
    store.insert_entry(long_entry(sg1, owner, "second", 20, false));
    store.insert_entry(long_entry(sg1, owner, "old", 30, true));
    store.insert_entry(long_entry(sg2, owner, "other", 10, false));
    Seed {
        nb,
        g1,
        g2,
        sg1,
        sg2,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let owner = Uuid::new_v4();
        let store = Arc::new(MemoryTreeStore::new());
        let seed = seed(&store, owner);
        let provider = Arc::new(MemoryStoreProvider::new(store));

        let mut tokens = TokenTable::default();
        tokens.insert(TOKEN, owner);
        let state = AppState::new(provider.clone(), Arc::new(tokens), true);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give server a moment to start
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        Self {
            base_url,
            client: reqwest::Client::new(),
            owner,
            state,
            provider,
            seed,
        }
    }

    pub fn store(&self) -> &MemoryTreeStore {
        self.provider.store()
    }

    pub fn tree_path(&self) -> String {
        format!("/api/v1/notebooks/{}/tree", self.seed.nb)
    }

    /// Authenticated GET of a path (with optional query).
    pub async fn get(&self, path_and_query: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path_and_query))
            .bearer_auth(TOKEN)
            .send()
            .await
            .unwrap()
    }

    pub async fn get_json(&self, path_and_query: &str) -> (u16, serde_json::Value) {
        let response = self.get(path_and_query).await;
        let status = response.status().as_u16();
        let body = response.json().await.unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    /// Body length in bytes of a successful GET.
    pub async fn body_len(&self, path_and_query: &str) -> usize {
        let response = self.get(path_and_query).await;
        assert_eq!(response.status().as_u16(), 200, "{}", path_and_query);
        response.bytes().await.unwrap().len()
    }
}

/// Find the JSON node with the given id in a `data` array.
pub fn node<'a>(page: &'a serde_json::Value, id: Uuid) -> &'a serde_json::Value {
    page["data"]
        .as_array()
        .and_then(|items| items.iter().find(|item| item["id"] == id.to_string()))
        .unwrap_or_else(|| panic!("no node {} in {}", id, page))
}
