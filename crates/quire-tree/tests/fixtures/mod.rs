//! Shared fixtures for tree engine tests.
//!
//! Every fixture seeds one notebook in a [`MemoryTreeStore`] owned by a fresh
//! owner id. Sort keys are spaced out so ordering never depends on ids.

#![allow(dead_code)]

use quire_core::Result;
use quire_db::MemoryTreeStore;
use quire_tree::{NotebookTree, TreeParams, TreeRequest, TreeVariant};
use uuid::Uuid;

pub struct TreeFixture {
    pub store: MemoryTreeStore,
    pub owner: Uuid,
    pub notebook: Uuid,
}

impl TreeFixture {
    pub fn new() -> Self {
        let store = MemoryTreeStore::new();
        let owner = Uuid::new_v4();
        let notebook = store.add_notebook(owner, "Journal");
        Self {
            store,
            owner,
            notebook,
        }
    }

    pub fn group(&self, name: &str, sort: i32) -> Uuid {
        self.store.add_group(self.notebook, name, sort)
    }

    pub fn subgroup(&self, group: Uuid, name: &str, sort: i32) -> Uuid {
        self.store.add_subgroup(group, name, sort)
    }

    pub fn entry(&self, subgroup: Uuid, title: &str, sort: i32) -> Uuid {
        self.store.add_entry(subgroup, self.owner, title, sort, false)
    }

    pub fn archived_entry(&self, subgroup: Uuid, title: &str, sort: i32) -> Uuid {
        self.store.add_entry(subgroup, self.owner, title, sort, true)
    }

    pub fn request(&self, query: &str) -> TreeRequest {
        let params = TreeParams::from_query_str(query).expect("valid query");
        TreeRequest::new(self.notebook, self.owner, params)
    }

    pub async fn build(&self, variant: TreeVariant, query: &str) -> Result<NotebookTree> {
        let request = self.request(query);
        variant.builder().build_tree(&self.store, &request).await
    }

    pub async fn batched(&self, query: &str) -> NotebookTree {
        self.build(TreeVariant::Batched, query)
            .await
            .expect("batched tree")
    }

    pub async fn legacy(&self, query: &str) -> NotebookTree {
        self.build(TreeVariant::Legacy, query)
            .await
            .expect("legacy tree")
    }
}

/// Groups `g1` (2 subgroups) and `g2` (none); `sg1` under `g1` has three
/// entries, one of them archived; `sg2` has one entry.
pub struct Scenario {
    pub fixture: TreeFixture,
    pub g1: Uuid,
    pub g2: Uuid,
    pub sg1: Uuid,
    pub sg2: Uuid,
    pub archived: Uuid,
}

impl Scenario {
    pub fn new() -> Self {
        let fixture = TreeFixture::new();
        let g1 = fixture.group("g1", 10);
        let g2 = fixture.group("g2", 20);
        let sg1 = fixture.subgroup(g1, "sg1", 10);
        let sg2 = fixture.subgroup(g1, "sg2", 20);
        fixture.entry(sg1, "first", 10);
        fixture.entry(sg1, "second", 20);
        let archived = fixture.archived_entry(sg1, "old", 30);
        fixture.entry(sg2, "other", 10);
        Self {
            fixture,
            g1,
            g2,
            sg1,
            sg2,
            archived,
        }
    }
}

/// The query-string part of a continuation link.
pub fn query_of(link: &str) -> &str {
    link.split_once('?').map(|(_, q)| q).unwrap_or("")
}

pub fn ids<T>(items: &[T], id: impl Fn(&T) -> Uuid) -> Vec<Uuid> {
    items.iter().map(id).collect()
}
