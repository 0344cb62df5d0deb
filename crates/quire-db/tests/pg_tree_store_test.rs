//! PostgreSQL tree store tests.
//!
//! These need a live database (`DATABASE_URL`) and are ignored by default.
//! Run with `cargo test -p quire-db -- --ignored`.

use quire_core::{EntryFilter, ListOptions, StoreProvider, TreeStore};
use quire_db::test_fixtures::{TestDatabase, DEFAULT_TEST_DATABASE_URL};
use quire_db::{Database, PoolConfig, StoreContextMode};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_groups_page_order_cursor_and_annotation() {
    let db = TestDatabase::new().await;
    let nb = db.insert_notebook("Journal").await;
    let g3 = db.insert_group(nb, "third", 30).await;
    let g1 = db.insert_group(nb, "first", 10).await;
    let g2 = db.insert_group(nb, "second", 20).await;
    db.insert_subgroup(g1, "a", 0).await;
    db.insert_subgroup(g1, "b", 1).await;

    assert_eq!(db.tree.count_groups(nb).await.unwrap(), 3);

    let page = db.tree.list_groups(nb, &ListOptions::take(2)).await.unwrap();
    assert_eq!(page.iter().map(|g| g.id).collect::<Vec<_>>(), vec![g1, g2]);
    assert_eq!(page[0].subgroup_count, 2);
    assert_eq!(page[1].subgroup_count, 0);

    let after = ListOptions {
        take: 10,
        skip: None,
        cursor: Some(g2),
    };
    let rest = db.tree.list_groups(nb, &after).await.unwrap();
    assert_eq!(rest.iter().map(|g| g.id).collect::<Vec<_>>(), vec![g3]);

    let stale = ListOptions {
        take: 10,
        skip: None,
        cursor: Some(Uuid::new_v4()),
    };
    assert!(db.tree.list_groups(nb, &stale).await.unwrap().is_empty());

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_notebook_lookup_is_owner_scoped() {
    let db = TestDatabase::new().await;
    let nb = db.insert_notebook("Private").await;

    assert!(db.tree.get_notebook(nb, db.owner_id).await.unwrap().is_some());
    assert!(db
        .tree
        .get_notebook(nb, Uuid::new_v4())
        .await
        .unwrap()
        .is_none());

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_entries_filter_projection_and_tags() {
    let db = TestDatabase::new().await;
    let nb = db.insert_notebook("Journal").await;
    let g = db.insert_group(nb, "g", 0).await;
    let s = db.insert_subgroup(g, "s", 0).await;
    let live = db.insert_entry(s, "live", 0, false).await;
    db.insert_entry(s, "old", 1, true).await;
    db.tag_entry(live, "Second", 1).await;
    db.tag_entry(live, "First", 0).await;

    let filter = EntryFilter::new(s, db.owner_id);
    assert_eq!(db.tree.count_entries(&filter).await.unwrap(), 1);

    let entries = db
        .tree
        .list_entries(&filter, &ListOptions::take(10))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].content.is_none());
    let names: Vec<&str> = entries[0].tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);

    let all = filter.include_archived(true).with_content();
    let entries = db.tree.list_entries(&all, &ListOptions::take(10)).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].content.as_deref(), Some("<p>live</p>"));

    let subgroup = db.tree.get_subgroup(g, s).await.unwrap().unwrap();
    assert_eq!(subgroup.entry_count, 2);
    assert_eq!(subgroup.active_entry_count, 1);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_startup_pool_closed_for_per_request_context() {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
    let config = PoolConfig::new().max_connections(1).min_connections(0);

    let db = Database::connect_with_config(&url, config.clone()).await.unwrap();
    let pool = db.pool().clone();
    let provider = db
        .into_store_provider(StoreContextMode::PerRequest, &url)
        .await;
    assert_eq!(provider.mode(), StoreContextMode::PerRequest);
    assert!(pool.is_closed());

    let db = Database::connect_with_config(&url, config).await.unwrap();
    let pool = db.pool().clone();
    let provider = db.into_store_provider(StoreContextMode::Shared, &url).await;
    assert!(!pool.is_closed());
    let lease = provider.acquire().await.unwrap();
    assert_eq!(lease.store().count_groups(Uuid::new_v4()).await.unwrap(), 0);
    drop(lease);
    pool.close().await;
}
