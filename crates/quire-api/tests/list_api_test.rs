//! HTTP tests for the flat list endpoints.

mod common;

use common::{node, TestApp};
use uuid::Uuid;

#[tokio::test]
async fn test_groups_endpoint_pages() {
    let app = TestApp::spawn().await;
    let path = format!("/api/v1/notebooks/{}/groups", app.seed.nb);

    let (status, first) = app.get_json(&format!("{}?take=1", path)).await;
    assert_eq!(status, 200);
    assert_eq!(first["data"].as_array().unwrap().len(), 1);
    assert_eq!(first["meta"]["total"], 2);
    assert_eq!(first["meta"]["hasMore"], true);

    let next = first["meta"]["links"]["next"].as_str().unwrap();
    assert!(next.starts_with(&path));
    let (status, second) = app.get_json(next).await;
    assert_eq!(status, 200);
    node(&second, app.seed.g2);
    assert_eq!(second["meta"]["hasMore"], false);
}

#[tokio::test]
async fn test_subgroups_endpoint_checks_group() {
    let app = TestApp::spawn().await;
    let seed = &app.seed;

    let (status, body) = app
        .get_json(&format!(
            "/api/v1/notebooks/{}/groups/{}/subgroups",
            seed.nb, seed.g1
        ))
        .await;
    assert_eq!(status, 200);
    node(&body, seed.sg1);
    node(&body, seed.sg2);

    let (status, _) = app
        .get_json(&format!(
            "/api/v1/notebooks/{}/groups/{}/subgroups",
            seed.nb,
            Uuid::now_v7()
        ))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_entries_endpoint_returns_content() {
    let app = TestApp::spawn().await;
    let seed = &app.seed;
    let path = format!(
        "/api/v1/notebooks/{}/groups/{}/subgroups/{}/entries",
        seed.nb, seed.g1, seed.sg1
    );

    let (status, body) = app.get_json(&path).await;
    assert_eq!(status, 200);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data.iter().all(|e| e["content"].is_string()));
    assert_eq!(body["meta"]["includeArchived"], false);

    let (status, body) = app.get_json(&format!("{}?includeArchived=TRUE", path)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["meta"]["includeArchived"], true);

    let (status, _) = app.get_json(&format!("{}?includeArchived=maybe", path)).await;
    assert_eq!(status, 400);

    for query in ["take=%FF", "includeArchived=%C3", "take=2&take=3"] {
        let (status, body) = app.get_json(&format!("{}?{}", path, query)).await;
        assert_eq!(status, 400, "{}", query);
        assert!(body["error"].is_string(), "{}", query);
    }
}

#[tokio::test]
async fn test_entries_endpoint_checks_subgroup_parent() {
    let app = TestApp::spawn().await;
    let seed = &app.seed;
    let (status, body) = app
        .get_json(&format!(
            "/api/v1/notebooks/{}/groups/{}/subgroups/{}/entries",
            seed.nb, seed.g2, seed.sg1
        ))
        .await;
    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("Subgroup"));
    assert_eq!(app.provider.acquired(), app.provider.released());
}
