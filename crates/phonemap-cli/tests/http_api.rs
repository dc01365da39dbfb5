//! HTTP surface against a real listener on an ephemeral port.

use phonemap_cli::http::{router, AppState};
use phonemap_core::config::ImportConfig;
use phonemap_core::import::{ImportStatus, ImportWorker};
use phonemap_core::{LookupService, MappingStore};
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct TestServer {
    base: String,
    store: MappingStore,
    status: Arc<ImportStatus>,
}

async fn spawn_server() -> TestServer {
    let store = MappingStore::memory().unwrap();
    let status = Arc::new(ImportStatus::new());
    let app = router(AppState {
        lookup: LookupService::new(store.clone()),
        status: status.clone(),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        base: format!("http://{addr}"),
        store,
        status,
    }
}

async fn get(url: String) -> (u16, Value) {
    let resp = reqwest::get(url).await.unwrap();
    let code = resp.status().as_u16();
    (code, resp.json().await.unwrap())
}

fn seed(store: &MappingStore) {
    store
        .insert_batch(&[
            ("79001111111".to_string(), "700000000000001".to_string()),
            ("79002222222".to_string(), "700000000000002".to_string()),
        ])
        .unwrap();
}

#[tokio::test]
async fn test_lookup_real_normalizes_and_logs_call() {
    let srv = spawn_server().await;
    seed(&srv.store);

    let (code, body) = get(format!("{}/lookup/real/7-000-000-000-00001", srv.base)).await;
    assert_eq!(code, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["real_phone"], "79001111111");

    let log = srv.store.call_log_for("700000000000001").unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].real_phone, "79001111111");
}

#[tokio::test]
async fn test_lookup_miss_is_404_and_not_logged() {
    let srv = spawn_server().await;
    seed(&srv.store);

    let (code, body) = get(format!("{}/lookup/real/799999999999999", srv.base)).await;
    assert_eq!(code, 404);
    assert_eq!(body["success"], false);
    assert!(srv.store.call_log_for("799999999999999").unwrap().is_empty());

    let (code, _) = get(format!("{}/lookup/fake/79990000000", srv.base)).await;
    assert_eq!(code, 404);
}

#[tokio::test]
async fn test_lookup_fake_does_not_log() {
    let srv = spawn_server().await;
    seed(&srv.store);

    let (code, body) = get(format!("{}/lookup/fake/79002222222", srv.base)).await;
    assert_eq!(code, 200);
    assert_eq!(body["fake_phone"], "700000000000002");
    assert!(srv.store.call_log_for("700000000000002").unwrap().is_empty());
}

#[tokio::test]
async fn test_mappings_lists_everything() {
    let srv = spawn_server().await;
    seed(&srv.store);

    let (code, body) = get(format!("{}/mappings", srv.base)).await;
    assert_eq!(code, 200);
    assert_eq!(body["count"], 2);
    assert_eq!(body["mappings"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_status_idle_then_last_run() {
    let srv = spawn_server().await;

    let (code, body) = get(format!("{}/status", srv.base)).await;
    assert_eq!(code, 200);
    assert_eq!(body, serde_json::json!({ "status": "idle" }));

    let dir = TempDir::new().unwrap();
    let config = ImportConfig::new(dir.path().join("in"), dir.path().join("archive"));
    let worker = ImportWorker::new(config, srv.store.clone(), srv.status.clone()).unwrap();
    fs::write(
        dir.path().join("in").join("GGS_all_phones.csv"),
        "real;fake\n79003333333;700000000000003\n",
    )
    .unwrap();
    let report = tokio::task::spawn_blocking(move || worker.scan_once())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(report.success);

    let (_, body) = get(format!("{}/status", srv.base)).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["last_run"]["success"], true);
    assert_eq!(body["last_run"]["inserted"], 1);
    assert_eq!(body["last_run"]["file"], "GGS_all_phones.csv");
}
