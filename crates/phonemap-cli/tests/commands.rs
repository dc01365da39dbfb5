//! Command dispatch against a temp database and inbox.

use clap::Parser;
use phonemap_cli::cli::args::Cli;
use phonemap_cli::cli::commands::dispatch;
use phonemap_cli::exit_codes::{FAILED, SUCCESS};
use phonemap_core::MappingStore;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn arg(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

async fn run(args: &[&str]) -> anyhow::Result<i32> {
    let mut argv = vec!["phonemap"];
    argv.extend_from_slice(args);
    dispatch(Cli::try_parse_from(argv)?).await
}

#[tokio::test]
async fn test_scan_idle_then_success_then_failure() {
    let dir = TempDir::new().unwrap();
    let db = arg(&dir.path().join("db").join("phonemap.db"));
    let incoming = dir.path().join("in");
    let incoming_arg = arg(&incoming);
    let archive = arg(&dir.path().join("archive"));
    let scan: [&str; 7] = [
        "scan",
        "--db",
        &db,
        "--incoming-dir",
        &incoming_arg,
        "--archive-dir",
        &archive,
    ];

    assert_eq!(run(&scan).await.unwrap(), SUCCESS);

    fs::write(
        incoming.join("GGS_all_phones.csv"),
        "real;fake\n79001111111;700000000000001\n",
    )
    .unwrap();
    assert_eq!(run(&scan).await.unwrap(), SUCCESS);

    fs::write(incoming.join("GGS_all_phones.csv"), "real;fake\nnope;nope\n").unwrap();
    assert_eq!(run(&scan).await.unwrap(), FAILED);

    let store = MappingStore::open(&dir.path().join("db").join("phonemap.db")).unwrap();
    assert_eq!(
        store.lookup_real_by_fake("700000000000001").unwrap().as_deref(),
        Some("79001111111")
    );
}

#[tokio::test]
async fn test_enroll_lookup_and_clear() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("phonemap.db");
    let db = arg(&db_path);
    let list = dir.path().join("phones.csv");
    fs::write(&list, "+7 900 111 11 11\n\njunk\n89002222222\n").unwrap();

    let code = run(&["enroll", &arg(&list), "--db", &db]).await.unwrap();
    assert_eq!(code, SUCCESS);

    let store = MappingStore::open(&db_path).unwrap();
    assert_eq!(store.count().unwrap(), 2);
    let fake = store.lookup_fake_by_real("79001111111").unwrap().unwrap();
    assert_eq!(fake.len(), 15);
    assert!(fake.starts_with('7'));

    assert_eq!(
        run(&["lookup", "real", &fake, "--db", &db]).await.unwrap(),
        SUCCESS
    );
    assert_eq!(store.call_log_for(&fake).unwrap().len(), 1);
    assert_eq!(
        run(&["lookup", "fake", "70000000000", "--db", &db])
            .await
            .unwrap(),
        FAILED
    );

    // re-enrolling keeps the existing fake
    run(&["enroll", &arg(&list), "--db", &db]).await.unwrap();
    assert_eq!(
        store.lookup_fake_by_real("79001111111").unwrap().unwrap(),
        fake
    );

    assert!(run(&["clear", "--db", &db]).await.is_err());
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(run(&["clear", "--yes", "--db", &db]).await.unwrap(), SUCCESS);
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_enroll_rejects_bad_generator_config() {
    let dir = TempDir::new().unwrap();
    let list = dir.path().join("phones.csv");
    fs::write(&list, "79001111111\n").unwrap();
    let db = arg(&dir.path().join("phonemap.db"));

    let result = run(&["enroll", &arg(&list), "--db", &db, "--fake-length", "8"]).await;
    assert!(result.is_err());
}
