use super::args::*;
use anyhow::{Context, Result};
use phonemap_core::MappingStore;
use std::fs;
use std::time::Duration;

/// How long a lookup-side write (the call log) waits for a running import.
const LOOKUP_BUSY_TIMEOUT: Duration = Duration::from_millis(200);

mod clear;
mod enroll;
mod lookup;
mod scan;
mod serve;

pub async fn dispatch(cli: Cli) -> Result<i32> {
    match cli.cmd {
        Command::Serve(args) => serve::run(args).await,
        Command::Scan(args) => scan::run(args),
        Command::Enroll(args) => enroll::run(args),
        Command::Clear(args) => clear::run(args),
        Command::Lookup(args) => lookup::run(args),
    }
}

/// Open the mapping database, creating its parent directory on first use.
pub(crate) fn open_store(args: &StoreArgs) -> Result<MappingStore> {
    if let Some(parent) = args.db.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database dir {}", parent.display()))?;
    }
    MappingStore::open(&args.db)
        .with_context(|| format!("failed to open database {}", args.db.display()))
}

/// Separate connections for the import worker and the lookup service, so a
/// bulk replace never queues switch lookups behind it. Returns `(import, lookup)`.
pub(crate) fn open_service_stores(args: &StoreArgs) -> Result<(MappingStore, MappingStore)> {
    let import = open_store(args)?;
    let lookup = MappingStore::open_with_busy_timeout(&args.db, LOOKUP_BUSY_TIMEOUT)
        .with_context(|| format!("failed to open database {}", args.db.display()))?;
    Ok((import, lookup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use phonemap_core::LookupService;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Instant;
    use tempfile::TempDir;

    #[test]
    fn test_lookups_answer_while_import_replaces() {
        let dir = TempDir::new().unwrap();
        let args = StoreArgs {
            db: dir.path().join("data").join("phonemap.db"),
        };
        let (import, lookup_store) = open_service_stores(&args).unwrap();
        import
            .insert_batch(&[("79001111111".to_string(), "700000000000001".to_string())])
            .unwrap();
        let lookup = LookupService::new(lookup_store);

        let image: Vec<(String, String)> = (0..200_000)
            .map(|i| (format!("78{i:09}"), format!("8{i:014}")))
            .collect();

        let done = Arc::new(AtomicBool::new(false));
        let start = Arc::new(Barrier::new(2));
        let writer = {
            let done = done.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                let began = Instant::now();
                import.replace_all(&image).unwrap();
                done.store(true, Ordering::SeqCst);
                began.elapsed()
            })
        };

        start.wait();
        thread::sleep(Duration::from_millis(50));

        let mut answered_during_replace = 0usize;
        let mut slowest = Duration::ZERO;
        while !done.load(Ordering::SeqCst) {
            let asked = Instant::now();
            let real = lookup.resolve_real("700000000000001").unwrap();
            let waited = asked.elapsed();
            if !done.load(Ordering::SeqCst) {
                // either the old image or, in the commit race window, the new one
                assert!(real.is_none() || real.as_deref() == Some("79001111111"));
                answered_during_replace += 1;
                slowest = slowest.max(waited);
            }
        }
        let replace_took = writer.join().unwrap();

        assert!(
            answered_during_replace > 0,
            "no lookup finished during a {replace_took:?} replace"
        );
        assert!(
            slowest < Duration::from_millis(750),
            "lookup waited {slowest:?} during a {replace_took:?} replace"
        );
        assert!(lookup
            .resolve_real("800000000000001")
            .unwrap()
            .is_some());
    }
}
