use super::open_store;
use crate::cli::args::ScanArgs;
use crate::exit_codes::{FAILED, SUCCESS};
use anyhow::Result;
use phonemap_core::import::{ImportStatus, ImportWorker};
use serde_json::json;
use std::sync::Arc;

/// One import cycle. Stale claims are left alone: a running `serve` may own them.
pub fn run(args: ScanArgs) -> Result<i32> {
    let config = args.import.to_config()?;
    let store = open_store(&args.store)?;
    let worker = ImportWorker::new(config, store, Arc::new(ImportStatus::new()))?;

    match worker.scan_once()? {
        None => {
            println!("{}", json!({ "status": "idle" }));
            Ok(SUCCESS)
        }
        Some(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(if report.success { SUCCESS } else { FAILED })
        }
    }
}
