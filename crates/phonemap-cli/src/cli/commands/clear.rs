use super::open_store;
use crate::cli::args::ClearArgs;
use crate::exit_codes::SUCCESS;
use anyhow::{bail, Result};
use serde_json::json;

pub fn run(args: ClearArgs) -> Result<i32> {
    if !args.yes {
        bail!("refusing to delete all mappings without --yes");
    }
    let store = open_store(&args.store)?;
    let deleted = store.clear_all()?;
    tracing::warn!(deleted, "all mappings cleared");
    println!("{}", json!({ "success": true, "deleted": deleted }));
    Ok(SUCCESS)
}
