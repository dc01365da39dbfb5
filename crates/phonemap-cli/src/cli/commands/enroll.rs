use super::open_store;
use crate::cli::args::EnrollArgs;
use crate::exit_codes::SUCCESS;
use anyhow::{Context, Result};
use phonemap_core::enroll::enroll_file;
use std::fs;

pub fn run(args: EnrollArgs) -> Result<i32> {
    let spec = args.generator.to_spec()?;
    let bytes = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let content = String::from_utf8_lossy(&bytes);

    let store = open_store(&args.store)?;
    let report = enroll_file(&store, &content, &spec, args.clear_old)?;
    tracing::info!(
        file = %args.file.display(),
        total = report.total,
        new = report.new,
        existing = report.existing,
        clear_old = args.clear_old,
        "enrollment finished"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(SUCCESS)
}
