//! File-based import pipeline.
//!
//! One cycle:
//!
//! ```text
//! IDLE ──▶ CLAIMED ──▶ PARSING ──▶ REPLACING ──▶ ARCHIVING ──▶ DONE | FAILED ──▶ IDLE
//!   │         │
//!   │         └─ file vanished before rename: abandon silently
//!   └─ no file: wait for the next tick
//! ```
//!
//! Parse failures never reach storage; the table is replaced in a single
//! transaction or not at all. The source file is archived and a `.OK`/`.fail`
//! marker is written whatever the verdict, then the report is published to
//! [`ImportStatus`].

mod fs_ops;
mod parse;
mod report;
mod status;
mod worker;

pub use fs_ops::{FAIL_SUFFIX, OK_SUFFIX, PROCESSING_SUFFIX};
pub use parse::{parse_mapping_csv, ParsedMappings};
pub use report::ImportRunReport;
pub use status::ImportStatus;
pub use worker::ImportWorker;
