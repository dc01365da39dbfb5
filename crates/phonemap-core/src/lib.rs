//! Bidirectional real <-> fake phone number mapping.
//!
//! An external telephony switch masks caller identity by swapping real
//! subscriber numbers for generated substitutes. This crate owns the mapping
//! and keeps it consistent:
//!
//! - [`phone`]: canonical digit-only form and validity (10 to 15 digits)
//! - [`generator`]: collision-free fake numbers with a bounded retry budget
//! - [`store`]: SQLite mapping table with a transactional full replace
//! - [`import`]: inbox polling worker that swaps in a bulk mapping file atomically
//! - [`lookup`]: real/fake resolution with call-log audit
//! - [`enroll`]: assign fakes to a list of real numbers
//!
//! # Quick Start
//!
//! ```no_run
//! use phonemap_core::config::ImportConfig;
//! use phonemap_core::import::{ImportStatus, ImportWorker};
//! use phonemap_core::store::MappingStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let store = MappingStore::open(Path::new("data/phone_proxy.db"))?;
//! let status = Arc::new(ImportStatus::new());
//! let worker = ImportWorker::new(
//!     ImportConfig::new("data/incoming", "data/archive"),
//!     store,
//!     status.clone(),
//! )?;
//! if let Some(report) = worker.scan_once()? {
//!     println!("imported: success={}", report.success);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod enroll;
pub mod errors;
pub mod generator;
pub mod import;
pub mod lookup;
pub mod phone;
pub mod store;

pub use errors::{EnrollError, GenerateError, ImportError, PhoneColumn, StoreError};
pub use generator::FakeNumberSpec;
pub use lookup::LookupService;
pub use store::MappingStore;
