//! Runtime configuration handed to the core by the binary.
//!
//! The core never reads the environment; the CLI resolves flags and env vars
//! and builds these values.

use crate::generator::FakeNumberSpec;
use crate::phone::{MAX_PHONE_DIGITS, MIN_PHONE_DIGITS};
use std::path::PathBuf;
use std::time::Duration;

/// Fixed name of the bulk mapping file dropped into the inbox.
pub const TARGET_FILE_NAME: &str = "GGS_all_phones.csv";

pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_MAX_FILE_MB: u64 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub incoming_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub scan_interval: Duration,
    pub max_file_bytes: u64,
    pub file_name: String,
}

impl ImportConfig {
    pub fn new(incoming_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            incoming_dir: incoming_dir.into(),
            archive_dir: archive_dir.into(),
            scan_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
            max_file_bytes: DEFAULT_MAX_FILE_MB * 1024 * 1024,
            file_name: TARGET_FILE_NAME.to_string(),
        }
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    pub fn with_max_file_bytes(mut self, max: u64) -> Self {
        self.max_file_bytes = max;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scan_interval.is_zero() {
            return Err("scan interval must be at least 1 second".to_string());
        }
        if self.max_file_bytes == 0 {
            return Err("max file size must be positive".to_string());
        }
        if self.file_name.is_empty() {
            return Err("inbox file name must not be empty".to_string());
        }
        Ok(())
    }
}

/// Generated numbers must themselves be valid phones.
pub fn validate_fake_spec(spec: &FakeNumberSpec) -> Result<(), String> {
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&spec.length) {
        return Err(format!(
            "fake number length {} outside {}..={}",
            spec.length, MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
        ));
    }
    if !spec.prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("fake number prefix '{}' must be digits", spec.prefix));
    }
    if spec.prefix.len() >= spec.length {
        return Err(format!(
            "fake number prefix '{}' leaves no random digits for length {}",
            spec.prefix, spec.length
        ));
    }
    Ok(())
}
