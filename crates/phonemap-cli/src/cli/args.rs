use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use phonemap_core::config::{self, ImportConfig};
use phonemap_core::FakeNumberSpec;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "phonemap",
    version,
    about = "Real/fake phone number mapping for caller masking"
)]
pub struct Cli {
    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the import worker and the lookup/status HTTP API
    Serve(ServeArgs),
    /// Run exactly one import cycle and print its report
    Scan(ScanArgs),
    /// Assign fake numbers to a one-number-per-line file
    Enroll(EnrollArgs),
    /// Delete every mapping
    Clear(ClearArgs),
    /// Resolve a number in either direction
    Lookup(LookupArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also append plain-text logs to this file
    #[arg(long, env = "IMPORT_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// SQLite database file
    #[arg(long, env = "PHONEMAP_DB", default_value = "data/phone_proxy.db")]
    pub db: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Inbox directory polled for GGS_all_phones.csv
    #[arg(long, env = "INCOMING_DIR", default_value = "data/incoming")]
    pub incoming_dir: PathBuf,

    /// Directory processed files are moved to
    #[arg(long, env = "ARCHIVE_DIR", default_value = "data/archive")]
    pub archive_dir: PathBuf,

    /// Seconds between inbox scans
    #[arg(long, env = "SCAN_INTERVAL", default_value_t = config::DEFAULT_SCAN_INTERVAL_SECS)]
    pub scan_interval: u64,

    /// Largest accepted inbox file, in MiB
    #[arg(long, env = "MAX_FILE_MB", default_value_t = config::DEFAULT_MAX_FILE_MB)]
    pub max_file_mb: u64,
}

impl ImportArgs {
    pub fn to_config(&self) -> Result<ImportConfig> {
        let Some(max_file_bytes) = self.max_file_mb.checked_mul(1024 * 1024) else {
            bail!("max file size {} MiB is too large", self.max_file_mb);
        };
        let cfg = ImportConfig::new(&self.incoming_dir, &self.archive_dir)
            .with_scan_interval(Duration::from_secs(self.scan_interval))
            .with_max_file_bytes(max_file_bytes);
        if let Err(reason) = cfg.validate() {
            bail!("invalid import configuration: {reason}");
        }
        Ok(cfg)
    }
}

#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    /// Length of generated fake numbers
    #[arg(long, env = "FAKE_NUMBER_LENGTH", default_value_t = 15)]
    pub fake_length: usize,

    /// Leading digits of generated fake numbers
    #[arg(long, env = "FAKE_NUMBER_PREFIX", default_value = "7")]
    pub fake_prefix: String,
}

impl GeneratorArgs {
    pub fn to_spec(&self) -> Result<FakeNumberSpec> {
        let spec = FakeNumberSpec::new(self.fake_length, self.fake_prefix.clone());
        if let Err(reason) = config::validate_fake_spec(&spec) {
            bail!("invalid fake number configuration: {reason}");
        }
        Ok(spec)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub import: ImportArgs,

    /// HTTP listen address
    #[arg(long, env = "PHONEMAP_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Serve lookups only; do not poll the inbox
    #[arg(long)]
    pub no_worker: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub import: ImportArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EnrollArgs {
    /// File with one real phone number per line
    pub file: PathBuf,

    /// Delete all existing mappings first
    #[arg(long)]
    pub clear_old: bool,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub generator: GeneratorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ClearArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Required; clearing cannot be undone
    #[arg(long)]
    pub yes: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// fake -> real (records a call log entry)
    Real,
    /// real -> fake
    Fake,
}

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    /// What to resolve to
    #[arg(value_enum)]
    pub direction: Direction,

    /// Phone number in any formatting
    pub number: String,

    #[command(flatten)]
    pub store: StoreArgs,
}
