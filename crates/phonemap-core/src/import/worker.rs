use super::fs_ops;
use super::parse::parse_mapping_csv;
use super::report::ImportRunReport;
use super::status::ImportStatus;
use crate::config::ImportConfig;
use crate::errors::ImportError;
use crate::store::MappingStore;
use chrono::Utc;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Polls the inbox for the mapping file and replaces the mapping table with it.
///
/// Single-writer: the rename-to-`.processing` claim is a best-effort guard
/// against a second worker on the same inbox, not a lock.
pub struct ImportWorker {
    config: ImportConfig,
    store: MappingStore,
    status: Arc<ImportStatus>,
}

impl ImportWorker {
    /// Create the worker, making sure the inbox and archive directories exist.
    pub fn new(
        config: ImportConfig,
        store: MappingStore,
        status: Arc<ImportStatus>,
    ) -> Result<Self, ImportError> {
        for dir in [&config.incoming_dir, &config.archive_dir] {
            fs::create_dir_all(dir)
                .map_err(|e| ImportError::io(format!("create {}", dir.display()), e))?;
        }
        Ok(Self {
            config,
            store,
            status,
        })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn status(&self) -> &Arc<ImportStatus> {
        &self.status
    }

    fn target_path(&self) -> PathBuf {
        self.config.incoming_dir.join(&self.config.file_name)
    }

    fn processing_path(&self) -> PathBuf {
        fs_ops::sibling(
            &self.config.incoming_dir,
            &self.config.file_name,
            fs_ops::PROCESSING_SUFFIX,
        )
    }

    /// Put back a claim left behind by an interrupted cycle.
    ///
    /// With no fresh file in the inbox the stale claim is renamed back so the
    /// next cycle reprocesses it; otherwise the fresh file wins and the stale
    /// one is archived.
    pub fn recover_stale_claim(&self) -> Result<(), ImportError> {
        let stale = self.processing_path();
        if !stale.exists() {
            return Ok(());
        }

        let target = self.target_path();
        if target.exists() {
            let name = fs_ops::archive_name(&self.config.file_name, Utc::now(), "_stale");
            let dest = fs_ops::archive(&stale, &self.config.archive_dir, &name)
                .map_err(|e| ImportError::io("archive stale claim", e))?;
            tracing::warn!(
                path = %dest.display(),
                "superseded stale claim archived without processing"
            );
        } else {
            fs::rename(&stale, &target)
                .map_err(|e| ImportError::io("restore stale claim", e))?;
            tracing::warn!(
                file = %self.config.file_name,
                "restored stale claim from interrupted cycle"
            );
        }
        Ok(())
    }

    /// Run one cycle.
    ///
    /// Returns `Ok(None)` when there was nothing to do (no file, or the file
    /// vanished before it could be claimed). A failed import is still
    /// `Ok(Some(report))` with `success == false`; `Err` is reserved for
    /// failures outside the import itself, such as a claim rename error.
    pub fn scan_once(&self) -> Result<Option<ImportRunReport>, ImportError> {
        self.scan_with(|path| self.process_file(path))
    }

    /// One cycle with a pluggable processing step. A panic inside `process`
    /// becomes a failed report; the file is still archived and marked.
    fn scan_with<F>(&self, process: F) -> Result<Option<ImportRunReport>, ImportError>
    where
        F: FnOnce(&Path) -> Result<(usize, usize), ImportError>,
    {
        let target = self.target_path();
        if !target.exists() {
            return Ok(None);
        }

        let claimed = match fs_ops::claim(&target)
            .map_err(|e| ImportError::io(format!("claim {}", target.display()), e))?
        {
            Some(path) => path,
            None => {
                tracing::debug!(file = %self.config.file_name, "file vanished before claim");
                return Ok(None);
            }
        };

        let file = self.config.file_name.as_str();
        let started_at = Utc::now();
        tracing::info!(file, "import started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| process(&claimed)))
            .unwrap_or_else(|payload| {
                Err(ImportError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            });
        let finished_at = Utc::now();

        let report = match outcome {
            Ok((inserted, total_rows)) => {
                let report =
                    ImportRunReport::succeeded(file, started_at, finished_at, total_rows, inserted);
                tracing::info!(
                    file,
                    inserted,
                    total_rows,
                    duration_sec = report.duration_sec,
                    "import finished"
                );
                report
            }
            Err(e) => {
                let report = ImportRunReport::failed(file, started_at, finished_at, e.to_string());
                tracing::error!(
                    file,
                    line = e.line(),
                    error = %e,
                    duration_sec = report.duration_sec,
                    "import failed"
                );
                report
            }
        };

        // archive regardless of the verdict
        let archive_name = fs_ops::archive_name(file, finished_at, "");
        match fs_ops::archive(&claimed, &self.config.archive_dir, &archive_name) {
            Ok(dest) => tracing::debug!(path = %dest.display(), "source archived"),
            Err(e) => tracing::error!(error = %e, "failed to move file to archive"),
        }

        if let Err(e) = fs_ops::write_marker(&self.config.incoming_dir, file, &report) {
            tracing::error!(error = %e, "failed to write status marker");
        }

        self.status.set(report.clone());
        Ok(Some(report))
    }

    /// Size check, strict parse, transactional replace. Returns `(inserted, total_rows)`.
    fn process_file(&self, path: &Path) -> Result<(usize, usize), ImportError> {
        let size = fs::metadata(path)
            .map_err(|e| ImportError::io(format!("stat {}", path.display()), e))?
            .len();
        if size > self.config.max_file_bytes {
            return Err(ImportError::FileTooLarge {
                size,
                max: self.config.max_file_bytes,
            });
        }

        let content =
            fs::read(path).map_err(|e| ImportError::io(format!("read {}", path.display()), e))?;
        let parsed = parse_mapping_csv(&content)?;
        let inserted = self.store.replace_all(&parsed.pairs)?;
        Ok((inserted, parsed.total_rows))
    }

    /// Poll forever until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Each cycle runs on the blocking pool. A failing or panicking cycle is
    /// logged and the loop keeps going; an in-flight cycle is never cancelled.
    pub async fn run_forever(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let worker = self.clone();
        match tokio::task::spawn_blocking(move || worker.recover_stale_claim()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "stale claim recovery failed"),
            Err(join_err) => tracing::error!(error = %join_err, "stale claim recovery panicked"),
        }

        tracing::info!(
            incoming = %self.config.incoming_dir.display(),
            archive = %self.config.archive_dir.display(),
            interval_secs = self.config.scan_interval.as_secs(),
            "import worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let worker = self.clone();
            match tokio::task::spawn_blocking(move || worker.scan_once()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "import cycle error"),
                Err(join_err) => tracing::error!(error = %join_err, "import cycle panicked"),
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.config.scan_interval) => {}
            }
        }

        tracing::info!("import worker stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
