//! Last-run status cache shared between the import worker and status readers.

use super::report::ImportRunReport;
use std::sync::Mutex;

/// Single-slot holder for the latest [`ImportRunReport`].
///
/// Reads and writes take the same lock, so a reader never sees a half-written report.
#[derive(Debug, Default)]
pub struct ImportStatus {
    last_run: Mutex<Option<ImportRunReport>>,
}

impl ImportStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, report: ImportRunReport) {
        let mut slot = match self.last_run.lock() {
            Ok(guard) => guard,
            // the slot holds plain data; a panicked writer cannot leave it torn
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(report);
    }

    /// Copy of the latest report, or `None` before the first run.
    pub fn snapshot(&self) -> Option<ImportRunReport> {
        match self.last_run.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_idle_until_first_set() {
        let status = ImportStatus::new();
        assert!(status.snapshot().is_none());

        let now = Utc::now();
        status.set(ImportRunReport::succeeded("f.csv", now, now, 1, 1));
        assert_eq!(status.snapshot().unwrap().inserted, Some(1));
    }

    #[test]
    fn test_set_overwrites() {
        let status = ImportStatus::new();
        let now = Utc::now();
        status.set(ImportRunReport::succeeded("f.csv", now, now, 1, 1));
        status.set(ImportRunReport::failed("f.csv", now, now, "boom"));

        let snap = status.snapshot().unwrap();
        assert!(!snap.success);
        assert_eq!(snap.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_concurrent_readers_see_whole_reports() {
        let status = Arc::new(ImportStatus::new());
        let writer = {
            let status = status.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let now = Utc::now();
                    status.set(ImportRunReport::succeeded("f.csv", now, now, i, i));
                }
            })
        };
        let reader = {
            let status = status.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    if let Some(snap) = status.snapshot() {
                        assert_eq!(snap.total_rows, snap.inserted);
                    }
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
    }
}
