//! Filesystem steps of a cycle: claim, archive, marker write.

use super::report::ImportRunReport;
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const PROCESSING_SUFFIX: &str = ".processing";
pub const OK_SUFFIX: &str = ".OK";
pub const FAIL_SUFFIX: &str = ".fail";

/// `<dir>/<name><suffix>`
pub(crate) fn sibling(dir: &Path, name: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{name}{suffix}"))
}

/// Rename `target` to its `.processing` name.
///
/// `Ok(None)` means the file vanished before the rename (lost race); the
/// cycle is silently abandoned.
pub(crate) fn claim(target: &Path) -> io::Result<Option<PathBuf>> {
    let mut claimed = target.as_os_str().to_owned();
    claimed.push(PROCESSING_SUFFIX);
    let claimed = PathBuf::from(claimed);

    match fs::rename(target, &claimed) {
        Ok(()) => Ok(Some(claimed)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// `<stem>_<YYYYMMDD_HHMMSS><tag><.ext>`
pub(crate) fn archive_name(file_name: &str, at: DateTime<Utc>, tag: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("{stem}_{}{tag}{ext}", at.format("%Y%m%d_%H%M%S"))
}

/// Move `src` into `archive_dir` under `name`, never overwriting an earlier archive.
pub(crate) fn archive(src: &Path, archive_dir: &Path, name: &str) -> io::Result<PathBuf> {
    let dest = free_path(archive_dir, name);
    move_file(src, &dest)?;
    Ok(dest)
}

fn free_path(dir: &Path, name: &str) -> PathBuf {
    let first = dir.join(name);
    if !first.exists() {
        return first;
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}_{n}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if !src.exists() {
                return Err(rename_err);
            }
            fs::copy(src, dest)?;
            fs::remove_file(src)
        }
    }
}

/// Write `<inbox>/<file><.OK|.fail>` atomically and drop a stale marker of
/// the opposite verdict.
pub(crate) fn write_marker(
    incoming_dir: &Path,
    file_name: &str,
    report: &ImportRunReport,
) -> io::Result<PathBuf> {
    let (suffix, stale_suffix) = if report.success {
        (OK_SUFFIX, FAIL_SUFFIX)
    } else {
        (FAIL_SUFFIX, OK_SUFFIX)
    };
    let marker = sibling(incoming_dir, file_name, suffix);
    write_atomic(&marker, &report.marker_lines().join("\n"))?;

    let stale = sibling(incoming_dir, file_name, stale_suffix);
    match fs::remove_file(&stale) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %stale.display(), error = %e, "failed to remove stale marker");
        }
    }

    Ok(marker)
}

fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    fs::write(&temp, content)?;
    fs::rename(&temp, path)
}
