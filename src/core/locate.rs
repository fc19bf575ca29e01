//! Single-pass source tree scan.
//!
//! The source dump is walked once. Each directory's files are visited
//! before its subdirectories (names sorted), and the first file whose name
//! matches a pending task resolves that task. Later duplicates are ignored.
//! Symlinked files count as files; symlinked directories are not followed.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::events::{EventSink, ExtractEvent};
use super::pipeline::CancelFlag;
use crate::domain::CopyTask;

/// Statistics from one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocateResult {
    /// Tasks that received a source path
    pub resolved: usize,

    /// Tasks still without a source path
    pub unresolved: usize,

    /// Files looked at before the scan finished
    pub files_scanned: usize,

    /// Entries the walk could not read
    pub errors: usize,

    /// Scan stopped because of a cancel request
    pub cancelled: bool,
}

/// Files first, then directories, each group by name
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Regular file, or a symlink whose target is one
fn is_file_like(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        || (entry.path_is_symlink()
            && std::fs::metadata(entry.path())
                .map(|m| m.is_file())
                .unwrap_or(false))
}

/// `exclude` spelled the way the walk will report it, when it lies strictly under `root`
fn walk_path_of(root: &Path, exclude: &Path) -> Option<PathBuf> {
    let root_canonical = root.canonicalize().ok()?;
    let exclude_canonical = exclude.canonicalize().ok()?;
    let rel = exclude_canonical.strip_prefix(&root_canonical).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(root.join(rel))
}

/// Resolve `source_path` for every task whose file exists under `root`.
///
/// The `exclude` directory (usually the output folder) is never descended
/// into, so earlier results are not mistaken for source files.
pub fn locate_sources(
    root: &Path,
    exclude: Option<&Path>,
    tasks: &mut [CopyTask],
    sink: &mut dyn EventSink,
    cancel: &CancelFlag,
) -> LocateResult {
    let mut result = LocateResult::default();

    // filename -> indices of tasks still waiting for it
    let mut pending: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, task) in tasks.iter().enumerate() {
        if !task.is_resolved() {
            pending.entry(task.filename.clone()).or_default().push(idx);
        }
    }

    let skip = exclude.and_then(|dir| walk_path_of(root, dir));
    if let Some(dir) = &skip {
        tracing::debug!("Skipping {} during scan", dir.display());
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(files_first)
        .into_iter()
        .filter_entry(move |e| skip.as_deref().map_or(true, |dir| e.path() != dir));

    for entry in walker {
        if pending.is_empty() {
            break;
        }

        if cancel.is_cancelled() {
            result.cancelled = true;
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error accessing entry: {}", e);
                result.errors += 1;
                sink.emit(ExtractEvent::ScanWarning {
                    message: e.to_string(),
                });
                continue;
            }
        };

        if !is_file_like(&entry) {
            continue;
        }
        result.files_scanned += 1;

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        if let Some(indices) = pending.remove(name) {
            let dir = entry.path().parent().unwrap_or(root).to_path_buf();
            for idx in indices {
                tasks[idx].source_path = Some(entry.path().to_path_buf());
                result.resolved += 1;
                sink.emit(ExtractEvent::Found {
                    filename: tasks[idx].filename.clone(),
                    dir: dir.clone(),
                });
            }
        }
    }

    result.unresolved = pending.values().map(Vec::len).sum();

    tracing::debug!(
        "Scan complete: {} resolved, {} unresolved, {} files scanned",
        result.resolved,
        result.unresolved,
        result.files_scanned
    );

    result
}
