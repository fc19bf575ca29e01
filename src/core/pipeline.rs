//! Extraction pipeline.
//!
//! A run goes through four steps:
//! 1. Classify index entries and apply filters, building copy tasks and
//!    per-character buckets
//! 2. Walk the source tree once to locate every task's file
//! 3. Copy located files into `<output>/<character>/<quest>/`
//! 4. Write `<output>/<character>/voice_data.json` for every bucket
//!
//! Preconditions (index, source folder, output folder) are checked by
//! `ExtractRequest::prepare` before anything touches the filesystem. After
//! that, failures are per item: they are reported through the event sink
//! and the run carries on.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::classify::{classify, Filters};
use super::events::{EventSink, ExtractEvent};
use super::locate::locate_sources;
use crate::domain::{Buckets, CopyTask, IndexError, MetadataRecord, VoiceIndex};

/// Default audio asset extension
pub const DEFAULT_EXTENSION: &str = "wem";

/// Default per-character metadata file name
pub const DEFAULT_METADATA_FILE: &str = "voice_data.json";

/// Fatal problems detected before a run starts
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("No index file selected")]
    IndexUnset,

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Index contains no entries")]
    EmptyIndex,

    #[error("Source folder not selected")]
    SourceUnset,

    #[error("Source folder does not exist: {0}")]
    SourceNotFound(PathBuf),

    #[error("Source path is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    #[error("Output folder not selected")]
    OutputUnset,

    #[error("Output path exists and is not a directory: {0}")]
    OutputNotDirectory(PathBuf),
}

/// Shared cancel request, checked during the walk and between copies
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Knobs that do not change which entries are selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Audio asset extension, without the dot
    pub extension: String,

    /// Name of the per-character metadata file
    pub metadata_file: String,

    /// Plan and locate only; leave the output tree untouched
    pub dry_run: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            dry_run: false,
        }
    }
}

/// Everything a front-end supplies for one run
#[derive(Debug, Clone, Default)]
pub struct ExtractRequest {
    pub index_path: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub filters: Filters,
    pub options: ExtractOptions,
}

impl ExtractRequest {
    /// Load the index and check every precondition
    pub fn prepare(self) -> Result<PreparedRun, PreconditionError> {
        let index_path = self.index_path.ok_or(PreconditionError::IndexUnset)?;
        let index = VoiceIndex::load(&index_path)?;
        tracing::debug!("Loaded {} entries from {}", index.len(), index_path.display());

        PreparedRun::new(
            index,
            self.source_dir,
            self.output_dir,
            self.filters,
            self.options,
        )
    }
}

/// A validated run, ready to execute
#[derive(Debug, Clone)]
pub struct PreparedRun {
    index: VoiceIndex,
    source_dir: PathBuf,
    output_dir: PathBuf,
    filters: Filters,
    options: ExtractOptions,
}

/// Output of the classify/filter step
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub tasks: Vec<CopyTask>,
    pub buckets: Buckets,
}

/// Build copy tasks and character buckets for every entry passing the filters
pub fn plan(index: &VoiceIndex, filters: &Filters, output_dir: &Path, extension: &str) -> Plan {
    let mut plan = Plan::default();

    for (entry_id, entry) in index.iter() {
        let class = classify(entry);
        if !filters.matches(&class) {
            continue;
        }

        let filename = format!("{}.{}", entry_id, extension);

        plan.buckets.bucket_mut(&class.character).insert(
            entry_id,
            MetadataRecord {
                voice_content: entry.voice_content.clone(),
                source_file_name: filename.clone(),
                avatar_name: class.character.clone(),
            },
        );

        plan.tasks.push(CopyTask::new(
            output_dir,
            class.character,
            class.quest_id,
            filename,
        ));
    }

    plan
}

/// Summary of a finished (or cancelled) run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Entries that passed the filters
    pub planned: usize,

    /// Successful copies (would-be copies on a dry run)
    pub total_copied: usize,

    /// Copies per character, in order of first copy
    pub per_character: Vec<(String, usize)>,

    /// Files never found in the source tree
    pub missing: usize,

    pub copy_failures: usize,
    pub metadata_written: usize,
    pub metadata_failures: usize,
    pub scan_errors: usize,
    pub dry_run: bool,
    pub cancelled: bool,
}

impl ExtractionReport {
    fn new(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            planned: 0,
            total_copied: 0,
            per_character: Vec::new(),
            missing: 0,
            copy_failures: 0,
            metadata_written: 0,
            metadata_failures: 0,
            scan_errors: 0,
            dry_run,
            cancelled: false,
        }
    }

    /// Copies recorded for one character
    pub fn copied_for(&self, character: &str) -> usize {
        self.per_character
            .iter()
            .find(|(name, _)| name == character)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn has_failures(&self) -> bool {
        self.missing + self.copy_failures + self.metadata_failures + self.scan_errors > 0
    }

    /// One-line breakdown of everything `has_failures` counts
    pub fn failure_summary(&self) -> String {
        format!(
            "{} missing, {} copy failures, {} metadata failures, {} scan errors",
            self.missing, self.copy_failures, self.metadata_failures, self.scan_errors
        )
    }

    fn record_copy(&mut self, character: &str) {
        self.total_copied += 1;
        match self.per_character.iter_mut().find(|(name, _)| name == character) {
            Some((_, count)) => *count += 1,
            None => self.per_character.push((character.to_string(), 1)),
        }
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

/// Whether both paths exist and resolve to the same file
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy a file, carrying over permissions and access/modification times.
///
/// Refuses to copy a file onto itself.
pub fn copy_preserving(source: &Path, dest: &Path) -> std::io::Result<()> {
    if same_file(source, dest) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "{} and {} are the same file",
                source.display(),
                dest.display()
            ),
        ));
    }

    std::fs::copy(source, dest)?;

    let metadata = std::fs::metadata(source)?;
    let atime = filetime::FileTime::from_last_access_time(&metadata);
    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(dest, atime, mtime)
}

impl PreparedRun {
    /// Validate folders for an already-loaded index
    pub fn new(
        index: VoiceIndex,
        source_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        filters: Filters,
        options: ExtractOptions,
    ) -> Result<Self, PreconditionError> {
        if index.is_empty() {
            return Err(PreconditionError::EmptyIndex);
        }

        let source_dir = source_dir.ok_or(PreconditionError::SourceUnset)?;
        if !source_dir.exists() {
            return Err(PreconditionError::SourceNotFound(source_dir));
        }
        if !source_dir.is_dir() {
            return Err(PreconditionError::SourceNotDirectory(source_dir));
        }

        let output_dir = output_dir.ok_or(PreconditionError::OutputUnset)?;
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(PreconditionError::OutputNotDirectory(output_dir));
        }

        Ok(Self {
            index,
            source_dir,
            output_dir,
            filters,
            options,
        })
    }

    pub fn index(&self) -> &VoiceIndex {
        &self.index
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Execute the run, reporting progress through `sink`
    pub fn run(&self, sink: &mut dyn EventSink, cancel: &CancelFlag) -> ExtractionReport {
        let mut report = ExtractionReport::new(self.options.dry_run);

        sink.emit(ExtractEvent::Started {
            character_filter: self.filters.character().map(str::to_string),
            quest_filter: self.filters.quest().map(str::to_string),
        });

        let Plan { mut tasks, buckets } = plan(
            &self.index,
            &self.filters,
            &self.output_dir,
            &self.options.extension,
        );
        report.planned = tasks.len();
        sink.emit(ExtractEvent::Planned {
            tasks: tasks.len(),
            characters: buckets.len(),
        });

        sink.emit(ExtractEvent::Locating {
            root: self.source_dir.clone(),
        });
        let located = locate_sources(
            &self.source_dir,
            Some(&self.output_dir),
            &mut tasks,
            sink,
            cancel,
        );
        report.scan_errors = located.errors;
        if located.cancelled {
            return self.cancelled(report, sink);
        }

        sink.emit(ExtractEvent::Copying);
        for task in &tasks {
            if cancel.is_cancelled() {
                return self.cancelled(report, sink);
            }
            self.copy_task(task, &mut report, sink);
        }

        if !self.options.dry_run {
            for bucket in buckets.iter() {
                let dir = self.output_dir.join(&bucket.character);
                let path = dir.join(&self.options.metadata_file);

                let written = std::fs::create_dir_all(&dir)
                    .map_err(|e| e.to_string())
                    .and_then(|_| bucket.to_json().map_err(|e| e.to_string()))
                    .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()));

                match written {
                    Ok(()) => {
                        report.metadata_written += 1;
                        sink.emit(ExtractEvent::MetadataSaved {
                            character: bucket.character.clone(),
                            path,
                        });
                    }
                    Err(error) => {
                        report.metadata_failures += 1;
                        sink.emit(ExtractEvent::MetadataFailed {
                            character: bucket.character.clone(),
                            error,
                        });
                    }
                }
            }
        }

        sink.emit(ExtractEvent::Completed {
            total_copied: report.total_copied,
            per_character: report.per_character.clone(),
        });

        tracing::debug!(
            "Run finished: {} planned, {} copied, {} missing, {} copy failures",
            report.planned,
            report.total_copied,
            report.missing,
            report.copy_failures
        );

        report.finish()
    }

    fn copy_task(&self, task: &CopyTask, report: &mut ExtractionReport, sink: &mut dyn EventSink) {
        let Some(source) = task.source_path.as_deref() else {
            report.missing += 1;
            sink.emit(ExtractEvent::NotFound {
                filename: task.filename.clone(),
                character: task.character.clone(),
            });
            return;
        };

        if self.options.dry_run {
            report.record_copy(&task.character);
            sink.emit(ExtractEvent::WouldCopy {
                filename: task.filename.clone(),
                character: task.character.clone(),
                dest: task.dest_path.clone(),
            });
            return;
        }

        let copied = std::fs::create_dir_all(task.dest_dir())
            .and_then(|_| copy_preserving(source, &task.dest_path));

        match copied {
            Ok(()) => {
                report.record_copy(&task.character);
                sink.emit(ExtractEvent::Copied {
                    filename: task.filename.clone(),
                    character: task.character.clone(),
                    dest: task.dest_path.clone(),
                });
            }
            Err(e) => {
                report.copy_failures += 1;
                sink.emit(ExtractEvent::CopyFailed {
                    filename: task.filename.clone(),
                    character: task.character.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    fn cancelled(&self, mut report: ExtractionReport, sink: &mut dyn EventSink) -> ExtractionReport {
        report.cancelled = true;
        sink.emit(ExtractEvent::Cancelled);
        tracing::info!("Extraction cancelled after {} copies", report.total_copied);
        report.finish()
    }
}
