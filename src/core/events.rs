//! Progress events emitted by an extraction run.
//!
//! The pipeline never prints. It pushes `ExtractEvent`s into an `EventSink`
//! and whichever front-end is attached decides how to show them. The
//! `Display` impl renders the human-readable log line.

use std::fmt;
use std::path::PathBuf;

use tokio::sync::mpsc;

/// A single progress or error line from a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractEvent {
    /// Run accepted; filters are already normalized
    Started {
        character_filter: Option<String>,
        quest_filter: Option<String>,
    },

    /// Filtering finished
    Planned { tasks: usize, characters: usize },

    /// Source tree walk starting
    Locating { root: PathBuf },

    /// A task's file was found in the source tree
    Found { filename: String, dir: PathBuf },

    /// A directory could not be read during the walk
    ScanWarning { message: String },

    /// Copy phase starting
    Copying,

    /// File was never located in the source tree
    NotFound { filename: String, character: String },

    /// File copied into the output tree
    Copied {
        filename: String,
        character: String,
        dest: PathBuf,
    },

    /// Dry run: file would have been copied
    WouldCopy {
        filename: String,
        character: String,
        dest: PathBuf,
    },

    CopyFailed {
        filename: String,
        character: String,
        error: String,
    },

    /// Per-character metadata file written
    MetadataSaved { character: String, path: PathBuf },

    MetadataFailed { character: String, error: String },

    /// Run stopped early on request
    Cancelled,

    /// Run finished
    Completed {
        total_copied: usize,
        per_character: Vec<(String, usize)>,
    },
}

impl ExtractEvent {
    /// Per-file success lines, shown only in verbose mode
    pub fn is_verbose(&self) -> bool {
        matches!(self, Self::Copied { .. } | Self::WouldCopy { .. })
    }

    /// Whether this event reports a per-item failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::CopyFailed { .. }
                | Self::MetadataFailed { .. }
                | Self::ScanWarning { .. }
        )
    }
}

impl fmt::Display for ExtractEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                character_filter,
                quest_filter,
            } => {
                writeln!(f, "Starting extraction...")?;
                writeln!(
                    f,
                    "Character filter: {}",
                    character_filter.as_deref().unwrap_or("All")
                )?;
                write!(f, "Quest ID filter: {}", quest_filter.as_deref().unwrap_or("All"))
            }
            Self::Planned { tasks, characters } => {
                write!(f, "Matched {} entries across {} characters", tasks, characters)
            }
            Self::Locating { root } => {
                write!(f, "Locating source files recursively in {}...", root.display())
            }
            Self::Found { filename, dir } => write!(f, "Found {} in {}", filename, dir.display()),
            Self::ScanWarning { message } => write!(f, "Warning: {}", message),
            Self::Copying => write!(f, "Processing files..."),
            Self::NotFound { filename, .. } => write!(f, "File not found: {}", filename),
            Self::Copied { filename, dest, .. } => {
                write!(f, "Copied {} -> {}", filename, dest.display())
            }
            Self::WouldCopy { filename, dest, .. } => {
                write!(f, "Would copy {} -> {}", filename, dest.display())
            }
            Self::CopyFailed {
                filename, error, ..
            } => write!(f, "Error copying {}: {}", filename, error),
            Self::MetadataSaved { character, .. } => {
                write!(f, "Saved voice data for {}", character)
            }
            Self::MetadataFailed { character, error } => {
                write!(f, "Error saving JSON for {}: {}", character, error)
            }
            Self::Cancelled => write!(f, "Extraction cancelled"),
            Self::Completed {
                total_copied,
                per_character,
            } => {
                writeln!(f, "Extraction complete!")?;
                write!(f, "Total files copied: {}", total_copied)?;
                if !per_character.is_empty() {
                    write!(f, "\nCharacter statistics:")?;
                    for (character, count) in per_character {
                        write!(f, "\n- {}: {} files", character, count)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Receiver of run events
pub trait EventSink {
    fn emit(&mut self, event: ExtractEvent);
}

/// Collect events in memory
impl EventSink for Vec<ExtractEvent> {
    fn emit(&mut self, event: ExtractEvent) {
        self.push(event);
    }
}

/// Forward events to another task; a closed receiver drops them
impl EventSink for mpsc::UnboundedSender<ExtractEvent> {
    fn emit(&mut self, event: ExtractEvent) {
        let _ = self.send(event);
    }
}

/// Route events into `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: ExtractEvent) {
        if event.is_failure() {
            tracing::warn!("{}", event);
        } else if event.is_verbose() {
            tracing::debug!("{}", event);
        } else {
            tracing::info!("{}", event);
        }
    }
}
