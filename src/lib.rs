//! voxtract - Per-character voice asset extraction
//!
//! Reads a voice metadata index (entry id -> source asset name, spoken
//! line, speaker), selects entries by character and quest, finds the
//! matching audio files in a bulk asset dump, and copies them into an
//! output tree grouped by character and quest. Each character folder also
//! gets a `voice_data.json` describing the lines it contains.
//!
//! # Modules
//!
//! - `domain`: Data structures (VoiceEntry, VoiceIndex, CopyTask, buckets)
//! - `core`: Extraction logic (classification, source scan, pipeline, events)
//! - `config`: Config file and environment resolution
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Extract everything
//! voxtract extract --index voice.json --source dump/ --output out/
//!
//! # One character, one quest
//! voxtract extract -i voice.json -s dump/ -o out/ -c zhongli -q XYJEQ005
//!
//! # See which characters and quests an index contains
//! voxtract inspect voice.json
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{
    CancelFlag, EventSink, ExtractEvent, ExtractOptions, ExtractRequest, ExtractionReport,
    Filters, PreconditionError, PreparedRun,
};
pub use crate::domain::{CopyTask, VoiceEntry, VoiceIndex};
