//! Core extraction logic.
//!
//! This module contains:
//! - Classify: Character/quest extraction and filters
//! - Locate: Single-pass source tree scan
//! - Events: Progress events and sinks
//! - Pipeline: Preconditions and the extraction run

pub mod classify;
pub mod events;
pub mod locate;
pub mod pipeline;

// Re-export commonly used types
pub use classify::{classify, Classification, Filters};
pub use events::{EventSink, ExtractEvent, TracingSink};
pub use locate::{locate_sources, LocateResult};
pub use pipeline::{
    copy_preserving, plan, CancelFlag, ExtractOptions, ExtractRequest, ExtractionReport, Plan,
    PreconditionError, PreparedRun, DEFAULT_EXTENSION, DEFAULT_METADATA_FILE,
};
