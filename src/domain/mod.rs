//! Domain types for voice extraction.
//!
//! This module contains the core data structures:
//! - Entry: Records loaded from the voice index
//! - Task: Copy tasks and per-character metadata buckets

pub mod entry;
pub mod task;

// Re-export commonly used types
pub use entry::{IndexError, VoiceEntry, VoiceIndex};
pub use task::{Buckets, CharacterBucket, CopyTask, MetadataRecord};
