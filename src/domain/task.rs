//! Per-run work items: copy tasks and character buckets.
//!
//! Both are built fresh for every extraction run and dropped once the
//! output tree and metadata files are written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

/// One audio file to copy into the output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    /// Resolved character name
    pub character: String,

    /// Quest id (empty when the source name carries none)
    pub quest_id: String,

    /// Target file name (`<entry id>.<ext>`)
    pub filename: String,

    /// Where the file was found in the source tree
    pub source_path: Option<PathBuf>,

    /// `<output>/<character>/<quest>/<filename>`
    pub dest_path: PathBuf,
}

impl CopyTask {
    pub fn new(
        output_dir: &Path,
        character: impl Into<String>,
        quest_id: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let character = character.into();
        let quest_id = quest_id.into();
        let filename = filename.into();

        let dest_path = output_dir.join(&character).join(&quest_id).join(&filename);

        Self {
            character,
            quest_id,
            filename,
            source_path: None,
            dest_path,
        }
    }

    /// Whether the source tree scan located this file
    pub fn is_resolved(&self) -> bool {
        self.source_path.is_some()
    }

    /// Directory the file is copied into
    pub fn dest_dir(&self) -> &Path {
        self.dest_path.parent().unwrap_or(&self.dest_path)
    }
}

/// Filtered view of an index entry, written to the per-character metadata file
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub voice_content: String,

    /// Normalized audio file name, not the original asset path
    pub source_file_name: String,

    /// Resolved character name
    pub avatar_name: String,
}

/// Entries grouped under one resolved character name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterBucket {
    pub character: String,
    entries: Vec<(String, MetadataRecord)>,
}

impl CharacterBucket {
    pub fn new(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            entries: Vec::new(),
        }
    }

    /// Add or replace the record for an entry id
    pub fn insert(&mut self, entry_id: impl Into<String>, record: MetadataRecord) {
        let entry_id = entry_id.into();
        if let Some(existing) = self.entries.iter_mut().find(|(id, _)| *id == entry_id) {
            existing.1 = record;
        } else {
            self.entries.push((entry_id, record));
        }
    }

    pub fn get(&self, entry_id: &str) -> Option<&MetadataRecord> {
        self.entries
            .iter()
            .find(|(id, _)| id == entry_id)
            .map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the metadata file body (2-space indent, non-ASCII kept literal)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for CharacterBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(id, record)| (id, record)))
    }
}

/// Character buckets in first-seen order
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    buckets: Vec<CharacterBucket>,
    positions: HashMap<String, usize>,
}

impl Buckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bucket for a character, creating it on first use
    pub fn bucket_mut(&mut self, character: &str) -> &mut CharacterBucket {
        let pos = match self.positions.get(character) {
            Some(&pos) => pos,
            None => {
                self.buckets.push(CharacterBucket::new(character));
                let pos = self.buckets.len() - 1;
                self.positions.insert(character.to_string(), pos);
                pos
            }
        };
        &mut self.buckets[pos]
    }

    pub fn get(&self, character: &str) -> Option<&CharacterBucket> {
        self.positions.get(character).map(|&pos| &self.buckets[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CharacterBucket> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
