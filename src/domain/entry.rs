//! Voice index entries.
//!
//! The index is a JSON object mapping an opaque entry id to a record that
//! describes one voice line. Entry order is kept as it appears in the file
//! so that buckets and metadata come out in the same order on every run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur while loading the index file
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Failed to read index {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse index {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Index {0} is not a JSON object")]
    NotAnObject(PathBuf),

    #[error("Invalid index entry '{id}': {source}")]
    Entry {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Missing and `null` fields both read as an empty string
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single record from the voice index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceEntry {
    /// Original asset path, carries character and quest hints
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source_file_name: String,

    /// Spoken line
    #[serde(default, deserialize_with = "null_as_empty")]
    pub voice_content: String,

    /// Fallback character label
    #[serde(default, deserialize_with = "null_as_empty")]
    pub avatar_name: String,
}

impl VoiceEntry {
    pub fn new(
        source_file_name: impl Into<String>,
        voice_content: impl Into<String>,
        avatar_name: impl Into<String>,
    ) -> Self {
        Self {
            source_file_name: source_file_name.into(),
            voice_content: voice_content.into(),
            avatar_name: avatar_name.into(),
        }
    }
}

/// The loaded index, in file order
#[derive(Debug, Clone, Default)]
pub struct VoiceIndex {
    entries: Vec<(String, VoiceEntry)>,
}

impl VoiceIndex {
    /// Create an index from already-parsed entries
    pub fn from_entries(entries: impl IntoIterator<Item = (String, VoiceEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Load and parse an index file
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content).map_err(|e| match e {
            IndexError::Parse { source, .. } => IndexError::Parse {
                path: path.to_path_buf(),
                source,
            },
            IndexError::NotAnObject(_) => IndexError::NotAnObject(path.to_path_buf()),
            other => other,
        })
    }

    /// Parse an index from a JSON string
    pub fn from_json(content: &str) -> Result<Self, IndexError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|source| IndexError::Parse {
                path: PathBuf::new(),
                source,
            })?;

        let serde_json::Value::Object(map) = value else {
            return Err(IndexError::NotAnObject(PathBuf::new()));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (id, raw) in map {
            let entry: VoiceEntry = serde_json::from_value(raw)
                .map_err(|source| IndexError::Entry { id: id.clone(), source })?;
            entries.push((id, entry));
        }

        Ok(Self { entries })
    }

    /// Iterate entries in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VoiceEntry)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    /// Get an entry by id
    pub fn get(&self, id: &str) -> Option<&VoiceEntry> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_keeps_file_order() {
        let index = VoiceIndex::from_json(
            r#"{
                "z9": {"sourceFileName": "a", "voiceContent": "first", "avatarName": "A"},
                "a1": {"sourceFileName": "b", "voiceContent": "second", "avatarName": "B"},
                "m5": {"sourceFileName": "c", "voiceContent": "third", "avatarName": "C"}
            }"#,
        )
        .unwrap();

        let ids: Vec<_> = index.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["z9", "a1", "m5"]);
        assert_eq!(index.get("a1").unwrap().voice_content, "second");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let index = VoiceIndex::from_json(r#"{"x": {"sourceFileName": "VO\\x.wem"}}"#).unwrap();

        let entry = index.get("x").unwrap();
        assert_eq!(entry.source_file_name, "VO\\x.wem");
        assert_eq!(entry.voice_content, "");
        assert_eq!(entry.avatar_name, "");
    }

    #[test]
    fn test_null_fields_default_to_empty() {
        let index = VoiceIndex::from_json(
            r#"{
                "a1": {"sourceFileName": "VO\\VO_Paimon\\vo_ABCDE01_001.wem", "voiceContent": null, "avatarName": null},
                "a2": {"sourceFileName": null, "voiceContent": "Hi", "avatarName": "Amber"}
            }"#,
        )
        .unwrap();

        let a1 = index.get("a1").unwrap();
        assert_eq!(a1.voice_content, "");
        assert_eq!(a1.avatar_name, "");

        let a2 = index.get("a2").unwrap();
        assert_eq!(a2.source_file_name, "");
        assert_eq!(a2.avatar_name, "Amber");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let index = VoiceIndex::from_json(
            r#"{"x": {"sourceFileName": "s", "talkRoleType": "TALK_ROLE_PLAYER", "gameTrigger": "Dialog"}}"#,
        )
        .unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_top_level_array_rejected() {
        let result = VoiceIndex::from_json("[1, 2, 3]");
        assert!(matches!(result, Err(IndexError::NotAnObject(_))));
    }

    #[test]
    fn test_non_object_entry_rejected() {
        let result = VoiceIndex::from_json(r#"{"bad": "just a string"}"#);
        match result {
            Err(IndexError::Entry { id, .. }) => assert_eq!(id, "bad"),
            other => panic!("Expected Entry error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        match VoiceIndex::load(&path) {
            Err(IndexError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("Expected Parse error, got {:?}", other),
        }

        let missing = temp.path().join("missing.json");
        assert!(matches!(
            VoiceIndex::load(&missing),
            Err(IndexError::Read { .. })
        ));
    }
}
