//! Character and quest classification of index entries.
//!
//! The original asset path embeds both hints, e.g.
//! `VO_AQ\VO_Paimon\vo_XYJEQ005_7_paimon_01.wem`:
//! - character: the `VO_<character>` directory under a `VO_<group>` directory
//! - quest: the alphanumeric token after `vo_`

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::VoiceEntry;

static CHARACTER_PATTERN: OnceLock<Regex> = OnceLock::new();
static QUEST_PATTERN: OnceLock<Regex> = OnceLock::new();

fn character_pattern() -> &'static Regex {
    CHARACTER_PATTERN.get_or_init(|| {
        Regex::new(r"VO_[^\\/]+\\VO_([^\\/]+)\\").expect("character pattern is valid")
    })
}

fn quest_pattern() -> &'static Regex {
    QUEST_PATTERN
        .get_or_init(|| Regex::new(r"(?i)vo_([A-Z0-9]+)_").expect("quest pattern is valid"))
}

/// Character and quest resolved for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub character: String,
    pub quest_id: String,
}

/// Resolve the character name, falling back to `avatarName`
pub fn character_name(entry: &VoiceEntry) -> String {
    character_pattern()
        .captures(&entry.source_file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| entry.avatar_name.clone())
}

/// Resolve the quest id, empty when the name carries none
pub fn quest_id(source_file_name: &str) -> String {
    quest_pattern()
        .captures(source_file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

pub fn classify(entry: &VoiceEntry) -> Classification {
    Classification {
        character: character_name(entry),
        quest_id: quest_id(&entry.source_file_name),
    }
}

/// Optional character / quest filters
///
/// Character matching ignores case; quest matching is exact. Blank input
/// means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Stored lowercased
    character: Option<String>,
    quest: Option<String>,
}

impl Filters {
    pub fn new(character: Option<&str>, quest: Option<&str>) -> Self {
        let normalize = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        Self {
            character: character.and_then(normalize).map(|c| c.to_lowercase()),
            quest: quest.and_then(normalize),
        }
    }

    /// Filter that accepts everything
    pub fn all() -> Self {
        Self::default()
    }

    pub fn character(&self) -> Option<&str> {
        self.character.as_deref()
    }

    pub fn quest(&self) -> Option<&str> {
        self.quest.as_deref()
    }

    pub fn matches_character(&self, character: &str) -> bool {
        self.character
            .as_deref()
            .map_or(true, |wanted| wanted == character.to_lowercase())
    }

    pub fn matches_quest(&self, quest_id: &str) -> bool {
        self.quest.as_deref().map_or(true, |wanted| wanted == quest_id)
    }

    pub fn matches(&self, classification: &Classification) -> bool {
        self.matches_character(&classification.character)
            && self.matches_quest(&classification.quest_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, avatar: &str) -> VoiceEntry {
        VoiceEntry::new(source, "", avatar)
    }

    #[test]
    fn test_character_from_path() {
        let e = entry(r"VO_AQ\VO_Zhongli\vo_XYJEQ005_7_zhongli_01.wem", "Someone");
        assert_eq!(character_name(&e), "Zhongli");
    }

    #[test]
    fn test_character_case_preserved() {
        let e = entry(r"VO_LQ\VO_raidenShogun\vo_abc_1.wem", "");
        assert_eq!(character_name(&e), "raidenShogun");
    }

    #[test]
    fn test_character_fallback_to_avatar() {
        // Lowercase `vo_` is not a character directory
        let e = entry(r"VO\VO_Paimon\vo_ABCDE01_001.wem", "Paimon");
        assert_eq!(character_name(&e), "Paimon");

        let e = entry("no hints here", "Traveler");
        assert_eq!(character_name(&e), "Traveler");
    }

    #[test]
    fn test_character_fallback_empty_avatar() {
        let e = entry("plain.wem", "");
        assert_eq!(character_name(&e), "");
    }

    #[test]
    fn test_forward_slashes_do_not_match_character() {
        let e = entry("VO_AQ/VO_Zhongli/vo_X_1.wem", "Fallback");
        assert_eq!(character_name(&e), "Fallback");
    }

    #[test]
    fn test_quest_id() {
        assert_eq!(quest_id(r"VO\VO_Paimon\vo_ABCDE01_001.wem"), "ABCDE01");
        assert_eq!(quest_id(r"VO_AQ\VO_Zhongli\vo_XYJEQ005_7.wem"), "XYJEQ005");
        // Case-insensitive token match keeps original casing
        assert_eq!(quest_id("Vo_abc12_x.wem"), "abc12");
        assert_eq!(quest_id("voice_line.wem"), "");
        assert_eq!(quest_id(""), "");
    }

    #[test]
    fn test_classify() {
        let c = classify(&entry(r"VO_AQ\VO_Zhongli\vo_XYJEQ005_7.wem", ""));
        assert_eq!(
            c,
            Classification {
                character: "Zhongli".to_string(),
                quest_id: "XYJEQ005".to_string(),
            }
        );
    }

    #[test]
    fn test_character_filter_ignores_case() {
        let filters = Filters::new(Some("  PAIMON "), None);
        assert_eq!(filters.character(), Some("paimon"));
        assert!(filters.matches_character("Paimon"));
        assert!(filters.matches_character("paimon"));
        assert!(!filters.matches_character("Paimon2"));
    }

    #[test]
    fn test_quest_filter_is_exact() {
        let filters = Filters::new(None, Some(" XYJEQ005 "));
        assert!(filters.matches_quest("XYJEQ005"));
        assert!(!filters.matches_quest("xyjeq005"));
        assert!(!filters.matches_quest(""));
    }

    #[test]
    fn test_blank_filters_match_everything() {
        let filters = Filters::new(Some("   "), Some(""));
        assert_eq!(filters, Filters::all());
        assert!(filters.matches(&Classification {
            character: String::new(),
            quest_id: String::new(),
        }));
    }
}
