//! Index inspection command.
//!
//! `voxtract inspect` classifies every entry the same way an extraction
//! would and lists what it found, so filter values can be picked before
//! copying anything.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config;
use crate::core::{classify, Filters};
use crate::domain::VoiceIndex;

/// Entries and quests seen for one character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSummary {
    pub character: String,
    pub entries: usize,
    pub quests: BTreeSet<String>,
    /// Entries whose name carries no quest id
    pub without_quest: usize,
}

/// Group filtered entries by character, in first-seen order
pub fn summarize(index: &VoiceIndex, filters: &Filters) -> Vec<CharacterSummary> {
    let mut summaries: Vec<CharacterSummary> = Vec::new();

    for (_, entry) in index.iter() {
        let class = classify(entry);
        if !filters.matches(&class) {
            continue;
        }

        let pos = match summaries.iter().position(|s| s.character == class.character) {
            Some(pos) => pos,
            None => {
                summaries.push(CharacterSummary {
                    character: class.character.clone(),
                    entries: 0,
                    quests: BTreeSet::new(),
                    without_quest: 0,
                });
                summaries.len() - 1
            }
        };

        let summary = &mut summaries[pos];
        summary.entries += 1;
        if class.quest_id.is_empty() {
            summary.without_quest += 1;
        } else {
            summary.quests.insert(class.quest_id);
        }
    }

    summaries
}

/// Print the character/quest breakdown of an index
pub async fn execute(index: Option<PathBuf>, filters: Filters) -> Result<()> {
    let path = match index {
        Some(path) => path,
        None => config::config()?
            .index
            .clone()
            .context("No index given. Pass a path or set VOXTRACT_INDEX")?,
    };

    let loaded = tokio::task::spawn_blocking({
        let path = path.clone();
        move || VoiceIndex::load(&path)
    })
    .await
    .context("Index loader failed")??;

    let summaries = summarize(&loaded, &filters);

    println!();
    println!("Index: {} ({} entries)", path.display(), loaded.len());
    println!();

    if summaries.is_empty() {
        println!("No entries match the given filters");
        return Ok(());
    }

    println!("{:<24} {:>8} {:>8}  QUESTS", "CHARACTER", "ENTRIES", "NO-QUEST");
    println!("{}", "-".repeat(75));

    for summary in &summaries {
        let name = if summary.character.is_empty() {
            "(unnamed)"
        } else {
            summary.character.as_str()
        };
        let quests: Vec<&str> = summary.quests.iter().map(String::as_str).collect();
        println!(
            "{:<24} {:>8} {:>8}  {}",
            name,
            summary.entries,
            summary.without_quest,
            quests.join(", ")
        );
    }

    let matched: usize = summaries.iter().map(|s| s.entries).sum();
    println!();
    println!("{} characters, {} matching entries", summaries.len(), matched);

    Ok(())
}
