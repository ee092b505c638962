//! Word-count reporting over downloaded transcripts.
//!
//! Pure read-side analytics: reads the persisted catalog and the
//! transcript artifacts, never the network. Words are lowercase `[a-z]+`
//! runs from the spoken text after each cue's ` [timestamp] ` prefix.

use std::collections::HashMap;

use anyhow::{Context, Result};
use clap::Args;
use regex::Regex;
use tracing::warn;

use crate::catalog::{Catalog, CatalogStore};
use crate::config::SyncConfig;
use crate::sync::TranscriptStore;

/// Arguments for the `words` subcommand.
#[derive(Args, Debug)]
pub struct WordsArgs {
    /// Count transcripts belonging to this user
    pub user: String,

    /// Words to look up (exact match)
    #[arg(long)]
    pub word: Vec<String>,

    /// Treat --word values as regular expressions
    #[arg(long)]
    pub regexify: bool,

    /// Occurrence counts to look up (lists all words spoken that many times)
    #[arg(long)]
    pub count: Vec<u64>,

    /// With no --word/--count lookups, print the N most frequent words
    #[arg(long, default_value = "25")]
    pub limit: usize,
}

/// Execute the `words` subcommand.
pub fn execute(args: WordsArgs) -> Result<()> {
    let config = SyncConfig::load()?;
    let catalog = CatalogStore::new(&config.catalog_path).load()?;
    let transcripts = TranscriptStore::new(&config.transcript_dir);

    let counts = count_words(&catalog, &transcripts, &args.user)?;
    if counts.is_empty() {
        println!("No downloaded transcripts found for user '{}'", args.user);
        return Ok(());
    }

    if args.word.is_empty() && args.count.is_empty() {
        print_top_words(&counts, args.limit);
        return Ok(());
    }

    for word in &args.word {
        if args.regexify {
            regex_lookup(word, &counts)?;
        } else {
            word_lookup(word, &counts);
        }
    }

    if !args.count.is_empty() {
        let by_count = invert_counts(&counts);
        for count in &args.count {
            count_lookup(*count, &by_count);
        }
    }

    Ok(())
}

/// Tally word occurrences across a user's downloaded transcripts.
fn count_words(
    catalog: &Catalog,
    transcripts: &TranscriptStore,
    user: &str,
) -> Result<HashMap<String, u64>> {
    let word_re = Regex::new("[a-z]+")?;
    let mut counts = HashMap::new();

    for record in catalog
        .records()
        .iter()
        .filter(|r| r.downloaded && r.user.as_deref() == Some(user))
    {
        let path = transcripts.path_for(&record.id_path);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                // downloaded=true should imply the artifact exists; keep
                // counting the rest either way
                warn!(
                    id_path = %record.id_path,
                    error = %e,
                    "Skipping unreadable transcript artifact"
                );
                continue;
            }
        };

        for line in text.lines() {
            // Strip the ` [timestamp] ` prefix; sentinel and malformed
            // lines have no cue separator and are skipped
            let Some((_, spoken)) = line.split_once("] ") else {
                continue;
            };
            for word in word_re.find_iter(&spoken.to_lowercase()) {
                *counts.entry(word.as_str().to_string()).or_insert(0) += 1;
            }
        }
    }

    Ok(counts)
}

fn print_top_words(counts: &HashMap<String, u64>, limit: usize) {
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    println!("{} distinct words; top {}:", counts.len(), limit.min(sorted.len()));
    for (word, count) in sorted.into_iter().take(limit) {
        println!("  {}: {}", word, count);
    }
}

fn word_lookup(word: &str, counts: &HashMap<String, u64>) {
    match counts.get(word) {
        Some(count) => println!("{}: {}", word, count),
        None => println!("No known uses of the word '{}'", word),
    }
}

fn regex_lookup(pattern: &str, counts: &HashMap<String, u64>) -> Result<()> {
    let re = Regex::new(pattern)
        .with_context(|| format!("Invalid word pattern '{}'", pattern))?;

    let mut matched: Vec<_> = counts.iter().filter(|(word, _)| re.is_match(word)).collect();
    if matched.is_empty() {
        println!("No words match pattern '{}'", pattern);
        return Ok(());
    }

    matched.sort_by(|a, b| a.0.cmp(b.0));
    for (word, count) in matched {
        println!("{}: {}", word, count);
    }
    Ok(())
}

fn invert_counts(counts: &HashMap<String, u64>) -> HashMap<u64, Vec<String>> {
    let mut by_count: HashMap<u64, Vec<String>> = HashMap::new();
    for (word, count) in counts {
        by_count.entry(*count).or_default().push(word.clone());
    }
    for words in by_count.values_mut() {
        words.sort();
    }
    by_count
}

fn count_lookup(count: u64, by_count: &HashMap<u64, Vec<String>>) {
    match by_count.get(&count) {
        Some(words) => println!("{}: {}", count, words.join(", ")),
        None => println!("No words with {} uses", count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Record, StreamKind};
    use tempfile::TempDir;

    fn downloaded_record(id: &str, user: &str) -> Record {
        Record {
            date: Some("20240101".to_string()),
            user: Some(user.to_string()),
            kind: StreamKind::Youtube,
            title: Some("T".to_string()),
            downloaded: true,
            id_path: id.to_string(),
        }
    }

    #[test]
    fn test_count_words_strips_cue_prefix_and_lowercases() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("vid1.txt"),
            " [00:00] Hello hello WORLD\n [00:05] hello again\n",
        )
        .unwrap();

        let catalog = Catalog::from_records(vec![downloaded_record("vid1", "A")]);
        let transcripts = TranscriptStore::new(temp.path());

        let counts = count_words(&catalog, &transcripts, "A").unwrap();
        assert_eq!(counts.get("hello"), Some(&3));
        assert_eq!(counts.get("world"), Some(&1));
        assert_eq!(counts.get("again"), Some(&1));
    }

    #[test]
    fn test_count_words_skips_sentinel_lines() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("vid1.txt"),
            format!("{}\n", crate::sync::NULL_TRANSCRIPT_SENTINEL),
        )
        .unwrap();

        let catalog = Catalog::from_records(vec![downloaded_record("vid1", "A")]);
        let transcripts = TranscriptStore::new(temp.path());

        let counts = count_words(&catalog, &transcripts, "A").unwrap();
        assert!(counts.is_empty());
    }

    #[test]
    fn test_count_words_filters_by_user_and_downloaded() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("vid1.txt"), " [00:00] mine\n").unwrap();
        std::fs::write(temp.path().join("vid2.txt"), " [00:00] theirs\n").unwrap();

        let mut not_downloaded = downloaded_record("vid3", "A");
        not_downloaded.downloaded = false;

        let catalog = Catalog::from_records(vec![
            downloaded_record("vid1", "A"),
            downloaded_record("vid2", "B"),
            not_downloaded,
        ]);
        let transcripts = TranscriptStore::new(temp.path());

        let counts = count_words(&catalog, &transcripts, "A").unwrap();
        assert_eq!(counts.get("mine"), Some(&1));
        assert_eq!(counts.get("theirs"), None);
    }

    #[test]
    fn test_invert_counts_groups_words() {
        let counts = HashMap::from([
            ("a".to_string(), 2u64),
            ("b".to_string(), 2),
            ("c".to_string(), 1),
        ]);

        let by_count = invert_counts(&counts);
        assert_eq!(by_count.get(&2).unwrap(), &vec!["a".to_string(), "b".to_string()]);
        assert_eq!(by_count.get(&1).unwrap(), &vec!["c".to_string()]);
    }
}
