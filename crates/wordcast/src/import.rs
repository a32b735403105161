// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wordcast import-words` command implementation.
//!
//! Reads a CSV with a header row:
//!
//! ```text
//! id,word,definition,example,category,part_of_speech,memory_hook,pronunciation
//! ```
//!
//! `id`, `memory_hook`, and `pronunciation` may be empty. Rows are appended to
//! the catalog in file order, which is also delivery order. Re-importing a
//! file updates words in place without changing their position.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use wordcast_core::types::VocabularyWord;
use wordcast_core::{Category, StorageAdapter, WordcastError};

#[derive(Debug, Deserialize)]
struct WordRow {
    #[serde(default)]
    id: Option<String>,
    word: String,
    definition: String,
    #[serde(default)]
    example: String,
    category: String,
    #[serde(default)]
    part_of_speech: String,
    #[serde(default)]
    memory_hook: Option<String>,
    #[serde(default)]
    pronunciation: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl WordRow {
    fn into_word(self, line: u64) -> Result<VocabularyWord, WordcastError> {
        let invalid = |what: &str| WordcastError::Validation(format!("line {line}: {what}"));

        let word = self.word.trim().to_string();
        if word.is_empty() {
            return Err(invalid("word is empty"));
        }
        let definition = self.definition.trim().to_string();
        if definition.is_empty() {
            return Err(invalid("definition is empty"));
        }
        let category: Category = self
            .category
            .trim()
            .parse()
            .map_err(|e: WordcastError| invalid(&e.to_string()))?;
        let id = non_empty(self.id)
            .unwrap_or_else(|| format!("{category}-{}", word.to_lowercase().replace(' ', "-")));

        Ok(VocabularyWord {
            id,
            word,
            definition,
            example: self.example.trim().to_string(),
            category,
            part_of_speech: self.part_of_speech.trim().to_string(),
            memory_hook: non_empty(self.memory_hook),
            pronunciation: non_empty(self.pronunciation),
        })
    }
}

/// Parse every row first so a bad file writes nothing.
pub fn parse_words<R: Read>(reader: R) -> Result<Vec<VocabularyWord>, WordcastError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let mut words = Vec::new();
    for record in csv.deserialize::<WordRow>() {
        let row = record.map_err(|e| WordcastError::Validation(format!("invalid CSV: {e}")))?;
        // Header is line 1.
        let line = words.len() as u64 + 2;
        words.push(row.into_word(line)?);
    }
    Ok(words)
}

/// Import `words` into the catalog, returning how many were written.
pub async fn import_words(
    storage: &dyn StorageAdapter,
    words: &[VocabularyWord],
) -> Result<usize, WordcastError> {
    for word in words {
        storage.upsert_word(word).await?;
    }
    info!(count = words.len(), "words imported");
    Ok(words.len())
}

/// Runs the `wordcast import-words` command.
pub async fn run_import(storage: &dyn StorageAdapter, path: &Path) -> Result<(), WordcastError> {
    let file = std::fs::File::open(path).map_err(|e| {
        WordcastError::Validation(format!("cannot open {}: {e}", path.display()))
    })?;
    let words = parse_words(file)?;
    let count = import_words(storage, &words).await?;
    println!("imported {count} words from {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,word,definition,example,category,part_of_speech,memory_hook,pronunciation
b-001,candor,the quality of being open and honest,She spoke with candor.,business-advanced,noun,CANDid = honest,/ˈkændər/
,leverage,use to maximum advantage,We can leverage our data.,business-advanced,verb,,
";

    #[test]
    fn parses_rows_in_file_order() {
        let words = parse_words(CSV.as_bytes()).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].id, "b-001");
        assert_eq!(words[0].memory_hook.as_deref(), Some("CANDid = honest"));
        assert_eq!(words[1].word, "leverage");
        assert!(words[1].memory_hook.is_none());
        assert!(words[1].pronunciation.is_none());
    }

    #[test]
    fn missing_id_is_derived_from_category_and_word() {
        let words = parse_words(CSV.as_bytes()).unwrap();
        assert_eq!(words[1].id, "business-advanced-leverage");
    }

    #[test]
    fn bad_category_reports_line() {
        let csv = "\
word,definition,category
alpha,first,business-advanced
beta,second,cooking-expert
";
        let err = parse_words(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"), "got: {err}");
    }

    #[test]
    fn empty_definition_is_rejected() {
        let csv = "word,definition,category\nalpha,,exam-beginner\n";
        assert!(matches!(
            parse_words(csv.as_bytes()),
            Err(WordcastError::Validation(_))
        ));
    }
}
