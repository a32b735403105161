// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Word catalog categories.
//!
//! A category is a (topic, difficulty) pair written as `topic-difficulty`,
//! e.g. `business-advanced`. Strings are parsed once at the boundary; inside
//! the service only the typed form is passed around.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::WordcastError;

/// Subject area of a vocabulary list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Everyday,
    Business,
    Academic,
    Exam,
}

/// Difficulty band within a topic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A validated catalog category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category {
    pub topic: Topic,
    pub difficulty: Difficulty,
}

impl Category {
    pub fn new(topic: Topic, difficulty: Difficulty) -> Self {
        Self { topic, difficulty }
    }

    /// Every valid category, topic-major.
    pub fn all() -> Vec<Category> {
        Topic::iter()
            .flat_map(|topic| Difficulty::iter().map(move |d| Category::new(topic, d)))
            .collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.difficulty)
    }
}

impl FromStr for Category {
    type Err = WordcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let (topic, difficulty) = normalized.split_once('-').ok_or_else(|| {
            WordcastError::Validation(format!(
                "category `{s}` must be written as <topic>-<difficulty>"
            ))
        })?;
        let topic = Topic::from_str(topic)
            .map_err(|_| WordcastError::Validation(format!("unknown topic `{topic}` in `{s}`")))?;
        let difficulty = Difficulty::from_str(difficulty).map_err(|_| {
            WordcastError::Validation(format!("unknown difficulty `{difficulty}` in `{s}`"))
        })?;
        Ok(Category::new(topic, difficulty))
    }
}

impl TryFrom<String> for Category {
    type Error = WordcastError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_topic_and_difficulty() {
        let category: Category = "business-advanced".parse().unwrap();
        assert_eq!(category.topic, Topic::Business);
        assert_eq!(category.difficulty, Difficulty::Advanced);
        assert_eq!(category.to_string(), "business-advanced");
    }

    #[test]
    fn parsing_is_case_and_whitespace_tolerant() {
        let category: Category = "  Exam-Intermediate ".parse().unwrap();
        assert_eq!(category, Category::new(Topic::Exam, Difficulty::Intermediate));
    }

    #[test]
    fn rejects_unknown_parts() {
        assert!(matches!(
            "cooking-advanced".parse::<Category>(),
            Err(WordcastError::Validation(_))
        ));
        assert!(matches!(
            "business-expert".parse::<Category>(),
            Err(WordcastError::Validation(_))
        ));
        assert!("business".parse::<Category>().is_err());
    }

    #[test]
    fn all_lists_every_pair_once() {
        let all = Category::all();
        assert_eq!(all.len(), 12);
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn serde_uses_the_string_form() {
        let category = Category::new(Topic::Everyday, Difficulty::Beginner);
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, "\"everyday-beginner\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, category);
        assert!(serde_json::from_str::<Category>("\"nope\"").is_err());
    }
}
