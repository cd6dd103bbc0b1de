//! Keyword search over the command help index.
//!
//! The index is read once at startup from a YAML mapping and never changes:
//!
//! ```yaml
//! othello start:
//!   description: start or join an othello match on the board
//!   usage: othello start
//! othello put:
//!   description: place a stone on the board
//!   usage: othello put <column><row>
//! ```
//!
//! Entries keep the order of the file. Search is plain case-sensitive
//! substring matching, see [`HelpIndex::search`].

use std::fmt;

use log::{debug, info};
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use thiserror::Error;
use tokio::fs;

/// One documented command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// Command name, unique in the index
    pub key: String,
    pub description: Option<String>,
    pub usage: Option<String>,
}

/// Errors raised while loading the help index.
#[derive(Debug, Error)]
pub enum HelpIndexError {
    #[error("unable to read help index {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed help index: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Immutable, ordered collection of [`HelpEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpIndex {
    entries: Vec<HelpEntry>,
}

#[derive(Deserialize, Default)]
struct HelpFields {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    usage: Option<String>,
}

impl HelpIndex {
    /// Reads and parses the help index at `path`.
    pub async fn load(path: &str) -> Result<Self, HelpIndexError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| HelpIndexError::Read {
                path: path.to_owned(),
                source,
            })?;

        let index = Self::parse(&content)?;
        info!("loaded {} help entries from {}", index.entries.len(), path);

        Ok(index)
    }

    /// Parses a YAML help index.
    ///
    /// An empty document yields an empty index. Duplicate keys are rejected.
    pub fn parse(content: &str) -> Result<Self, HelpIndexError> {
        if content.trim().is_empty() {
            return Ok(HelpIndex::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[HelpEntry] {
        &self.entries
    }

    /// Finds the entries related to `keywords`.
    ///
    /// An entry matches when its key contains the space-joined phrase, when the
    /// phrase contains the key, or when any single keyword appears in its
    /// description. Results keep the index order.
    pub fn search(&self, keywords: &[&str]) -> Vec<&HelpEntry> {
        let phrase = keywords.join(" ");
        debug!("searching help for \"{}\"", phrase);

        self.entries
            .iter()
            .filter(|entry| {
                if entry.key.contains(&phrase) || phrase.contains(&entry.key) {
                    return true;
                }
                let description = entry.description.as_deref().unwrap_or_default();
                keywords.iter().any(|keyword| description.contains(keyword))
            })
            .collect()
    }
}

impl<'de> Deserialize<'de> for HelpIndex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HelpIndexVisitor;

        impl<'de> Visitor<'de> for HelpIndexVisitor {
            type Value = HelpIndex;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping of command names to help entries")
            }

            fn visit_map<A>(self, mut map: A) -> Result<HelpIndex, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<HelpEntry> = Vec::new();

                while let Some((key, fields)) = map.next_entry::<String, Option<HelpFields>>()? {
                    if entries.iter().any(|entry| entry.key == key) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate help entry `{}`",
                            key
                        )));
                    }
                    let fields = fields.unwrap_or_default();
                    entries.push(HelpEntry {
                        key,
                        description: fields.description,
                        usage: fields.usage,
                    });
                }

                Ok(HelpIndex { entries })
            }
        }

        deserializer.deserialize_map(HelpIndexVisitor)
    }
}
