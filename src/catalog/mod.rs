//! Named query catalogs.
//!
//! A catalog is an ordered list of `(name, sql)` entries. It is loaded either
//! from a `queries.sql` style file or from an in-process list such as the
//! built-in check queries.

pub mod builtin;

use crate::error::{ReportError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Line separating named blocks in a catalog file.
pub const BLOCK_DELIMITER: &str =
    "----------------------------------------------------------------";

/// Prefix of SQL comment lines, which are stripped from returned SQL.
const COMMENT_PREFIX: &str = "--";

/// A single named query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEntry {
    pub name: String,
    pub sql: String,
}

impl QueryEntry {
    /// Creates an entry, normalizing the SQL text.
    pub fn new(name: impl Into<String>, sql: &str) -> Self {
        Self {
            name: name.into(),
            sql: normalize_sql(sql),
        }
    }
}

/// Ordered mapping from query name to SQL text.
#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    source: String,
    entries: Vec<QueryEntry>,
}

impl QueryCatalog {
    /// Builds an in-memory catalog from `(name, sql)` pairs, keeping their order.
    ///
    /// When a name repeats, the first entry wins and later ones are ignored.
    pub fn from_pairs<'a>(
        source: impl Into<String>,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut catalog = Self {
            source: source.into(),
            entries: Vec::new(),
        };
        for (name, sql) in pairs {
            catalog.push(QueryEntry::new(name, sql));
        }
        catalog
    }

    /// Loads a file-backed catalog.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReportError::config(format!(
                "Failed to read query catalog {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self::parse(&path.display().to_string(), &text))
    }

    /// Parses catalog text made of delimiter-separated named blocks.
    ///
    /// A block is named by a `name: <identifier>` line, which may itself be an
    /// SQL comment (`-- name: daily_revenue`). Comment lines are dropped from
    /// the SQL. Blocks with no name or no SQL are skipped.
    pub fn parse(source: &str, text: &str) -> Self {
        let mut catalog = Self {
            source: source.to_string(),
            entries: Vec::new(),
        };

        for (index, block) in split_blocks(text).into_iter().enumerate() {
            let Some(name) = block_name(block) else {
                debug!("Skipping unnamed block #{index} in {source}");
                continue;
            };

            let sql = normalize_sql(block);
            if sql == ";" {
                debug!("Skipping block '{name}' in {source}: no SQL");
                continue;
            }

            catalog.push(QueryEntry { name, sql });
        }

        debug!("Loaded {} queries from {source}", catalog.len());
        catalog
    }

    fn push(&mut self, entry: QueryEntry) {
        if self.get(&entry.name).is_some() {
            warn!(
                "Duplicate query name '{}' in {}; keeping the first definition",
                entry.name, self.source
            );
            return;
        }
        self.entries.push(entry);
    }

    /// Returns the SQL for `name`.
    pub fn resolve(&self, name: &str) -> Result<&str> {
        self.get(name)
            .map(|entry| entry.sql.as_str())
            .ok_or_else(|| ReportError::query_not_found(name, &self.source))
    }

    /// Returns the entry for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&QueryEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Where the catalog came from (a file path or a label).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Entries in catalog order.
    pub fn entries(&self) -> &[QueryEntry] {
        &self.entries
    }

    /// Query names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries restricted to `only`, in catalog order. Empty `only` selects everything.
    pub fn select<S: AsRef<str>>(&self, only: &[S]) -> Vec<&QueryEntry> {
        if only.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries
            .iter()
            .filter(|entry| only.iter().any(|name| name.as_ref() == entry.name))
            .collect()
    }

    /// Names in `only` that the catalog does not contain.
    pub fn unknown_names<'a, S: AsRef<str>>(&self, only: &'a [S]) -> Vec<&'a str> {
        only.iter()
            .map(AsRef::as_ref)
            .filter(|name| self.get(name).is_none())
            .collect()
    }
}

/// Splits catalog text on delimiter lines.
fn split_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim_end() == BLOCK_DELIMITER {
            blocks.push(&text[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    blocks.push(&text[start..]);

    blocks
}

fn name_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^\s*(?:--\s*)?name:\s*([A-Za-z0-9_.\-]+)\s*$")
            .expect("name marker pattern is valid")
    })
}

/// Finds the `name:` marker of a block.
fn block_name(block: &str) -> Option<String> {
    block
        .lines()
        .find_map(|line| name_marker().captures(line))
        .map(|caps| caps[1].to_string())
}

/// Strips comment lines and marker lines, trims, and ensures a trailing `;`.
fn normalize_sql(sql: &str) -> String {
    let cleaned = sql
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with(COMMENT_PREFIX) && !name_marker().is_match(line)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = cleaned.trim();

    if cleaned.ends_with(';') {
        cleaned.to_string()
    } else {
        format!("{cleaned};")
    }
}
