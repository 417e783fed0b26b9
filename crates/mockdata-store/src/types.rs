//! Document model for the mockd data store.
//!
//! The document is a generic JSON tree. Two optional sub-schemas are layered
//! on top of it: the record table under [`RECORD_TABLE`], and index entries
//! (any other top-level key shaped as an [`IndexEntry`]).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// The whole in-memory document: top-level key → JSON value.
pub type Document = Map<String, Value>;

/// Top-level key holding the record table.
pub const RECORD_TABLE: &str = "all_data";

/// Page size reported for an unresolvable index lookup.
pub const DEFAULT_PER_PAGE_COUNT: u64 = 10;

// ── Index entries ──────────────────────────────────────────────────

/// A named view over a subset of the record table.
///
/// Borrowed out of the document after the shape check succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry<'a> {
    pub cards: Vec<&'a str>,
    pub total_count: &'a Number,
    pub per_page_count: &'a Number,
}

impl<'a> IndexEntry<'a> {
    /// Match `value` against `{cards: [string], total_count: n, per_page_count: n}`.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        let Value::Object(entry) = value else {
            return None;
        };
        let Some(Value::Array(ids)) = entry.get("cards") else {
            return None;
        };
        let cards = ids.iter().map(Value::as_str).collect::<Option<Vec<_>>>()?;
        Some(Self {
            cards,
            total_count: count_field(entry, "total_count")?,
            per_page_count: count_field(entry, "per_page_count")?,
        })
    }
}

/// Numeric field, copied through as written.
fn count_field<'a>(entry: &'a Map<String, Value>, name: &str) -> Option<&'a Number> {
    match entry.get(name)? {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

/// Materialized result of joining an index entry against the record table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PathView {
    /// Resolved records, `null` where the id is missing from the table.
    pub cards: Vec<Value>,
    pub total_count: Number,
    pub per_page_count: Number,
}

impl PathView {
    /// The page served when an index lookup cannot be resolved.
    pub fn empty() -> Self {
        Self {
            cards: Vec::new(),
            total_count: Number::from(0u64),
            per_page_count: Number::from(DEFAULT_PER_PAGE_COUNT),
        }
    }
}

// ── Bootstrap compression ──────────────────────────────────────────

/// How the bootstrap source is framed on disk.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Detect a zstd frame by its magic number, else read plain JSON.
    #[default]
    Auto,
    Zstd,
    None,
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "zstd" | "zst" => Ok(Self::Zstd),
            "none" | "plain" => Ok(Self::None),
            other => Err(format!("unknown compression '{other}' (expected auto, zstd, none)")),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Zstd => "zstd",
            Self::None => "none",
        };
        f.write_str(s)
    }
}
