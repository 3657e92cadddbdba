//! Addressable text units
//!
//! A [`Block`] is one non-empty piece of text pulled out of a document,
//! tagged with the [`Address`] of the position it came from. Blocks are
//! created fresh for each run and carry no state beyond it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a text position inside a document
///
/// Addresses are built from `(label, index)` segments, e.g.
/// `table[0]/row[2]/cell[1]/p[0]`. The pipeline treats them as opaque and only
/// compares them for equality; the document that issued an address is the
/// only party that interprets its segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Build an address from `(label, index)` path segments
    ///
    /// ```ignore
    /// let addr = Address::from_path(&[("table", 0), ("row", 1), ("cell", 2), ("p", 0)]);
    /// assert_eq!(addr.as_str(), "table[0]/row[1]/cell[2]/p[0]");
    /// ```
    pub fn from_path(segments: &[(&str, usize)]) -> Self {
        let path = segments
            .iter()
            .map(|(label, index)| format!("{}[{}]", label, index))
            .collect::<Vec<_>>()
            .join("/");
        Address(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the address back into `(label, index)` segments
    ///
    /// Returns `None` when the address was not produced by [`Address::from_path`]
    /// (for instance an address echoed back by an oracle with a typo).
    pub fn segments(&self) -> Option<Vec<(&str, usize)>> {
        self.0
            .split('/')
            .map(|segment| {
                let (label, rest) = segment.split_once('[')?;
                let index = rest.strip_suffix(']')?.parse().ok()?;
                Some((label, index))
            })
            .collect()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Address(value.to_string())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Address(value)
    }
}

/// One addressable, non-empty text unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Where the text lives in the document; assigned at extraction time
    pub address: Address,

    /// Original text, trimmed and never empty
    pub source_text: String,

    /// Translation assigned by the reconciler (absent until then)
    pub translated_text: Option<String>,
}

impl Block {
    pub fn new(address: Address, source_text: impl Into<String>) -> Self {
        Self {
            address,
            source_text: source_text.into(),
            translated_text: None,
        }
    }

    /// Size of the block as counted against the chunk budget (characters)
    pub fn size(&self) -> usize {
        self.source_text.chars().count()
    }

    pub fn is_translated(&self) -> bool {
        self.translated_text.is_some()
    }

    /// Text the writer should put back: the translation if one was assigned,
    /// the original otherwise
    pub fn resolved_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.source_text)
    }

    pub(crate) fn assign(&mut self, text: String) {
        self.translated_text = Some(text);
    }

    /// Mark the block as untranslated by copying the source text over
    pub(crate) fn fall_back(&mut self) {
        self.translated_text = Some(self.source_text.clone());
    }
}
