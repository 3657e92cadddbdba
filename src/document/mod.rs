//! Document models
//!
//! The pipeline never looks inside a concrete container. Anything that can
//! list its text positions, read them and overwrite them implements
//! [`TextSource`] and can be translated. Two in-memory containers ship with
//! the crate:
//!
//! - [`WordDocument`]: body paragraphs, tables and section headers/footers
//! - [`SlideDeck`]: slides made of shapes, plus speaker notes
//!
//! Both are stored on disk as JSON.

pub mod slides;
pub mod word;

pub use slides::{Shape, Slide, SlideDeck};
pub use word::{Cell, Section, Table, WordDocument};

use crate::block::Address;
use crate::error::{LebabError, LebabResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors raised by a document when a position cannot be accessed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The address does not name a position of this document
    UnknownAddress(Address),
    /// The position exists but cannot be modified
    ///
    /// The bundled models never raise it. It is meant for custom
    /// [`TextSource`] implementations with locked positions (protected form
    /// fields, shared master slides), and the writer reports it per address.
    ReadOnly(Address),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::UnknownAddress(addr) => write!(f, "no text position at {}", addr),
            DocumentError::ReadOnly(addr) => write!(f, "position {} is read-only", addr),
        }
    }
}

impl std::error::Error for DocumentError {}

/// A source of addressable text positions
///
/// Implementations must return positions in document order and keep them
/// stable between the read pass and the write pass: an address handed out by
/// [`TextSource::positions`] must still resolve to the same slot when it is
/// written back.
pub trait TextSource {
    /// All text-bearing positions, in document order (whitespace-only ones included)
    fn positions(&self) -> Vec<Address>;

    /// Current text at `address`
    fn read(&self, address: &Address) -> Result<String, DocumentError>;

    /// Replace the text at `address`
    fn write(&mut self, address: &Address, text: &str) -> Result<(), DocumentError>;
}

/// Load a JSON-encoded document from disk
pub fn load_json<T: DeserializeOwned>(path: &Path) -> LebabResult<T> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| LebabError::Format(format!("{}: {}", path.display(), e)))
}

/// Save a document to disk as pretty-printed JSON
pub fn save_json<T: Serialize>(document: &T, path: &Path) -> LebabResult<()> {
    let data = serde_json::to_string_pretty(document)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Path of the translated copy: `report.json` → `report_fr.json`
pub fn output_path(input: &Path, target_locale: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{}_{}.{}", stem, target_locale, ext.to_string_lossy()),
        None => format!("{}_{}", stem, target_locale),
    };
    input.with_file_name(file_name)
}
