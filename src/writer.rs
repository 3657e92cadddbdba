//! Write-back of translated blocks
//!
//! Each block is written exactly once, at its address, with its translation
//! or (when it has none) its source text. The whitespace that extraction
//! trimmed off the original position is put back around the new text.
//! Failures are collected per address; positions already written are not
//! rolled back.

use crate::block::{Address, Block};
use crate::document::TextSource;
use std::fmt;
use tracing::error;

/// A block that could not be written back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub address: Address,
    pub reason: String,
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.address, self.reason)
    }
}

/// Apply `blocks` to `document`, in order
pub fn write_blocks<D: TextSource + ?Sized>(document: &mut D, blocks: &[Block]) -> Vec<WriteFailure> {
    let mut failures = Vec::new();

    for block in blocks {
        let result = document
            .read(&block.address)
            .map(|current| with_padding_of(&current, block.resolved_text()))
            .and_then(|text| document.write(&block.address, &text));

        if let Err(e) = result {
            error!(address = %block.address, error = %e, "failed to write block");
            failures.push(WriteFailure {
                address: block.address.clone(),
                reason: e.to_string(),
            });
        }
    }

    failures
}

/// Surround `text` with the leading and trailing whitespace of `original`
fn with_padding_of(original: &str, text: &str) -> String {
    let leading = &original[..original.len() - original.trim_start().len()];
    let trailing = &original[original.trim_end().len()..];
    if leading.len() == original.len() {
        // whitespace-only original: no meaningful padding to restore
        return text.to_string();
    }
    format!("{}{}{}", leading, text, trailing)
}
