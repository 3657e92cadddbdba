//! Block extraction
//!
//! Walks a [`TextSource`] in document order and yields one [`Block`] per
//! position whose trimmed text is non-empty. Extraction is lazy (positions
//! are read as the iterator advances), never mutates the document, and can
//! be restarted simply by calling [`extract`] again.

use crate::block::{Address, Block};
use crate::document::TextSource;
use crate::error::{LebabError, LebabResult};

/// Lazy iterator over the blocks of a document
pub struct Extractor<'a, D: TextSource + ?Sized> {
    document: &'a D,
    positions: std::vec::IntoIter<Address>,
}

impl<'a, D: TextSource + ?Sized> Iterator for Extractor<'a, D> {
    type Item = LebabResult<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        for address in self.positions.by_ref() {
            let text = match self.document.read(&address) {
                Ok(text) => text,
                Err(e) => return Some(Err(LebabError::Extraction(e.to_string()))),
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Some(Ok(Block::new(address, trimmed)));
        }
        None
    }
}

/// Start a new extraction pass over `document`
pub fn extract<D: TextSource + ?Sized>(document: &D) -> Extractor<'_, D> {
    Extractor {
        document,
        positions: document.positions().into_iter(),
    }
}

/// Extract all blocks, failing on the first unreadable position
pub fn extract_blocks<D: TextSource + ?Sized>(document: &D) -> LebabResult<Vec<Block>> {
    extract(document).collect()
}
