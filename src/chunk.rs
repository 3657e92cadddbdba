//! Chunk planning
//!
//! Groups an ordered block stream into contiguous, size-bounded chunks.
//! Blocks are never split or reordered: a block that does not fit closes the
//! current chunk and opens the next one, and a block that alone exceeds the
//! budget travels in a chunk of its own.

use crate::block::Block;
use crate::error::{LebabError, LebabResult};

/// An ordered, non-empty group of blocks sent to the oracle in one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk within the run (zero-based)
    pub index: usize,
    pub blocks: Vec<Block>,
    size: usize,
}

impl Chunk {
    /// Budgeted size: block characters plus separator overhead between blocks
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Splits block sequences into chunks no larger than `max_chunk_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlanner {
    max_chunk_size: usize,
    separator_overhead: usize,
}

impl ChunkPlanner {
    pub fn new(max_chunk_size: usize) -> LebabResult<Self> {
        if max_chunk_size == 0 {
            return Err(LebabError::Config(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_chunk_size,
            separator_overhead: 0,
        })
    }

    /// Characters charged for every block after the first in a chunk
    pub fn with_separator_overhead(mut self, overhead: usize) -> Self {
        self.separator_overhead = overhead;
        self
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Lazily plan chunks over `blocks`
    pub fn chunks<I>(&self, blocks: I) -> Chunks<I::IntoIter>
    where
        I: IntoIterator<Item = Block>,
    {
        Chunks {
            blocks: blocks.into_iter(),
            pending: None,
            next_index: 0,
            max_chunk_size: self.max_chunk_size,
            separator_overhead: self.separator_overhead,
        }
    }

    pub fn plan<I>(&self, blocks: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = Block>,
    {
        self.chunks(blocks).collect()
    }
}

/// Iterator returned by [`ChunkPlanner::chunks`]
pub struct Chunks<I> {
    blocks: I,
    // block that overflowed the previous chunk and opens the next one
    pending: Option<Block>,
    next_index: usize,
    max_chunk_size: usize,
    separator_overhead: usize,
}

impl<I: Iterator<Item = Block>> Iterator for Chunks<I> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let first = self.pending.take().or_else(|| self.blocks.next())?;
        let mut size = first.size();
        let mut blocks = vec![first];

        for block in self.blocks.by_ref() {
            let grown = size + self.separator_overhead + block.size();
            if grown > self.max_chunk_size {
                self.pending = Some(block);
                break;
            }
            size = grown;
            blocks.push(block);
        }

        let chunk = Chunk {
            index: self.next_index,
            blocks,
            size,
        };
        self.next_index += 1;
        Some(chunk)
    }
}
