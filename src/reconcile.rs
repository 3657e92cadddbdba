//! Response reconciliation
//!
//! Maps an oracle answer back onto the blocks of the chunk that produced it.
//! The answer is untrusted: it may have too few or too many items, drop the
//! addresses, wrap itself in a Markdown fence or not be JSON at all. Whatever
//! happens, every block leaves this module with `translated_text` set, either
//! to the oracle's text or to its own source text, and anything unexpected is
//! reported as an [`Anomaly`] instead of an error.
//!
//! Assignment rules, in order:
//!
//! 1. Every item echoes a distinct address belonging to the chunk: assign by
//!    address. Blocks nobody answered for keep their source text.
//! 2. Otherwise (an address missing, unknown or repeated) assign by position
//!    over the overlapping prefix. Blocks beyond the response keep their source
//!    text and extra items are discarded.
//! 3. Unparseable response: every block keeps its source text and the chunk is
//!    reported as an error.
//!
//! In the first two cases a count mismatch is reported as a warning.

use crate::block::{Address, Block};
use crate::chunk::Chunk;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use tracing::{error, warn};

/// How bad an anomaly is for the chunk it was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Part of the chunk drifted; the rest is translated
    Warning,
    /// The whole chunk stayed untranslated
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnomalyKind {
    /// The response had a different number of items than the request
    CountMismatch { expected: usize, received: usize },
    /// The response could not be decoded
    Unparseable { reason: String },
    /// The oracle returned blank text for a block
    BlankTranslation { address: Address },
    /// The oracle call itself failed and the chunk was degraded by policy
    TransportFailure { reason: String },
}

/// Structured report of something that went wrong inside one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub chunk: usize,
    pub kind: AnomalyKind,
    pub severity: Severity,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            AnomalyKind::CountMismatch { expected, received } => write!(
                f,
                "chunk {}: expected {} items, oracle returned {}",
                self.chunk, expected, received
            ),
            AnomalyKind::Unparseable { reason } => write!(
                f,
                "chunk {}: unparseable response, kept source text ({})",
                self.chunk, reason
            ),
            AnomalyKind::BlankTranslation { address } => write!(
                f,
                "chunk {}: blank translation for {}, kept source text",
                self.chunk, address
            ),
            AnomalyKind::TransportFailure { reason } => write!(
                f,
                "chunk {}: oracle call failed, kept source text ({})",
                self.chunk, reason
            ),
        }
    }
}

/// Blocks of one chunk after reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub chunk: usize,
    /// Same blocks, same order, all with `translated_text` set
    pub blocks: Vec<Block>,
    /// Number of blocks whose text came from the oracle
    pub translated: usize,
    pub anomalies: Vec<Anomaly>,
}

/// One decoded item of an oracle response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseItem {
    pub address: Option<Address>,
    pub text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    Plain(String),
    Record {
        #[serde(default)]
        address: Option<Address>,
        #[serde(alias = "translated_text", alias = "translation")]
        text: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawResponse {
    List(Vec<RawItem>),
    Wrapped {
        #[serde(alias = "items", alias = "translations", alias = "paragraphs")]
        blocks: Vec<RawItem>,
    },
}

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\s*```\s*$").expect("valid regex")
});

/// Decode a raw oracle response into ordered items
///
/// Accepts a JSON array of `{address?, text}` objects or of plain strings,
/// optionally wrapped in an object under `blocks`, `items`, `translations`
/// or `paragraphs`, optionally inside a Markdown code fence.
pub fn parse_response(raw: &str) -> Result<Vec<ResponseItem>, String> {
    let body = match CODE_FENCE.captures(raw) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => raw.trim(),
    };

    let parsed: RawResponse = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let items = match parsed {
        RawResponse::List(items) => items,
        RawResponse::Wrapped { blocks } => blocks,
    };

    Ok(items
        .into_iter()
        .map(|item| match item {
            RawItem::Plain(text) => ResponseItem {
                address: None,
                text,
            },
            RawItem::Record { address, text } => ResponseItem { address, text },
        })
        .collect())
}

/// Reconcile a raw oracle response with the chunk it answers
pub fn reconcile(chunk: Chunk, raw: &str) -> Reconciled {
    match parse_response(raw) {
        Ok(items) => assign(chunk, items),
        Err(reason) => {
            error!(chunk = chunk.index, %reason, "unparseable oracle response, chunk left untranslated");
            degrade(chunk, AnomalyKind::Unparseable { reason })
        }
    }
}

/// Degrade a whole chunk to its source text after a failed oracle call
pub fn fallback(chunk: Chunk, reason: &str) -> Reconciled {
    error!(chunk = chunk.index, %reason, "oracle call failed, chunk left untranslated");
    degrade(
        chunk,
        AnomalyKind::TransportFailure {
            reason: reason.to_string(),
        },
    )
}

fn degrade(chunk: Chunk, kind: AnomalyKind) -> Reconciled {
    let index = chunk.index;
    let mut blocks = chunk.blocks;
    for block in &mut blocks {
        block.fall_back();
    }
    Reconciled {
        chunk: index,
        blocks,
        translated: 0,
        anomalies: vec![Anomaly {
            chunk: index,
            kind,
            severity: Severity::Error,
        }],
    }
}

/// True when every item names a distinct block of the chunk
fn addresses_usable(blocks: &[Block], items: &[ResponseItem]) -> bool {
    let expected: HashSet<&Address> = blocks.iter().map(|b| &b.address).collect();
    let mut seen = HashSet::new();
    items.iter().all(|item| match &item.address {
        Some(addr) => expected.contains(addr) && seen.insert(addr),
        None => false,
    })
}

fn assign(chunk: Chunk, items: Vec<ResponseItem>) -> Reconciled {
    let index = chunk.index;
    let mut blocks = chunk.blocks;
    let mut anomalies = Vec::new();

    if items.len() != blocks.len() {
        warn!(
            chunk = index,
            expected = blocks.len(),
            received = items.len(),
            "oracle returned a different number of items"
        );
        anomalies.push(Anomaly {
            chunk: index,
            kind: AnomalyKind::CountMismatch {
                expected: blocks.len(),
                received: items.len(),
            },
            severity: Severity::Warning,
        });
    }

    let texts: Vec<Option<String>> = if addresses_usable(&blocks, &items) {
        let mut by_address: HashMap<Address, String> = items
            .into_iter()
            .filter_map(|item| item.address.map(|addr| (addr, item.text)))
            .collect();
        blocks
            .iter()
            .map(|b| by_address.remove(&b.address))
            .collect()
    } else {
        let mut items = items.into_iter();
        blocks
            .iter()
            .map(|_| items.next().map(|item| item.text))
            .collect()
    };

    let mut translated = 0;
    for (block, text) in blocks.iter_mut().zip(texts) {
        match text {
            Some(text) if !text.trim().is_empty() => {
                block.assign(text);
                translated += 1;
            }
            Some(_) => {
                warn!(chunk = index, address = %block.address, "blank translation, keeping source text");
                anomalies.push(Anomaly {
                    chunk: index,
                    kind: AnomalyKind::BlankTranslation {
                        address: block.address.clone(),
                    },
                    severity: Severity::Warning,
                });
                block.fall_back();
            }
            None => block.fall_back(),
        }
    }

    Reconciled {
        chunk: index,
        blocks,
        translated,
        anomalies,
    }
}
