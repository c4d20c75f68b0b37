use crate::index::Position;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[A-Za-z]+").expect("valid regex");
}

/// Only plain ASCII text without NUL bytes is indexed.
fn is_indexable(text: &str) -> bool {
    text.bytes().all(|b| b != 0 && b.is_ascii())
}

/// Split text into lowercased alphabetic words, each paired with the byte
/// offset where it starts.
pub fn tokenize(text: &str) -> Vec<(String, Position)> {
    WORD.find_iter(text)
        .map(|m| (m.as_str().to_ascii_lowercase(), m.start() as Position))
        .collect()
}

/// Group a document's words with every position they occur at.
///
/// Returns `None` when the document is empty, is not plain ASCII, or
/// contains no words at all.
pub fn parse_word_positions(text: &str) -> Option<BTreeMap<String, Vec<Position>>> {
    if text.is_empty() || !is_indexable(text) {
        return None;
    }
    let mut table: BTreeMap<String, Vec<Position>> = BTreeMap::new();
    for (word, pos) in tokenize(text) {
        table.entry(word).or_default().push(pos);
    }
    if table.is_empty() {
        None
    } else {
        Some(table)
    }
}

/// Normalize a raw query line into lowercase whitespace-separated terms.
pub fn query_terms(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_lowercase).collect()
}
