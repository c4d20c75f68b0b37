use crate::table::{hash_word, ChainedTable};
use std::collections::HashMap;

pub type DocId = u64;
pub type Position = u32;

/// Reserved: never assigned to a document.
pub const INVALID_DOC_ID: DocId = 0;

/// Bidirectional document id <-> name mapping. Ids are handed out
/// sequentially from 1.
#[derive(Debug, Clone)]
pub struct DocTable {
    id_to_name: ChainedTable<String>,
    name_to_id: HashMap<String, DocId>,
    next_id: DocId,
}

impl Default for DocTable {
    fn default() -> Self {
        Self { id_to_name: ChainedTable::new(), name_to_id: HashMap::new(), next_id: 1 }
    }
}

impl DocTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, returning its id. A name already present keeps its id.
    pub fn add(&mut self, name: &str) -> DocId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.id_to_name.insert(id, name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    pub fn doc_id(&self, name: &str) -> Option<DocId> {
        self.name_to_id.get(name).copied()
    }

    pub fn doc_name(&self, id: DocId) -> Option<&str> {
        debug_assert_ne!(id, INVALID_DOC_ID);
        self.id_to_name.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    /// The id -> name table, keyed by the doc id itself. This is what gets
    /// serialized.
    pub fn id_to_name(&self) -> &ChainedTable<String> {
        &self.id_to_name
    }
}

/// All postings of one word: doc id -> positions of the word in that doc.
#[derive(Debug, Clone)]
pub struct WordPostings {
    pub word: String,
    pub postings: ChainedTable<Vec<Position>>,
}

/// In-memory inverted index, keyed by the FNV-1a hash of each word.
#[derive(Debug, Clone, Default)]
pub struct MemIndex {
    words: ChainedTable<WordPostings>,
}

impl MemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `word` occurs in `doc_id` at `positions`. Replaces any
    /// positions previously recorded for the same (word, doc) pair.
    pub fn add_posting_list(&mut self, word: &str, doc_id: DocId, positions: Vec<Position>) {
        debug_assert_ne!(doc_id, INVALID_DOC_ID);
        let key = hash_word(word);
        match self.words.get_mut(key) {
            Some(wp) => {
                // Two distinct words sharing a 64-bit hash is a defect we
                // can't represent in the on-disk format either.
                debug_assert_eq!(wp.word, word, "FNV collision");
                wp.postings.insert(doc_id, positions);
            }
            None => {
                let mut postings = ChainedTable::new();
                postings.insert(doc_id, positions);
                self.words.insert(key, WordPostings { word: word.to_string(), postings });
            }
        }
    }

    pub fn lookup(&self, word: &str) -> Option<&WordPostings> {
        self.words.get(hash_word(word)).filter(|wp| wp.word == word)
    }

    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    pub fn words(&self) -> &ChainedTable<WordPostings> {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_start_at_one_and_are_stable() {
        let mut dt = DocTable::new();
        assert_eq!(dt.add("a.txt"), 1);
        assert_eq!(dt.add("b.txt"), 2);
        assert_eq!(dt.add("a.txt"), 1);
        assert_eq!(dt.len(), 2);
        assert_eq!(dt.doc_name(2), Some("b.txt"));
        assert_eq!(dt.doc_id("c.txt"), None);
    }

    #[test]
    fn mem_index_groups_postings_by_word() {
        let mut mi = MemIndex::new();
        mi.add_posting_list("apple", 1, vec![0, 13]);
        mi.add_posting_list("apple", 2, vec![4]);
        mi.add_posting_list("pear", 2, vec![9]);
        assert_eq!(mi.num_words(), 2);
        let apple = mi.lookup("apple").unwrap();
        assert_eq!(apple.postings.get(1), Some(&vec![0, 13]));
        assert_eq!(apple.postings.len(), 2);
        assert!(mi.lookup("plum").is_none());
    }
}
