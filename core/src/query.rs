//! Boolean-AND queries across a set of index files.
//!
//! A document matches when every query term occurs in it. Its rank is the
//! sum, over all terms, of the number of positions the term has in that
//! document. Results from all files are pooled and sorted by
//! (document name, rank).

use crate::error::Result;
use crate::index::DocId;
use crate::index_file::IndexFileReader;
use crate::reader::{DocTableReader, WordTableReader};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QueryResult {
    pub document_name: String,
    pub rank: u64,
}

/// The pair of readers a query needs for one index file.
#[derive(Debug, Clone)]
pub struct IndexReaders {
    pub path: PathBuf,
    pub doc_table: DocTableReader,
    pub words: WordTableReader,
}

impl IndexReaders {
    pub fn open(path: impl AsRef<Path>, validate: bool) -> Result<Self> {
        let file = IndexFileReader::open(path, validate)?;
        Ok(Self {
            path: file.path().to_path_buf(),
            doc_table: file.doc_table_reader()?,
            words: file.word_table_reader()?,
        })
    }

    /// Doc id -> accumulated rank for documents containing every term.
    fn matching_docs(&self, terms: &[String]) -> Result<HashMap<DocId, u64>> {
        let Some((first, rest)) = terms.split_first() else {
            return Ok(HashMap::new());
        };
        let Some(postings) = self.words.lookup_word(first)? else {
            return Ok(HashMap::new());
        };
        let mut ranks: HashMap<DocId, u64> = postings
            .doc_id_list()?
            .into_iter()
            .map(|h| (h.doc_id, u64::from(h.num_positions)))
            .collect();

        for term in rest {
            if ranks.is_empty() {
                break;
            }
            let Some(postings) = self.words.lookup_word(term)? else {
                return Ok(HashMap::new());
            };
            ranks = postings
                .doc_id_list()?
                .into_iter()
                .filter_map(|h| ranks.get(&h.doc_id).map(|r| (h.doc_id, r + u64::from(h.num_positions))))
                .collect();
        }
        Ok(ranks)
    }

    fn query(&self, terms: &[String]) -> Result<Vec<QueryResult>> {
        let mut out = Vec::new();
        for (doc_id, rank) in self.matching_docs(terms)? {
            match self.doc_table.lookup_doc_id(doc_id)? {
                Some(document_name) => out.push(QueryResult { document_name, rank }),
                None => tracing::debug!(doc_id, path = %self.path.display(), "doc id has no name; dropped"),
            }
        }
        Ok(out)
    }
}

/// A reusable set of opened index files.
///
/// Opening validates each file once; queries afterwards only read. The
/// processor is `Send + Sync`, so one instance can serve concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct QueryProcessor {
    indices: Vec<IndexReaders>,
}

impl QueryProcessor {
    /// Opens every path; files that fail to open are logged and left out.
    pub fn open<P: AsRef<Path>>(paths: &[P], validate: bool) -> Self {
        let indices = paths
            .iter()
            .filter_map(|p| match IndexReaders::open(p, validate) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(path = %p.as_ref().display(), error = %e, "skipping index file");
                    None
                }
            })
            .collect();
        Self { indices }
    }

    pub fn from_readers(indices: Vec<IndexReaders>) -> Self {
        Self { indices }
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[IndexReaders] {
        &self.indices
    }

    /// Runs `terms` (already lowercased) against every index file.
    ///
    /// A file that turns out to be inconsistent mid-query contributes
    /// nothing; the others are unaffected.
    pub fn process_query(&self, terms: &[String]) -> Vec<QueryResult> {
        debug_assert!(!terms.is_empty(), "query needs at least one term");
        let mut results = Vec::new();
        for readers in &self.indices {
            match readers.query(terms) {
                Ok(found) => results.extend(found),
                Err(e) => {
                    tracing::warn!(path = %readers.path.display(), error = %e, "index file failed during query");
                }
            }
        }
        results.sort();
        results
    }
}

/// One-shot query: open `paths` with checksum validation, run `terms`.
pub fn process_query<P: AsRef<Path>>(paths: &[P], terms: &[String]) -> Vec<QueryResult> {
    QueryProcessor::open(paths, true).process_query(terms)
}
