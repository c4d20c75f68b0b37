use crate::error::{IndexError, Result};
use crate::index::{DocTable, MemIndex};
use crate::tokenizer::parse_word_positions;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Walk `root` recursively and build a document table plus inverted index
/// from every readable plain-text file beneath it.
///
/// Directory entries are visited in file-name order so the same tree always
/// yields the same doc ids. Files that can't be read or aren't ASCII text
/// are skipped.
pub fn crawl_file_tree(root: &Path) -> Result<(DocTable, MemIndex)> {
    if !fs::metadata(root)?.is_dir() {
        return Err(IndexError::NotADirectory(root.to_path_buf()));
    }

    let mut doc_table = DocTable::new();
    let mut index = MemIndex::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(root).sort_by_file_name().into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Ok(contents) = fs::read_to_string(path) else {
            skipped += 1;
            continue;
        };
        let Some(words) = parse_word_positions(&contents) else {
            skipped += 1;
            continue;
        };

        let doc_id = doc_table.add(&path.to_string_lossy());
        for (word, positions) in words {
            index.add_posting_list(&word, doc_id, positions);
        }
    }

    tracing::info!(
        root = %root.display(),
        docs = doc_table.len(),
        words = index.num_words(),
        skipped,
        "crawled file tree"
    );
    Ok((doc_table, index))
}
