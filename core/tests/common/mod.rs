#![allow(dead_code)]

use filesearch_core::{crawl_file_tree, write_index, DocTable, MemIndex};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `(relative name, contents)` pairs under `dir`, crawl them, and
/// write the index to `dir/<idx_name>`. Returns the index path.
pub fn build_index_from(dir: &Path, docs: &[(&str, &str)], idx_name: &str) -> PathBuf {
    let corpus = dir.join(format!("{idx_name}.corpus"));
    fs::create_dir_all(&corpus).unwrap();
    for (name, text) in docs {
        let p = corpus.join(name);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(p, text).unwrap();
    }
    let (dt, mi) = crawl_file_tree(&corpus).unwrap();
    let out = dir.join(idx_name);
    write_index(&mi, &dt, &out).unwrap();
    out
}

pub fn doc_path(dir: &Path, idx_name: &str, name: &str) -> String {
    dir.join(format!("{idx_name}.corpus")).join(name).to_string_lossy().into_owned()
}

/// The two-document corpus: A = "apple banana apple", B = "banana cherry".
pub fn fruit_tables() -> (DocTable, MemIndex) {
    let mut dt = DocTable::new();
    let mut mi = MemIndex::new();
    let a = dt.add("A");
    let b = dt.add("B");
    mi.add_posting_list("apple", a, vec![0, 13]);
    mi.add_posting_list("banana", a, vec![6]);
    mi.add_posting_list("banana", b, vec![0]);
    mi.add_posting_list("cherry", b, vec![7]);
    (dt, mi)
}

pub fn terms(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
