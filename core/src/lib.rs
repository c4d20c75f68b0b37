//! On-disk inverted index files: writing, random-access reading, and
//! multi-file boolean queries.
//!
//! ```text
//! crawl ──▶ DocTable + MemIndex ──▶ writer ──▶ index file
//!                                                 │
//!                      IndexFileReader ◀──────────┘
//!                     ┌──────┴───────┐
//!             DocTableReader   WordTableReader ──▶ PostingsReader
//!                     └──────┬───────┘
//!                      QueryProcessor
//! ```

pub mod crawl;
pub mod error;
pub mod index;
pub mod index_file;
pub mod layout;
pub mod query;
pub mod reader;
pub mod table;
pub mod tokenizer;
pub mod writer;

pub use crawl::crawl_file_tree;
pub use error::{IndexError, Result};
pub use index::{DocId, DocTable, MemIndex, Position, WordPostings, INVALID_DOC_ID};
pub use index_file::IndexFileReader;
pub use query::{process_query, IndexReaders, QueryProcessor, QueryResult};
pub use reader::{DocHits, DocTableReader, HashTableReader, PostingsReader, WordTableReader};
pub use table::{hash_word, ChainedTable};
pub use writer::write_index;
