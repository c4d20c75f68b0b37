use criterion::{criterion_group, criterion_main, Criterion};
use filesearch_core::{write_index, DocTable, MemIndex, QueryProcessor};
use tempfile::tempdir;

const WORDS: &[&str] = &["alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta"];

fn synthetic_tables(num_docs: u32) -> (DocTable, MemIndex) {
    let mut dt = DocTable::new();
    let mut mi = MemIndex::new();
    for d in 0..num_docs {
        let id = dt.add(&format!("/corpus/doc{d:05}.txt"));
        for (i, w) in WORDS.iter().enumerate() {
            if (d as usize + i) % 3 != 0 {
                let positions = (0..(i as u32 + 1)).map(|p| p * 16 + d).collect();
                mi.add_posting_list(w, id, positions);
            }
        }
    }
    (dt, mi)
}

fn bench_query(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.idx");
    let (dt, mi) = synthetic_tables(2_000);
    write_index(&mi, &dt, &path).unwrap();
    let qp = QueryProcessor::open(&[&path], true);
    let terms: Vec<String> = vec!["beta".into(), "gamma".into()];

    c.bench_function("two_term_query_2k_docs", |b| b.iter(|| qp.process_query(&terms)));
    c.bench_function("open_with_checksum", |b| b.iter(|| QueryProcessor::open(&[&path], true)));
}

criterion_group!(benches, bench_query);
criterion_main!(benches);
