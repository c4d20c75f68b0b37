use filesearch_core::tokenizer::{parse_word_positions, tokenize};

#[test]
fn it_lowercases_and_records_byte_offsets() {
    let toks = tokenize("Running, RUN! x");
    assert_eq!(toks[0], ("running".to_string(), 0));
    assert_eq!(toks[1], ("run".to_string(), 9));
    assert_eq!(toks[2], ("x".to_string(), 14));
}

#[test]
fn it_groups_repeated_words() {
    let table = parse_word_positions("apple banana apple").unwrap();
    assert_eq!(table["apple"], vec![0, 13]);
    assert_eq!(table["banana"], vec![6]);
    assert_eq!(table.len(), 2);
}

#[test]
fn it_treats_punctuation_as_boundaries() {
    let table = parse_word_positions("don't stop-me").unwrap();
    let words: Vec<&str> = table.keys().map(String::as_str).collect();
    assert_eq!(words, vec!["don", "me", "stop", "t"]);
}
