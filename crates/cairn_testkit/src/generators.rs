//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;

/// Strategy for generating valid path segments.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_][a-zA-Z0-9_-]{0,11}").expect("Invalid regex")
}

/// Strategy for generating root-relative file paths, one to three levels deep.
pub fn relative_path_strategy() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(segment_strategy(), 0..3),
        segment_strategy(),
        prop::sample::select(vec!["txt", "md", "bin", "json"]),
    )
        .prop_map(|(dirs, stem, ext)| {
            let mut parts = dirs;
            parts.push(format!("{stem}.{ext}"));
            parts.join("/")
        })
}

/// Strategy for generating file contents.
pub fn contents_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..2048)
}

/// Strategy for generating a small tree of distinct files.
///
/// No path is a prefix directory of another, so every entry can be
/// written as a regular file.
pub fn file_tree_strategy(max_files: usize) -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    prop::collection::btree_map(relative_path_strategy(), contents_strategy(), 1..=max_files.max(1))
        .prop_map(|files| {
            let mut kept: Vec<(String, Vec<u8>)> = Vec::new();
            for (path, contents) in files {
                let clashes = kept.iter().any(|(other, _)| {
                    path.starts_with(&format!("{other}/")) || other.starts_with(&format!("{path}/"))
                });
                if !clashes {
                    kept.push((path, contents));
                }
            }
            kept
        })
}

/// Strategy for generating passphrases.
pub fn passphrase_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{1,40}").expect("Invalid regex")
}
