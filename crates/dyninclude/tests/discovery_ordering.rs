use std::fs;
use std::path::{Path, PathBuf};

use dyninclude::{filter_current_file, find_files, load_sort_config, sort_files};

fn touch(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn find_and_sort(dir: &Path, current: &str, glob: &str, suffixes: &[&str]) -> Vec<String> {
    let suffixes: Vec<String> = suffixes.iter().map(|s| s.to_string()).collect();
    let found = find_files(dir, glob, &suffixes).unwrap();
    let filtered = filter_current_file(found, &dir.join(current));
    let mut messages = Vec::new();
    let sorted = sort_files(
        &mut |m| messages.push(m),
        filtered,
        &suffixes,
        load_sort_config,
    );
    assert!(messages.is_empty(), "unexpected advisories: {messages:?}");
    sorted
        .iter()
        .map(|p| dyninclude::paths::relative_key(dir, p))
        .collect()
}

#[test]
fn plain_directory_sorts_index_first() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    touch(&dir.join("pages/index.adoc"), "= Index\n");
    touch(&dir.join("pages/page1.adoc"), "== One\n");
    touch(&dir.join("pages/page2.adoc"), "== Two\n");
    touch(&dir.join("publish/publish.adoc"), "== Publish\n");
    touch(&dir.join("publish/sub/main.adoc"), "== Main\n");

    assert_eq!(
        find_and_sort(&dir, "index.adoc", "pages/*.adoc", &[]),
        vec!["pages/index.adoc", "pages/page1.adoc", "pages/page2.adoc"]
    );
    assert_eq!(
        find_and_sort(&dir, "index.adoc", "**/*.adoc", &[]),
        vec![
            "pages/index.adoc",
            "pages/page1.adoc",
            "pages/page2.adoc",
            "publish/publish.adoc",
            "publish/sub/main.adoc"
        ]
    );
    assert_eq!(
        find_and_sort(&dir.join("pages"), "test.adoc", "*.adoc", &[]),
        vec!["index.adoc", "page1.adoc", "page2.adoc"]
    );
    assert_eq!(
        find_and_sort(&dir, "index.adoc", "pages/page*.adoc", &[]),
        vec!["pages/page1.adoc", "pages/page2.adoc"]
    );
}

#[test]
fn explicit_page_order_from_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    touch(&dir.join("cnt/index.adoc"), "= Index\n");
    touch(&dir.join("cnt/lorem.adoc"), "== Lorem\n");
    touch(&dir.join("cnt/ipsum.adoc"), "== Ipsum\n");
    touch(&dir.join("cnt/dolor.adoc"), "== Dolor\n");
    touch(
        &dir.join("cnt/pages.yaml"),
        "order:\n  - lorem\n  - ipsum\n  - dolor\n",
    );

    assert_eq!(
        find_and_sort(&dir, "index.adoc", "cnt/*.adoc", &[]),
        vec![
            "cnt/index.adoc",
            "cnt/lorem.adoc",
            "cnt/ipsum.adoc",
            "cnt/dolor.adoc"
        ]
    );
}

#[test]
fn suffix_priority_follows_list_order() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    touch(&dir.join("pages/index.adoc"), "= Index\n");
    touch(&dir.join("pages/page1.adoc"), "== One\n");
    touch(&dir.join("pages/page1.internal.adoc"), "== One internal\n");
    touch(&dir.join("pages/page1.advanced.adoc"), "== One advanced\n");
    touch(&dir.join("pages/page2.adoc"), "== Two\n");
    touch(&dir.join("pages/page2.internal.adoc"), "== Two internal\n");
    touch(&dir.join("pages/page2.advanced.adoc"), "== Two advanced\n");

    assert_eq!(
        find_and_sort(&dir, "index.adoc", "pages/*.adoc", &["internal"]),
        vec![
            "pages/index.adoc",
            "pages/page1.adoc",
            "pages/page1.internal.adoc",
            "pages/page2.adoc",
            "pages/page2.internal.adoc"
        ]
    );
    assert_eq!(
        find_and_sort(
            &dir,
            "index.adoc",
            "pages/*.adoc",
            &["advanced", "internal"]
        ),
        vec![
            "pages/index.adoc",
            "pages/page1.adoc",
            "pages/page1.advanced.adoc",
            "pages/page1.internal.adoc",
            "pages/page2.adoc",
            "pages/page2.advanced.adoc",
            "pages/page2.internal.adoc"
        ]
    );
    assert_eq!(
        find_and_sort(
            &dir,
            "index.adoc",
            "pages/*.adoc",
            &["internal", "advanced"]
        ),
        vec![
            "pages/index.adoc",
            "pages/page1.adoc",
            "pages/page1.internal.adoc",
            "pages/page1.advanced.adoc",
            "pages/page2.adoc",
            "pages/page2.internal.adoc",
            "pages/page2.advanced.adoc"
        ]
    );
}

#[test]
fn natural_default_order_from_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    touch(&dir.join("pages/page1.adoc"), "== One\n");
    touch(&dir.join("pages/page2.adoc"), "== Two\n");
    touch(&dir.join("pages/page10.adoc"), "== Ten\n");

    // Lexicographic by default.
    assert_eq!(
        find_and_sort(&dir, "index.adoc", "pages/*.adoc", &[]),
        vec![
            "pages/page1.adoc",
            "pages/page10.adoc",
            "pages/page2.adoc"
        ]
    );

    touch(&dir.join("pages/pages.yaml"), "defaultOrder: natural\n");
    assert_eq!(
        find_and_sort(&dir, "index.adoc", "pages/*.adoc", &[]),
        vec![
            "pages/page1.adoc",
            "pages/page2.adoc",
            "pages/page10.adoc"
        ]
    );
}

#[test]
fn sorting_is_a_total_order_under_permutation() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    for name in ["b.adoc", "a.adoc", "index.adoc", "c.internal.adoc", "c.adoc"] {
        touch(&dir.join("pages").join(name), "text\n");
    }

    let found = find_files(&dir, "pages/*.adoc", &[]).unwrap();
    let mut sink = |_: String| {};
    let sorted = sort_files(&mut sink, found.clone(), &[], load_sort_config);
    let mut reversed: Vec<PathBuf> = found;
    reversed.reverse();
    let sorted_again = sort_files(&mut sink, reversed, &[], load_sort_config);
    assert_eq!(sorted, sorted_again);
}
