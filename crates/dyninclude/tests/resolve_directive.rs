use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use dyninclude::{ContentBlock, ResolveRequest, resolve_directive};

fn touch(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn resolve(
    dir: &Path,
    glob: &str,
    attributes: &BTreeMap<String, String>,
) -> (Vec<ContentBlock>, Vec<String>) {
    let current = dir.join("index.adoc");
    let target = format!("dynamic:{glob}");
    let request = ResolveRequest {
        dir,
        root: dir,
        target: &target,
        glob,
        current_file: &current,
    };
    let lookup = |key: &str| attributes.get(key).cloned();
    let mut messages = Vec::new();
    let blocks = resolve_directive(&request, &lookup, &mut |m| messages.push(m)).unwrap();
    (blocks, messages)
}

fn standard_tree(dir: &Path) {
    touch(&dir.join("index.adoc"), "= Index\n");
    touch(
        &dir.join("pages/page1.adoc"),
        "== Page One\n\nSee <<page2.adoc#, next>>.\n",
    );
    touch(
        &dir.join("pages/page2.adoc"),
        "== Page Two\n\nBack to xref:page1.adoc#[first].\n",
    );
    touch(&dir.join("pages/zpage.adoc"), "No title here.\n");
}

#[test]
fn blocks_come_out_in_reverse_reading_order() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    standard_tree(&dir);

    let (blocks, messages) = resolve(&dir, "pages/*.adoc", &BTreeMap::new());
    assert!(messages.is_empty(), "{messages:?}");

    // Reverse order: the host pushes stack-wise, so the last file in
    // reading order is handed over first.
    let keys: Vec<&str> = blocks.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(
        keys,
        ["pages/zpage.adoc", "pages/page2.adoc", "pages/page1.adoc"]
    );
}

#[test]
fn cross_references_are_rewritten_between_resolved_files() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    standard_tree(&dir);

    let (blocks, _) = resolve(&dir, "pages/*.adoc", &BTreeMap::new());
    let page1 = &blocks[2];
    let page2 = &blocks[1];

    // Blank anchor resolves to the target's first-title anchor.
    assert!(
        page1.content.contains("See <<#_page_two, next>>."),
        "{}",
        page1.content
    );
    assert!(
        page2.content.contains("Back to xref:#_page_one[first]."),
        "{}",
        page2.content
    );
}

#[test]
fn blocks_carry_markers_offsets_and_anchor_lines() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    standard_tree(&dir);

    let (blocks, _) = resolve(&dir, "pages/*.adoc", &BTreeMap::new());
    let page1 = &blocks[2];
    let zpage = &blocks[0];

    assert!(page1.content.starts_with("// dynamic include: pages/page1.adoc\n\n"));
    // depth 1 + shift 1 - title level 2 = 0: no leveloffset bracket.
    assert!(!page1.content.contains(":leveloffset:"), "{}", page1.content);
    // Two inserted lines ahead of a title on line 1.
    assert_eq!(page1.starting_line, -1);

    // A title-less file gets a synthetic anchor and a +2 bracket
    // (depth 1 + shift 1 - level 0).
    assert!(zpage.content.contains(":leveloffset: +2\n"), "{}", zpage.content);
    assert!(zpage.content.contains("[#_pageszpage_adoc]\n"), "{}", zpage.content);
    assert!(zpage.content.contains("No title here."));
    assert!(zpage.content.ends_with(":leveloffset: -2\n"), "{}", zpage.content);
}

#[test]
fn equal_consecutive_titles_are_merged() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    touch(&dir.join("index.adoc"), "= Index\n");
    touch(&dir.join("pages/a1.adoc"), "== Shared\n\nFirst half.\n");
    touch(&dir.join("pages/a2.adoc"), "== Shared\n\nSecond half.\n");

    let (blocks, _) = resolve(&dir, "pages/*.adoc", &BTreeMap::new());
    let first = &blocks[1];
    let second = &blocks[0];

    assert!(first.content.contains("== Shared"));
    assert!(!second.content.contains("== Shared"), "{}", second.content);
    assert!(second.content.contains("Second half."));
}

#[test]
fn colliding_anchors_are_shifted_in_later_files() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    touch(&dir.join("index.adoc"), "= Index\n");
    // Same title text at different levels: anchors collide but the
    // headings are not merged.
    touch(&dir.join("pages/a1.adoc"), "//= Topic\n\nFirst.\n");
    touch(&dir.join("pages/a2.adoc"), "//== Topic\n\nSecond.\n");

    let (blocks, _) = resolve(&dir, "pages/*.adoc", &BTreeMap::new());
    let first = &blocks[1];
    let second = &blocks[0];

    assert!(first.content.contains("[#_topic]\n"), "{}", first.content);
    assert!(second.content.contains("[#_topic_2]\n"), "{}", second.content);
}

#[test]
fn audit_log_is_appended() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    standard_tree(&dir);

    let logfile = dir.join("include.log");
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "logfile".to_string(),
        logfile.to_string_lossy().into_owned(),
    );

    resolve(&dir, "pages/*.adoc", &attributes);
    let log = fs::read_to_string(&logfile).unwrap();
    assert!(log.contains("# Target: dynamic:pages/*.adoc"));
    assert!(log.contains("# level-offset-shifting: 1"));
    assert!(log.contains("pages/page1.adoc (leveloffset: +0)"));
    assert!(log.contains("pages/zpage.adoc (leveloffset: +2)"));
}

#[test]
fn invalid_level_offset_shifting_degrades_with_advisory() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    standard_tree(&dir);

    let mut attributes = BTreeMap::new();
    attributes.insert("level-offset-shifting".to_string(), "two".to_string());

    let (blocks, messages) = resolve(&dir, "pages/*.adoc", &attributes);
    assert_eq!(blocks.len(), 3);
    assert!(
        messages.iter().any(|m| m.contains("level-offset-shifting")),
        "{messages:?}"
    );
}

#[test]
fn per_call_order_list_takes_precedence() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    standard_tree(&dir);

    let mut attributes = BTreeMap::new();
    attributes.insert(
        "order".to_string(),
        "pages/zpage.adoc:pages/page2.adoc".to_string(),
    );

    let (blocks, messages) = resolve(&dir, "pages/*.adoc", &attributes);
    let keys: Vec<&str> = blocks.iter().rev().map(|b| b.key.as_str()).collect();
    assert_eq!(
        keys,
        ["pages/zpage.adoc", "pages/page2.adoc", "pages/page1.adoc"]
    );
    assert!(
        messages
            .iter()
            .any(|m| m.contains("'pages/page1.adoc'") && m.contains("end of the document")),
        "{messages:?}"
    );
}

#[test]
fn view_source_link_resolves_placeholders() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    standard_tree(&dir);

    let mut attributes = BTreeMap::new();
    attributes.insert("display-view-source".to_string(), String::new());
    attributes.insert(
        "view-source-link-pattern".to_string(),
        "https://example.com/{file-relative-to-git-repository}".to_string(),
    );
    attributes.insert("view-source-link-text".to_string(), "View source".to_string());
    attributes.insert(
        "local-git-repository-path".to_string(),
        dir.to_string_lossy().into_owned(),
    );

    let (blocks, _) = resolve(&dir, "pages/*.adoc", &attributes);
    let page1 = &blocks[2];
    assert!(
        page1
            .content
            .contains("link:https://example.com/pages/page1.adoc[View source]\n"),
        "{}",
        page1.content
    );
    // The extra link block shifts the starting line two further.
    assert_eq!(page1.starting_line, -3);
}

#[test]
fn current_file_is_never_included() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().canonicalize().unwrap();
    touch(&dir.join("index.adoc"), "= Index\n");
    touch(&dir.join("other.adoc"), "== Other\n");

    let (blocks, _) = resolve(&dir, "*.adoc", &BTreeMap::new());
    let keys: Vec<&str> = blocks.iter().map(|b| b.key.as_str()).collect();
    assert_eq!(keys, ["other.adoc"]);
}
