use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::DynincludeError;
use crate::paths::{name_suffix, name_without_suffix, relative_key, relativize};

/// Structural classification of a heading occurrence.
///
/// `Commented` marks a `//`-prefixed heading line: inert as a structural
/// title but still usable as a file's nominal title.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TitleType {
    Present,
    Commented,
    Absent,
}

/// One heading occurrence inside a file's content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleMatch {
    pub kind: TitleType,
    /// Count of leading `=` characters (1-5); 0 for a synthetic record.
    pub level: u32,
    pub text: String,
    pub anchor: String,
    /// Byte offsets of the matched heading line within the file content.
    pub start: usize,
    pub end: usize,
}

/// One resolved content file, enriched with title and anchor metadata.
/// Created once per inclusion invocation and immutable afterwards (the
/// cross-file anchor pass fills `anchor_shift` before assembly starts).
#[derive(Clone, Debug)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Path relative to the resolution directory, forward-slash normalized.
    pub key: String,
    pub name_without_suffix: String,
    pub name_suffix: Option<String>,
    pub content: String,
    pub first_title: TitleMatch,
    pub level_offset: i32,
    /// Title text to anchor id, for resolving references by title text.
    pub title_anchor_map: BTreeMap<String, String>,
    /// Original local anchor to globally-unique anchor, populated only for
    /// anchors that collided with a previously processed file.
    pub anchor_shift: BTreeMap<String, String>,
    /// Anchors owned by this file, in document order, fed to the
    /// whole-inclusion collision pass.
    pub(crate) local_anchors: Vec<String>,
}

fn heading_regex() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| {
        Regex::new(r"(?mR)^(//)?(={1,5})((?:[^=\r\n][^\r\n]*)?)$").expect("invalid heading regex")
    })
}

/// Extracts every heading occurrence from `content`, classified but without
/// anchors (those depend on per-file and whole-inclusion state).
pub fn compute_title_matches(content: &str) -> Vec<TitleMatch> {
    heading_regex()
        .captures_iter(content)
        .map(|captures| {
            let whole = captures.get(0).expect("match has a group 0");
            let kind = if captures.get(1).is_some() {
                TitleType::Commented
            } else {
                TitleType::Present
            };
            let level = captures.get(2).map(|m| m.len()).unwrap_or(0) as u32;
            let text = captures
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            TitleMatch {
                kind,
                level,
                text,
                anchor: String::new(),
                start: whole.start(),
                end: whole.end(),
            }
        })
        .collect()
}

/// Computes the anchor id for a title, unique with respect to `existing`.
///
/// Slashes are stripped, runs of non-word characters become a single
/// space, the result is trimmed, lowercased, internal whitespace collapsed
/// to `id_separator`, and `id_prefix` prepended. Collisions with `existing`
/// get `id_separator` plus the smallest unused integer suffix (starting
/// at 2).
pub fn compute_title_id(
    text: &str,
    id_prefix: &str,
    id_separator: &str,
    existing: &[String],
) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^0-9A-Za-z_]+").expect("invalid regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("invalid regex"));

    let stripped = text.replace('/', "");
    let spaced = non_word.replace_all(&stripped, " ");
    let lowered = spaced.trim().to_lowercase();
    let slug = whitespace.replace_all(&lowered, id_separator);
    dedup_anchor(format!("{id_prefix}{slug}"), id_separator, existing)
}

/// Appends `separator + n` for the smallest unused `n >= 2` when `base`
/// already appears in `existing`.
pub fn dedup_anchor(base: String, separator: &str, existing: &[String]) -> String {
    if !existing.iter().any(|e| *e == base) {
        return base;
    }
    let mut n = 2usize;
    loop {
        let candidate = format!("{base}{separator}{n}");
        if !existing.iter().any(|e| *e == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Signed heading-level adjustment for a file: directory depth below
/// `root` plus `shift`, minus one for `index` files, minus the title level.
pub fn calculate_offset(
    root: &Path,
    path: &Path,
    base_name: &str,
    title_level: u32,
    shift: i32,
) -> i32 {
    let relative = relativize(root, path);
    let depth = relative.components().count().saturating_sub(1) as i32;
    depth + shift - i32::from(base_name == "index") - title_level as i32
}

/// Reads `path` and computes its enriched record. A read failure is fatal
/// for the invocation: nothing can be assembled without content.
pub fn create_file_record(
    dir: &Path,
    root: &Path,
    path: &Path,
    id_prefix: &str,
    id_separator: &str,
    shift: i32,
) -> Result<FileRecord, DynincludeError> {
    let content = fs::read_to_string(path).map_err(|err| {
        DynincludeError::Content(format!("could not read '{}': {err}", path.display()))
    })?;

    let key = relative_key(dir, path);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base_name = name_without_suffix(&file_name).to_string();
    let suffix = name_suffix(&file_name).map(str::to_string);

    let mut matches = compute_title_matches(&content);
    let mut local_anchors: Vec<String> = Vec::new();
    let mut title_anchor_map: BTreeMap<String, String> = BTreeMap::new();
    for title in &mut matches {
        title.anchor = compute_title_id(&title.text, id_prefix, id_separator, &local_anchors);
        if title.kind == TitleType::Present {
            local_anchors.push(title.anchor.clone());
            title_anchor_map
                .entry(title.text.clone())
                .or_insert_with(|| title.anchor.clone());
        }
    }

    let first_title = matches
        .iter()
        .find(|t| t.kind == TitleType::Present)
        .or_else(|| matches.first())
        .cloned()
        .unwrap_or_else(|| TitleMatch {
            kind: TitleType::Absent,
            level: 0,
            text: String::new(),
            anchor: compute_title_id(&key, id_prefix, id_separator, &[]),
            start: 0,
            end: 0,
        });

    // Synthetic and commented first titles own an anchor that the heading
    // pass did not register; it still must be globally unique.
    if first_title.kind != TitleType::Present {
        local_anchors.insert(0, first_title.anchor.clone());
    }

    let level_offset = calculate_offset(root, path, &base_name, first_title.level, shift);

    Ok(FileRecord {
        path: path.to_path_buf(),
        key,
        name_without_suffix: base_name,
        name_suffix: suffix,
        content,
        first_title,
        level_offset,
        title_anchor_map,
        anchor_shift: BTreeMap::new(),
        local_anchors,
    })
}

/// Whole-inclusion collision pass: walks files in processing order and
/// remaps any anchor already claimed by an earlier file, recording the
/// replacement in that file's `anchor_shift`.
pub fn resolve_anchor_collisions(records: &mut [FileRecord], id_separator: &str) {
    let mut pool: Vec<String> = Vec::new();
    for record in records.iter_mut() {
        for anchor in record.local_anchors.clone() {
            if pool.iter().any(|p| *p == anchor) {
                let replacement = dedup_anchor(anchor.clone(), id_separator, &pool);
                pool.push(replacement.clone());
                record.anchor_shift.insert(anchor, replacement);
            } else {
                pool.push(anchor);
            }
        }
    }
}

impl FileRecord {
    /// Anchor of the first title after the whole-inclusion shift.
    pub fn shifted_first_anchor(&self) -> &str {
        self.anchor_shift
            .get(&self.first_title.anchor)
            .unwrap_or(&self.first_title.anchor)
    }
}
