use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::paths::{forward_slashes, lexical_normalize, relativize};
use crate::scanner::next_span;
use crate::title::FileRecord;

/// Reference syntax kind. `PlainText` marks an occurrence degraded to its
/// display text (external target with `external-xref-as-text` set).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XrefKind {
    AngleBracket,
    Inline,
    PlainText,
}

/// One parsed cross-reference occurrence in source text, ephemeral within a
/// single rewrite pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XrefOccurrence {
    pub file: Option<String>,
    pub anchor: Option<String>,
    pub text: Option<String>,
    pub kind: XrefKind,
    pub start: usize,
    pub end: usize,
}

/// Finds the next `<<...>>` reference at or after `from`.
///
/// The inner content splits on the first `#` into file part and rest; the
/// rest splits on the first `,` into anchor and display text. The display
/// text keeps its leading whitespace so re-serialization is byte-exact.
pub fn find_next_angle_bracket(text: &str, from: usize) -> Option<XrefOccurrence> {
    let span = next_span(text, "<<", ">>", from)?;
    let inner = &text[span.inner_start..span.inner_end];

    let (file, rest) = match inner.find('#') {
        Some(i) => (Some(inner[..i].to_string()), &inner[i + 1..]),
        None => (None, inner),
    };
    let (anchor, display) = match rest.find(',') {
        Some(i) => (rest[..i].to_string(), Some(rest[i + 1..].to_string())),
        None => (rest.to_string(), None),
    };

    Some(XrefOccurrence {
        file,
        anchor: Some(anchor),
        text: display,
        kind: XrefKind::AngleBracket,
        start: span.outer_start,
        end: span.outer_end,
    })
}

fn bare_file_regex() -> &'static Regex {
    static BARE_FILE: OnceLock<Regex> = OnceLock::new();
    BARE_FILE.get_or_init(|| Regex::new(r"\.[a-z]+$").expect("invalid bare-file regex"))
}

/// Finds the next `xref:target[text]` reference at or after `from`.
///
/// The target is the run of non-whitespace characters between `xref:` and
/// the opening bracket; anything else is not a reference and scanning
/// continues past it. A target without `#` that ends in a dot plus
/// lowercase letters is a bare file reference; otherwise it is an anchor.
pub fn find_next_inline(text: &str, from: usize) -> Option<XrefOccurrence> {
    let mut search = from.min(text.len());
    loop {
        let start = search + text[search..].find("xref:")?;
        let target_start = start + "xref:".len();
        search = target_start;

        let mut bracket = None;
        for (offset, ch) in text[target_start..].char_indices() {
            if ch == '[' {
                bracket = Some(target_start + offset);
                break;
            }
            if ch.is_whitespace() {
                break;
            }
        }
        let Some(bracket_pos) = bracket else {
            continue;
        };
        if bracket_pos == target_start {
            continue;
        }
        let Some(span) = next_span(text, "[", "]", bracket_pos) else {
            continue;
        };

        let target = &text[target_start..bracket_pos];
        let (file, anchor) = match target.find('#') {
            Some(i) => (
                Some(target[..i].to_string()),
                Some(target[i + 1..].to_string()),
            ),
            None => {
                if bare_file_regex().is_match(target) {
                    (Some(target.to_string()), None)
                } else {
                    (None, Some(target.to_string()))
                }
            }
        };
        let display = &text[span.inner_start..span.inner_end];

        return Some(XrefOccurrence {
            file,
            anchor,
            text: (!display.is_empty()).then(|| display.to_string()),
            kind: XrefKind::Inline,
            start,
            end: span.outer_end,
        });
    }
}

/// Re-serializes an occurrence with exact punctuation for its syntax kind.
pub fn xref_to_string(occurrence: &XrefOccurrence) -> String {
    match occurrence.kind {
        XrefKind::AngleBracket => {
            let mut out = String::from("<<");
            if let Some(file) = &occurrence.file {
                out.push_str(file);
                out.push('#');
            }
            if let Some(anchor) = &occurrence.anchor {
                out.push_str(anchor);
            }
            if let Some(text) = &occurrence.text {
                out.push(',');
                out.push_str(text);
            }
            out.push_str(">>");
            out
        }
        XrefKind::Inline => {
            let mut out = String::from("xref:");
            if let Some(file) = &occurrence.file {
                out.push_str(file);
                out.push('#');
            }
            if let Some(anchor) = &occurrence.anchor {
                out.push_str(anchor);
            }
            out.push('[');
            if let Some(text) = &occurrence.text {
                out.push_str(text);
            }
            out.push(']');
            out
        }
        XrefKind::PlainText => occurrence.text.clone().unwrap_or_default(),
    }
}

/// Resolves one occurrence against the resolved file set.
///
/// File targets resolve `{root}`-prefixed against `root`, otherwise against
/// the referencing file's directory with a fallback to `root` when the
/// sibling candidate does not exist on disk. Targets found in the set lose
/// their file part and have their anchor remapped; unknown targets are
/// rewritten relative to `request_dir` (or degraded to display text when
/// `external_as_text` is set), with the anchor deliberately untouched.
pub fn resolve_xref(
    occurrence: &XrefOccurrence,
    files: &[FileRecord],
    current: &FileRecord,
    request_dir: &Path,
    root: &Path,
    external_as_text: bool,
) -> XrefOccurrence {
    let mut resolved = occurrence.clone();
    match occurrence.file.as_deref() {
        // An empty file part only appears in already-rewritten text.
        Some("") => resolved,
        Some(file) => {
            let candidate = if let Some(rest) = file.strip_prefix("{root}") {
                lexical_normalize(&root.join(rest))
            } else {
                let parent = current.path.parent().unwrap_or_else(|| Path::new(""));
                let sibling = lexical_normalize(&parent.join(file));
                if sibling.exists() {
                    sibling
                } else {
                    let from_root = lexical_normalize(&root.join(file));
                    if from_root.exists() { from_root } else { sibling }
                }
            };

            match files.iter().find(|record| record.path == candidate) {
                Some(target) => {
                    resolved.file = None;
                    let given = occurrence.anchor.as_deref().unwrap_or("");
                    let mut anchor = if given.trim().is_empty() {
                        target.first_title.anchor.clone()
                    } else {
                        target
                            .title_anchor_map
                            .get(given)
                            .cloned()
                            .unwrap_or_else(|| given.to_string())
                    };
                    if let Some(shifted) = target.anchor_shift.get(&anchor) {
                        anchor = shifted.clone();
                    }
                    resolved.anchor = Some(anchor);
                    resolved
                }
                None => {
                    if external_as_text {
                        XrefOccurrence {
                            file: None,
                            anchor: None,
                            text: occurrence.text.clone(),
                            kind: XrefKind::PlainText,
                            start: occurrence.start,
                            end: occurrence.end,
                        }
                    } else {
                        resolved.file =
                            Some(forward_slashes(&relativize(request_dir, &candidate)));
                        resolved
                    }
                }
            }
        }
        None => {
            let Some(given) = occurrence.anchor.as_deref() else {
                return resolved;
            };
            if given.trim().is_empty() {
                return resolved;
            }
            let mut anchor = current
                .title_anchor_map
                .get(given)
                .cloned()
                .unwrap_or_else(|| given.to_string());
            if let Some(shifted) = current.anchor_shift.get(&anchor) {
                anchor = shifted.clone();
            }
            resolved.anchor = Some(anchor);
            resolved
        }
    }
}

fn replace_with<F>(content: &str, mut find: F) -> String
where
    F: FnMut(&str, usize) -> Option<(XrefOccurrence, XrefOccurrence)>,
{
    let mut out = String::with_capacity(content.len());
    let mut position = 0;
    while let Some((found, resolved)) = find(content, position) {
        out.push_str(&content[position..found.start]);
        out.push_str(&xref_to_string(&resolved));
        position = found.end;
    }
    out.push_str(&content[position..]);
    out
}

/// Rewrites every `<<...>>` reference in `content`, copying untouched spans
/// verbatim.
pub fn replace_angle_bracket_xrefs(
    content: &str,
    files: &[FileRecord],
    current: &FileRecord,
    request_dir: &Path,
    root: &Path,
    external_as_text: bool,
) -> String {
    replace_with(content, |text, from| {
        let found = find_next_angle_bracket(text, from)?;
        let resolved = resolve_xref(&found, files, current, request_dir, root, external_as_text);
        Some((found, resolved))
    })
}

/// Rewrites every `xref:...[...]` reference in `content`.
pub fn replace_inline_xrefs(
    content: &str,
    files: &[FileRecord],
    current: &FileRecord,
    request_dir: &Path,
    root: &Path,
    external_as_text: bool,
) -> String {
    replace_with(content, |text, from| {
        let found = find_next_inline(text, from)?;
        let resolved = resolve_xref(&found, files, current, request_dir, root, external_as_text);
        Some((found, resolved))
    })
}

/// Runs both reference syntaxes over `content`, one pass each.
pub fn rewrite_xrefs(
    content: &str,
    files: &[FileRecord],
    current: &FileRecord,
    request_dir: &Path,
    root: &Path,
    external_as_text: bool,
) -> String {
    let pass = replace_angle_bracket_xrefs(
        content,
        files,
        current,
        request_dir,
        root,
        external_as_text,
    );
    replace_inline_xrefs(&pass, files, current, request_dir, root, external_as_text)
}
