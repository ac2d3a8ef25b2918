use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use regex::Regex;

use crate::error::DynincludeError;
use crate::glob::convert_glob_to_regex;
use crate::paths::{forward_slashes, lexical_normalize, name_suffix};

// `*` would not survive lexical normalization of the joined glob path, so it
// is masked before normalizing and restored afterwards.
const STAR_REPLACEMENT: &str = "__STAR__";

fn sanitize_glob(glob: &str) -> String {
    glob.replace('*', STAR_REPLACEMENT)
}

fn unsanitize_glob(glob: &str) -> String {
    glob.replace(STAR_REPLACEMENT, "*")
}

fn is_wildcard_segment(segment: &str) -> bool {
    segment.contains(STAR_REPLACEMENT)
        || segment.contains('?')
        || segment.contains('[')
        || segment.contains('{')
}

/// Longest prefix of the sanitized glob path containing no wildcard segment.
fn find_walk_root(sanitized: &Path) -> PathBuf {
    let mut root = PathBuf::new();
    for component in sanitized.components() {
        match component {
            Component::Normal(segment) => {
                if is_wildcard_segment(&segment.to_string_lossy()) {
                    break;
                }
                root.push(segment);
            }
            other => root.push(other.as_os_str()),
        }
    }
    root
}

/// Discovers every regular file under `dir` matching `glob`.
///
/// The glob is resolved against `dir`, lexically normalized, and matched
/// against absolute normalized candidate paths. When `suffixes` is
/// non-empty, files carrying a qualifier suffix outside the list are
/// dropped; files without a qualifier suffix always pass. Per-entry
/// traversal errors are skipped, not reported.
pub fn find_files(
    dir: &Path,
    glob: &str,
    suffixes: &[String],
) -> Result<Vec<PathBuf>, DynincludeError> {
    let joined = dir.join(sanitize_glob(glob));
    let absolute = std::path::absolute(&joined)?;
    let sanitized = lexical_normalize(&absolute);

    let pattern = unsanitize_glob(&forward_slashes(&sanitized));
    let matcher = Regex::new(&format!("^{}$", convert_glob_to_regex(&pattern)))
        .map_err(|err| DynincludeError::Content(format!("invalid glob '{glob}': {err}")))?;

    let walk_root = find_walk_root(&sanitized);
    let walker = WalkBuilder::new(&walk_root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(false)
        .build();

    let mut result = Vec::new();
    for entry in walker {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = lexical_normalize(entry.path());
        if !matcher.is_match(&forward_slashes(&path)) {
            continue;
        }
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        if let Some(suffix) = name_suffix(&file_name) {
            if !suffixes.is_empty() && !suffixes.iter().any(|s| s.as_str() == suffix) {
                continue;
            }
        }
        result.push(path);
    }
    Ok(result)
}

/// `find_files` plus scope/area filtering relative to `root`: the first and
/// second directory segments below `root` must appear in the corresponding
/// accept list. An empty list disables filtering on that axis; a path
/// lacking a required segment is rejected.
pub fn find_files_filtered(
    dir: &Path,
    root: &Path,
    glob: &str,
    suffixes: &[String],
    scopes: &[String],
    areas: &[String],
) -> Result<Vec<PathBuf>, DynincludeError> {
    let files = find_files(dir, glob, suffixes)?;
    if scopes.is_empty() && areas.is_empty() {
        return Ok(files);
    }

    let root = lexical_normalize(&std::path::absolute(root)?);
    Ok(files
        .into_iter()
        .filter(|path| {
            let Ok(relative) = path.strip_prefix(&root) else {
                return false;
            };
            let segments: Vec<String> = relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            // The last segment is the file itself, never a scope or area.
            if !scopes.is_empty() {
                match segments.first() {
                    Some(scope) if segments.len() >= 2 && scopes.contains(scope) => {}
                    _ => return false,
                }
            }
            if !areas.is_empty() {
                match segments.get(1) {
                    Some(area) if segments.len() >= 3 && areas.contains(area) => {}
                    _ => return false,
                }
            }
            true
        })
        .collect())
}

/// Removes the invoking file from the candidate set by absolute-path
/// equality.
pub fn filter_current_file(files: Vec<PathBuf>, current_file: &Path) -> Vec<PathBuf> {
    let current = std::path::absolute(current_file)
        .map(|p| lexical_normalize(&p))
        .unwrap_or_else(|_| current_file.to_path_buf());
    files.into_iter().filter(|p| *p != current).collect()
}
