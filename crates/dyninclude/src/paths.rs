use std::path::{Component, Path, PathBuf};

/// Qualifier suffix of a file name: the secondary dot-segment before the
/// extension (`internal` in `page.internal.adoc`). `None` when the name has
/// no extension or no secondary segment.
pub fn name_suffix(file_name: &str) -> Option<&str> {
    let extension_position = file_name.rfind('.')?;
    let suffix_position = file_name[..extension_position].rfind('.')?;
    Some(&file_name[suffix_position + 1..extension_position])
}

/// File name with both the extension and any qualifier suffix removed.
pub fn name_without_suffix(file_name: &str) -> &str {
    match file_name.rfind('.') {
        None => file_name,
        Some(extension_position) => match file_name[..extension_position].rfind('.') {
            None => &file_name[..extension_position],
            Some(suffix_position) => &file_name[..suffix_position],
        },
    }
}

/// Lexically resolves `.` and `..` without touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Renders a path with forward slashes regardless of platform.
pub fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Deepest ancestor shared by two paths. For two distinct file paths this is
/// their common directory; for unrelated absolute paths it is the root.
pub fn common_path(p1: &Path, p2: &Path) -> PathBuf {
    if p1 == p2 {
        return p1.to_path_buf();
    }
    let mut out = PathBuf::new();
    for (a, b) in p1.components().zip(p2.components()) {
        if a != b {
            break;
        }
        out.push(a.as_os_str());
    }
    out
}

/// Relative path from `base` to `target`, both taken lexically. Walks up
/// with `..` segments when `target` is not below `base`.
pub fn relativize(base: &Path, target: &Path) -> PathBuf {
    let base = lexical_normalize(base);
    let target = lexical_normalize(target);
    let common = common_path(&base, &target);

    let mut out = PathBuf::new();
    for _ in base.strip_prefix(&common).iter().flat_map(|p| p.components()) {
        out.push("..");
    }
    if let Ok(rest) = target.strip_prefix(&common) {
        out.push(rest);
    }
    out
}

/// Forward-slash relative path used as a stable identity and log label.
pub fn relative_key(base: &Path, path: &Path) -> String {
    forward_slashes(&relativize(base, path))
}
