use std::path::Path;

use crate::error::DynincludeError;
use crate::paths::{forward_slashes, lexical_normalize, relativize};
use crate::scanner::next_span;

/// Attribute lookup collaborator: document attribute name to value.
pub type AttributeGetter<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Resolves `{name}` tokens in `template` against the built-in file
/// placeholders, falling back to the attribute lookup. Unresolved tokens
/// are left verbatim. Attribute values are themselves re-resolved;
/// self-referential chains are fatal and the error names the full chain.
pub fn replace_placeholders(
    template: &str,
    file: &Path,
    attributes: AttributeGetter,
) -> Result<String, DynincludeError> {
    resolve_template(template, file, attributes, &mut Vec::new())
}

fn resolve_template(
    template: &str,
    file: &Path,
    attributes: AttributeGetter,
    chain: &mut Vec<String>,
) -> Result<String, DynincludeError> {
    let mut out = String::with_capacity(template.len());
    let mut position = 0;
    while let Some(span) = next_span(template, "{", "}", position) {
        out.push_str(&template[position..span.outer_start]);
        let name = &template[span.inner_start..span.inner_end];
        match resolve_token(name, file, attributes, chain)? {
            Some(value) => out.push_str(&value),
            None => out.push_str(&template[span.outer_start..span.outer_end]),
        }
        position = span.outer_end;
    }
    out.push_str(&template[position..]);
    Ok(out)
}

fn resolve_token(
    name: &str,
    file: &Path,
    attributes: AttributeGetter,
    chain: &mut Vec<String>,
) -> Result<Option<String>, DynincludeError> {
    match name {
        "file-absolute-with-leading-slash" => Ok(Some(absolute_with_leading_slash(file))),
        "file-relative-to-git-repository" => {
            Ok(relative_to_attribute(file, "local-git-repository-path", attributes))
        }
        "file-relative-to-gradle-projectdir" => {
            Ok(relative_to_attribute(file, "gradle-projectdir", attributes))
        }
        "file-relative-to-gradle-rootdir" => {
            Ok(relative_to_attribute(file, "gradle-rootdir", attributes))
        }
        _ => {
            let Some(value) = attributes(name) else {
                return Ok(None);
            };
            if chain.iter().any(|c| c.as_str() == name) {
                chain.push(name.to_string());
                return Err(DynincludeError::Placeholder(format!(
                    "circular placeholder resolution: {}",
                    chain.join(" -> ")
                )));
            }
            chain.push(name.to_string());
            let resolved = resolve_template(&value, file, attributes, chain)?;
            chain.pop();
            Ok(Some(resolved))
        }
    }
}

fn absolute_with_leading_slash(file: &Path) -> String {
    let rendered = forward_slashes(file);
    if rendered.starts_with('/') {
        rendered
    } else {
        format!("/{rendered}")
    }
}

fn relative_to_attribute(
    file: &Path,
    attribute: &str,
    attributes: AttributeGetter,
) -> Option<String> {
    let base = attributes(attribute)?;
    let base = lexical_normalize(Path::new(&base));
    Some(forward_slashes(&relativize(&base, file)))
}
