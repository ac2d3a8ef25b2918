use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::audit::append_audit_log;
use crate::discovery::{filter_current_file, find_files_filtered};
use crate::error::DynincludeError;
use crate::options::{AttributeSource, IncludeOptions};
use crate::ordering::sort_files;
use crate::placeholder::{AttributeGetter, replace_placeholders};
use crate::sort_config::load_sort_config;
use crate::title::{FileRecord, TitleType, create_file_record, resolve_anchor_collisions};
use crate::xref::rewrite_xrefs;

/// One dynamic-include directive to resolve.
pub struct ResolveRequest<'a> {
    /// Directory of the including document; the glob and file keys resolve
    /// against it.
    pub dir: &'a Path,
    /// Base directory for `{root}`-prefixed reference targets and for
    /// level-offset depth computation.
    pub root: &'a Path,
    /// Full directive text, recorded in the audit log.
    pub target: &'a str,
    /// Glob pattern extracted from the directive.
    pub glob: &'a str,
    /// The including file itself, always excluded from the candidate set.
    pub current_file: &'a Path,
}

/// One emitted per-file block.
///
/// `content` is the fully rewritten text including the source marker, any
/// view-source link, leveloffset directives, and the anchor line.
/// `starting_line` is the line number the host must assume for the first
/// line of `content` so diagnostics map back to the original file; every
/// line inserted ahead of the original content decrements it.
#[derive(Clone, Debug)]
pub struct ContentBlock {
    pub key: String,
    pub path: PathBuf,
    pub content: String,
    pub starting_line: i32,
}

/// Number of lines in `text` (one more than its newline count).
pub fn count_lines(text: &str) -> usize {
    text.matches('\n').count() + 1
}

/// Resolves one directive into content blocks.
///
/// The returned blocks are in REVERSE reading order: the host consumes
/// them through a stack-based inclusion mechanism, so the last-discovered
/// content must be pushed first for the assembled document to read
/// forward. This is the required contract with the host, not an
/// implementation detail.
///
/// All working state (sort-config cache, anchor pool, advisory buffers) is
/// scoped to this call, so a host may run many directives concurrently.
pub fn resolve_directive(
    request: &ResolveRequest<'_>,
    attributes: AttributeGetter,
    logger: &mut dyn FnMut(String),
) -> Result<Vec<ContentBlock>, DynincludeError> {
    let source = AttributeSource::new(attributes);
    let options = IncludeOptions::from_attributes(&source, logger);

    let files = find_files_filtered(
        request.dir,
        request.root,
        request.glob,
        &options.suffixes,
        &options.scopes,
        &options.areas,
    )?;
    let files = filter_current_file(files, request.current_file);
    let files = sort_files(logger, files, &options.suffixes, load_sort_config);
    let files = apply_explicit_order(files, &options.order, request.dir, logger);

    let mut records = Vec::with_capacity(files.len());
    for path in &files {
        records.push(create_file_record(
            request.dir,
            request.root,
            path,
            &options.id_prefix,
            &options.id_separator,
            options.level_offset_shifting,
        )?);
    }
    resolve_anchor_collisions(&mut records, &options.id_separator);

    if let Some(logfile) = &options.logfile {
        if let Err(err) = append_audit_log(
            logfile,
            request.current_file,
            request.target,
            options.level_offset_shifting,
            &records,
        ) {
            logger(format!(
                "Could not write log file '{}': {err}",
                logfile.display()
            ));
        }
    }

    let mut blocks = Vec::with_capacity(records.len());
    for index in 0..records.len() {
        blocks.push(build_block(&records, index, request, attributes, &options)?);
    }
    blocks.reverse();
    Ok(blocks)
}

/// Primary ordering by position in the per-call `order` key list, with a
/// plain key comparison as tie-break. Keys missing from the list sort
/// after every listed key, each with one advisory.
fn apply_explicit_order(
    files: Vec<PathBuf>,
    order: &[String],
    dir: &Path,
    logger: &mut dyn FnMut(String),
) -> Vec<PathBuf> {
    if order.is_empty() {
        return files;
    }
    let mut messages = BTreeSet::new();
    let mut sorted = files;
    sorted.sort_by_key(|path| {
        let key = crate::paths::relative_key(dir, path);
        let position = order.iter().position(|o| *o == key).unwrap_or_else(|| {
            messages.insert(format!(
                "Did not find any information order for '{key}', \
                 putting it at the end of the document"
            ));
            usize::MAX
        });
        (position, key)
    });
    for message in messages {
        logger(message);
    }
    sorted
}

fn build_block(
    records: &[FileRecord],
    index: usize,
    request: &ResolveRequest<'_>,
    attributes: AttributeGetter,
    options: &IncludeOptions,
) -> Result<ContentBlock, DynincludeError> {
    let record = &records[index];
    let title = &record.first_title;

    // A file whose first title equals the previous file's continues that
    // section: its heading line is suppressed and no anchor is emitted.
    let suppress_title = index > 0 && {
        let previous = &records[index - 1].first_title;
        previous.kind == title.kind && previous.level == title.level && previous.text == title.text
    };

    let split_offset = if suppress_title { title.end } else { title.start };
    let mut starting_line = count_lines(&record.content[..split_offset]) as i32;

    let mut out = String::new();
    let push_line = |out: &mut String, line: &str, starting_line: &mut i32| {
        out.push_str(line);
        out.push('\n');
        *starting_line -= 1;
    };

    push_line(
        &mut out,
        &format!("// dynamic include: {}", record.key),
        &mut starting_line,
    );
    push_line(&mut out, "", &mut starting_line);

    if options.display_view_source {
        if let Some(pattern) = &options.view_source_link_pattern {
            let url = replace_placeholders(pattern, &record.path, attributes)?;
            let text = match &options.view_source_link_text {
                Some(text) => replace_placeholders(text, &record.path, attributes)?,
                None => "View source".to_string(),
            };
            push_line(&mut out, &format!("link:{url}[{text}]"), &mut starting_line);
            push_line(&mut out, "", &mut starting_line);
        }
    }

    if record.level_offset != 0 {
        push_line(
            &mut out,
            &format!(":leveloffset: {:+}", record.level_offset),
            &mut starting_line,
        );
        push_line(&mut out, "", &mut starting_line);
    }

    if !suppress_title && title.kind != TitleType::Present {
        push_line(
            &mut out,
            &format!("[#{}]", record.shifted_first_anchor()),
            &mut starting_line,
        );
    }

    let mut body = rewrite_xrefs(
        &record.content[split_offset..],
        records,
        record,
        request.dir,
        request.root,
        options.external_xref_as_text,
    );
    if !body.ends_with('\n') {
        body.push('\n');
    }
    out.push_str(&body);

    if record.level_offset != 0 {
        out.push('\n');
        out.push_str(&format!(":leveloffset: {:+}\n", -record.level_offset));
    }

    Ok(ContentBlock {
        key: record.key.clone(),
        path: record.path.clone(),
        content: out,
        starting_line,
    })
}
