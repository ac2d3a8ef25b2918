pub mod assembly;
pub mod audit;
pub mod discovery;
pub mod error;
pub mod glob;
pub mod options;
pub mod ordering;
pub mod paths;
pub mod placeholder;
pub mod scanner;
pub mod sort_config;
pub mod title;
pub mod xref;

pub use assembly::{ContentBlock, ResolveRequest, count_lines, resolve_directive};
pub use audit::append_audit_log;
pub use discovery::{filter_current_file, find_files, find_files_filtered};
pub use error::DynincludeError;
pub use glob::convert_glob_to_regex;
pub use options::{AttributeSource, DEFAULT_LEVEL_OFFSET_SHIFTING, IncludeOptions};
pub use ordering::{PathComparator, alphanum_compare, sort_files};
pub use placeholder::{AttributeGetter, replace_placeholders};
pub use scanner::{Span, next_span};
pub use sort_config::{Order, SORT_CONFIG_FILE, SortConfig, SortConfigLoad, load_sort_config};
pub use title::{
    FileRecord, TitleMatch, TitleType, calculate_offset, compute_title_id, compute_title_matches,
    create_file_record, resolve_anchor_collisions,
};
pub use xref::{
    XrefKind, XrefOccurrence, find_next_angle_bracket, find_next_inline,
    replace_angle_bracket_xrefs, replace_inline_xrefs, resolve_xref, rewrite_xrefs,
    xref_to_string,
};
