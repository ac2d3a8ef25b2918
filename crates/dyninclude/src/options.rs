use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

/// Default applied when `level-offset-shifting` is absent or invalid.
pub const DEFAULT_LEVEL_OFFSET_SHIFTING: i32 = 1;

/// Attribute-like key/value source with a directive-local key and a
/// document-wide `dynamic-include-<key>` fallback.
pub struct AttributeSource<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> AttributeSource<'a> {
    pub fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    /// Plain document-attribute lookup without the fallback key.
    pub fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    /// Directive-local value, falling back to the document-wide key.
    pub fn option(&self, key: &str) -> Option<String> {
        (self.lookup)(key).or_else(|| (self.lookup)(&format!("dynamic-include-{key}")))
    }
}

/// Parsed per-call options of one dynamic-include directive.
#[derive(Clone, Debug)]
pub struct IncludeOptions {
    pub order: Vec<String>,
    pub scopes: Vec<String>,
    pub areas: Vec<String>,
    pub suffixes: Vec<String>,
    pub external_xref_as_text: bool,
    pub logfile: Option<PathBuf>,
    pub level_offset_shifting: i32,
    pub display_view_source: bool,
    pub view_source_link_pattern: Option<String>,
    pub view_source_link_text: Option<String>,
    pub id_prefix: String,
    pub id_separator: String,
}

fn colon_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(':')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn level_offset_regex() -> &'static Regex {
    static LEVEL_OFFSET: OnceLock<Regex> = OnceLock::new();
    LEVEL_OFFSET.get_or_init(|| Regex::new(r"^-?\+?[0-9]+$").expect("invalid level-offset regex"))
}

impl IncludeOptions {
    /// Reads all options, emitting an advisory and falling back to the
    /// default when `level-offset-shifting` does not parse.
    pub fn from_attributes(
        attributes: &AttributeSource<'_>,
        logger: &mut dyn FnMut(String),
    ) -> Self {
        let level_offset_shifting = match attributes.option("level-offset-shifting") {
            None => DEFAULT_LEVEL_OFFSET_SHIFTING,
            Some(value) => {
                if level_offset_regex().is_match(&value) {
                    value
                        .replace('+', "")
                        .parse()
                        .unwrap_or(DEFAULT_LEVEL_OFFSET_SHIFTING)
                } else {
                    logger(format!(
                        "Invalid value '{value}' for 'level-offset-shifting', \
                         using '{DEFAULT_LEVEL_OFFSET_SHIFTING}' instead"
                    ));
                    DEFAULT_LEVEL_OFFSET_SHIFTING
                }
            }
        };

        Self {
            order: colon_list(attributes.option("order")),
            scopes: colon_list(attributes.option("scopes")),
            areas: colon_list(attributes.option("areas")),
            suffixes: colon_list(attributes.option("suffixes")),
            external_xref_as_text: attributes.option("external-xref-as-text").is_some(),
            logfile: attributes.option("logfile").map(PathBuf::from),
            level_offset_shifting,
            display_view_source: attributes.option("display-view-source").is_some(),
            view_source_link_pattern: attributes.option("view-source-link-pattern"),
            view_source_link_text: attributes.option("view-source-link-text"),
            id_prefix: attributes.raw("idprefix").unwrap_or_else(|| "_".to_string()),
            id_separator: attributes
                .raw("idseparator")
                .unwrap_or_else(|| "_".to_string()),
        }
    }
}
