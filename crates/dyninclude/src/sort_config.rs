use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Conventional per-directory order-configuration file name.
pub const SORT_CONFIG_FILE: &str = "pages.yaml";

/// Default-order mode applied when two base names tie on everything else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Order {
    #[default]
    Lexicographic,
    LexicographicReversed,
    Natural,
    NaturalReversed,
}

/// Object representation of the content of a `pages.yaml` file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub order: Option<Vec<String>>,
    #[serde(default, rename = "defaultOrder")]
    pub default_order: Option<Order>,
}

/// Result of attempting to load a directory's `pages.yaml`.
pub enum SortConfigLoad {
    Found(SortConfig),
    Missing,
    /// File exists but could not be parsed; carries an advisory message.
    Malformed(String),
}

/// Loads the sort configuration of `dir`. A missing or unreadable file is
/// the common case and reported as `Missing`; a present but unparseable
/// file yields `Malformed` so the caller can log one advisory.
pub fn load_sort_config(dir: &Path) -> SortConfigLoad {
    if !dir.is_dir() {
        return SortConfigLoad::Missing;
    }
    let file = dir.join(SORT_CONFIG_FILE);
    let Ok(raw) = fs::read_to_string(&file) else {
        return SortConfigLoad::Missing;
    };
    match serde_yaml::from_str::<SortConfig>(&raw) {
        Ok(config) => SortConfigLoad::Found(config),
        Err(err) => SortConfigLoad::Malformed(format!(
            "Could not parse '{}': {err}",
            file.display()
        )),
    }
}
