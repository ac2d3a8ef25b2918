use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::paths::{common_path, name_suffix, name_without_suffix};
use crate::sort_config::{Order, SortConfig, SortConfigLoad};

/// Pairwise path comparator combining explicit per-directory order, the
/// index-first rule, suffix-priority tiers, and a configurable default
/// order. Advisory messages are collected, deduplicated, and handed to the
/// caller after the sort; the comparator itself never fails.
pub struct PathComparator<'a, L>
where
    L: Fn(&Path) -> SortConfigLoad,
{
    load_config: L,
    suffixes: &'a [String],
    configs: RefCell<HashMap<PathBuf, Option<SortConfig>>>,
    messages: RefCell<BTreeSet<String>>,
}

impl<'a, L> PathComparator<'a, L>
where
    L: Fn(&Path) -> SortConfigLoad,
{
    pub fn new(suffixes: &'a [String], load_config: L) -> Self {
        Self {
            load_config,
            suffixes,
            configs: RefCell::new(HashMap::new()),
            messages: RefCell::new(BTreeSet::new()),
        }
    }

    /// Sorted, deduplicated advisory messages collected while comparing.
    pub fn into_messages(self) -> Vec<String> {
        self.messages.into_inner().into_iter().collect()
    }

    fn config_for(&self, dir: &Path) -> Option<SortConfig> {
        self.configs
            .borrow_mut()
            .entry(dir.to_path_buf())
            .or_insert_with(|| match (self.load_config)(dir) {
                SortConfigLoad::Found(config) => Some(config),
                SortConfigLoad::Missing => None,
                SortConfigLoad::Malformed(message) => {
                    self.messages.borrow_mut().insert(message);
                    None
                }
            })
            .clone()
    }

    fn no_order_message(&self, name: &str, dir: &Path) {
        self.messages.borrow_mut().insert(format!(
            "No ordering indication for '{name}' in '{}', putting it at the end",
            dir.display()
        ));
    }

    pub fn compare(&self, p1: &Path, p2: &Path) -> Ordering {
        if p1 == p2 {
            return Ordering::Equal;
        }
        let common = common_path(p1, p2);
        let name1 = first_segment(p1, &common);
        let name2 = first_segment(p2, &common);
        let base1 = name_without_suffix(&name1);
        let base2 = name_without_suffix(&name2);

        let config = self.config_for(&common);
        let default_order = config
            .as_ref()
            .and_then(|c| c.default_order)
            .unwrap_or_default();

        if let Some(order) = config.as_ref().and_then(|c| c.order.as_ref()) {
            if !order.iter().any(|o| o.as_str() == "index") {
                if base1 == "index" {
                    if base2 == "index" {
                        return self.compare_name_and_suffixes(&name1, &name2, default_order);
                    }
                    return Ordering::Less;
                }
                if base2 == "index" {
                    return Ordering::Greater;
                }
            }
            let pos1 = order.iter().position(|o| o.as_str() == base1);
            let pos2 = order.iter().position(|o| o.as_str() == base2);
            match (pos1, pos2) {
                (Some(i), Some(j)) => {
                    return if i == j {
                        self.compare_name_and_suffixes(&name1, &name2, default_order)
                    } else {
                        i.cmp(&j)
                    };
                }
                (Some(_), None) => {
                    self.no_order_message(base2, &common);
                    return Ordering::Less;
                }
                (None, Some(_)) => {
                    self.no_order_message(base1, &common);
                    return Ordering::Greater;
                }
                (None, None) => {
                    self.no_order_message(base1, &common);
                    // Neither name is listed; fall back to the default rules.
                }
            }
        }

        if base1 == "index" {
            if base2 == "index" {
                return self.compare_name_and_suffixes(&name1, &name2, default_order);
            }
            return Ordering::Less;
        }
        if base2 == "index" {
            return Ordering::Greater;
        }

        match compare_names(base1, base2, default_order) {
            Ordering::Equal => self.compare_name_and_suffixes(&name1, &name2, default_order),
            other => other,
        }
    }

    fn compare_name_and_suffixes(
        &self,
        name1: &str,
        name2: &str,
        default_order: Order,
    ) -> Ordering {
        let suffix1 = name_suffix(name1);
        let suffix2 = name_suffix(name2);
        if self.suffixes.is_empty() || suffix1 == suffix2 {
            return compare_names(name1, name2, default_order);
        }
        match (suffix1, suffix2) {
            (None, _) => Ordering::Less,
            (_, None) => Ordering::Greater,
            (Some(s1), Some(s2)) => {
                let i1 = suffix_rank(self.suffixes, s1);
                let i2 = suffix_rank(self.suffixes, s2);
                if i1 == i2 {
                    name1.cmp(name2)
                } else {
                    i1.cmp(&i2)
                }
            }
        }
    }
}

// Unknown suffixes sort after every listed one.
fn suffix_rank(suffixes: &[String], suffix: &str) -> usize {
    suffixes
        .iter()
        .position(|s| s.as_str() == suffix)
        .unwrap_or(usize::MAX)
}

fn first_segment(path: &Path, common: &Path) -> String {
    path.strip_prefix(common)
        .ok()
        .and_then(|rest| rest.components().next())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

fn compare_names(name1: &str, name2: &str, order: Order) -> Ordering {
    match order {
        Order::Lexicographic => name1.cmp(name2),
        Order::LexicographicReversed => name2.cmp(name1),
        Order::Natural => alphanum_compare(name1, name2),
        Order::NaturalReversed => alphanum_compare(name2, name1),
    }
}

/// Natural comparison over alternating digit/non-digit runs: numeric runs
/// compare by value, non-numeric runs by codepoint. Equal-valued numeric
/// runs with different leading zeros fall back to plain string comparison.
pub fn alphanum_compare(a: &str, b: &str) -> Ordering {
    let chunks_a = chunks(a);
    let chunks_b = chunks(b);
    for (ca, cb) in chunks_a.iter().zip(chunks_b.iter()) {
        let result = if is_digit_run(ca) && is_digit_run(cb) {
            compare_digit_runs(ca, cb)
        } else {
            ca.cmp(cb)
        };
        if result != Ordering::Equal {
            return result;
        }
    }
    chunks_a.len().cmp(&chunks_b.len())
}

fn is_digit_run(chunk: &str) -> bool {
    chunk.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let va = a.trim_start_matches('0');
    let vb = b.trim_start_matches('0');
    va.len()
        .cmp(&vb.len())
        .then_with(|| va.cmp(vb))
        .then_with(|| a.cmp(b))
}

fn chunks(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut previous_digit: Option<bool> = None;
    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        if let Some(prev) = previous_digit {
            if prev != digit {
                out.push(&s[start..i]);
                start = i;
            }
        }
        previous_digit = Some(digit);
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Sorts `files` with the comparator and reports collected advisories
/// through `logger`, sorted and deduplicated.
pub fn sort_files(
    logger: &mut dyn FnMut(String),
    files: Vec<PathBuf>,
    suffixes: &[String],
    load_config: impl Fn(&Path) -> SortConfigLoad,
) -> Vec<PathBuf> {
    let comparator = PathComparator::new(suffixes, load_config);
    let mut sorted = files;
    sorted.sort_by(|a, b| comparator.compare(a, b));
    for message in comparator.into_messages() {
        logger(message);
    }
    sorted
}
