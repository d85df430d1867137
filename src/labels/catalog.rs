//! Label parsing and the class-index-ordered catalog.

use crate::constants::labels::{IGNORED_VARIANT_TOKENS, SYNTHETIC_LABEL_PREFIX};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// A fully resolved label for one model class.
///
/// Built once per model load; the catalog position equals the model class
/// index for the lifetime of the loaded model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRecord {
    /// The source token, as read from the label list.
    pub raw_label: String,
    /// Normalized underscore-joined species key, lowercase.
    pub scientific_key: String,
    /// Space-joined, title-cased scientific name. Never empty.
    pub scientific_name: String,
    /// Title-cased regional name, when the key is in the regional map.
    pub regional_name: Option<String>,
    /// Sex/age qualifier surrounding the species key, title-cased.
    pub variant: Option<String>,
    /// Name shown to the user. Never empty.
    pub display_name: String,
}

/// Ordered list of label records, indexed by model class index.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    records: Vec<LabelRecord>,
}

impl LabelCatalog {
    /// Parse label lines against a regional-name map.
    ///
    /// One class token per line; blank lines are ignored. Map keys are
    /// case-folded. Record order follows input order, which is the model
    /// class index order.
    pub fn parse<'a, I>(lines: I, regional_names: &HashMap<String, String>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let records = lines
            .into_iter()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| parse_label(line, regional_names))
            .collect();
        Self { records }
    }

    /// Load a catalog from a label-list file and a regional-name JSON file.
    ///
    /// Unreadable assets degrade to an empty catalog (lookups then fall back
    /// to synthetic labels) rather than failing inference.
    pub fn from_files(labels_path: &Path, regional_path: &Path) -> Self {
        let regional_names = load_regional_names(regional_path);

        let text = match std::fs::read_to_string(labels_path) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to read labels '{}': {e}", labels_path.display());
                return Self::default();
            }
        };

        let catalog = Self::parse(text.lines(), &regional_names);
        info!(
            classes = catalog.len(),
            regional = regional_names.len(),
            "label catalog loaded"
        );
        catalog
    }

    /// Record for a class index, if the catalog covers it.
    pub fn record(&self, index: usize) -> Option<&LabelRecord> {
        self.records.get(index)
    }

    /// Display name for a class index, with a synthetic fallback for
    /// indices outside the catalog.
    pub fn display_name(&self, index: usize) -> String {
        self.records.get(index).map_or_else(
            || format!("{SYNTHETIC_LABEL_PREFIX} {index}"),
            |record| record.display_name.clone(),
        )
    }

    /// Number of classes in the catalog.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the catalog holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records in class-index order.
    pub fn iter(&self) -> std::slice::Iter<'_, LabelRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a LabelCatalog {
    type Item = &'a LabelRecord;
    type IntoIter = std::slice::Iter<'a, LabelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read the scientific-key to regional-name JSON map, case-folding keys.
///
/// Missing or malformed files degrade to an empty map.
fn load_regional_names(path: &Path) -> HashMap<String, String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("regional names unavailable '{}': {e}", path.display());
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HashMap<String, String>>(&text) {
        Ok(map) => map
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect(),
        Err(e) => {
            warn!("regional names unparsable '{}': {e}", path.display());
            HashMap::new()
        }
    }
}

/// Resolve a single raw label line into a record.
fn parse_label(raw_label: &str, regional_names: &HashMap<String, String>) -> LabelRecord {
    // Strip a leading "NNN." ordinal, keep the rest as the token body.
    let body = raw_label
        .split_once('.')
        .map_or(raw_label, |(_, rest)| rest)
        .to_lowercase();
    let tokens: Vec<&str> = body.split('_').filter(|t| !t.is_empty()).collect();

    let scientific_key =
        find_regional_key(&tokens, regional_names).unwrap_or_else(|| body.clone());
    let scientific_tokens: Vec<&str> = scientific_key.split('_').collect();

    // Variant tokens are subtracted by position: whatever leads or trails
    // the matched species key, never a set difference.
    let variant_tokens: &[&str] = if tokens.len() > scientific_tokens.len()
        && tokens[..scientific_tokens.len()] == scientific_tokens[..]
    {
        &tokens[scientific_tokens.len()..]
    } else if tokens.len() > scientific_tokens.len()
        && tokens[tokens.len() - scientific_tokens.len()..] == scientific_tokens[..]
    {
        &tokens[..tokens.len() - scientific_tokens.len()]
    } else {
        &[]
    };

    let regional_name = regional_names
        .get(&scientific_key)
        .map(|name| title_case_words(name, ' '));
    let scientific_name = title_case_words(&scientific_key, '_');

    let variant = if variant_tokens.is_empty() {
        None
    } else {
        let joined = variant_tokens
            .iter()
            .map(|token| title_case_word(token))
            .collect::<Vec<_>>()
            .join(" ");
        let shadows_regional = regional_name
            .as_ref()
            .is_some_and(|name| name.eq_ignore_ascii_case(&joined));
        if shadows_regional || joined.eq_ignore_ascii_case(&scientific_name) {
            None
        } else {
            Some(joined)
        }
    };

    let display_base = regional_name.as_ref().unwrap_or(&scientific_name);
    let mut display_name = match &variant {
        Some(variant) => format!("{display_base} ({variant})"),
        None => display_base.clone(),
    };
    // A label whose body degenerates to nothing still gets a visible name.
    if display_name.is_empty() {
        display_name = raw_label.to_string();
    }

    LabelRecord {
        raw_label: raw_label.to_string(),
        scientific_key,
        scientific_name,
        regional_name,
        variant,
        display_name,
    }
}

/// Find the longest contiguous token sub-sequence that is a regional key.
///
/// Sub-sequences of length >= 2 are tried longest first, left to right. If
/// no full-token candidate matches, the search is retried with age/sex
/// qualifier tokens removed, but only when that filtering actually removed
/// tokens.
fn find_regional_key(tokens: &[&str], regional_names: &HashMap<String, String>) -> Option<String> {
    if tokens.is_empty() {
        return None;
    }

    if let Some(key) = scan_subsequences(tokens, regional_names) {
        return Some(key);
    }

    let filtered: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|token| !IGNORED_VARIANT_TOKENS.contains(token))
        .collect();
    if filtered.len() >= 2 && filtered.len() != tokens.len() {
        return scan_subsequences(&filtered, regional_names);
    }

    None
}

fn scan_subsequences(tokens: &[&str], regional_names: &HashMap<String, String>) -> Option<String> {
    for length in (2..=tokens.len()).rev() {
        for start in 0..=tokens.len() - length {
            let candidate = tokens[start..start + length].join("_");
            if regional_names.contains_key(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Title-case every word of `text`, splitting on `separator`, joining with
/// spaces.
fn title_case_words(text: &str, separator: char) -> String {
    text.split(separator)
        .filter(|word| !word.is_empty())
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}
