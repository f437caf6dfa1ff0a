//! Raw selections as received from request query parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter name to the raw string value(s) sent by the client.
///
/// A key may carry several values when the query string repeats it
/// (`?category=a&category=b`). Parameters absent from the mapping, or whose
/// values are all blank, resolve to their default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSelection(BTreeMap<String, Vec<String>>);

impl RawSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single value for `name`, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a value for `name`
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Build from decoded query-string pairs, merging repeated keys
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut selection = Self::new();
        for (k, v) in pairs {
            selection.push(k, v);
        }
        selection
    }

    /// Values for `name`, or `None` when absent or blank
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0
            .get(name)
            .map(Vec::as_slice)
            .filter(|values| !is_blank(values))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical form keeping only `known` names with non-blank values.
    ///
    /// Value order is preserved because it is meaningful for multi-selects
    /// with `order_matters` and for ranges.
    pub fn normalized(&self, known: impl Fn(&str) -> bool) -> BTreeMap<String, Vec<String>> {
        self.0
            .iter()
            .filter(|(name, values)| known(name) && !is_blank(values))
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect()
    }
}

impl FromIterator<(String, Vec<String>)> for RawSelection {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn is_blank(values: &[String]) -> bool {
    values.iter().all(|v| v.trim().is_empty())
}

/// Expand raw values into a flat list.
///
/// Each value may be a JSON array (`["a","b"]`) or a comma-delimited string
/// (`a,b`). Entries are trimmed and blank entries dropped.
pub fn parse_list(values: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for value in values {
        let trimmed = value.trim();
        if trimmed.starts_with('[') {
            if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(trimmed) {
                out.extend(items.iter().filter_map(json_scalar_to_string));
                continue;
            }
        }
        out.extend(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }
    out
}

/// Require exactly one non-blank raw value
pub fn single_value(values: &[String]) -> Result<&str, String> {
    untrimmed_single_value(values).map(str::trim)
}

/// Like [`single_value`], but returns the value exactly as sent
pub fn untrimmed_single_value(values: &[String]) -> Result<&str, String> {
    let mut non_blank = values
        .iter()
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty());
    match (non_blank.next(), non_blank.next()) {
        (Some(v), None) => Ok(v),
        (None, _) => Err("a value is required".to_string()),
        (Some(_), Some(_)) => Err("expected a single value".to_string()),
    }
}

/// Require exactly two values, either repeated or joined by a comma
pub fn pair_values(values: &[String]) -> Result<(String, String), String> {
    let items = parse_list(values);
    match <[String; 2]>::try_from(items) {
        Ok([a, b]) => Ok((a, b)),
        Err(items) => Err(format!(
            "expected two values joined by a comma, got {}",
            items.len()
        )),
    }
}

fn json_scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;
