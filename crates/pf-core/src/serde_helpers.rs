//! Shared serde helper functions used across config modules.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;

/// Serde default function that returns `true`.
///
/// Used for boolean fields that should default to enabled/active.
pub(crate) fn default_true() -> bool {
    true
}

/// Accept either a single string or a list of strings.
///
/// `user_groups: manager` and `user_groups: [manager, employee]` are both
/// valid in parameter configs.
pub(crate) fn string_or_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => BTreeSet::from([s]),
        OneOrMany::Many(v) => v.into_iter().collect(),
    })
}
