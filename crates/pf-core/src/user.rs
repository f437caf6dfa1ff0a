//! User attribute bag handed over by the authentication layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Attributes of the requesting user, keyed by attribute name.
///
/// Scalars and arrays of scalars are supported; a parameter's
/// `user_attribute` names the entry whose value(s) are matched against the
/// `user_groups` of each option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserAttributes(BTreeMap<String, Value>);

impl UserAttributes {
    /// An empty attribute bag (anonymous user)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a raw attribute value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The group values the user holds for `attribute`.
    ///
    /// A missing or null attribute yields an empty set, so only options
    /// without `user_groups` stay visible.
    pub fn group_values(&self, attribute: &str) -> BTreeSet<String> {
        let mut groups = BTreeSet::new();
        match self.0.get(attribute) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                groups.extend(items.iter().filter_map(scalar_to_string));
            }
            Some(other) => groups.extend(scalar_to_string(other)),
        }
        groups
    }

    /// Canonical subset of the bag restricted to `attributes`.
    ///
    /// Resolution only reads the attributes named by parameters, so this is
    /// all a request fingerprint needs to include.
    pub fn signature<'a>(
        &self,
        attributes: impl IntoIterator<Item = &'a str>,
    ) -> BTreeMap<String, BTreeSet<String>> {
        attributes
            .into_iter()
            .map(|attr| (attr.to_string(), self.group_values(attr)))
            .collect()
    }
}

impl FromIterator<(String, Value)> for UserAttributes {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_values_scalar_and_array() {
        let user = UserAttributes::new()
            .with("role", "manager")
            .with("regions", json!(["east", "west", 3]));

        assert_eq!(
            user.group_values("role"),
            BTreeSet::from(["manager".to_string()])
        );
        assert_eq!(user.group_values("regions").len(), 3);
        assert!(user.group_values("regions").contains("3"));
        assert!(user.group_values("missing").is_empty());
    }

    #[test]
    fn test_signature_ignores_unrelated_attributes() {
        let a = UserAttributes::new().with("role", "employee").with("email", "a@x.io");
        let b = UserAttributes::new().with("role", "employee").with("email", "b@x.io");
        assert_eq!(a.signature(["role"]), b.signature(["role"]));
    }
}
