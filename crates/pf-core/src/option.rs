//! Parameter options and the scope that gates their visibility.

use crate::serde_helpers::string_or_set;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Who can see an option and under which parent selections.
///
/// Empty `user_groups` means visible to every user; empty
/// `parent_option_ids` means visible regardless of the parent selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionScope {
    /// Values of the parameter's `user_attribute` allowed to see the option
    #[serde(default, deserialize_with = "string_or_set")]
    pub user_groups: BTreeSet<String>,

    /// Parent option ids under which the option is offered
    #[serde(default, deserialize_with = "string_or_set")]
    pub parent_option_ids: BTreeSet<String>,
}

impl OptionScope {
    /// Scope with no restrictions
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Whether an option in this scope passes `filter`
    pub fn allows(&self, filter: &OptionFilter<'_>) -> bool {
        self.is_visible_to(filter.user_groups) && self.matches_parent(filter.parent_option_ids)
    }

    /// `None` means the parameter has no `user_attribute`, so groups are not
    /// consulted at all.
    pub fn is_visible_to(&self, user_groups: Option<&BTreeSet<String>>) -> bool {
        match user_groups {
            None => true,
            Some(groups) => self.user_groups.is_empty() || !self.user_groups.is_disjoint(groups),
        }
    }

    /// `None` means the parameter has no parent.
    pub fn matches_parent(&self, parent_option_ids: Option<&BTreeSet<String>>) -> bool {
        match parent_option_ids {
            None => true,
            Some(ids) => self.parent_option_ids.is_empty() || !self.parent_option_ids.is_disjoint(ids),
        }
    }

    /// True when the scope places no constraint at all
    pub fn is_unrestricted(&self) -> bool {
        self.user_groups.is_empty() && self.parent_option_ids.is_empty()
    }
}

/// Inputs used to narrow a parameter's options for one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionFilter<'a> {
    /// Group values of the user, when the parameter has a `user_attribute`
    pub user_groups: Option<&'a BTreeSet<String>>,
    /// Selected option ids of the parent, when the parameter has a parent
    pub parent_option_ids: Option<&'a BTreeSet<String>>,
}

impl<'a> OptionFilter<'a> {
    /// Filter that only applies user groups
    pub fn for_user(user_groups: Option<&'a BTreeSet<String>>) -> Self {
        Self {
            user_groups,
            parent_option_ids: None,
        }
    }
}

/// One selectable choice of a single-select or multi-select parameter.
///
/// Immutable once built; the `with_*` methods consume and return the option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterOption {
    id: String,
    label: String,
    #[serde(default)]
    is_default: bool,
    #[serde(default)]
    custom_fields: BTreeMap<String, Value>,
    #[serde(flatten)]
    scope: OptionScope,
}

impl ParameterOption {
    /// Create an option visible to everyone
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            is_default: false,
            custom_fields: BTreeMap::new(),
            scope: OptionScope::default(),
        }
    }

    /// Mark the option as selected by default
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Restrict the option to the given user groups
    pub fn with_user_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.user_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Offer the option only under the given parent option ids
    pub fn with_parent_option_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.parent_option_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an arbitrary custom field
    pub fn with_custom_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_fields.insert(key.into(), value.into());
        self
    }

    /// Replace the visibility scope
    pub fn with_scope(mut self, scope: OptionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn scope(&self) -> &OptionScope {
        &self.scope
    }

    pub fn custom_fields(&self) -> &BTreeMap<String, Value> {
        &self.custom_fields
    }

    /// Look up a field for templating.
    ///
    /// `id` and `label` resolve to the option's own id and label unless a
    /// custom field shadows them.
    pub fn field(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.custom_fields.get(name) {
            return Some(value.clone());
        }
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "label" => Some(Value::String(self.label.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "option_test.rs"]
mod tests;
