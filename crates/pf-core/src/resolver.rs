//! Cascading resolution of a raw selection against a base parameter set.
//!
//! Parameters are visited parents first. Each one is narrowed to what the
//! user may see, then to what its parent's resolved selection allows, and
//! only then is the raw value applied. Resolution is pure and synchronous.

use crate::error::{CoreError, CoreResult};
use crate::option::OptionFilter;
use crate::parameter::Parameter;
use crate::parameter_set::{BaseParameterSet, ParameterSet};
use crate::selection::RawSelection;
use crate::user::UserAttributes;
use crate::widget::Validation;
use std::collections::{BTreeSet, HashMap, HashSet};

/// A selection that stopped being valid because a parent changed.
///
/// Not an error: the parameter falls back to its default (or, for
/// multi-selects, to the ids still available) and resolution continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleSelection {
    pub parameter: String,
    pub value: String,
    pub reason: String,
}

/// Result of resolving one request
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub parameters: ParameterSet,
    pub stale: Vec<StaleSelection>,
}

/// Which parameters a resolution returns.
///
/// The default returns every parameter. `parameters` limits the result to a
/// subset (a dataset's parameters, say); their ancestors are still resolved
/// so cascading stays correct. With `updates_only`, only the parameters
/// named in the raw selection and their descendants are returned, which is
/// what a client needs after changing a `trigger_refresh` parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResolveScope {
    pub parameters: Option<BTreeSet<String>>,
    pub updates_only: bool,
}

impl ResolveScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: Some(names.into_iter().map(Into::into).collect()),
            updates_only: false,
        }
    }

    pub fn updates_only(mut self) -> Self {
        self.updates_only = true;
        self
    }

    /// Names of the parameters the resolution returns
    fn targets<'b>(&self, base: &'b BaseParameterSet, raw: &RawSelection) -> HashSet<&'b str> {
        let in_subset = |name: &str| {
            self.parameters
                .as_ref()
                .map_or(true, |subset| subset.contains(name))
        };
        if let Some(subset) = &self.parameters {
            for name in subset.iter().filter(|n| base.get(n).is_none()) {
                log::debug!("Ignoring unknown parameter '{name}' in resolve scope");
            }
        }

        let order = base.resolution_order().iter().map(|n| n.as_str());
        let changed: HashSet<&str> = order
            .clone()
            .filter(|&name| raw.get(name).is_some() && in_subset(name))
            .collect();
        if !self.updates_only || changed.is_empty() {
            return order.filter(|&name| in_subset(name)).collect();
        }

        // Parents come first, so one pass collects every descendant
        let mut updated = changed;
        for name in order {
            let parent = base.get(name).and_then(Parameter::parent_name);
            if parent.is_some_and(|p| updated.contains(p.as_str())) && in_subset(name) {
                updated.insert(name);
            }
        }
        updated
    }
}

/// `targets` plus every ancestor they cascade from
fn with_ancestors<'b>(base: &'b BaseParameterSet, targets: &HashSet<&'b str>) -> HashSet<&'b str> {
    let mut needed = targets.clone();
    for name in targets {
        let mut current = base.get(name).and_then(Parameter::parent_name);
        while let Some(parent) = current {
            if !needed.insert(parent.as_str()) {
                break;
            }
            current = base.get(parent).and_then(Parameter::parent_name);
        }
    }
    needed
}

/// Resolve `raw` for `user`, discarding stale-selection reports
pub fn resolve(
    base: &BaseParameterSet,
    raw: &RawSelection,
    user: &UserAttributes,
) -> CoreResult<ParameterSet> {
    resolve_with_report(base, raw, user).map(|r| r.parameters)
}

/// Resolve `raw` for `user`.
///
/// Fails on the first raw value that does not parse or names an option the
/// user can never see. Parameters with nothing visible are dropped.
pub fn resolve_with_report(
    base: &BaseParameterSet,
    raw: &RawSelection,
    user: &UserAttributes,
) -> CoreResult<Resolution> {
    resolve_scoped(base, raw, user, &ResolveScope::all())
}

/// Resolve `raw` for `user`, returning only the parameters in `scope`.
///
/// Parameters outside the scope and its ancestors are not visited, so their
/// raw values are neither parsed nor reported.
pub fn resolve_scoped(
    base: &BaseParameterSet,
    raw: &RawSelection,
    user: &UserAttributes,
    scope: &ResolveScope,
) -> CoreResult<Resolution> {
    for name in raw.names().filter(|n| base.get(n).is_none()) {
        log::debug!("Ignoring selection for unknown parameter '{name}'");
    }

    let targets = scope.targets(base, raw);
    let needed = with_ancestors(base, &targets);

    let mut resolved: HashMap<&str, Parameter> = HashMap::new();
    let mut stale = Vec::new();

    for name in base.resolution_order() {
        if !needed.contains(name.as_str()) {
            continue;
        }
        let Some(param) = base.get(name) else {
            continue;
        };

        let groups = param.user_groups(user);
        let Some(user_view) = param.narrowed(&OptionFilter::for_user(groups.as_ref())) else {
            continue;
        };

        let view = match param.parent_name() {
            None => user_view.clone(),
            Some(parent) => {
                let parent_ids: BTreeSet<String> = resolved
                    .get(parent.as_str())
                    .and_then(Parameter::selected_option_ids)
                    .unwrap_or_default();
                let filter = OptionFilter {
                    user_groups: None,
                    parent_option_ids: Some(&parent_ids),
                };
                match user_view.narrowed(&filter) {
                    Some(view) => view,
                    None => continue,
                }
            }
        };

        let selected = match raw.get(name) {
            None => view,
            Some(values) => match view.with_selection(values) {
                Ok(selected) => selected,
                Err(err) if param.parent_name().is_some() && user_view.recognizes(values) => {
                    let reason = match err {
                        CoreError::InvalidParameterValue { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    let record = StaleSelection {
                        parameter: name.to_string(),
                        value: values.join(","),
                        reason,
                    };
                    log::info!(
                        "Corrected stale selection \"{}\" for parameter '{}': {}",
                        record.value,
                        record.parameter,
                        record.reason
                    );
                    stale.push(record);
                    view.corrected_from(values)
                }
                Err(err) => return Err(err),
            },
        };

        let selected = match selected.validate() {
            Validation::Valid => selected,
            Validation::CorrectedToDefault { reason } => {
                log::info!("Reset parameter '{name}' to its default: {reason}");
                selected.with_default_selection()
            }
            Validation::Invalid { reason } => {
                return Err(CoreError::invalid_config(name, reason));
            }
        };

        resolved.insert(name.as_str(), selected);
    }

    let parameters = base
        .parameters()
        .names()
        .filter(|name| targets.contains(name.as_str()))
        .filter_map(|name| resolved.remove(name.as_str()))
        .collect();

    Ok(Resolution {
        parameters: ParameterSet::new(parameters)?,
        stale,
    })
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
