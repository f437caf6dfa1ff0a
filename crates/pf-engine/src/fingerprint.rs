//! Request fingerprints keying the resolved-set cache.

use pf_core::selection::{parse_list, single_value};
use pf_core::{BaseParameterSet, Parameter, RawSelection, ResolveScope, UserAttributes, Widget};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// SHA-256 over the canonical form of everything resolution reads.
///
/// Selection entries for unknown parameters and user attributes that no
/// parameter consults are left out, so requests that cannot resolve
/// differently share a fingerprint, as do the equivalent spellings of a list
/// value. The base set generation is included so a rebuilt base never
/// serves entries resolved from the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_request(
        project_id: &str,
        base: &BaseParameterSet,
        raw: &RawSelection,
        user: &UserAttributes,
        scope: &ResolveScope,
    ) -> Self {
        let selection = canonical_selection(base, raw);
        let signature = user.signature(base.parameters().user_attributes());
        let canonical = json!({
            "project": project_id,
            "generation": base.generation(),
            "selection": selection,
            "user": signature,
            "scope": {
                "parameters": &scope.parameters,
                "updates_only": scope.updates_only,
            },
        });

        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw values in the form the widget reads them.
///
/// Lists are flattened, multi-select ids deduplicated (and sorted unless
/// order matters) and single values trimmed. Text stays as sent.
fn canonical_selection(base: &BaseParameterSet, raw: &RawSelection) -> BTreeMap<String, Vec<String>> {
    raw.normalized(|name| base.get(name).is_some())
        .into_iter()
        .map(|(name, values)| {
            let values = match base.get(&name).map(Parameter::widget) {
                Some(Widget::MultiSelect(w)) => {
                    let mut ids = parse_list(&values);
                    let mut seen = HashSet::new();
                    ids.retain(|id| seen.insert(id.clone()));
                    if !w.order_matters() {
                        ids.sort();
                    }
                    ids
                }
                Some(Widget::DateRange(_) | Widget::NumberRange(_)) => parse_list(&values),
                Some(Widget::SingleSelect(_) | Widget::Date(_) | Widget::Number(_)) => {
                    let single = single_value(&values).ok().map(str::to_string);
                    single.map_or(values, |value| vec![value])
                }
                _ => values,
            };
            (name, values)
        })
        .collect()
}

#[cfg(test)]
#[path = "fingerprint_test.rs"]
mod tests;
