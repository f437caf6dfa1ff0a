//! Base and resolved parameter sets

use crate::bounds::{Bounds, ScopedBounds};
use crate::dag::{DagNode, ParameterDag};
use crate::error::{CoreError, CoreResult};
use crate::names::ParameterName;
use crate::parameter::{Parameter, Widget};
use crate::widget::ScalarWidget;
use std::collections::{HashMap, HashSet};

/// Parameters keyed by name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
    index: HashMap<ParameterName, usize>,
}

impl ParameterSet {
    /// Assemble a set, rejecting duplicate names
    pub fn new(parameters: Vec<Parameter>) -> CoreResult<Self> {
        let mut index = HashMap::with_capacity(parameters.len());
        for (i, param) in parameters.iter().enumerate() {
            if index.insert(param.name().clone(), i).is_some() {
                return Err(CoreError::DuplicateParameter {
                    name: param.name().to_string(),
                });
            }
        }
        Ok(Self { parameters, index })
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.parameters[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &ParameterName> {
        self.parameters.iter().map(Parameter::name)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Distinct `user_attribute` names used by the parameters
    pub fn user_attributes(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.parameters
            .iter()
            .filter_map(Parameter::user_attribute)
            .filter(|attr| seen.insert(*attr))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

/// The unselected parameter set of a project.
///
/// Built once per project (or per cache lifetime) and shared read-only by
/// every request. `generation` changes on every rebuild so results derived
/// from an older build can be told apart.
#[derive(Debug, Clone)]
pub struct BaseParameterSet {
    set: ParameterSet,
    resolution_order: Vec<ParameterName>,
    generation: u64,
}

impl BaseParameterSet {
    /// Validate relationships and assemble the base set.
    ///
    /// Derives `trigger_refresh` for every parameter that has children.
    pub fn new(mut parameters: Vec<Parameter>, generation: u64) -> CoreResult<Self> {
        let dag = {
            let nodes: Vec<DagNode<'_>> = parameters
                .iter()
                .map(|p| DagNode {
                    name: p.name(),
                    kind: p.kind(),
                    parent: p.parent_name(),
                })
                .collect();
            ParameterDag::build(&nodes)?
        };

        for param in &mut parameters {
            let has_children = dag.has_dependents(param.name());
            param.set_trigger_refresh(has_children);
        }
        for param in &parameters {
            if param.parent_name().is_some() {
                check_unique_parent_ids(param)?;
            }
        }

        Ok(Self {
            resolution_order: dag.topological_order_names()?,
            set: ParameterSet::new(parameters)?,
            generation,
        })
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.set
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.set.get(name)
    }

    /// Parameter names with parents before children
    pub fn resolution_order(&self) -> &[ParameterName] {
        &self.resolution_order
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Each parent option id may select at most one bound record per user
/// group; otherwise the record in effect would depend on declaration order.
fn check_unique_parent_ids(param: &Parameter) -> CoreResult<()> {
    let conflict = match param.widget() {
        Widget::SingleSelect(_) | Widget::MultiSelect(_) => None,
        Widget::Date(w) => first_conflict(w),
        Widget::DateRange(w) => first_conflict(w),
        Widget::Number(w) => first_conflict(w),
        Widget::NumberRange(w) => first_conflict(w),
        Widget::Text(w) => first_conflict(w),
    };
    match conflict {
        Some((group, parent_id)) => Err(CoreError::invalid_config(
            param.name(),
            match group {
                Some(group) => format!(
                    "parent option id \"{parent_id}\" appears in more than one option for user group \"{group}\""
                ),
                None => format!("parent option id \"{parent_id}\" appears in more than one option"),
            },
        )),
        None => Ok(()),
    }
}

fn first_conflict<B: Bounds>(widget: &ScalarWidget<B>) -> Option<(Option<String>, String)> {
    let mut seen: HashSet<(Option<&str>, &str)> = HashSet::new();
    for ScopedBounds { scope, .. } in widget.records() {
        let groups: Vec<Option<&str>> = if scope.user_groups.is_empty() {
            vec![None]
        } else {
            scope.user_groups.iter().map(|g| Some(g.as_str())).collect()
        };
        for group in groups {
            for parent_id in &scope.parent_option_ids {
                if !seen.insert((group, parent_id.as_str())) {
                    return Some((group.map(str::to_string), parent_id.clone()));
                }
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "parameter_set_test.rs"]
mod tests;
