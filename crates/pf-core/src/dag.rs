//! Parent/child dependency graph between parameters

use crate::error::{CoreError, CoreResult};
use crate::names::ParameterName;
use crate::parameter::WidgetKind;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// One parameter as seen by the graph
#[derive(Debug, Clone, Copy)]
pub struct DagNode<'a> {
    pub name: &'a ParameterName,
    pub kind: WidgetKind,
    pub parent: Option<&'a ParameterName>,
}

/// A directed acyclic graph of `parent_name` links.
///
/// Edges point from parent to child so a topological sort yields parents
/// first.
#[derive(Debug)]
pub struct ParameterDag {
    graph: DiGraph<ParameterName, ()>,
    node_map: HashMap<ParameterName, NodeIndex>,
}

impl ParameterDag {
    /// Build the graph, checking every relationship rule.
    ///
    /// Fails on duplicate names, unknown parents, parents of the wrong
    /// kind, or cycles.
    pub fn build(nodes: &[DagNode<'_>]) -> CoreResult<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();
        let mut kinds = HashMap::new();

        for node in nodes {
            if node_map.contains_key(node.name) {
                return Err(CoreError::DuplicateParameter {
                    name: node.name.to_string(),
                });
            }
            let idx = graph.add_node(node.name.clone());
            node_map.insert(node.name.clone(), idx);
            kinds.insert(node.name.as_str(), node.kind);
        }

        for node in nodes {
            let Some(parent) = node.parent else {
                continue;
            };
            let parent_kind =
                kinds
                    .get(parent.as_str())
                    .copied()
                    .ok_or_else(|| CoreError::UnknownParent {
                        name: node.name.to_string(),
                        parent: parent.to_string(),
                    })?;
            check_parent_kind(node, parent, parent_kind)?;
            graph.add_edge(node_map[parent], node_map[node.name], ());
        }

        let dag = Self { graph, node_map };
        dag.validate()?;
        Ok(dag)
    }

    /// Validate the graph has no cycles
    pub fn validate(&self) -> CoreResult<()> {
        self.topological_order_names().map(|_| ())
    }

    /// Find a cycle path starting from a node for error reporting
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let mut path: Vec<String> = vec![self.graph[start].to_string()];
        let mut current = start;
        let mut visited = HashSet::new();
        visited.insert(current);

        while let Some(edge) = self.graph.edges(current).next() {
            let target = edge.target();
            path.push(self.graph[target].to_string());

            if target == start || visited.contains(&target) {
                break;
            }

            visited.insert(target);
            current = target;
        }

        path.join(" -> ")
    }

    /// Parameter names with every parent before its children
    pub fn topological_order_names(&self) -> CoreResult<Vec<ParameterName>> {
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => Err(CoreError::CircularDependency {
                cycle: self.find_cycle_path(cycle.node_id()),
            }),
        }
    }

    pub fn has_dependents(&self, name: &str) -> bool {
        self.node_map.get(name).is_some_and(|&idx| {
            self.graph
                .edges_directed(idx, petgraph::Direction::Outgoing)
                .next()
                .is_some()
        })
    }
}

/// Only selects can be parents, and non-select children need a
/// single-select parent so their bounds resolve to one record.
fn check_parent_kind(
    child: &DagNode<'_>,
    parent: &ParameterName,
    parent_kind: WidgetKind,
) -> CoreResult<()> {
    let reason = if !parent_kind.is_select() {
        format!("parent is a {parent_kind} parameter; only select parameters can be parents")
    } else if !child.kind.is_select() && parent_kind != WidgetKind::SingleSelect {
        format!("a {} parameter requires a single_select parent", child.kind)
    } else {
        return Ok(());
    };
    Err(CoreError::InvalidParent {
        name: child.name.to_string(),
        parent: parent.to_string(),
        reason,
    })
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
