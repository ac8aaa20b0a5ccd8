//! Field dependency graph.
//!
//! `showWhen` and `linkedValues` are flat declarative edges between inputs:
//!
//! - **Visibility**: `B → A` when `A.showWhen.field == B` (A's visibility depends on B)
//! - **Link**: `A → C` when selecting an option of A writes a value into C
//!
//! The graph is built and checked once per configuration. Resolution then walks
//! [`DependencyGraph::order`], so every controller is settled before the fields
//! that depend on it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::schema::CalculatorConfig;

/// Why one field depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    Visibility,
    Link,
}

/// Directed edge: `to` reacts to the value of `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from: String,
    pub to: String,
    pub kind: DependencyKind,
}

/// Validated, acyclic dependency graph with a stable evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: Vec<Dependency>,
    order: Vec<String>,
}

impl DependencyGraph {
    /// Raw edges declared by `config`, in declaration order. Unchecked.
    pub fn edges_of(config: &CalculatorConfig) -> Vec<Dependency> {
        let mut edges = Vec::new();
        for input in &config.inputs {
            if let Some(show_when) = &input.show_when {
                edges.push(Dependency {
                    from: show_when.field.clone(),
                    to: input.id.clone(),
                    kind: DependencyKind::Visibility,
                });
            }
            let targets: BTreeSet<&String> = input
                .linked_values
                .values()
                .flat_map(|writes| writes.keys())
                .collect();
            for target in targets {
                edges.push(Dependency {
                    from: input.id.clone(),
                    to: target.clone(),
                    kind: DependencyKind::Link,
                });
            }
        }
        edges
    }

    /// Build the graph, or return every problem found.
    ///
    /// Problems: edges naming undeclared fields, self-references, and cycles.
    pub fn build(config: &CalculatorConfig) -> Result<Self, Vec<String>> {
        let ids: Vec<&str> = config.inputs.iter().map(|i| i.id.as_str()).collect();
        let edges = Self::edges_of(config);
        let mut issues = Vec::new();

        for edge in &edges {
            let (owner, other) = match edge.kind {
                DependencyKind::Visibility => (&edge.to, &edge.from),
                DependencyKind::Link => (&edge.from, &edge.to),
            };
            let what = match edge.kind {
                DependencyKind::Visibility => "showWhen.field",
                DependencyKind::Link => "linkedValues target",
            };
            if !ids.contains(&other.as_str()) {
                issues.push(format!("input '{owner}': {what} '{other}' is not a declared input"));
            } else if edge.from == edge.to {
                issues.push(format!("input '{owner}': {what} refers to itself"));
            }
        }
        if !issues.is_empty() {
            return Err(issues);
        }

        match topological_order(&ids, &edges) {
            Ok(order) => Ok(DependencyGraph { edges, order }),
            Err(stuck) => Err(vec![format!(
                "dependency cycle between inputs: {}",
                stuck.join(", ")
            )]),
        }
    }

    pub fn edges(&self) -> &[Dependency] {
        &self.edges
    }

    /// Every input id, controllers before dependents, declaration order otherwise.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Fields that react to `id`
    pub fn dependents_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Dependency> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }
}

/// Kahn's algorithm, always releasing the earliest-declared ready node.
///
/// On a cycle, returns the ids that could not be ordered.
fn topological_order(ids: &[&str], edges: &[Dependency]) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: Vec<usize> = ids
        .iter()
        .map(|id| edges.iter().filter(|e| e.to == *id).count())
        .collect();
    let mut done = vec![false; ids.len()];
    let mut order = Vec::with_capacity(ids.len());

    while order.len() < ids.len() {
        let Some(next) = (0..ids.len()).find(|&i| !done[i] && indegree[i] == 0) else {
            let stuck = (0..ids.len())
                .filter(|&i| !done[i])
                .map(|i| ids[i].to_string())
                .collect();
            return Err(stuck);
        };
        done[next] = true;
        order.push(ids[next].to_string());
        for edge in edges.iter().filter(|e| e.from == ids[next]) {
            if let Some(j) = ids.iter().position(|id| *id == edge.to) {
                indegree[j] = indegree[j].saturating_sub(1);
            }
        }
    }
    Ok(order)
}
