//! Assembly of a flat, name-linked step list into an owned tree.
//!
//! Imported and hand-edited flows arrive as an arena of steps keyed by
//! name, with links expressed as step names. Such data can describe
//! shapes an owned tree cannot: cycles, shared subtrees, dangling links.
//! Those are rejected here, before anything is assembled or traversed.

use crate::error::GraphError;
use crate::step::Step;
use crate::validate::validate_tree;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A step whose links are step names rather than owned subtrees.
///
/// `step`'s own child slots and `nextAction` are ignored; they are filled
/// from `next_action` and `children` during assembly. `children` follows
/// the kind's declared slot order (loop body; success, failure; router
/// branches in order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatStep {
    pub step: Step,
    #[serde(default)]
    pub next_action: Option<String>,
    #[serde(default)]
    pub children: Vec<Option<String>>,
}

/// A flow described as a flat list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatFlow {
    /// Name of the root trigger.
    pub trigger: String,
    pub steps: Vec<FlatStep>,
}

impl FlatFlow {
    /// Assembles the owned step tree and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate names, links to unknown steps,
    /// cycles, steps linked from two places, steps unreachable from the
    /// trigger, wrong child counts, or any [`crate::validate`] violation.
    pub fn into_tree(self) -> Result<Step, GraphError> {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        for flat in &self.steps {
            let name = flat.step.name.clone();
            if index.contains_key(&name) {
                return Err(GraphError::DuplicateStepName { step_name: name });
            }
            let node = graph.add_node(name.clone());
            index.insert(name, node);
        }

        let root = *index.get(&self.trigger).ok_or_else(|| GraphError::StepNotFound {
            step_name: self.trigger.clone(),
        })?;

        for flat in &self.steps {
            let source = index[&flat.step.name];
            let expected = flat.step.kind.expected_child_count();
            if flat.children.len() != expected {
                return Err(GraphError::ChildCountMismatch {
                    step_name: flat.step.name.clone(),
                    expected,
                    found: flat.children.len(),
                });
            }
            let targets = flat
                .children
                .iter()
                .flatten()
                .chain(flat.next_action.iter());
            for target in targets {
                let Some(&target_node) = index.get(target) else {
                    return Err(GraphError::UnknownStep {
                        step_name: target.clone(),
                        referenced_by: flat.step.name.clone(),
                    });
                };
                graph.add_edge(source, target_node, ());
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(GraphError::CycleDetected {
                step_name: graph[cycle.node_id()].clone(),
            });
        }

        for node in graph.node_indices() {
            let incoming = graph.edges_directed(node, Direction::Incoming).count();
            if incoming > 1 || (node == root && incoming > 0) {
                return Err(GraphError::StepReferencedTwice {
                    step_name: graph[node].clone(),
                });
            }
        }

        let mut reachable = vec![false; graph.node_count()];
        let mut dfs = Dfs::new(&graph, root);
        while let Some(node) = dfs.next(&graph) {
            reachable[node.index()] = true;
        }
        if let Some(node) = graph.node_indices().find(|n| !reachable[n.index()]) {
            return Err(GraphError::UnreachableStep {
                step_name: graph[node].clone(),
            });
        }

        let mut pool: HashMap<String, FlatStep> = self
            .steps
            .into_iter()
            .map(|flat| (flat.step.name.clone(), flat))
            .collect();
        let tree = assemble(&self.trigger, &mut pool)?;
        validate_tree(&tree)?;
        Ok(tree)
    }
}

fn assemble(name: &str, pool: &mut HashMap<String, FlatStep>) -> Result<Step, GraphError> {
    let FlatStep {
        mut step,
        next_action,
        children,
    } = pool.remove(name).ok_or_else(|| GraphError::StepReferencedTwice {
        step_name: name.to_string(),
    })?;

    for (slot, child) in step.kind.children_mut().into_iter().zip(children) {
        *slot = match child {
            Some(child) => Some(Box::new(assemble(&child, pool)?)),
            None => None,
        };
    }
    step.next_action = match next_action {
        Some(next) => Some(Box::new(assemble(&next, pool)?)),
        None => None,
    };
    Ok(step)
}
