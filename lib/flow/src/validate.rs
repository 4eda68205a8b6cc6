//! Structural validation of a flow version's step tree.
//!
//! The owned tree cannot hold a cycle, so acyclicity is enforced where
//! trees are assembled from name-linked data (see [`crate::import`]).
//! This module checks the remaining invariants on an assembled tree.

use crate::error::GraphError;
use crate::step::{Step, StepKind};
use crate::version::FlowVersion;
use std::collections::HashSet;

/// Validates a flow version.
///
/// Checks:
/// - The root is a trigger and no other step is
/// - Step names are unique
/// - Every step has as many child slots as its kind declares
/// - Every router ends with exactly one fallback branch
///
/// # Errors
///
/// Returns the first violation found, in traversal order.
pub fn validate(version: &FlowVersion) -> piecework_core::Result<(), GraphError> {
    validate_tree(&version.trigger).map_err(Into::into)
}

pub(crate) fn validate_tree(root: &Step) -> Result<(), GraphError> {
    if !root.is_trigger() {
        return Err(GraphError::RootNotTrigger {
            step_name: root.name.clone(),
        });
    }

    let mut steps = Vec::new();
    root.walk(&mut |step| steps.push(step));

    let mut names = HashSet::with_capacity(steps.len());
    for step in steps {
        if !names.insert(step.name.as_str()) {
            return Err(GraphError::DuplicateStepName {
                step_name: step.name.clone(),
            });
        }
        if step.is_trigger() && !std::ptr::eq(step, root) {
            return Err(GraphError::TriggerNotAtRoot {
                step_name: step.name.clone(),
            });
        }
        check_children(step)?;
    }
    Ok(())
}

fn check_children(step: &Step) -> Result<(), GraphError> {
    let expected = step.kind.expected_child_count();
    let found = step.kind.child_count();
    if expected != found {
        return Err(GraphError::ChildCountMismatch {
            step_name: step.name.clone(),
            expected,
            found,
        });
    }

    if let StepKind::Router { settings, .. } = &step.kind {
        let fallbacks = settings.branches.iter().filter(|b| b.is_fallback()).count();
        let last_is_fallback = settings.branches.last().is_some_and(|b| b.is_fallback());
        if fallbacks != 1 || !last_is_fallback {
            return Err(GraphError::RouterFallbackMisplaced {
                step_name: step.name.clone(),
            });
        }
    }
    Ok(())
}
