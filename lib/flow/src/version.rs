//! Flow versions and in-place graph edits.
//!
//! A flow version exclusively owns its step tree, rooted at the trigger.
//! Edits never drop the remainder of a chain: inserting into an occupied
//! slot chains the previous occupant after the new step, and removing a
//! step puts the removed step's `nextAction` into the slot it vacated.

use crate::error::GraphError;
use crate::step::{RouterBranch, Step, StepKind, StepSlot};
use chrono::{DateTime, Utc};
use piecework_core::{FlowId, FlowVersionId};
use serde::{Deserialize, Serialize};

/// One immutable snapshot of a flow's step graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVersion {
    pub id: FlowVersionId,
    pub flow_id: FlowId,
    pub display_name: String,
    /// Root of the step tree.
    pub trigger: Step,
    #[serde(default)]
    pub valid: bool,
    pub updated_at: DateTime<Utc>,
}

/// Where to insert a new step, relative to an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepLocation {
    /// As the parent's `nextAction`.
    After { parent: String },
    /// As the first step of a loop body.
    IntoLoop { parent: String },
    /// As the first step of one router branch.
    IntoRouterBranch { parent: String, branch_index: usize },
}

impl StepLocation {
    fn parent(&self) -> &str {
        match self {
            Self::After { parent }
            | Self::IntoLoop { parent }
            | Self::IntoRouterBranch { parent, .. } => parent,
        }
    }
}

impl FlowVersion {
    /// Creates a flow version around `trigger` and stamps ownership on
    /// every step.
    #[must_use]
    pub fn new(flow_id: FlowId, display_name: impl Into<String>, trigger: Step) -> Self {
        let mut version = Self {
            id: FlowVersionId::new(),
            flow_id,
            display_name: display_name.into(),
            trigger,
            valid: false,
            updated_at: Utc::now(),
        };
        version.stamp_ownership();
        version
    }

    /// Sets `flow_version_id` on every step to this version's id.
    pub fn stamp_ownership(&mut self) {
        stamp(&mut self.trigger, self.id);
    }

    /// Bumps `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns the step with the given name.
    #[must_use]
    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.steps().into_iter().find(|step| step.name == name)
    }

    /// Returns every step, in traversal order.
    #[must_use]
    pub fn steps(&self) -> Vec<&Step> {
        let mut steps = Vec::new();
        self.trigger.walk(&mut |step| steps.push(step));
        steps
    }

    /// Returns every step name, in traversal order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps().into_iter().map(|step| step.name.as_str()).collect()
    }

    /// Inserts `step` (and its own `nextAction` chain) at `location`.
    ///
    /// # Errors
    ///
    /// Returns an error if a step with the same name already exists, the
    /// parent does not exist, or the parent has no such slot.
    pub fn insert_step(&mut self, location: StepLocation, mut step: Step) -> Result<(), GraphError> {
        let mut incoming = Vec::new();
        step.walk(&mut |s| incoming.push(s.name.clone()));
        for name in &incoming {
            if self.get_step(name).is_some() {
                return Err(GraphError::DuplicateStepName {
                    step_name: name.clone(),
                });
            }
        }

        stamp(&mut step, self.id);
        let parent_name = location.parent().to_string();
        let parent = find_mut(&mut self.trigger, &parent_name).ok_or_else(|| {
            GraphError::StepNotFound {
                step_name: parent_name.clone(),
            }
        })?;

        let slot = match &location {
            StepLocation::After { .. } => &mut parent.next_action,
            StepLocation::IntoLoop { .. } => match &mut parent.kind {
                StepKind::LoopOnItems {
                    first_loop_action, ..
                } => first_loop_action,
                other => {
                    return Err(GraphError::InvalidLocation {
                        step_name: parent_name,
                        reason: format!("{} is not a loop", other.type_name()),
                    });
                }
            },
            StepLocation::IntoRouterBranch { branch_index, .. } => match &mut parent.kind {
                StepKind::Router { children, .. } => {
                    let count = children.len();
                    children.get_mut(*branch_index).ok_or_else(|| {
                        GraphError::InvalidLocation {
                            step_name: parent_name.clone(),
                            reason: format!("router has {count} branches, no branch {branch_index}"),
                        }
                    })?
                }
                other => {
                    return Err(GraphError::InvalidLocation {
                        step_name: parent_name,
                        reason: format!("{} is not a router", other.type_name()),
                    });
                }
            },
        };

        let previous = slot.take();
        step.last_mut().next_action = previous;
        *slot = Some(Box::new(step));
        self.touch();
        Ok(())
    }

    /// Removes the named step and returns it without its `nextAction`.
    ///
    /// The slot that held the step (a `nextAction`, loop body, branch arm
    /// or router child) now holds the removed step's `nextAction`. The
    /// removed step keeps its own children.
    ///
    /// # Errors
    ///
    /// Returns an error if the step does not exist or is the trigger.
    pub fn remove_step(&mut self, name: &str) -> Result<Step, GraphError> {
        if self.trigger.name == name {
            return Err(GraphError::CannotRemoveTrigger {
                step_name: name.to_string(),
            });
        }
        let removed = detach_within(&mut self.trigger, name).ok_or_else(|| {
            GraphError::StepNotFound {
                step_name: name.to_string(),
            }
        })?;
        self.touch();
        Ok(*removed)
    }

    /// Adds a condition branch to a router, just before its fallback.
    ///
    /// The new branch starts with an empty child so branches and children
    /// stay aligned.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is missing, is not a router, or
    /// `branch` is a fallback.
    pub fn add_router_branch(&mut self, router: &str, branch: RouterBranch) -> Result<(), GraphError> {
        if branch.is_fallback() {
            return Err(GraphError::RouterFallbackMisplaced {
                step_name: router.to_string(),
            });
        }
        let step = find_mut(&mut self.trigger, router).ok_or_else(|| GraphError::StepNotFound {
            step_name: router.to_string(),
        })?;
        let type_name = step.kind.type_name();
        let StepKind::Router { settings, children } = &mut step.kind else {
            return Err(GraphError::InvalidLocation {
                step_name: router.to_string(),
                reason: format!("{type_name} is not a router"),
            });
        };
        let position = settings
            .branches
            .iter()
            .position(RouterBranch::is_fallback)
            .unwrap_or(settings.branches.len());
        settings.branches.insert(position, branch);
        children.insert(position.min(children.len()), None);
        self.touch();
        Ok(())
    }
}

fn stamp(step: &mut Step, id: FlowVersionId) {
    step.flow_version_id = Some(id);
    for slot in step.kind.children_mut() {
        if let Some(child) = slot.as_deref_mut() {
            stamp(child, id);
        }
    }
    if let Some(next) = step.next_action.as_deref_mut() {
        stamp(next, id);
    }
}

fn find_mut<'a>(step: &'a mut Step, name: &str) -> Option<&'a mut Step> {
    if step.name == name {
        return Some(step);
    }
    for slot in step.kind.children_mut() {
        if let Some(found) = slot.as_deref_mut().and_then(|child| find_mut(child, name)) {
            return Some(found);
        }
    }
    step.next_action
        .as_deref_mut()
        .and_then(|next| find_mut(next, name))
}

fn detach_within(step: &mut Step, name: &str) -> Option<Box<Step>> {
    for slot in step.kind.children_mut() {
        if let Some(removed) = detach(slot, name) {
            return Some(removed);
        }
    }
    detach(&mut step.next_action, name)
}

fn detach(slot: &mut StepSlot, name: &str) -> Option<Box<Step>> {
    if slot.as_ref().is_some_and(|step| step.name == name) {
        let mut removed = slot.take()?;
        *slot = removed.next_action.take();
        return Some(removed);
    }
    detach_within(slot.as_deref_mut()?, name)
}
