//! Depth-first traversal with per-node rewrites.
//!
//! The driver owns every link. A visitor sees one step's name and kind and
//! may answer with a replacement kind. It never holds a mutable reference
//! into the tree: when a replacement comes back, the driver detaches the
//! step's children, installs the new kind and moves the children into its
//! slots in order with [`Step::replace_child`]. `nextAction` is never
//! touched by a rewrite.
//!
//! Visiting order:
//! - router, loop and leaf kinds are visited before their children
//! - a legacy branch is visited after both of its arms
//! - the `nextAction` chain is always walked last
//!
//! Children are read from the node *after* the rewrite, so a visitor that
//! changes the kind also changes what is descended into.

use crate::error::GraphError;
use crate::step::{Step, StepKind, StepSlot};

/// A per-node rewrite applied by [`try_traverse`].
pub trait StepVisitor {
    /// Error that aborts the traversal. A replacement that cannot hold the
    /// node's children is reported through the [`GraphError`] conversion.
    type Error: From<GraphError>;

    /// Inspects one node and returns its replacement, if any.
    ///
    /// Child slots of the replacement are overwritten by the driver, so
    /// they are best left empty.
    fn visit(&mut self, step_name: &str, kind: &StepKind) -> Result<Option<StepKind>, Self::Error>;
}

/// Walks the tree rooted at `root`, applying `visitor` to every step.
///
/// Returns `true` if the visitor replaced at least one step. The first
/// error stops the walk; steps already rewritten stay rewritten, so callers
/// that need all-or-nothing semantics should run this on a copy or discard
/// the tree on error.
///
/// # Errors
///
/// Returns the first error produced by the visitor, or
/// [`GraphError::ChildCountMismatch`] (converted into the visitor's error)
/// if a replacement has fewer child slots than the node has children.
pub fn try_traverse<V>(root: &mut Step, visitor: &mut V) -> Result<bool, V::Error>
where
    V: StepVisitor + ?Sized,
{
    let mut changed = false;

    if matches!(root.kind, StepKind::Branch { .. }) {
        for slot in root.kind.children_mut() {
            changed |= traverse_slot(slot, visitor)?;
        }
        changed |= visit_node(root, visitor)?;
    } else {
        changed |= visit_node(root, visitor)?;
        for slot in root.kind.children_mut() {
            changed |= traverse_slot(slot, visitor)?;
        }
    }

    changed |= traverse_slot(&mut root.next_action, visitor)?;
    Ok(changed)
}

fn traverse_slot<V>(slot: &mut StepSlot, visitor: &mut V) -> Result<bool, V::Error>
where
    V: StepVisitor + ?Sized,
{
    match slot.as_deref_mut() {
        Some(step) => try_traverse(step, visitor),
        None => Ok(false),
    }
}

fn visit_node<V>(step: &mut Step, visitor: &mut V) -> Result<bool, V::Error>
where
    V: StepVisitor + ?Sized,
{
    match visitor.visit(&step.name, &step.kind)? {
        Some(kind) => {
            relink(step, kind)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Installs `kind` on `step`, carrying the step's children over slot by slot.
///
/// Nothing is changed if the new kind cannot hold every occupied slot.
fn relink(step: &mut Step, kind: StepKind) -> Result<(), GraphError> {
    let occupied = step
        .kind
        .children()
        .iter()
        .rposition(|slot| slot.is_some())
        .map_or(0, |last| last + 1);
    if kind.child_count() < occupied {
        return Err(GraphError::ChildCountMismatch {
            step_name: step.name.clone(),
            expected: occupied,
            found: kind.child_count(),
        });
    }

    let mut detached = Vec::with_capacity(occupied);
    for position in 0..occupied {
        detached.push(step.replace_child(position, None)?);
    }
    step.kind = kind;
    for (position, child) in detached.into_iter().enumerate() {
        step.replace_child(position, child)?;
    }
    Ok(())
}

struct FnVisitor<F>(F);

impl<F> StepVisitor for FnVisitor<F>
where
    F: FnMut(&StepKind) -> Option<StepKind>,
{
    type Error = GraphError;

    fn visit(&mut self, _step_name: &str, kind: &StepKind) -> Result<Option<StepKind>, GraphError> {
        Ok((self.0)(kind))
    }
}

/// [`try_traverse`] with a closure that has no failure of its own.
///
/// Returns `true` if `visit` replaced at least one step.
///
/// # Errors
///
/// Returns [`GraphError::ChildCountMismatch`] if a replacement cannot hold
/// the children of the step it replaces.
pub fn traverse<F>(root: &mut Step, visit: F) -> Result<bool, GraphError>
where
    F: FnMut(&StepKind) -> Option<StepKind>,
{
    try_traverse(root, &mut FnVisitor(visit))
}
