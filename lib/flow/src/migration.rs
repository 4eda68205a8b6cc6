//! Structural migrations over flow versions.
//!
//! A migration rewrites the step tree of one flow version in place and
//! reports whether anything changed, so callers persist only what moved.
//! Migrations that cannot be undone say so from `down` instead of
//! pretending to succeed.

use crate::error::MigrationError;
use crate::step::{BranchSettings, RouterBranch, RouterExecutionType, RouterSettings, StepKind};
use crate::traverse::{StepVisitor, try_traverse};
use crate::version::FlowVersion;
use tracing::debug;

/// A structural rewrite of a flow version.
pub trait Migration: Send + Sync {
    /// Stable identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Applies the migration. Returns `true` if the flow version changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a step cannot be migrated. The flow version may
    /// be partially rewritten and should be discarded.
    fn up(&self, version: &mut FlowVersion) -> Result<bool, MigrationError>;

    /// Reverts the migration.
    ///
    /// # Errors
    ///
    /// The default implementation always returns
    /// [`MigrationError::Irreversible`].
    fn down(&self, version: &mut FlowVersion) -> Result<bool, MigrationError> {
        let _ = version;
        Err(MigrationError::Irreversible {
            migration: self.name(),
        })
    }
}

/// Replaces every legacy branch with an equivalent two-way router.
///
/// The router gets a `CONDITION` branch carrying the original conditions
/// and a `FALLBACK` branch; `children` are `[onSuccessAction,
/// onFailureAction]`. The step's `nextAction` is not touched. Running it
/// again is a no-op because routers are not branches.
///
/// There is no `down`: a router with more than two branches, or edited
/// after migration, has no branch equivalent.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchToRouter;

impl Migration for BranchToRouter {
    fn name(&self) -> &'static str {
        "branch-to-router"
    }

    fn up(&self, version: &mut FlowVersion) -> Result<bool, MigrationError> {
        let changed = try_traverse(&mut version.trigger, &mut BranchToRouterVisitor)?;
        if changed {
            version.touch();
        }
        Ok(changed)
    }
}

struct BranchToRouterVisitor;

impl StepVisitor for BranchToRouterVisitor {
    type Error = MigrationError;

    fn visit(&mut self, step_name: &str, kind: &StepKind) -> Result<Option<StepKind>, MigrationError> {
        let router = branch_to_router(step_name, kind)?;
        if router.is_some() {
            debug!(step = %step_name, "converted branch to router");
        }
        Ok(router)
    }
}

/// Builds the router kind that replaces one legacy branch kind.
///
/// Returns `Ok(None)` if `kind` is not a branch. The router's two child
/// slots are left empty; the traversal driver moves the branch's
/// `onSuccessAction` and `onFailureAction` into them.
///
/// # Errors
///
/// Returns [`MigrationError::MalformedBranch`] if the branch has no
/// conditions or a comparison is missing its second value.
pub fn branch_to_router(step_name: &str, kind: &StepKind) -> Result<Option<StepKind>, MigrationError> {
    let StepKind::Branch { settings, .. } = kind else {
        return Ok(None);
    };

    check_conditions(step_name, settings)?;

    Ok(Some(StepKind::Router {
        settings: RouterSettings {
            branches: vec![
                RouterBranch::Condition {
                    branch_name: "Branch 1".to_string(),
                    conditions: settings.conditions.clone(),
                },
                RouterBranch::Fallback {
                    branch_name: "Otherwise".to_string(),
                },
            ],
            execution_type: RouterExecutionType::ExecuteFirstMatch,
        },
        children: vec![None, None],
    }))
}

fn check_conditions(step_name: &str, settings: &BranchSettings) -> Result<(), MigrationError> {
    if settings.conditions.iter().all(Vec::is_empty) {
        return Err(MigrationError::MalformedBranch {
            step_name: step_name.to_string(),
            reason: "branch has no conditions".to_string(),
        });
    }
    let incomplete = settings
        .conditions
        .iter()
        .flatten()
        .find(|c| !c.operator.is_unary() && c.second_value.is_none());
    if let Some(condition) = incomplete {
        return Err(MigrationError::MalformedBranch {
            step_name: step_name.to_string(),
            reason: format!(
                "condition on '{}' has no value to compare against",
                condition.first_value
            ),
        });
    }
    Ok(())
}
