//! Error types for the flow crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `GraphError`: Structural problems in a step tree (names, links, arity)
//! - `MigrationError`: Failures while rewriting or persisting a flow version
//!
//! Both carry only what the graph layer knows (step names, flow version
//! ids). Storage details stay in the source that produced them.

use piecework_core::FlowVersionId;
use std::fmt;

/// Errors from step graph operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two steps in the same flow version share a name.
    DuplicateStepName { step_name: String },
    /// A step has a different number of child slots than its kind declares.
    ChildCountMismatch {
        step_name: String,
        expected: usize,
        found: usize,
    },
    /// A router does not end with exactly one fallback branch.
    RouterFallbackMisplaced { step_name: String },
    /// A trigger kind appears somewhere other than the root.
    TriggerNotAtRoot { step_name: String },
    /// The root of a flow version is not a trigger.
    RootNotTrigger { step_name: String },
    /// A step's links reach back to itself.
    CycleDetected { step_name: String },
    /// A link points at a step that does not exist.
    UnknownStep {
        step_name: String,
        referenced_by: String,
    },
    /// A step is linked from more than one place.
    StepReferencedTwice { step_name: String },
    /// A step cannot be reached from the trigger.
    UnreachableStep { step_name: String },
    /// No step with the given name exists.
    StepNotFound { step_name: String },
    /// The requested location does not exist on the parent step.
    InvalidLocation { step_name: String, reason: String },
    /// The trigger is the root and cannot be removed.
    CannotRemoveTrigger { step_name: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateStepName { step_name } => {
                write!(f, "step name '{step_name}' is used more than once")
            }
            Self::ChildCountMismatch {
                step_name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "step '{step_name}' expects {expected} child slots but has {found}"
                )
            }
            Self::RouterFallbackMisplaced { step_name } => {
                write!(
                    f,
                    "router '{step_name}' must end with exactly one fallback branch"
                )
            }
            Self::TriggerNotAtRoot { step_name } => {
                write!(f, "trigger step '{step_name}' is not at the root of the flow")
            }
            Self::RootNotTrigger { step_name } => {
                write!(f, "root step '{step_name}' is not a trigger")
            }
            Self::CycleDetected { step_name } => {
                write!(f, "step '{step_name}' is part of a cycle")
            }
            Self::UnknownStep {
                step_name,
                referenced_by,
            } => {
                write!(
                    f,
                    "step '{referenced_by}' links to unknown step '{step_name}'"
                )
            }
            Self::StepReferencedTwice { step_name } => {
                write!(f, "step '{step_name}' is linked from more than one place")
            }
            Self::UnreachableStep { step_name } => {
                write!(f, "step '{step_name}' is not reachable from the trigger")
            }
            Self::StepNotFound { step_name } => write!(f, "step not found: {step_name}"),
            Self::InvalidLocation { step_name, reason } => {
                write!(f, "invalid location on step '{step_name}': {reason}")
            }
            Self::CannotRemoveTrigger { step_name } => {
                write!(f, "trigger '{step_name}' cannot be removed")
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from structural migrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// A legacy branch cannot be converted because its settings are malformed.
    MalformedBranch { step_name: String, reason: String },
    /// The stored flow version could not be decoded.
    Deserialize { reason: String },
    /// The migrated flow version failed structural validation.
    InvalidResult { source: GraphError },
    /// The migration has no inverse.
    Irreversible { migration: &'static str },
    /// Loading stored flow versions failed.
    SourceUnavailable { reason: String },
    /// The stored body belongs to a different flow version than the one it
    /// is stored as.
    IdMismatch {
        stored_as: FlowVersionId,
        found: FlowVersionId,
    },
    /// Writing a migrated flow version failed.
    Persist { reason: String },
    /// Flow version context (use as context wrapper).
    FlowVersion { flow_version_id: FlowVersionId },
}

impl MigrationError {
    /// Returns the step that caused the failure, when one is known.
    #[must_use]
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::MalformedBranch { step_name, .. } => Some(step_name),
            Self::InvalidResult { source } => match source {
                GraphError::DuplicateStepName { step_name }
                | GraphError::ChildCountMismatch { step_name, .. }
                | GraphError::RouterFallbackMisplaced { step_name }
                | GraphError::TriggerNotAtRoot { step_name }
                | GraphError::RootNotTrigger { step_name }
                | GraphError::CycleDetected { step_name }
                | GraphError::UnknownStep { step_name, .. }
                | GraphError::StepReferencedTwice { step_name }
                | GraphError::UnreachableStep { step_name }
                | GraphError::StepNotFound { step_name }
                | GraphError::InvalidLocation { step_name, .. }
                | GraphError::CannotRemoveTrigger { step_name } => Some(step_name),
            },
            _ => None,
        }
    }
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedBranch { step_name, reason } => {
                write!(f, "cannot migrate branch '{step_name}': {reason}")
            }
            Self::Deserialize { reason } => {
                write!(f, "stored flow version is not readable: {reason}")
            }
            Self::InvalidResult { source } => {
                write!(f, "migrated flow version is invalid: {source}")
            }
            Self::Irreversible { migration } => {
                write!(f, "migration '{migration}' cannot be reversed")
            }
            Self::SourceUnavailable { reason } => {
                write!(f, "flow version source unavailable: {reason}")
            }
            Self::IdMismatch { stored_as, found } => {
                write!(f, "flow version stored as {stored_as} has id {found}")
            }
            Self::Persist { reason } => write!(f, "failed to save flow version: {reason}"),
            Self::FlowVersion { flow_version_id } => {
                write!(f, "migration failed for flow version {flow_version_id}")
            }
        }
    }
}

impl std::error::Error for MigrationError {}

impl From<GraphError> for MigrationError {
    fn from(source: GraphError) -> Self {
        Self::InvalidResult { source }
    }
}
