//! Step node types and settings.
//!
//! A step is the unit of a flow's graph. Every step has:
//! - A name that is unique within its flow version
//! - A kind, tagged by `type` on the wire, with kind-specific settings
//! - An optional `nextAction`, the sequential continuation
//! - Kind-specific child slots (loop body, branch arms, router children)
//!
//! Steps own their children by value, so a tree can be serialized as-is
//! and a step can never be shared between two parents.

use piecework_core::FlowVersionId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A slot that may hold a subtree (a `nextAction`, a loop body, a branch arm
/// or a router child). `None` is an empty subtree.
pub type StepSlot = Option<Box<Step>>;

/// A node in a flow's step graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Flow-scoped unique name (e.g. `step_3`).
    pub name: String,
    /// Human-readable name shown in the builder.
    pub display_name: String,
    /// Whether the step's settings passed builder validation.
    #[serde(default = "default_valid")]
    pub valid: bool,
    /// The flow version that owns this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_version_id: Option<FlowVersionId>,
    /// Kind-specific settings and child slots.
    #[serde(flatten)]
    pub kind: StepKind,
    /// The step that runs after this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: StepSlot,
}

fn default_valid() -> bool {
    true
}

impl Step {
    /// Creates a step with no continuation.
    #[must_use]
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            valid: true,
            flow_version_id: None,
            kind,
            next_action: None,
        }
    }

    /// Sets the continuation.
    #[must_use]
    pub fn with_next(mut self, next: Step) -> Self {
        self.next_action = Some(Box::new(next));
        self
    }

    /// Returns true if this step is a trigger kind.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.kind.is_trigger()
    }

    /// Returns the last step of the `nextAction` chain starting here.
    pub fn last_mut(&mut self) -> &mut Step {
        match self.next_action {
            Some(ref mut next) => next.last_mut(),
            None => self,
        }
    }

    /// Visits this step and everything below it, read-only.
    ///
    /// Order matches [`crate::traverse::traverse`]: a legacy branch is
    /// reported after its arms, every other kind before its children, and
    /// the `nextAction` chain last.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Step)) {
        let is_branch = matches!(self.kind, StepKind::Branch { .. });
        if !is_branch {
            f(self);
        }
        for child in self.kind.children().into_iter().flatten() {
            child.walk(f);
        }
        if is_branch {
            f(self);
        }
        if let Some(next) = &self.next_action {
            next.walk(f);
        }
    }

    /// Replaces the child subtree at `position`, returning the previous one.
    ///
    /// The replaced subtree is handed back intact; this is the only place
    /// child links are rewritten outside of construction.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GraphError::InvalidLocation`] if the step has no
    /// child slot at `position`.
    pub fn replace_child(
        &mut self,
        position: usize,
        child: Option<Step>,
    ) -> Result<Option<Step>, crate::GraphError> {
        let slot_count = self.kind.child_count();
        let Some(slot) = self.kind.children_mut().into_iter().nth(position) else {
            return Err(crate::GraphError::InvalidLocation {
                step_name: self.name.clone(),
                reason: format!("no child slot {position} (step has {slot_count})"),
            });
        };
        let previous = std::mem::replace(slot, child.map(Box::new));
        Ok(previous.map(|boxed| *boxed))
    }
}

/// The kind of a step, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum StepKind {
    /// Placeholder trigger of a flow that has not been configured yet.
    Empty,
    /// Trigger provided by a piece.
    PieceTrigger { settings: PieceTriggerSettings },
    /// Inline code block.
    Code { settings: CodeSettings },
    /// Calls one action of one piece.
    Piece { settings: PieceSettings },
    /// Runs its body once per item of a collection.
    LoopOnItems {
        settings: LoopSettings,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        first_loop_action: StepSlot,
    },
    /// Legacy binary branch; superseded by [`StepKind::Router`].
    Branch {
        settings: BranchSettings,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_success_action: StepSlot,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_failure_action: StepSlot,
    },
    /// N-ary branching; `children[i]` runs when `settings.branches[i]` matches.
    Router {
        settings: RouterSettings,
        #[serde(default)]
        children: Vec<StepSlot>,
    },
}

impl StepKind {
    /// Returns true for kinds that can only appear at the root of a flow.
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        matches!(self, Self::Empty | Self::PieceTrigger { .. })
    }

    /// Returns the wire tag of this kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::PieceTrigger { .. } => "PIECE_TRIGGER",
            Self::Code { .. } => "CODE",
            Self::Piece { .. } => "PIECE",
            Self::LoopOnItems { .. } => "LOOP_ON_ITEMS",
            Self::Branch { .. } => "BRANCH",
            Self::Router { .. } => "ROUTER",
        }
    }

    /// Number of child slots this kind declares.
    ///
    /// For a router this is the number of declared branches, which may
    /// differ from `children.len()` in unvalidated data.
    #[must_use]
    pub fn expected_child_count(&self) -> usize {
        match self {
            Self::Empty | Self::PieceTrigger { .. } | Self::Code { .. } | Self::Piece { .. } => 0,
            Self::LoopOnItems { .. } => 1,
            Self::Branch { .. } => 2,
            Self::Router { settings, .. } => settings.branches.len(),
        }
    }

    /// Number of child slots actually present.
    #[must_use]
    pub fn child_count(&self) -> usize {
        match self {
            Self::Router { children, .. } => children.len(),
            other => other.expected_child_count(),
        }
    }

    /// Child slots in declared order.
    #[must_use]
    pub fn children(&self) -> Vec<&StepSlot> {
        match self {
            Self::Empty | Self::PieceTrigger { .. } | Self::Code { .. } | Self::Piece { .. } => {
                Vec::new()
            }
            Self::LoopOnItems {
                first_loop_action, ..
            } => vec![first_loop_action],
            Self::Branch {
                on_success_action,
                on_failure_action,
                ..
            } => vec![on_success_action, on_failure_action],
            Self::Router { children, .. } => children.iter().collect(),
        }
    }

    /// Mutable child slots in declared order.
    pub fn children_mut(&mut self) -> Vec<&mut StepSlot> {
        match self {
            Self::Empty | Self::PieceTrigger { .. } | Self::Code { .. } | Self::Piece { .. } => {
                Vec::new()
            }
            Self::LoopOnItems {
                first_loop_action, ..
            } => vec![first_loop_action],
            Self::Branch {
                on_success_action,
                on_failure_action,
                ..
            } => vec![on_success_action, on_failure_action],
            Self::Router { children, .. } => children.iter_mut().collect(),
        }
    }
}

/// Source of a code step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCode {
    pub code: String,
    #[serde(default)]
    pub package_json: String,
}

/// Settings of a code step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSettings {
    pub source_code: SourceCode,
    /// Input expressions keyed by parameter name.
    #[serde(default)]
    pub input: Map<String, JsonValue>,
}

/// Settings of a piece action step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceSettings {
    /// Piece package name (e.g. `@pieces/gmail`).
    pub piece_name: String,
    /// Pinned piece version.
    pub piece_version: String,
    /// The action to call; unset while the step is being configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(default)]
    pub input: Map<String, JsonValue>,
}

/// Settings of a piece trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceTriggerSettings {
    pub piece_name: String,
    pub piece_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_name: Option<String>,
    #[serde(default)]
    pub input: Map<String, JsonValue>,
}

/// Settings of a loop step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSettings {
    /// Expression producing the collection to iterate.
    pub items: String,
}

/// Settings of a legacy branch step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchSettings {
    /// Groups of conditions: conditions inside a group are AND-ed,
    /// groups are OR-ed.
    #[serde(default)]
    pub conditions: Vec<Vec<BranchCondition>>,
}

/// A single comparison inside a branch or router condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCondition {
    pub first_value: String,
    pub operator: BranchOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

impl BranchCondition {
    /// Creates a condition for an operator that needs no second value.
    #[must_use]
    pub fn unary(first_value: impl Into<String>, operator: BranchOperator) -> Self {
        Self {
            first_value: first_value.into(),
            operator,
            second_value: None,
            case_sensitive: None,
        }
    }

    /// Creates a condition comparing two values.
    #[must_use]
    pub fn binary(
        first_value: impl Into<String>,
        operator: BranchOperator,
        second_value: impl Into<String>,
    ) -> Self {
        Self {
            first_value: first_value.into(),
            operator,
            second_value: Some(second_value.into()),
            case_sensitive: None,
        }
    }
}

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchOperator {
    TextContains,
    TextDoesNotContain,
    TextExactlyMatches,
    TextDoesNotExactlyMatch,
    TextStartsWith,
    TextEndsWith,
    NumberIsGreaterThan,
    NumberIsLessThan,
    NumberIsEqualTo,
    BooleanIsTrue,
    BooleanIsFalse,
    Exists,
    DoesNotExist,
}

impl BranchOperator {
    /// Returns true if the operator only inspects `first_value`.
    #[must_use]
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            Self::BooleanIsTrue | Self::BooleanIsFalse | Self::Exists | Self::DoesNotExist
        )
    }
}

/// Settings of a router step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSettings {
    pub branches: Vec<RouterBranch>,
    pub execution_type: RouterExecutionType,
}

/// One guarded branch of a router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "branchType",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum RouterBranch {
    /// Taken when the conditions match.
    Condition {
        branch_name: String,
        conditions: Vec<Vec<BranchCondition>>,
    },
    /// Taken when no condition branch matched. Must be the last branch.
    Fallback { branch_name: String },
}

impl RouterBranch {
    /// Returns true for the fallback branch.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// How a router picks among matching branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouterExecutionType {
    /// Run only the first branch whose conditions match.
    #[default]
    ExecuteFirstMatch,
    /// Run every branch whose conditions match.
    ExecuteAllMatch,
}
