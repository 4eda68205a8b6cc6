//! Step graph engine for piecework flows.
//!
//! This crate provides:
//!
//! - **Step model**: a recursive, typed tree of steps (code, piece actions,
//!   loops, routers and the legacy binary branch) owned by a flow version
//! - **Traversal**: a depth-first walk that lets a visitor rewrite one node
//!   at a time while the driver keeps ownership of every link
//! - **Validation & import**: structural checks and assembly of a flat,
//!   name-linked step list into the owned tree
//! - **Migrations**: structural rewrites such as branch-to-router, applied
//!   in bulk over stored flow versions

pub mod error;
pub mod import;
pub mod migration;
pub mod runner;
pub mod step;
pub mod traverse;
pub mod validate;
pub mod version;

pub use error::{GraphError, MigrationError};
pub use import::{FlatFlow, FlatStep};
pub use migration::{BranchToRouter, Migration, branch_to_router};
pub use runner::{
    FlowVersionSource, MigrationFailure, MigrationReport, MigrationRunner, RunnerOptions,
    StoredFlowVersion,
};
pub use step::{
    BranchCondition, BranchOperator, BranchSettings, CodeSettings, LoopSettings, PieceSettings,
    PieceTriggerSettings, RouterBranch, RouterExecutionType, RouterSettings, SourceCode, Step,
    StepKind, StepSlot,
};
pub use traverse::{StepVisitor, traverse, try_traverse};
pub use validate::validate;
pub use version::{FlowVersion, StepLocation};
