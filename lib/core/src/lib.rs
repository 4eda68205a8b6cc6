//! Core identifiers and utilities for piecework.
//!
//! This crate provides the strongly-typed identifiers and the `Result`
//! alias shared by the flow graph and trigger crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{FlowId, FlowVersionId, ParseIdError, TriggerId};
